//! `anxiousroid catalog check` — Validate the term and rule catalogs.

use anxiousroid_catalog::{CatalogSource, RuleIndex, TermIndex};
use anxiousroid_config::AppConfig;

pub fn check(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("Catalog check");
    println!("=============");

    let terms = TermIndex::new(CatalogSource::file(&config.catalog.terminology_path));
    let rules = RuleIndex::new(CatalogSource::file(&config.catalog.additional_rules_path));

    let mut failures = 0;
    for (label, path, loaded) in [
        ("Terms", &config.catalog.terminology_path, terms.preload()),
        ("Rules", &config.catalog.additional_rules_path, rules.preload()),
    ] {
        match loaded {
            Ok(count) => println!("  OK   {label}: {count} entries ({})", path.display()),
            Err(e) => {
                println!("  FAIL {label}: {e}");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(format!("{failures} catalog(s) failed to load").into());
    }
    Ok(())
}
