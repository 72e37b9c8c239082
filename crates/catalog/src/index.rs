//! Lazily loaded, regex-indexed catalogs.

use anxiousroid_core::catalog::{Rule, Term, TermCategory};
use anxiousroid_core::error::CatalogError;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::source::CatalogSource;

/// An entry type that can live in a [`Catalog`].
pub trait CatalogEntry: DeserializeOwned + Clone + Send + Sync {
    /// Singular noun used in log lines ("term", "rule").
    const KIND: &'static str;

    /// The pattern searched for in the query.
    fn pattern(&self) -> &str;
}

impl CatalogEntry for Term {
    const KIND: &'static str = "term";

    fn pattern(&self) -> &str {
        &self.index_regex
    }
}

impl CatalogEntry for Rule {
    const KIND: &'static str = "rule";

    fn pattern(&self) -> &str {
        &self.index_regex
    }
}

struct Indexed<T> {
    matcher: Regex,
    entry: T,
}

/// A catalog loaded once from its [`CatalogSource`] on first access.
///
/// A failed load leaves the catalog empty and returns the error; the next
/// access tries again. Once loaded, the entries never change.
pub struct Catalog<T> {
    source: CatalogSource,
    entries: OnceCell<Vec<Indexed<T>>>,
}

impl<T: CatalogEntry> Catalog<T> {
    pub fn new(source: CatalogSource) -> Self {
        Self {
            source,
            entries: OnceCell::new(),
        }
    }

    /// Whether the catalog has been loaded successfully.
    pub fn is_loaded(&self) -> bool {
        self.entries.get().is_some()
    }

    /// Force the load now. Returns the number of entries.
    pub fn preload(&self) -> Result<usize, CatalogError> {
        Ok(self.indexed()?.len())
    }

    /// Return every entry whose pattern matches somewhere in `query` and that
    /// passes `filter`, in catalog order.
    pub fn matching<F>(&self, query: &str, filter: F) -> Result<Vec<T>, CatalogError>
    where
        F: Fn(&T) -> bool,
    {
        let hits: Vec<T> = self
            .indexed()?
            .iter()
            .filter(|item| filter(&item.entry) && item.matcher.is_match(query))
            .map(|item| item.entry.clone())
            .collect();
        debug!(kind = T::KIND, hits = hits.len(), "Catalog searched");
        Ok(hits)
    }

    fn indexed(&self) -> Result<&[Indexed<T>], CatalogError> {
        self.entries
            .get_or_try_init(|| load(&self.source))
            .map(Vec::as_slice)
    }
}

fn load<T: CatalogEntry>(source: &CatalogSource) -> Result<Vec<Indexed<T>>, CatalogError> {
    let raw = source.read()?;
    let entries: Vec<T> = serde_json::from_str(&raw).map_err(|e| CatalogError::Parse {
        source_name: source.describe(),
        reason: e.to_string(),
    })?;

    let indexed = entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let matcher =
                Regex::new(entry.pattern()).map_err(|e| CatalogError::InvalidPattern {
                    index,
                    pattern: entry.pattern().to_string(),
                    reason: e.to_string(),
                })?;
            Ok(Indexed { matcher, entry })
        })
        .collect::<Result<Vec<_>, CatalogError>>()?;

    info!(
        kind = T::KIND,
        source = %source.describe(),
        count = indexed.len(),
        "Catalog loaded"
    );
    Ok(indexed)
}

/// Named entities (people and other terms).
pub struct TermIndex {
    catalog: Catalog<Term>,
}

impl TermIndex {
    pub fn new(source: CatalogSource) -> Self {
        Self {
            catalog: Catalog::new(source),
        }
    }

    pub fn preload(&self) -> Result<usize, CatalogError> {
        self.catalog.preload()
    }

    /// Terms matching `query`, optionally restricted to one category.
    pub fn search(
        &self,
        query: &str,
        category: Option<TermCategory>,
    ) -> Result<Vec<Term>, CatalogError> {
        self.catalog
            .matching(query, |term| category.is_none_or(|c| term.has_category(c)))
    }
}

/// Situational behaviour rules.
pub struct RuleIndex {
    catalog: Catalog<Rule>,
}

impl RuleIndex {
    pub fn new(source: CatalogSource) -> Self {
        Self {
            catalog: Catalog::new(source),
        }
    }

    pub fn preload(&self) -> Result<usize, CatalogError> {
        self.catalog.preload()
    }

    pub fn search(&self, query: &str) -> Result<Vec<Rule>, CatalogError> {
        self.catalog.matching(query, |_| true)
    }
}
