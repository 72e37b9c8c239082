pub mod catalog;
pub mod chat;
pub mod history;
pub mod serve;

use anxiousroid_config::AppConfig;
use std::path::Path;

/// Load the config file (defaults when absent) with environment overrides.
pub fn load_config(path: &Path) -> Result<AppConfig, Box<dyn std::error::Error>> {
    AppConfig::load_with_env(path).map_err(|e| format!("Failed to load config: {e}").into())
}
