//! Where a catalog's JSON comes from.

use anxiousroid_core::error::CatalogError;
use std::path::PathBuf;

/// The origin of a catalog's JSON array.
#[derive(Debug, Clone)]
pub enum CatalogSource {
    /// A JSON file on disk
    File(PathBuf),
    /// JSON held in memory (embedded defaults, tests)
    Inline { name: String, json: String },
}

impl CatalogSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn inline(name: impl Into<String>, json: impl Into<String>) -> Self {
        Self::Inline {
            name: name.into(),
            json: json.into(),
        }
    }

    /// Human-readable label used in logs and errors.
    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Inline { name, .. } => format!("inline:{name}"),
        }
    }

    /// Read the raw JSON text.
    pub(crate) fn read(&self) -> Result<String, CatalogError> {
        match self {
            Self::File(path) => std::fs::read_to_string(path).map_err(|e| CatalogError::Read {
                path: path.clone(),
                reason: e.to_string(),
            }),
            Self::Inline { json, .. } => Ok(json.clone()),
        }
    }
}
