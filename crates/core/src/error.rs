//! Error types for the Anxiousroid domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! History loading and persistence deliberately have no error type: they
//! report through [`crate::store::HistoryLoad`] and
//! [`crate::store::AppendOutcome`] instead.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all Anxiousroid operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Catalog errors ---
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider returned no text content")]
    EmptyResponse,

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Stable machine-readable code reported to chat clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ApiError { .. } | Self::EmptyResponse => "api_error",
            Self::RateLimited { .. } => "rate_limited",
            Self::AuthenticationFailed(_) => "authentication_failed",
            Self::NotConfigured(_) => "not_configured",
            Self::Timeout(_) => "timeout",
            Self::Network(_) => "network_error",
        }
    }
}

/// Failure to load a static catalog. Fatal for the catalog subsystem.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse catalog {source_name}: {reason}")]
    Parse { source_name: String, reason: String },

    #[error("Invalid pattern {pattern:?} at catalog entry {index}: {reason}")]
    InvalidPattern {
        index: usize,
        pattern: String,
        reason: String,
    },
}

impl Error {
    /// Stable machine-readable code for the chat response `error.code` field.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Provider(e) => e.code(),
            Self::Catalog(_) => "catalog_unavailable",
        }
    }
}
