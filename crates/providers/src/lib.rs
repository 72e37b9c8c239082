//! LLM Provider implementations for Anxiousroid.
//!
//! All providers implement the `anxiousroid_core::Provider` trait.

pub mod anthropic;

pub use anthropic::AnthropicProvider;

use anxiousroid_config::AppConfig;
use anxiousroid_core::Provider;
use anxiousroid_core::error::ProviderError;
use std::sync::Arc;
use std::time::Duration;

/// Build the configured provider.
///
/// Fails with [`ProviderError::NotConfigured`] when no API key is available.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config.api_key.clone().ok_or_else(|| {
        ProviderError::NotConfigured(
            "no Anthropic API key; set api_key or CLAUDE_API_KEY".into(),
        )
    })?;

    let mut provider =
        AnthropicProvider::with_timeout(api_key, Duration::from_secs(config.request_timeout_secs));
    if let Some(base_url) = &config.base_url {
        provider = provider.with_base_url(base_url.clone());
    }

    tracing::info!(provider = provider.name(), model = %config.model, "Provider configured");
    Ok(Arc::new(provider))
}
