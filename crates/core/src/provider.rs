//! Provider trait — the abstraction over LLM backends.
//!
//! A Provider takes a fully rendered prompt (system text, prior turns, the new
//! user message and an optional assistant prefill) and returns the model's
//! text together with usage statistics. Prompt templating happens before the
//! request is built; providers only transport it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::ChatMessage;

/// A single completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g. "claude-3-sonnet-20240229")
    pub model: String,

    /// Rendered system prompt
    pub system: String,

    /// History followed by the current user message
    pub messages: Vec<ChatMessage>,

    /// Text the assistant turn is forced to start with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_prefill: Option<String>,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    0.8
}

/// Token usage and latency of one completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub elapsed_ms: u64,
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated text, unshaped
    pub text: String,

    pub usage: Usage,

    /// Which model actually responded
    pub model: String,
}

/// The core Provider trait.
///
/// The response pipeline calls `complete()` without knowing which backend is
/// behind it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g. "anthropic").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError>;
}
