//! The chat turn pipeline for Anxiousroid.
//!
//! Every message goes through the same steps:
//!
//! 1. **Load** the user's recent turns from the conversation store
//! 2. **Match** people and situational rules against the recent text
//! 3. **Render** the system prompt and assistant prefill
//! 4. **Call** the provider with history + the new message
//! 5. **Shape** the reply: strip framing, cut on a sentence boundary
//! 6. **Persist** both turns, only when a reply was produced
//!
//! Failures at any step become a [`ChatOutcome::ProviderError`]; the
//! pipeline itself never returns an error.

pub mod context;
pub mod pipeline;
pub mod prompt;
pub mod truncate;

pub use context::{AssembledContext, ContextAssembler};
pub use pipeline::{ChatOutcome, PipelineSettings, ResponsePipeline};
pub use prompt::{PromptTemplate, RenderedPrompt};
pub use truncate::{Truncation, shape_reply, truncate};
