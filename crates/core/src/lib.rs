//! # Anxiousroid Core
//!
//! Domain types, traits, and error definitions for the Anxiousroid
//! conversational proxy. This crate has **no framework dependencies**: it
//! defines the model that every other crate implements against.
//!
//! ## Seams
//!
//! The two external collaborators of the chat pipeline are traits here:
//! - [`Provider`] sends an enriched prompt to an LLM backend
//! - [`ConversationStore`] persists and replays per-user turns
//!
//! Implementations live in `anxiousroid-providers` and `anxiousroid-memory`,
//! which keeps the pipeline testable with scripted stand-ins.

pub mod catalog;
pub mod error;
pub mod message;
pub mod provider;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use catalog::{Rule, Term, TermAttribute, TermCategory};
pub use error::{CatalogError, Error, ProviderError, Result};
pub use message::{ChatMessage, ConversationRecord, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use store::{AppendOutcome, ConversationStore, HistoryLoad};
