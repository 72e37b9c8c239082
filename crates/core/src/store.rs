//! Conversation store trait — per-user, append-only turn history.
//!
//! Neither operation can fail from the caller's point of view. A broken or
//! unreadable log degrades to an empty history, and a failed write is reported
//! but dropped, so persistence problems never reach the chat path.

use async_trait::async_trait;

use crate::message::{ChatMessage, Role};

/// Result of reading a user's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryLoad {
    /// The log was read (or does not exist yet)
    Loaded(Vec<ChatMessage>),
    /// The log could not be read or parsed; continue with no history
    Degraded { reason: String },
}

impl HistoryLoad {
    /// The usable messages: the loaded window, or nothing when degraded.
    pub fn into_messages(self) -> Vec<ChatMessage> {
        match self {
            Self::Loaded(messages) => messages,
            Self::Degraded { .. } => Vec::new(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// Result of persisting one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The record was appended; `archived` if the log was rotated first
    Written { archived: bool },
    /// The record was not persisted
    Dropped { reason: String },
}

impl AppendOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }
}

/// Storage for per-user conversation logs.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// A human-readable name for this backend (e.g. "file", "memory").
    fn name(&self) -> &str;

    /// Return at most the last `window` messages for `user_id`, oldest first.
    async fn load(&self, user_id: &str, window: usize) -> HistoryLoad;

    /// Append one turn to `user_id`'s log.
    async fn append(&self, user_id: &str, platform: &str, role: Role, text: &str) -> AppendOutcome;
}
