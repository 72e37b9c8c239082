//! Chat message and persisted conversation record types.
//!
//! A [`ChatMessage`] is what the pipeline reasons about; a
//! [`ConversationRecord`] is what lands on disk, one JSON object per line.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The character answering through the LLM
    Assistant,
}

impl Role {
    /// The literal stored in the `role` field of a conversation record.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Map a stored role string back to a [`Role`].
    ///
    /// Only `"user"` is a user turn; anything else replays as the assistant.
    pub fn from_record(role: &str) -> Self {
        if role == "user" {
            Self::User
        } else {
            Self::Assistant
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One persisted turn in a user's conversation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub user_id: String,

    /// Front end the message arrived from (e.g. "line", "discord", "cli")
    pub platform: String,

    /// UTC time the record was written
    pub timestamp: DateTime<Utc>,

    /// `"user"` or `"assistant"`; kept as a string so foreign values replay
    pub role: String,

    pub text: String,
}

impl ConversationRecord {
    /// Build a record stamped with the current UTC time.
    pub fn now(user_id: &str, platform: &str, role: Role, text: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            platform: platform.to_string(),
            timestamp: Utc::now(),
            role: role.as_str().to_string(),
            text: text.to_string(),
        }
    }

    /// Convert to the message form used for prompting.
    pub fn to_message(&self) -> ChatMessage {
        ChatMessage {
            role: Role::from_record(&self.role),
            content: self.text.clone(),
        }
    }
}
