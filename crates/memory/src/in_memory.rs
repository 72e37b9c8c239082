//! In-memory conversation store — useful for testing and ephemeral sessions.

use anxiousroid_core::message::{ChatMessage, ConversationRecord, Role};
use anxiousroid_core::store::{AppendOutcome, ConversationStore, HistoryLoad};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Keeps every user's records in a map. Nothing survives a restart.
pub struct InMemoryConversationStore {
    logs: Arc<RwLock<HashMap<String, Vec<ConversationRecord>>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self {
            logs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// All records stored for `user_id`, oldest first.
    pub async fn records(&self, user_id: &str) -> Vec<ConversationRecord> {
        self.logs
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Total records across all users.
    pub async fn total_records(&self) -> usize {
        self.logs.read().await.values().map(Vec::len).sum()
    }
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self, user_id: &str, window: usize) -> HistoryLoad {
        let logs = self.logs.read().await;
        let messages: Vec<ChatMessage> = logs
            .get(user_id)
            .map(|records| {
                let skip = records.len().saturating_sub(window);
                records[skip..].iter().map(ConversationRecord::to_message).collect()
            })
            .unwrap_or_default();
        HistoryLoad::Loaded(messages)
    }

    async fn append(&self, user_id: &str, platform: &str, role: Role, text: &str) -> AppendOutcome {
        let record = ConversationRecord::now(user_id, platform, role, text);
        self.logs
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .push(record);
        AppendOutcome::Written { archived: false }
    }
}
