//! Conversation history storage for Anxiousroid.

pub mod file_backend;
pub mod in_memory;
pub mod paths;

pub use file_backend::{FileConversationStore, FileStoreSettings};
pub use in_memory::InMemoryConversationStore;

use anxiousroid_config::ConversationConfig;
use anxiousroid_core::store::ConversationStore;
use std::sync::Arc;

/// Build the store selected by `conversation.backend`.
///
/// The configuration is validated beforehand, so anything other than
/// `"memory"` means the file store.
pub fn build_from_config(config: &ConversationConfig) -> Arc<dyn ConversationStore> {
    match config.backend.as_str() {
        "memory" => Arc::new(InMemoryConversationStore::new()),
        _ => Arc::new(FileConversationStore::new(FileStoreSettings::from(config))),
    }
}
