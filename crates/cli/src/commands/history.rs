//! `anxiousroid history` — Print a user's recent turns.

use anxiousroid_config::AppConfig;
use anxiousroid_core::store::HistoryLoad;

pub async fn run(
    config: &AppConfig,
    user_id: &str,
    window: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let window = window.unwrap_or(config.conversation.max_chat_log_length);
    let store = anxiousroid_memory::build_from_config(&config.conversation);

    match store.load(user_id, window).await {
        HistoryLoad::Loaded(messages) if messages.is_empty() => {
            println!("No history for {user_id}.");
        }
        HistoryLoad::Loaded(messages) => {
            for message in messages {
                println!("[{}] {}", message.role, message.content);
            }
        }
        HistoryLoad::Degraded { reason } => {
            return Err(format!("history for {user_id} is unreadable: {reason}").into());
        }
    }

    Ok(())
}
