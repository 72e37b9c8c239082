//! File-based conversation store — one JSON-lines log per user.
//!
//! Each line is a JSON-encoded [`ConversationRecord`]. Writes are appends, so
//! the file is ordered by time. When a log grows past the size threshold it
//! is copied into the archive directory as
//! `<user_id>_<YYYYmmdd_HHMMSS>.jsonl` (with a `_N` suffix when that name is
//! taken) and the live file is cut back to its most recent
//! `2 × history_window` lines.
//!
//! Storage problems never surface as errors: reads degrade to an empty
//! history and failed writes are logged and dropped.

use anxiousroid_config::ConversationConfig;
use anxiousroid_core::message::{ChatMessage, ConversationRecord, Role};
use anxiousroid_core::store::{AppendOutcome, ConversationStore, HistoryLoad};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::paths;

/// Settings for [`FileConversationStore`].
#[derive(Debug, Clone)]
pub struct FileStoreSettings {
    /// Log path template containing `{user_id}`
    pub path_template: String,
    pub archive_dir: PathBuf,
    /// Live log size (bytes) at which the next append archives first
    pub archive_threshold_bytes: u64,
    /// Prompt history window; the live log keeps twice this after archival
    pub history_window: usize,
}

impl From<&ConversationConfig> for FileStoreSettings {
    fn from(config: &ConversationConfig) -> Self {
        Self {
            path_template: config.history_path_template.clone(),
            archive_dir: PathBuf::from(paths::expand(&config.archive_dir)),
            archive_threshold_bytes: config.max_size_bytes(),
            history_window: config.max_chat_log_length,
        }
    }
}

/// Only the fields replay needs; extra or missing metadata is tolerated.
#[derive(Deserialize)]
struct StoredTurn {
    role: String,
    text: String,
}

/// A file-backed conversation store.
///
/// Operations on the same user are serialized through a per-user lock, so
/// archive-then-append is atomic with respect to other requests in this
/// process. Different users never contend.
pub struct FileConversationStore {
    settings: FileStoreSettings,
    locks: std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl FileConversationStore {
    pub fn new(settings: FileStoreSettings) -> Self {
        debug!(
            template = %settings.path_template,
            archive_dir = %settings.archive_dir.display(),
            threshold = settings.archive_threshold_bytes,
            "File conversation store ready"
        );
        Self {
            settings,
            locks: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// The live log path for `user_id`.
    pub fn log_path(&self, user_id: &str) -> Result<PathBuf, String> {
        paths::resolve_log_path(&self.settings.path_template, user_id)
    }

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(user_id.to_string()).or_default().clone()
    }

    /// Forget `user_id`'s lock once nobody else holds or waits on it.
    ///
    /// Clones are only taken under the map lock, so a count of two (the map
    /// and `lock`) means no other task can reach this entry.
    fn release_user_lock(&self, user_id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if Arc::strong_count(&lock) == 2 {
            locks.remove(user_id);
        }
    }

    #[cfg(test)]
    fn tracked_users(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Archive `user_id`'s log if it has reached the size threshold.
    ///
    /// Returns `Ok(false)` without touching anything when the log is missing
    /// or below the threshold.
    pub async fn archive_if_oversized(&self, user_id: &str) -> io::Result<bool> {
        let path = self
            .log_path(user_id)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let lock = self.user_lock(user_id);
        let archived = {
            let _guard = lock.lock().await;
            self.archive_locked(user_id, &path).await
        };
        self.release_user_lock(user_id, lock);
        archived
    }

    async fn archive_locked(&self, user_id: &str, path: &Path) -> io::Result<bool> {
        let size = match tokio::fs::metadata(path).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };
        if size < self.settings.archive_threshold_bytes {
            return Ok(false);
        }

        let archive_path = self.claim_archive_path(user_id).await?;
        tokio::fs::copy(path, &archive_path).await?;

        let content = tokio::fs::read_to_string(path).await?;
        let lines: Vec<&str> = content.lines().collect();
        let keep = self.settings.history_window.saturating_mul(2);
        let tail = &lines[lines.len().saturating_sub(keep)..];
        let mut kept = tail.join("\n");
        if !kept.is_empty() {
            kept.push('\n');
        }
        tokio::fs::write(path, kept).await?;

        info!(
            user_id,
            size,
            archive = %archive_path.display(),
            kept = tail.len(),
            "Conversation log archived"
        );
        Ok(true)
    }

    /// Create an empty, previously unused archive file for `user_id`.
    async fn claim_archive_path(&self, user_id: &str) -> io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.settings.archive_dir).await?;
        let stamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        let mut attempt = 0u32;
        loop {
            let name = match attempt {
                0 => format!("{user_id}_{stamp}.jsonl"),
                n => format!("{user_id}_{stamp}_{n}.jsonl"),
            };
            let candidate = self.settings.archive_dir.join(name);
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await
            {
                Ok(_) => return Ok(candidate),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e),
            }
        }
    }

    async fn read_window(path: &Path, window: usize) -> Result<Vec<ChatMessage>, String> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        let mut messages = Vec::new();
        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let turn: StoredTurn = serde_json::from_str(line)
                .map_err(|e| format!("line {} of {}: {e}", number + 1, path.display()))?;
            messages.push(ChatMessage {
                role: Role::from_record(&turn.role),
                content: turn.text,
            });
        }

        let skip = messages.len().saturating_sub(window);
        Ok(messages.split_off(skip))
    }

    async fn write_record(&self, path: &Path, record: &ConversationRecord) -> Result<bool, String> {
        let archived = match self.archive_locked(&record.user_id, path).await {
            Ok(archived) => archived,
            Err(e) => {
                warn!(user_id = %record.user_id, error = %e, "Archival failed, appending anyway");
                false
            }
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("failed to create {}: {e}", parent.display()))?;
        }

        let mut line = serde_json::to_string(record)
            .map_err(|e| format!("failed to serialize record: {e}"))?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| format!("failed to open {}: {e}", path.display()))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
        file.flush()
            .await
            .map_err(|e| format!("failed to flush {}: {e}", path.display()))?;

        Ok(archived)
    }
}

#[async_trait]
impl ConversationStore for FileConversationStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn load(&self, user_id: &str, window: usize) -> HistoryLoad {
        let path = match self.log_path(user_id) {
            Ok(p) => p,
            Err(reason) => {
                warn!(%reason, "Refusing to load history");
                return HistoryLoad::Degraded { reason };
            }
        };

        let lock = self.user_lock(user_id);
        let read = {
            let _guard = lock.lock().await;
            Self::read_window(&path, window).await
        };
        self.release_user_lock(user_id, lock);

        match read {
            Ok(messages) => {
                debug!(user_id, count = messages.len(), "History loaded");
                HistoryLoad::Loaded(messages)
            }
            Err(reason) => {
                warn!(user_id, %reason, "History unreadable, continuing without it");
                HistoryLoad::Degraded { reason }
            }
        }
    }

    async fn append(&self, user_id: &str, platform: &str, role: Role, text: &str) -> AppendOutcome {
        let path = match self.log_path(user_id) {
            Ok(p) => p,
            Err(reason) => {
                warn!(%reason, "Refusing to persist turn");
                return AppendOutcome::Dropped { reason };
            }
        };

        let record = ConversationRecord::now(user_id, platform, role, text);
        let lock = self.user_lock(user_id);
        let written = {
            let _guard = lock.lock().await;
            self.write_record(&path, &record).await
        };
        self.release_user_lock(user_id, lock);

        match written {
            Ok(archived) => AppendOutcome::Written { archived },
            Err(reason) => {
                warn!(user_id, %role, %reason, "Turn not persisted");
                AppendOutcome::Dropped { reason }
            }
        }
    }
}
