//! Configuration loading, validation, and management for Anxiousroid.
//!
//! Loads configuration from `anxiousroid.toml` (or an explicit path) with
//! environment variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "anxiousroid.toml";

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Anthropic API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Override for the Anthropic API base URL (proxies, tests)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    /// Max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// HTTP timeout for a single provider call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub conversation: ConversationConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub response: ResponseConfig,

    #[serde(default)]
    pub prompt: PromptConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_model() -> String {
    "claude-3-sonnet-20240229".into()
}
fn default_max_tokens() -> u32 {
    80
}
fn default_temperature() -> f32 {
    0.8
}
fn default_request_timeout_secs() -> u64 {
    120
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("conversation", &self.conversation)
            .field("catalog", &self.catalog)
            .field("response", &self.response)
            .field("prompt", &self.prompt)
            .field("gateway", &self.gateway)
            .finish()
    }
}

/// Where and how conversation history is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// "file" (JSONL per user) or "memory" (process-local, for trials)
    #[serde(default = "default_conversation_backend")]
    pub backend: String,

    /// Log path; `{user_id}` is substituted, `~` and `$VAR` are expanded
    #[serde(default = "default_history_path_template")]
    pub history_path_template: String,

    /// Number of past messages sent to the model
    #[serde(default = "default_max_chat_log_length")]
    pub max_chat_log_length: usize,

    /// Live log size that triggers archival
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: u64,

    #[serde(default = "default_archive_dir")]
    pub archive_dir: String,
}

fn default_conversation_backend() -> String {
    "file".into()
}
fn default_history_path_template() -> String {
    "data/conversations/{user_id}.jsonl".into()
}
fn default_max_chat_log_length() -> usize {
    10
}
fn default_max_size_mb() -> u64 {
    50
}
fn default_archive_dir() -> String {
    "data/conversations/archive/".into()
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            backend: default_conversation_backend(),
            history_path_template: default_history_path_template(),
            max_chat_log_length: default_max_chat_log_length(),
            max_size_mb: default_max_size_mb(),
            archive_dir: default_archive_dir(),
        }
    }
}

impl ConversationConfig {
    /// Archive threshold in bytes.
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(1024 * 1024)
    }
}

/// Locations of the static term and rule catalogs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_terminology_path")]
    pub terminology_path: PathBuf,

    #[serde(default = "default_additional_rules_path")]
    pub additional_rules_path: PathBuf,
}

fn default_terminology_path() -> PathBuf {
    PathBuf::from("data/terminology.json")
}
fn default_additional_rules_path() -> PathBuf {
    PathBuf::from("data/additional_rules.json")
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            terminology_path: default_terminology_path(),
            additional_rules_path: default_additional_rules_path(),
        }
    }
}

/// Reply shaping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseConfig {
    /// Strict character limit for replies; the loose fallback allows twice this
    #[serde(default = "default_max_response_length")]
    pub max_length: usize,

    /// Closing framing token stripped from the end of replies
    #[serde(default = "default_response_postfix")]
    pub postfix: String,
}

fn default_max_response_length() -> usize {
    80
}
fn default_response_postfix() -> String {
    "</response>".into()
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            max_length: default_max_response_length(),
            postfix: default_response_postfix(),
        }
    }
}

/// Prompt templates. `{{people}}` and `{{additional_rules}}` are substituted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    #[serde(default = "default_system_template")]
    pub system_template: String,

    /// Opening of the assistant turn; empty disables the prefill
    #[serde(default = "default_assistant_prefill")]
    pub assistant_prefill: String,
}

fn default_system_template() -> String {
    r#"You are an angel named ぴの. Your goal is to provide your concerns about the topic that the user talks about. Users will be confused if you don't respond in the character of ぴの.

Important rules for the interaction:
 - Always stay in character as ぴの.
 - You end your sentences with "ですわ" or "ますわ".
 - Your emotion is anxious.
 - Have a negative view.
 - You often say "不安ですわ".

Respond to the user in 80 characters in Japanese within <response></response> tags."#
        .into()
}
fn default_assistant_prefill() -> String {
    "[ぴの]<response>".into()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_template: default_system_template(),
            assistant_prefill: default_assistant_prefill(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "0.0.0.0".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, then apply environment overrides and validate.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    ///
    /// Recognised keys:
    /// - `ANXIOUSROID_API_KEY`, then `CLAUDE_API_KEY`
    /// - `ANXIOUSROID_MODEL`
    /// - `CONV_HISTORY_PATH_TEMPLATE`, `MAX_CHAT_LOG_LENGTH`,
    ///   `CONV_HISTORY_MAX_SIZE_MB`, `CONV_HISTORY_ARCHIVE_FOLDER`
    /// - `TERMINOLOGY_FILE_PATH`, `ADDITIONAL_RULES_FILE_PATH`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("ANXIOUSROID_API_KEY").or_else(|| lookup("CLAUDE_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(model) = lookup("ANXIOUSROID_MODEL") {
            self.model = model;
        }
        if let Some(template) = lookup("CONV_HISTORY_PATH_TEMPLATE") {
            self.conversation.history_path_template = template;
        }
        if let Some(raw) = lookup("MAX_CHAT_LOG_LENGTH") {
            self.conversation.max_chat_log_length = parse_override("MAX_CHAT_LOG_LENGTH", &raw)?;
        }
        if let Some(raw) = lookup("CONV_HISTORY_MAX_SIZE_MB") {
            self.conversation.max_size_mb = parse_override("CONV_HISTORY_MAX_SIZE_MB", &raw)?;
        }
        if let Some(dir) = lookup("CONV_HISTORY_ARCHIVE_FOLDER") {
            self.conversation.archive_dir = dir;
        }
        if let Some(path) = lookup("TERMINOLOGY_FILE_PATH") {
            self.catalog.terminology_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("ADDITIONAL_RULES_FILE_PATH") {
            self.catalog.additional_rules_path = PathBuf::from(path);
        }
        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 1.0".into(),
            ));
        }

        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationError("max_tokens must be > 0".into()));
        }

        if self.conversation.max_chat_log_length == 0 {
            return Err(ConfigError::ValidationError(
                "conversation.max_chat_log_length must be > 0".into(),
            ));
        }

        if !self.conversation.history_path_template.contains("{user_id}") {
            return Err(ConfigError::ValidationError(
                "conversation.history_path_template must contain {user_id}".into(),
            ));
        }

        if !matches!(self.conversation.backend.as_str(), "file" | "memory") {
            return Err(ConfigError::ValidationError(format!(
                "unknown conversation.backend '{}' (expected \"file\" or \"memory\")",
                self.conversation.backend
            )));
        }

        if self.response.max_length == 0 {
            return Err(ConfigError::ValidationError(
                "response.max_length must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

fn parse_override<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| {
        ConfigError::ValidationError(format!("{key} must be a non-negative integer, got '{raw}'"))
    })
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
            conversation: ConversationConfig::default(),
            catalog: CatalogConfig::default(),
            response: ResponseConfig::default(),
            prompt: PromptConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
