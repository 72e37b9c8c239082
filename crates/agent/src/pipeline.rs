//! One chat turn: assemble context, call the provider, shape the reply,
//! persist the exchange.

use crate::context::ContextAssembler;
use crate::prompt::PromptTemplate;
use crate::truncate::{Truncation, shape_reply};
use anxiousroid_catalog::{RuleIndex, TermIndex};
use anxiousroid_config::AppConfig;
use anxiousroid_core::error::{Error, Result};
use anxiousroid_core::message::{ChatMessage, Role};
use anxiousroid_core::provider::{Provider, ProviderRequest, Usage};
use anxiousroid_core::store::ConversationStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Model parameters and reply limits for every turn.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Strict truncation limit in characters
    pub max_length: usize,
    /// Framing token stripped from the end of the reply
    pub postfix: String,
}

impl From<&AppConfig> for PipelineSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            max_length: config.response.max_length,
            postfix: config.response.postfix.clone(),
        }
    }
}

/// Result of one turn. Failures are values, never panics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChatOutcome {
    Ok {
        reply: String,
        usage: Usage,
        truncation: Truncation,
    },
    ProviderError {
        code: String,
        message: String,
    },
}

impl ChatOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    fn from_error(err: &Error) -> Self {
        Self::ProviderError {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// The chat pipeline shared by every front end.
pub struct ResponsePipeline {
    provider: Arc<dyn Provider>,
    store: Arc<dyn ConversationStore>,
    assembler: ContextAssembler,
    prompt: PromptTemplate,
    settings: PipelineSettings,
}

impl ResponsePipeline {
    pub fn new(
        provider: Arc<dyn Provider>,
        store: Arc<dyn ConversationStore>,
        assembler: ContextAssembler,
        prompt: PromptTemplate,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            provider,
            store,
            assembler,
            prompt,
            settings,
        }
    }

    /// Wire a pipeline from configuration and already built collaborators.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        store: Arc<dyn ConversationStore>,
        terms: Arc<TermIndex>,
        rules: Arc<RuleIndex>,
    ) -> Self {
        let assembler = ContextAssembler::new(
            terms,
            rules,
            store.clone(),
            config.conversation.max_chat_log_length,
        );
        Self::new(
            provider,
            store,
            assembler,
            PromptTemplate::from_config(&config.prompt),
            PipelineSettings::from(config),
        )
    }

    /// Run one turn for `user_id`.
    ///
    /// Both turns are persisted only when a reply was produced; a failed turn
    /// leaves the store untouched.
    pub async fn respond(&self, user_id: &str, platform: &str, text: &str) -> ChatOutcome {
        info!(user_id, platform, "Received message");

        let Generated {
            reply,
            usage,
            truncation,
            history_degraded,
        } = match self.generate(user_id, text).await {
            Ok(generated) => generated,
            Err(e) => {
                warn!(user_id, code = e.code(), error = %e, "Chat turn failed");
                return ChatOutcome::from_error(&e);
            }
        };

        let saved_user = self.store.append(user_id, platform, Role::User, text).await;
        let saved_reply = self
            .store
            .append(user_id, platform, Role::Assistant, &reply)
            .await;

        info!(
            user_id,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            elapsed_ms = usage.elapsed_ms,
            truncation = ?truncation,
            history_degraded,
            persisted = saved_user.is_written() && saved_reply.is_written(),
            "Reply generated"
        );

        ChatOutcome::Ok {
            reply,
            usage,
            truncation,
        }
    }

    async fn generate(&self, user_id: &str, text: &str) -> Result<Generated> {
        let context = self.assembler.assemble(user_id, text).await?;
        let prompt = self.prompt.render(&context.people, &context.rules);

        let mut messages = context.history;
        messages.push(ChatMessage::user(text));

        let request = ProviderRequest {
            model: self.settings.model.clone(),
            system: prompt.system,
            messages,
            assistant_prefill: prompt.assistant_prefill,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        let response = self.provider.complete(request).await?;
        let cleaned = clean_reply(&response.text, &self.settings.postfix);
        let (reply, truncation) = shape_reply(cleaned, self.settings.max_length);
        Ok(Generated {
            reply,
            usage: response.usage,
            truncation,
            history_degraded: context.history_degraded,
        })
    }
}

struct Generated {
    reply: String,
    usage: Usage,
    truncation: Truncation,
    history_degraded: bool,
}

/// Trim, drop one trailing framing token, trim again.
fn clean_reply<'a>(raw: &'a str, postfix: &str) -> &'a str {
    let trimmed = raw.trim();
    let unframed = if postfix.is_empty() {
        trimmed
    } else {
        trimmed.strip_suffix(postfix).unwrap_or(trimmed)
    };
    unframed.trim()
}
