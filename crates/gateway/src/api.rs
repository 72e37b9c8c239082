//! Chat API v0.1 wire types and handler.

use anxiousroid_agent::ChatOutcome;
use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::SharedState;

/// Mount path of the chat endpoint.
pub const CHAT_PATH: &str = "/api/chat/v0.1";

const UNKNOWN_PLATFORM: &str = "unknown";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Echoed back; generated when absent
    #[serde(default)]
    pub request_id: Option<String>,

    #[serde(default)]
    pub origin: Option<Origin>,

    pub author: Author,

    pub message: MessageBody,
}

#[derive(Debug, Default, Deserialize)]
pub struct Origin {
    #[serde(default)]
    pub platform: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub text: Option<String>,
}

impl ChatRequest {
    pub fn platform(&self) -> &str {
        self.origin
            .as_ref()
            .and_then(|o| o.platform.as_deref())
            .unwrap_or(UNKNOWN_PLATFORM)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub request_id: String,
    /// `"ok"` or `"provider_error"`
    pub status: String,
    pub messages: Vec<String>,
    pub fallback_used: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ChatResponse {
    fn ok(request_id: String, reply: String) -> Self {
        Self {
            request_id,
            status: "ok".into(),
            messages: vec![reply],
            fallback_used: false,
            error: None,
        }
    }

    fn failed(request_id: String, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            request_id,
            status: "provider_error".into(),
            messages: Vec::new(),
            fallback_used: false,
            error: Some(ErrorInfo {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// `POST /api/chat/v0.1`. Always answers 200; failures are reported in the
/// body.
pub async fn chat_handler(
    State(state): State<SharedState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let request_id = request
        .request_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let platform = request.platform().to_string();

    let Some(user_id) = request.author.user_id.as_deref() else {
        warn!(request_id = %request_id, "Chat request without author.user_id");
        return Json(ChatResponse::failed(
            request_id,
            "invalid_request",
            "author.user_id is required",
        ));
    };
    let Some(text) = request.message.text.as_deref() else {
        warn!(request_id = %request_id, "Chat request without message.text");
        return Json(ChatResponse::failed(
            request_id,
            "invalid_request",
            "message.text is required",
        ));
    };

    info!(request_id = %request_id, user_id, platform = %platform, "Chat request");

    let response = match state.pipeline.respond(user_id, &platform, text).await {
        ChatOutcome::Ok { reply, .. } => ChatResponse::ok(request_id, reply),
        ChatOutcome::ProviderError { code, message } => {
            ChatResponse::failed(request_id, code, message)
        }
    };
    Json(response)
}
