//! End-to-end integration tests for the Anxiousroid chat proxy.
//!
//! These tests run the whole stack: TOML config on disk, catalogs on disk,
//! the file conversation store, the real Anthropic provider pointed at a
//! local stand-in endpoint, and the HTTP gateway.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anxiousroid_config::AppConfig;
use anxiousroid_gateway::{GatewayState, build_pipeline, build_router};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use http_body_util::BodyExt;
use tower::ServiceExt;

// ── Stand-in Anthropic endpoint ──────────────────────────────────────────

type Captured = Arc<Mutex<Vec<serde_json::Value>>>;

/// Serve a Messages API stand-in that always answers `reply` (or fails with
/// `status`) and captures every request body.
async fn anthropic_stub(reply: &'static str, status: StatusCode) -> (String, Captured) {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let sink = captured.clone();
    let router = Router::new().route(
        "/v1/messages",
        post(move |Json(body): Json<serde_json::Value>| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(body);
                let payload = serde_json::json!({
                    "id": "msg_e2e",
                    "type": "message",
                    "model": "claude-3-sonnet-20240229",
                    "content": [{"type": "text", "text": reply}],
                    "usage": {"input_tokens": 30, "output_tokens": 12}
                });
                (status, Json(payload))
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}"), captured)
}

// ── Fixtures ─────────────────────────────────────────────────────────────

const TERMINOLOGY: &str = r#"[
    {"index_regex": "太郎|たろう", "name": "太郎", "categories": ["person"],
     "description": "ユーザーの弟。雨の日は機嫌が悪い。", "alias": "たろちゃん",
     "attributes": [{"name": "年齢", "value": "12"}]},
    {"index_regex": "東京", "name": "東京", "categories": ["other"],
     "description": "大きな街。", "alias": "", "attributes": []}
]"#;

const ADDITIONAL_RULES: &str = r#"[
    {"index_regex": "雨", "rules": ["天気の話では傘の心配をする。"]},
    {"index_regex": "試験", "rules": ["試験の話では緊張を表す。"]}
]"#;

struct Workspace {
    _dir: tempfile::TempDir,
    root: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        std::fs::write(root.join("terminology.json"), TERMINOLOGY).unwrap();
        std::fs::write(root.join("additional_rules.json"), ADDITIONAL_RULES).unwrap();
        Self { _dir: dir, root }
    }

    /// Write a config file and load it the way the CLI does, with a fixed
    /// environment instead of the process one.
    fn config(&self, base_url: &str) -> AppConfig {
        let root = self.root.display();
        let toml = format!(
            r#"
base_url = '{base_url}'
request_timeout_secs = 5

[conversation]
history_path_template = '{root}/conversations/{{user_id}}.jsonl'
archive_dir = '{root}/conversations/archive'

[catalog]
terminology_path = '{root}/terminology.json'
additional_rules_path = '{root}/additional_rules.json'
"#
        );
        let path = self.root.join("anxiousroid.toml");
        std::fs::write(&path, toml).unwrap();

        let mut config = AppConfig::load_from(&path).unwrap();
        config
            .apply_overrides(|key| (key == "CLAUDE_API_KEY").then(|| "sk-ant-e2e".to_string()))
            .unwrap();
        config.validate().unwrap();
        config
    }

    fn log_path(&self, user_id: &str) -> PathBuf {
        self.root.join("conversations").join(format!("{user_id}.jsonl"))
    }

    fn archive_dir(&self) -> PathBuf {
        self.root.join("conversations").join("archive")
    }
}

fn read_log(path: &Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

fn app(config: &AppConfig) -> Router {
    let pipeline = build_pipeline(config).expect("pipeline should build");
    build_router(Arc::new(GatewayState {
        pipeline: Arc::new(pipeline),
    }))
}

async fn chat(app: &Router, user_id: &str, text: &str) -> serde_json::Value {
    let body = serde_json::json!({
        "origin": {"platform": "discord"},
        "author": {"user_id": user_id},
        "message": {"text": text}
    });
    let req = Request::builder()
        .method("POST")
        .uri("/api/chat/v0.1")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ── E2E: first turn ──────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_first_turn_replies_and_persists() {
    let ws = Workspace::new();
    let (base_url, captured) =
        anthropic_stub("元気ですわ。不安ですわ。</response>", StatusCode::OK).await;
    let config = ws.config(&base_url);
    let app = app(&config);

    let resp = chat(&app, "u1", "こんにちは").await;
    assert_eq!(resp["status"], "ok");
    assert_eq!(resp["messages"], serde_json::json!(["元気ですわ。不安ですわ。"]));
    assert_eq!(resp["fallback_used"], false);
    assert!(resp.get("error").is_none());

    let log = read_log(&ws.log_path("u1"));
    assert_eq!(log.len(), 2);
    assert_eq!(log[0]["role"], "user");
    assert_eq!(log[0]["text"], "こんにちは");
    assert_eq!(log[0]["platform"], "discord");
    assert_eq!(log[1]["role"], "assistant");
    assert_eq!(log[1]["text"], "元気ですわ。不安ですわ。");

    let requests = captured.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let messages = requests[0]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"][0]["text"], "こんにちは");
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["content"][0]["text"], "[ぴの]<response>");
    assert_eq!(requests[0]["max_tokens"], 80);
}

// ── E2E: context flows across turns ──────────────────────────────────────

#[tokio::test]
async fn e2e_history_and_catalog_matches_reach_the_model() {
    let ws = Workspace::new();
    let (base_url, captured) = anthropic_stub("心配ですわ。", StatusCode::OK).await;
    let config = ws.config(&base_url);
    let app = app(&config);

    chat(&app, "u1", "たろうが遊びに来た").await;
    chat(&app, "u1", "出かけるよ").await;

    let requests = captured.lock().unwrap();
    let first_system = requests[0]["system"].as_str().unwrap();
    assert!(first_system.contains("- 太郎 (たろちゃん): ユーザーの弟。雨の日は機嫌が悪い。"));
    assert!(first_system.contains("  - 年齢: 12"));
    // The rule matched only through 太郎's description.
    assert!(first_system.contains("- 天気の話では傘の心配をする。"));
    assert!(!first_system.contains("東京"));

    let second = requests[1]["messages"].as_array().unwrap();
    let texts: Vec<_> = second
        .iter()
        .map(|m| m["content"][0]["text"].as_str().unwrap())
        .collect();
    assert_eq!(
        texts,
        vec!["たろうが遊びに来た", "心配ですわ。", "出かけるよ", "[ぴの]<response>"]
    );
    assert!(requests[1]["system"].as_str().unwrap().contains("太郎"));
}

#[tokio::test]
async fn e2e_users_are_isolated() {
    let ws = Workspace::new();
    let (base_url, captured) = anthropic_stub("はい。", StatusCode::OK).await;
    let app = app(&ws.config(&base_url));

    chat(&app, "alice", "試験が明日").await;
    chat(&app, "bob", "こんばんは").await;

    assert_eq!(read_log(&ws.log_path("alice")).len(), 2);
    assert_eq!(read_log(&ws.log_path("bob")).len(), 2);

    let requests = captured.lock().unwrap();
    assert_eq!(requests[1]["messages"].as_array().unwrap().len(), 2);
    assert!(!requests[1]["system"].as_str().unwrap().contains("緊張"));
}

// ── E2E: failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_provider_failure_persists_nothing() {
    let ws = Workspace::new();
    let (base_url, _) = anthropic_stub("unused", StatusCode::INTERNAL_SERVER_ERROR).await;
    let app = app(&ws.config(&base_url));

    let resp = chat(&app, "u1", "こんにちは").await;
    assert_eq!(resp["status"], "provider_error");
    assert_eq!(resp["messages"], serde_json::json!([]));
    assert_eq!(resp["error"]["code"], "api_error");
    assert!(!ws.log_path("u1").exists());
}

#[tokio::test]
async fn e2e_rate_limit_is_reported() {
    let ws = Workspace::new();
    let (base_url, _) = anthropic_stub("unused", StatusCode::TOO_MANY_REQUESTS).await;
    let app = app(&ws.config(&base_url));

    let resp = chat(&app, "u1", "こんにちは").await;
    assert_eq!(resp["error"]["code"], "rate_limited");
}

#[tokio::test]
async fn e2e_path_escaping_user_is_not_persisted() {
    let ws = Workspace::new();
    let (base_url, _) = anthropic_stub("はい。", StatusCode::OK).await;
    let app = app(&ws.config(&base_url));

    let resp = chat(&app, "../escape", "こんにちは").await;
    assert_eq!(resp["status"], "ok");
    assert!(!ws.root.join("escape.jsonl").exists());
}

#[tokio::test]
async fn e2e_broken_catalog_fails_startup() {
    let ws = Workspace::new();
    std::fs::write(
        ws.root.join("additional_rules.json"),
        r#"[{"index_regex": "(unclosed", "rules": []}]"#,
    )
    .unwrap();
    let config = ws.config("http://127.0.0.1:9");

    let err = build_pipeline(&config).err().expect("startup should fail");
    assert!(err.to_string().contains("(unclosed"));
}

#[tokio::test]
async fn e2e_missing_api_key_fails_startup() {
    let ws = Workspace::new();
    let mut config = ws.config("http://127.0.0.1:9");
    config.api_key = None;

    let err = build_pipeline(&config).err().expect("startup should fail");
    assert!(err.to_string().contains("not configured"));
}

// ── E2E: archival ────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_oversized_log_is_archived_and_cut_to_tail() {
    let ws = Workspace::new();
    let (base_url, captured) = anthropic_stub("不安ですわ。", StatusCode::OK).await;
    let mut config = ws.config(&base_url);
    // A zero threshold archives before every append to an existing log.
    config.conversation.max_size_mb = 0;
    config.conversation.max_chat_log_length = 1;
    let app = app(&config);

    chat(&app, "u1", "one").await;
    chat(&app, "u1", "two").await;
    chat(&app, "u1", "three").await;

    // Live log keeps the last 2 × window lines plus the line just appended.
    let log = read_log(&ws.log_path("u1"));
    assert_eq!(log.len(), 3);
    assert_eq!(log[2]["text"], "不安ですわ。");
    assert_eq!(log[1]["text"], "three");

    let archives: Vec<_> = std::fs::read_dir(ws.archive_dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(!archives.is_empty());
    assert!(archives.iter().all(|name| name.starts_with("u1_") && name.ends_with(".jsonl")));

    // Window 1: only the previous reply is replayed.
    let requests = captured.lock().unwrap();
    assert_eq!(requests[2]["messages"].as_array().unwrap().len(), 3);
}
