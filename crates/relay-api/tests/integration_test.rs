use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use futures::stream;
use relay_api::{build_router, config::Config, state::AppState};
use relay_core::RelayService;
use relay_llm::{FragmentStream, LlmError, Message, ModelAdapter, Result};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct FixedAdapter {
    fragments: Vec<&'static str>,
    fail: bool,
}

impl FixedAdapter {
    fn new(fragments: Vec<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            fragments,
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            fragments: Vec::new(),
            fail: true,
        })
    }

    fn check(&self) -> Result<()> {
        if self.fail {
            return Err(LlmError::vendor("Fixed", Some(500), "boom"));
        }
        Ok(())
    }
}

#[async_trait]
impl ModelAdapter for FixedAdapter {
    fn vendor(&self) -> &str {
        "Fixed"
    }

    fn model(&self) -> &str {
        "fixed-1"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.check()?;
        Ok(format!("echo: {}", prompt))
    }

    async fn converse(&self, _messages: Vec<Message>) -> Result<String> {
        self.check()?;
        Ok(self.fragments.concat())
    }

    async fn converse_stream(&self, _messages: Vec<Message>) -> Result<FragmentStream> {
        self.check()?;
        let fragments: Vec<Result<String>> =
            self.fragments.iter().map(|f| Ok(f.to_string())).collect();
        Ok(Box::pin(stream::iter(fragments)))
    }
}

fn app() -> Router {
    let service = RelayService::builder()
        .register(
            "dsr1",
            FixedAdapter::new(vec!["思考：", "先算", "一下", "回答：", "42"]),
        )
        .register("broken", FixedAdapter::failing())
        .waiting_notice(None)
        .build();
    build_router(Arc::new(AppState::new(Config::default(), service)))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn get(path: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(path)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(), request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn post_request(path: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn post(path: &str, body: Value) -> (StatusCode, Value) {
    let (status, body) = send(app(), post_request(path, body.to_string())).await;
    (status, serde_json::from_slice(&body).unwrap())
}

/// `data:` payloads of an SSE body, in order
fn sse_payloads(body: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(body)
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim_start()).unwrap())
        .collect()
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_list_models_is_sorted() {
    let (status, body) = get("/models").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"models": ["broken", "dsr1"]}));
}

#[tokio::test]
async fn test_stats_start_empty() {
    let (status, body) = get("/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_requests"], 0);
    assert!(body["avg_time"].is_null());
}

#[tokio::test]
async fn test_openapi_document_lists_routes() {
    let (status, body) = get("/api-docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/conversation_stream"].is_object());
    assert!(body["paths"]["/generate/{model_name}"].is_object());
}

#[tokio::test]
async fn test_generate_known_model() {
    let (status, body) = post("/generate/dsr1", json!({"prompt": "hi"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"response": "echo: hi"}));
}

#[tokio::test]
async fn test_generate_unknown_model_is_404() {
    let (status, body) = post("/generate/gpt", json!({"prompt": "hi"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("gpt"));
}

#[tokio::test]
async fn test_generate_vendor_failure_is_502() {
    let (status, body) = post("/generate/broken", json!({"prompt": "hi"})).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("Fixed"));
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let (status, body) = send(
        app(),
        post_request("/conversation", r#"{"model_name": "dsr1"}"#.to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_empty_messages_is_400() {
    let (status, _) = post(
        "/conversation",
        json!({"model_name": "dsr1", "messages": []}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_all_omits_failures() {
    let (status, body) = post("/generate_all", json!({"prompt": "ping"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"dsr1": "echo: ping"}));
}

#[tokio::test]
async fn test_conversation_splits_reasoning() {
    let request = json!({
        "model_name": "dsr1",
        "messages": [{"role": "user", "content": "6 * 7?"}],
        "show_reasoning": true
    });
    let (status, body) = post("/conversation", request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"response": "42", "reasoning": "先算一下"}));
}

#[tokio::test]
async fn test_conversation_hides_reasoning_by_default() {
    let request = json!({
        "model_name": "dsr1",
        "messages": [{"role": "user", "content": "6 * 7?"}]
    });
    let (_, body) = post("/conversation", request).await;
    assert_eq!(body, json!({"response": "42"}));
}

#[tokio::test]
async fn test_conversation_stream_framing() {
    let request = json!({
        "model_name": "dsr1",
        "messages": [{"role": "user", "content": "6 * 7?"}],
        "show_reasoning": true
    });
    let response = app()
        .oneshot(post_request("/conversation_stream", request.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/event-stream"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let events = sse_payloads(&body);

    assert_eq!(events.first(), Some(&json!({"status": "connected"})));
    assert_eq!(events.last(), Some(&json!({"status": "completed"})));
    let deltas: Vec<&Value> = events[1..events.len() - 1].iter().collect();
    assert!(!deltas.is_empty());
    assert_eq!(
        deltas.last().copied(),
        Some(&json!({"reasoning": "先算一下", "response": "42"}))
    );
}

#[tokio::test]
async fn test_conversation_stream_unknown_model_is_404() {
    let request = json!({
        "model_name": "nope",
        "messages": [{"role": "user", "content": "hi"}]
    });
    let (status, body) = post("/conversation_stream", request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_conversation_stream_vendor_failure_ends_with_error() {
    let request = json!({
        "model_name": "broken",
        "messages": [{"role": "user", "content": "hi"}]
    });
    let (status, body) = send(app(), post_request("/conversation_stream", request.to_string())).await;
    assert_eq!(status, StatusCode::OK);

    let events = sse_payloads(&body);
    assert_eq!(events.first(), Some(&json!({"status": "connected"})));
    let last = events.last().unwrap();
    assert!(last["error"].as_str().unwrap().contains("Fixed"));
    assert!(!events.iter().any(|e| e == &json!({"status": "completed"})));
}
