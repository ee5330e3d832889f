use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use ai_llm_service::{AiLlmError, CompletionClient, error_handler::Result as LlmResult};
use api::{build_router, core::app_state::AppState};
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use member_qa::{AnswerCache, MessageRecord, MessageStore, QaConfig, QaEngine};
use serde_json::{Value, json};
use tower::ServiceExt;

struct StubClient {
    calls: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl CompletionClient for StubClient {
    async fn complete(&self, prompt: &str) -> LlmResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AiLlmError::Timeout(Duration::from_secs(30)));
        }
        if prompt.contains("=== Layla ===") {
            Ok("Layla is planning her London trip for June.".into())
        } else {
            Ok("No relevant information found.".into())
        }
    }

    fn model(&self) -> &str {
        "stub"
    }
}

fn records() -> Vec<MessageRecord> {
    serde_json::from_value(json!([
        { "id": "1", "user_id": "u1", "user_name": "Layla", "timestamp": "2025-01-03T10:00:00Z",
          "message": "Planning a trip to London in June" },
        { "id": "2", "user_id": "u2", "user_name": "Vikram Desai", "timestamp": "2025-01-04T10:00:00Z",
          "message": "I need a driver for my second car" },
        { "id": "3", "user_id": "u1", "user_name": "Layla", "timestamp": "2025-01-05T10:00:00Z",
          "message": "Book the hotel near Hyde Park" }
    ]))
    .unwrap()
}

fn app(fail: bool) -> (Router, Arc<StubClient>) {
    let client = Arc::new(StubClient {
        calls: AtomicUsize::new(0),
        fail,
    });
    let cfg = QaConfig {
        completion_timeout: Duration::from_secs(2),
        ..QaConfig::default()
    };
    let store = Arc::new(MessageStore::from_records(records()).unwrap());
    let cache = Arc::new(AnswerCache::new(cfg.cache_ttl, cfg.cache_max_entries));
    let engine = QaEngine::new(store, cache, client.clone(), &cfg);
    (build_router(AppState::new(engine)), client)
}

fn ask_request(body: &str) -> Request<Body> {
    Request::post("/ask")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(res: Response) -> Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn ask_returns_answer() {
    let (app, client) = app(false);
    let res = app
        .oneshot(ask_request(r#"{"question":"When is Layla planning her trip to London?"}"#))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    let body = json_body(res).await;
    assert_eq!(body["answer"], "Layla is planning her London trip for June.");
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn repeated_question_is_served_from_cache() {
    let (app, client) = app(false);
    for q in ["What does Vikram need?", "  what does VIKRAM need?"] {
        let res = app
            .clone()
            .oneshot(ask_request(&json!({ "question": q }).to_string()))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_question_is_400_with_detail() {
    let (app, client) = app(false);
    let res = app.oneshot(ask_request(r#"{"question":"   "}"#)).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(res).await["detail"].is_string());
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_body_is_rejected_with_detail() {
    let (app, _) = app(false);
    let res = app.oneshot(ask_request(r#"{"q": 1}"#)).await.unwrap();
    assert!(res.status().is_client_error());
    assert!(json_body(res).await["detail"].is_string());
}

#[tokio::test]
async fn upstream_failure_is_502_with_generic_detail() {
    let (app, client) = app(true);
    let res = app
        .oneshot(ask_request(r#"{"question":"What does Vikram need?"}"#))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let detail = json_body(res).await["detail"].as_str().unwrap().to_string();
    assert!(!detail.contains("AI LLM Service"));
    // timeouts are transient: one retry
    assert_eq!(client.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn health_and_stats() {
    let (app, _) = app(false);

    let res = app
        .clone()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["status"], "ok");

    let res = app
        .oneshot(Request::get("/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let stats = json_body(res).await;
    assert_eq!(stats["total_messages"], 3);
    assert_eq!(stats["unique_users"], 2);
    assert_eq!(stats["users"]["Layla"], 2);
}

#[tokio::test]
async fn request_id_is_echoed_and_docs_are_served() {
    let (app, _) = app(false);
    let res = app
        .clone()
        .oneshot(
            Request::get("/docs")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-request-id"], "abc-123");
    let html = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&html).contains("swagger-ui-bundle.js"));

    let res = app
        .oneshot(Request::get("/openapi.json").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(json_body(res).await["paths"]["/ask"].is_object());
}
