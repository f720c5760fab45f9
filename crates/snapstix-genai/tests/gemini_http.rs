//! Gemini client tests against a local mock server.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use snapstix_config::GenerationConfig;
use snapstix_genai::{GeminiImageClient, GenerationError, ImageGenerator, PromptBuilder};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const SOURCE: &str = "data:image/jpeg;base64,aGVsbG8=";

#[derive(Debug, Clone)]
struct Seen {
    call: String,
    api_key: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    reply: Value,
    delay: Option<Duration>,
    seen: Arc<Mutex<Vec<Seen>>>,
}

async fn generate_content(
    State(state): State<MockState>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.seen.lock().expect("lock").push(Seen {
        call,
        api_key: headers
            .get("x-goog-api-key")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        body,
    });
    if let Some(delay) = state.delay {
        tokio::time::sleep(delay).await;
    }
    (state.status, Json(state.reply.clone()))
}

/// Start a mock server and return its base url plus the request log.
async fn spawn_mock(
    status: StatusCode,
    reply: Value,
    delay: Option<Duration>,
) -> (String, Arc<Mutex<Vec<Seen>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        status,
        reply,
        delay,
        seen: seen.clone(),
    };
    let router = Router::new()
        .route("/v1beta/models/{call}", post(generate_content))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    (format!("http://{addr}"), seen)
}

fn config_for(base_url: &str) -> GenerationConfig {
    GenerationConfig {
        api_base_url: format!("{base_url}/"),
        model: "test-model".to_string(),
        ..GenerationConfig::default()
    }
}

fn image_reply() -> Value {
    json!({
        "candidates": [{ "content": { "parts": [
            { "text": "sticker ready" },
            { "inlineData": { "mimeType": "image/png", "data": "c3RpY2tlcg==" } }
        ] } }]
    })
}

#[tokio::test]
async fn generate_posts_source_and_prompt() {
    let (base_url, seen) = spawn_mock(StatusCode::OK, image_reply(), None).await;
    let client = GeminiImageClient::new("secret", &config_for(&base_url)).expect("client");

    let result = client
        .generate(SOURCE, "Space Cat", "Winking")
        .await
        .expect("generate");
    assert_eq!(result, "data:image/png;base64,c3RpY2tlcg==");

    let seen = seen.lock().expect("lock").clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].call, "test-model:generateContent");
    assert_eq!(seen[0].api_key.as_deref(), Some("secret"));
    let parts = &seen[0].body["contents"]["parts"];
    assert_eq!(
        parts[0],
        json!({ "inlineData": { "mimeType": "image/jpeg", "data": "aGVsbG8=" } })
    );
    assert_eq!(
        parts[1]["text"],
        json!(PromptBuilder::default().render("Space Cat", "Winking"))
    );
}

#[tokio::test]
async fn custom_prompt_template_is_sent() {
    let (base_url, seen) = spawn_mock(StatusCode::OK, image_reply(), None).await;
    let mut config = config_for(&base_url);
    config.prompt_template = Some("sticker of {theme} feeling {expression}".to_string());
    let client = GeminiImageClient::new("secret", &config).expect("client");

    client.generate(SOURCE, "", "Cool").await.expect("generate");

    let seen = seen.lock().expect("lock").clone();
    assert_eq!(
        seen[0].body["contents"]["parts"][1]["text"],
        json!("sticker of Friendly Character feeling Cool")
    );
}

#[tokio::test]
async fn malformed_source_fails_before_network() {
    let (base_url, seen) = spawn_mock(StatusCode::OK, image_reply(), None).await;
    let client = GeminiImageClient::new("secret", &config_for(&base_url)).expect("client");

    let err = client
        .generate("not-a-data-url", "Ninja", "Happy")
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::InvalidInput(_)));
    assert!(seen.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn service_error_message_passes_through() {
    let (base_url, _) = spawn_mock(
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "error": { "code": 429, "message": "Resource has been exhausted" } }),
        None,
    )
    .await;
    let client = GeminiImageClient::new("secret", &config_for(&base_url)).expect("client");

    let err = client.generate(SOURCE, "Ninja", "Happy").await.unwrap_err();
    assert_eq!(
        err,
        GenerationError::UpstreamFailure("Resource has been exhausted".to_string())
    );
}

#[tokio::test]
async fn service_error_without_body_reports_status() {
    let (base_url, _) = spawn_mock(StatusCode::INTERNAL_SERVER_ERROR, json!(null), None).await;
    let client = GeminiImageClient::new("secret", &config_for(&base_url)).expect("client");

    let err = client.generate(SOURCE, "Ninja", "Happy").await.unwrap_err();
    match err {
        GenerationError::UpstreamFailure(message) => assert!(message.contains("500")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn text_only_reply_is_empty_response() {
    let (base_url, _) = spawn_mock(
        StatusCode::OK,
        json!({ "candidates": [{ "content": { "parts": [{ "text": "blocked" }] } }] }),
        None,
    )
    .await;
    let client = GeminiImageClient::new("secret", &config_for(&base_url)).expect("client");

    let err = client.generate(SOURCE, "Ninja", "Happy").await.unwrap_err();
    assert!(matches!(err, GenerationError::EmptyResponse(_)));
}

#[tokio::test]
async fn configured_timeout_becomes_upstream_failure() {
    let (base_url, _) = spawn_mock(
        StatusCode::OK,
        image_reply(),
        Some(Duration::from_secs(3)),
    )
    .await;
    let mut config = config_for(&base_url);
    config.request_timeout_secs = Some(1);
    let client = GeminiImageClient::new("secret", &config).expect("client");

    let err = client.generate(SOURCE, "Ninja", "Happy").await.unwrap_err();
    assert!(matches!(err, GenerationError::UpstreamFailure(_)));
}

#[tokio::test]
async fn unreachable_service_is_upstream_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let client =
        GeminiImageClient::new("secret", &config_for(&format!("http://{addr}"))).expect("client");

    let err = client.generate(SOURCE, "Ninja", "Happy").await.unwrap_err();
    assert!(matches!(err, GenerationError::UpstreamFailure(_)));
}
