//! Integration tests for the Gemini backend against a local fake server.
//!
//! The fake speaks just enough of the `generateContent` REST API to check
//! the request shape, status-code classification and the retry budgets over
//! real HTTP.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use kumpel_core::{
    AnswerCheck, AnswerChecker, CheckMode, GeminiBackend, KumpelError, LearnerPreferences, Level,
    ModelChoice, RetryController, RetryPolicy, RetryStage, SchemaTag, StoryGenerator,
    StructuredClient,
};
use serde_json::{json, Value};

const STORY_JSON: &str = r#"{"story_name":"Im Park","sentences":[{"german":"Die Sonne scheint.","english":"The sun is shining."}]}"#;

/// A request the fake server received.
#[derive(Debug, Clone)]
struct Received {
    call: String,
    api_key: Option<String>,
    body: Value,
}

#[derive(Default)]
struct Inner {
    replies: VecDeque<(StatusCode, String)>,
    received: Vec<Received>,
}

/// Scripted stand-in for the Gemini REST API.
#[derive(Clone, Default)]
struct FakeGemini {
    inner: Arc<Mutex<Inner>>,
}

impl FakeGemini {
    fn with_replies(replies: Vec<(StatusCode, String)>) -> Self {
        let fake = Self::default();
        fake.inner.lock().expect("fake lock").replies = replies.into();
        fake
    }

    fn received(&self) -> Vec<Received> {
        self.inner.lock().expect("fake lock").received.clone()
    }
}

async fn generate_content(
    State(fake): State<FakeGemini>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    let mut inner = fake.inner.lock().expect("fake lock");
    inner.received.push(Received {
        call,
        api_key: headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });
    inner
        .replies
        .pop_front()
        .unwrap_or((StatusCode::INTERNAL_SERVER_ERROR, "no reply scripted".to_string()))
}

/// Starts the fake server and returns its API base URL.
async fn spawn_fake(fake: FakeGemini) -> String {
    let router = Router::new()
        .route("/v1beta/models/:call", post(generate_content))
        .with_state(fake);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    format!("http://{addr}/v1beta")
}

/// A successful `generateContent` response carrying `parts` as text parts.
fn envelope(parts: &[&str]) -> (StatusCode, String) {
    let parts: Vec<Value> = parts.iter().map(|text| json!({ "text": text })).collect();
    let body = json!({
        "candidates": [
            { "content": { "role": "model", "parts": parts } }
        ]
    });
    (StatusCode::OK, body.to_string())
}

fn controller(base_url: &str, policy: RetryPolicy) -> RetryController {
    let backend = GeminiBackend::new("test-key", base_url, Duration::from_secs(5))
        .expect("HTTP client builds");
    RetryController::new(StructuredClient::new(Arc::new(backend)), policy)
}

fn fast_policy(attempts: u32) -> RetryPolicy {
    RetryPolicy::new(attempts, Duration::from_millis(5))
}

fn check(answer: &str) -> AnswerCheck<'_> {
    AnswerCheck {
        german: "Die Sonne scheint.",
        english: "The sun is shining.",
        answer,
        story_text: "Die Sonne scheint.",
    }
}

/// A story request carries the key, the model and the JSON schema.
#[tokio::test]
async fn test_story_request_over_http() {
    let fake = FakeGemini::with_replies(vec![envelope(&[STORY_JSON])]);
    let base_url = spawn_fake(fake.clone()).await;
    let generator = StoryGenerator::new(controller(&base_url, fast_policy(5)));
    let preferences = LearnerPreferences::new(
        Level::A1,
        Some("a sunny park".to_string()),
        Some("a diary entry".to_string()),
        ModelChoice::FlashLite,
    )
    .expect("valid preferences");

    let story = generator
        .generate(&preferences)
        .await
        .expect("story generated");

    assert_eq!(story.story_name, "Im Park");
    let received = fake.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].call, "gemini-2.5-flash-lite:generateContent");
    assert_eq!(received[0].api_key.as_deref(), Some("test-key"));

    let body = &received[0].body;
    assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    assert_eq!(
        body["generationConfig"]["responseSchema"],
        SchemaTag::Story.response_schema()
    );
    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .expect("prompt text");
    assert!(prompt.contains("CEFR level A1"));
    assert!(prompt.contains("a sunny park"));
    assert!(prompt.contains("a diary entry"));
}

/// Multi-part candidates are joined before decoding.
#[tokio::test]
async fn test_split_parts_are_joined() {
    let (head, tail) = STORY_JSON.split_at(20);
    let fake = FakeGemini::with_replies(vec![envelope(&[head, tail])]);
    let base_url = spawn_fake(fake).await;
    let generator = StoryGenerator::new(controller(&base_url, fast_policy(5)));
    let preferences =
        LearnerPreferences::new(Level::B2, None, None, ModelChoice::Pro).expect("valid preferences");

    let story = generator
        .generate(&preferences)
        .await
        .expect("story generated");

    assert_eq!(story.sentences.len(), 1);
}

/// 503 is retried and the second attempt succeeds.
#[tokio::test]
async fn test_retryable_status_then_success() {
    let fake = FakeGemini::with_replies(vec![
        (StatusCode::SERVICE_UNAVAILABLE, "overloaded".to_string()),
        envelope(&[r#"{"correct": false, "feedback": "Mind the tense."}"#]),
    ]);
    let base_url = spawn_fake(fake.clone()).await;
    let checker = AnswerChecker::new(
        controller(&base_url, fast_policy(5)),
        ModelChoice::Flash,
        CheckMode::Semantic,
    );

    let feedback = checker
        .check(&check("The sun shone."))
        .await
        .expect("graded");

    assert!(!feedback.correct);
    assert_eq!(feedback.feedback, "Mind the tense.");
    let received = fake.received();
    assert_eq!(received.len(), 2);
    assert_eq!(received[1].call, "gemini-2.5-flash:generateContent");
    assert_eq!(
        received[1].body["generationConfig"]["responseSchema"],
        SchemaTag::Feedback.response_schema()
    );
}

/// Client errors such as 400 are never retried.
#[tokio::test]
async fn test_client_error_is_unrecoverable() {
    let fake = FakeGemini::with_replies(vec![(
        StatusCode::BAD_REQUEST,
        "API key not valid".to_string(),
    )]);
    let base_url = spawn_fake(fake.clone()).await;
    let checker = AnswerChecker::new(
        controller(&base_url, fast_policy(5)),
        ModelChoice::Flash,
        CheckMode::Semantic,
    );

    let err = checker
        .check(&check("The sun shone."))
        .await
        .expect_err("request rejected");

    assert!(matches!(err, KumpelError::Llm(_)));
    assert!(err.to_string().contains("400"));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(fake.received().len(), 1);
}

/// Responses that never match the schema use up the schema budget.
#[tokio::test]
async fn test_malformed_output_exhausts_schema_budget() {
    let fake = FakeGemini::with_replies(vec![
        envelope(&["this is not json"]),
        envelope(&[r#"{"story_name": "Leer", "sentences": []}"#]),
        envelope(&["{}"]),
    ]);
    let base_url = spawn_fake(fake.clone()).await;
    let generator = StoryGenerator::new(controller(&base_url, fast_policy(3)));
    let preferences =
        LearnerPreferences::new(Level::A2, None, None, ModelChoice::Flash).expect("valid preferences");

    let err = generator
        .generate(&preferences)
        .await
        .expect_err("schema budget exhausted");

    assert!(matches!(
        err,
        KumpelError::RetriesExhausted {
            stage: RetryStage::Schema,
            attempts: 3,
            ..
        }
    ));
    assert_eq!(fake.received().len(), 3);
}
