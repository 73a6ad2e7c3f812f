//! End-to-end tests for Kumpel sessions.
//!
//! A stub backend stands in for Gemini and a scripted learner types the
//! answers, so whole runs (generate, save, reload, practice) execute without
//! network access or a terminal.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use kumpel_core::{
    AnswerChecker, BackendError, CheckMode, Config, KumpelError, Learner, LearnerPreferences,
    Level, LlmBackend, LlmRequest, Mode, ModelChoice, Phase, RetryController, RetryPolicy,
    RetryStage, SchemaTag, Session, SessionContext, SessionEvent, SessionOptions, Story,
    StoryGenerator, StructuredClient,
};
use kumpel_store::StoryStore;
use tokio::time::Instant;

const STORY_JSON: &str = r#"{
    "story_name": "Am Bahnhof",
    "sentences": [
        {"german": "Der Zug kommt.", "english": "The train is coming."},
        {"german": "Anna wartet.", "english": "Anna waits."},
        {"german": "Sie lacht.", "english": "She laughs."}
    ]
}"#;

/// Backend that replays scripted replies and records every request.
struct StubBackend {
    script: Mutex<VecDeque<Result<String, BackendError>>>,
    requests: Mutex<Vec<LlmRequest>>,
    calls: AtomicUsize,
}

impl StubBackend {
    fn new(script: Vec<Result<String, BackendError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl LlmBackend for StubBackend {
    async fn generate(&self, request: &LlmRequest) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        self.script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::without_status("script exhausted")))
    }
}

/// Learner that types scripted answers and keeps a transcript.
struct ScriptedLearner {
    answers: VecDeque<String>,
    transcript: Vec<String>,
}

impl ScriptedLearner {
    fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| (*a).to_string()).collect(),
            transcript: Vec::new(),
        }
    }

    fn saw(&self, line: &str) -> bool {
        self.transcript.iter().any(|l| l == line)
    }
}

#[async_trait]
impl Learner for ScriptedLearner {
    async fn notify(&mut self, event: SessionEvent<'_>) -> kumpel_core::Result<()> {
        let line = match event {
            SessionEvent::Header {
                context,
                index,
                phase,
            } => format!("header {index} {phase} done={}", context.completed.len()),
            SessionEvent::Sentence { german } => format!("sentence {german}"),
            SessionEvent::Pause(_) => "pause".to_string(),
            SessionEvent::Reveal { english } => format!("reveal {english}"),
            SessionEvent::LengthRejected(verdict) => format!("rejected {verdict:?}"),
            SessionEvent::Correct => "correct".to_string(),
            SessionEvent::Incorrect { feedback } => {
                format!("incorrect {}", feedback.unwrap_or("-"))
            }
            SessionEvent::Finished { context } => format!("finished {}", context.completed.len()),
        };
        self.transcript.push(line);
        Ok(())
    }

    async fn answer(&mut self, _phase: Phase) -> kumpel_core::Result<String> {
        self.answers.pop_front().ok_or(KumpelError::InputClosed)
    }
}

fn ok(text: &str) -> Result<String, BackendError> {
    Ok(text.to_string())
}

fn status(code: u16) -> Result<String, BackendError> {
    Err(BackendError::with_status(code, format!("status {code}")))
}

fn controller(backend: Arc<StubBackend>) -> RetryController {
    RetryController::new(StructuredClient::new(backend), RetryPolicy::default())
}

fn preferences() -> LearnerPreferences {
    LearnerPreferences::new(
        Level::A1,
        Some("a train station".to_string()),
        None,
        ModelChoice::FlashLite,
    )
    .expect("valid preferences")
}

async fn run_session(
    story: &Story,
    checker: &AnswerChecker,
    mode: Mode,
    answers: &[&str],
) -> (Result<SessionContext, KumpelError>, ScriptedLearner) {
    let mut learner = ScriptedLearner::new(answers);
    let result = Session::new(
        story,
        checker,
        &mut learner,
        SessionOptions::new(mode, Duration::ZERO),
    )
    .run()
    .await;
    (result, learner)
}

/// Generates a story, saves it, reloads it and passes a test session.
#[tokio::test]
async fn test_generate_save_reload_and_test_mode() {
    let backend = StubBackend::new(vec![ok(STORY_JSON)]);
    let generator = StoryGenerator::new(controller(backend.clone()));
    let store = StoryStore::in_memory().await.expect("in-memory store");

    let story = generator
        .generate(&preferences())
        .await
        .expect("story generated");
    let id = store
        .save_story(&story, &preferences())
        .await
        .expect("story saved");
    let reloaded = store.load_story(id).await.expect("story reloaded");
    assert_eq!(reloaded, story);

    let checker = AnswerChecker::new(
        controller(backend.clone()),
        ModelChoice::FlashLite,
        CheckMode::Semantic,
    );
    let (result, learner) = run_session(
        &reloaded,
        &checker,
        Mode::Test,
        &["The train is coming.", "Anna waits.", "She laughs."],
    )
    .await;
    let context = result.expect("session completed");

    assert_eq!(
        context.completed,
        vec!["Der Zug kommt.", "Anna wartet.", "Sie lacht."]
    );
    assert!(context.is_complete());
    // Only the generation call; exact answers are never graded.
    assert_eq!(backend.calls(), 1);
    assert!(learner.saw("finished 3"));
}

/// Wrong answers are graded with the story as context and repeat the sentence.
#[tokio::test]
async fn test_practice_mode_grading_round_trip() {
    let story: Story = serde_json::from_str(STORY_JSON).expect("story json");
    let backend = StubBackend::new(vec![
        ok(r#"{"correct": false, "feedback": "Who is waiting? Check the name."}"#),
        ok(r#"{"correct": true}"#),
    ]);
    let checker = AnswerChecker::new(
        controller(backend.clone()),
        ModelChoice::Flash,
        CheckMode::Semantic,
    );

    let (result, learner) = run_session(
        &story,
        &checker,
        Mode::Practice,
        &[
            "The train is coming.",
            "Ben waits.",
            "Anna is waiting.",
            "She laughs.",
        ],
    )
    .await;
    let context = result.expect("session completed");

    assert_eq!(context.mistakes, vec!["Anna wartet."]);
    assert!(learner.saw("incorrect Who is waiting? Check the name."));

    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        assert_eq!(request.schema, SchemaTag::Feedback);
        assert_eq!(request.model_id, "gemini-2.5-flash");
        assert!(request
            .content
            .contains("Der Zug kommt. Anna wartet. Sie lacht."));
        assert!(request.content.contains("German sentence: Anna wartet."));
    }
}

/// Learn mode previews each sentence before recall.
#[tokio::test]
async fn test_learn_mode_transcript() {
    let story = Story::new(
        "Kurz",
        vec![kumpel_core::StorySentence::new("Ja.", "Yes.")],
    );
    let backend = StubBackend::new(Vec::new());
    let checker = AnswerChecker::new(
        controller(backend.clone()),
        ModelChoice::FlashLite,
        CheckMode::Exact,
    );

    let (result, learner) = run_session(&story, &checker, Mode::Learn, &["Yes.", "Yes!", "Yes."]).await;
    result.expect("session completed");

    assert_eq!(
        learner.transcript,
        vec![
            "header 0 preview done=0",
            "sentence Ja.",
            "pause",
            "reveal Yes.",
            "correct",
            "header 0 recall done=0",
            "sentence Ja.",
            "incorrect Not an exact match.",
            "correct",
            "finished 1",
        ]
    );
    assert_eq!(backend.calls(), 0);
}

/// Transient failures are retried on the 15s, 30s, ... schedule.
#[tokio::test(start_paused = true)]
async fn test_generation_survives_transient_failures() {
    let backend = StubBackend::new(vec![status(503), status(429), ok(STORY_JSON)]);
    let generator = StoryGenerator::new(controller(backend.clone()));

    let start = Instant::now();
    let story = generator
        .generate(&preferences())
        .await
        .expect("story generated");

    assert_eq!(story.story_name, "Am Bahnhof");
    assert_eq!(backend.calls(), 3);
    assert_eq!(start.elapsed(), Duration::from_secs(45));
}

/// A grading failure that exhausts its budget ends the session with exit code 1.
#[tokio::test(start_paused = true)]
async fn test_exhausted_grading_budget_is_fatal() {
    let story: Story = serde_json::from_str(STORY_JSON).expect("story json");
    let backend = StubBackend::new((0..5).map(|_| status(500)).collect());
    let checker = AnswerChecker::new(
        controller(backend.clone()),
        ModelChoice::FlashLite,
        CheckMode::Semantic,
    );

    let (result, _learner) = run_session(&story, &checker, Mode::Practice, &["A train arrives."]).await;
    let err = result.expect_err("budget exhausted");

    assert!(matches!(
        err,
        KumpelError::RetriesExhausted {
            stage: RetryStage::Transport,
            attempts: 5,
            ..
        }
    ));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(backend.calls(), 5);
}

/// The sample config fixture loads and drives the retry policy.
#[test]
fn test_sample_config_loads() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/kumpel.json");

    let config = Config::load_from_file(&path).expect("fixture loads");

    assert_eq!(config.database_path, "library.sqlite");
    assert_eq!(config.check_mode, CheckMode::Exact);
    assert_eq!(config.preview_pause(), Duration::ZERO);
    assert_eq!(
        config.retry_policy(),
        RetryPolicy::new(3, Duration::from_secs(2))
    );
    assert_eq!(config.api_key_env, "KUMPEL_GEMINI_API_KEY");
}
