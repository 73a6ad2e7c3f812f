//! Kumpel core
//!
//! Generates German stories with an LLM and drills a learner through them
//! sentence by sentence, judging each English translation.

pub mod checker;
pub mod config;
pub mod error;
pub mod generator;
pub mod llm;
pub mod plausibility;
pub mod preferences;
pub mod retry;
pub mod session;
pub mod story;

#[cfg(test)]
mod test_support;

pub use checker::{AnswerCheck, AnswerChecker, CheckMode, EXACT_MISMATCH_FEEDBACK, MAX_FEEDBACK_WORDS};
pub use config::{Config, CONFIG_FILE_NAME, CONFIG_PATH_ENV};
pub use error::{KumpelError, Result, RetryStage};
pub use generator::{generation_prompt, StoryGenerator};
pub use llm::{
    BackendError, Feedback, GeminiBackend, LlmBackend, LlmError, LlmRequest, SchemaTag,
    StructuredClient, StructuredOutput,
};
pub use plausibility::{word_count, LengthRange, LengthVerdict};
pub use preferences::{LearnerPreferences, Level, ModelChoice, MAX_FREE_TEXT_CHARS};
pub use retry::{RetryController, RetryPolicy, INITIAL_DELAY_SECONDS, MAX_RETRIES};
pub use session::{Learner, Mode, Phase, Session, SessionContext, SessionEvent, SessionOptions};
pub use story::{Story, StorySentence};
