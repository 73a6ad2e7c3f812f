//! Answer checking: exact-match fast path, LLM judgment otherwise.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::llm::{Feedback, StructuredClient};
use crate::preferences::ModelChoice;
use crate::retry::RetryController;

/// Maximum number of words of feedback the grader may give.
pub const MAX_FEEDBACK_WORDS: usize = 25;

/// Feedback given in exact mode when the answer does not match.
pub const EXACT_MISMATCH_FEEDBACK: &str = "Not an exact match.";

const GRADING_INSTRUCTION: &str = "You check English translations written by someone learning \
German. Decide whether the learner's answer is a correct translation of the German sentence. \
Accept answers that keep the meaning of the sentence even if the wording differs from the \
reference translation; use the full story only to resolve ambiguity. Set correct to true or \
false. If the answer is correct, leave feedback empty. If it is incorrect, explain the mistake \
in at most 25 words. Never include the correct translation, or any part of it, in the feedback.";

/// How answers are judged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckMode {
    /// Exact match, otherwise semantic judgment by the LLM.
    #[default]
    Semantic,
    /// Exact match only. Never calls the LLM.
    Exact,
}

impl std::fmt::Display for CheckMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Semantic => write!(f, "semantic"),
            Self::Exact => write!(f, "exact"),
        }
    }
}

/// One answer to be checked.
#[derive(Debug, Clone, Copy)]
pub struct AnswerCheck<'a> {
    /// The German sentence being translated.
    pub german: &'a str,
    /// The canonical English translation.
    pub english: &'a str,
    /// What the learner typed.
    pub answer: &'a str,
    /// The whole German story, for context.
    pub story_text: &'a str,
}

/// Builds the grading content for one answer.
pub fn grading_prompt(check: &AnswerCheck<'_>) -> String {
    format!(
        "Full story (German): {}\nGerman sentence: {}\nReference translation: {}\nLearner's answer: {}",
        check.story_text, check.german, check.english, check.answer
    )
}

/// Judges learner answers.
#[derive(Debug, Clone)]
pub struct AnswerChecker {
    controller: RetryController,
    model: ModelChoice,
    mode: CheckMode,
}

impl AnswerChecker {
    /// Creates a checker that grades with `model` in the given mode.
    #[must_use]
    pub const fn new(controller: RetryController, model: ModelChoice, mode: CheckMode) -> Self {
        Self {
            controller,
            model,
            mode,
        }
    }

    /// The check mode in use.
    #[must_use]
    pub const fn mode(&self) -> CheckMode {
        self.mode
    }

    /// Checks one answer.
    ///
    /// An answer byte-identical to the canonical translation is accepted
    /// without contacting the backend.
    pub async fn check(&self, check: &AnswerCheck<'_>) -> Result<Feedback> {
        if check.answer == check.english {
            tracing::debug!("Exact match, skipping grading");
            return Ok(Feedback::correct());
        }

        match self.mode {
            CheckMode::Exact => Ok(Feedback::incorrect(EXACT_MISMATCH_FEEDBACK)),
            CheckMode::Semantic => {
                let request = StructuredClient::request_for::<Feedback>(
                    self.model.model_id(),
                    GRADING_INSTRUCTION,
                    grading_prompt(check),
                );
                tracing::debug!(model = %self.model, "Grading answer");
                let feedback: Feedback = self.controller.request(&request).await?;
                tracing::debug!(correct = feedback.correct, "Answer graded");
                Ok(feedback)
            }
        }
    }
}
