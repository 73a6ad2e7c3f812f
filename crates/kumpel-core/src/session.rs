//! The exercise session state machine.
//!
//! A session walks the story sentence by sentence. Each sentence goes
//! through the phases of the chosen [`Mode`]:
//!
//! - `Learn`: `Preview` (German shown, pause, English revealed, learner
//!   retypes it) then `Recall`.
//! - `Practice`: `Recall` with feedback on failure.
//! - `Test`: `Recall` with a bare pass/fail verdict.
//!
//! Within a phase the learner answers until an answer is accepted. Answers
//! with an implausible word count are turned away before grading and do not
//! count as attempts. There is no attempt cap and no automatic reveal.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checker::{AnswerCheck, AnswerChecker};
use crate::error::Result;
use crate::plausibility::{LengthRange, LengthVerdict};
use crate::story::{Story, StorySentence};

// ============================================================================
// Mode and Phase
// ============================================================================

/// Difficulty mode of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Preview every sentence before recalling it.
    #[default]
    Learn,
    /// Recall only, with feedback.
    Practice,
    /// Recall only, pass/fail.
    Test,
}

impl Mode {
    /// All modes in menu order.
    pub const ALL: [Self; 3] = [Self::Learn, Self::Practice, Self::Test];

    /// Phases visited for every sentence, in order.
    #[must_use]
    pub const fn phases(&self) -> &'static [Phase] {
        match self {
            Self::Learn => &[Phase::Preview, Phase::Recall],
            Self::Practice | Self::Test => &[Phase::Recall],
        }
    }

    /// Whether grading feedback is shown after a wrong answer.
    #[must_use]
    pub const fn shows_feedback(&self) -> bool {
        !matches!(self, Self::Test)
    }

    /// One-line explanation for menus.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Learn => "See each translation first, retype it, then translate from memory",
            Self::Practice => "Translate each sentence from memory, with hints when wrong",
            Self::Test => "Translate each sentence from memory, no hints",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Learn => write!(f, "learn"),
            Self::Practice => write!(f, "practice"),
            Self::Test => write!(f, "test"),
        }
    }
}

/// Exercise phase for one sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// The translation is shown and retyped.
    Preview,
    /// The translation is produced from memory.
    Recall,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Preview => write!(f, "preview"),
            Self::Recall => write!(f, "recall"),
        }
    }
}

// ============================================================================
// SessionContext
// ============================================================================

/// Progress of a running session, shown in the header before each sentence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    /// Title of the story being practiced.
    pub story_name: String,
    /// Session mode.
    pub mode: Mode,
    /// Number of sentences in the story.
    pub total: usize,
    /// German text of every completed sentence, in completion order.
    pub completed: Vec<String>,
    /// German text of every sentence that received a wrong answer.
    pub mistakes: Vec<String>,
    /// When the session started.
    pub started_at: DateTime<Utc>,
}

impl SessionContext {
    /// Creates an empty context for a story.
    #[must_use]
    pub fn new(story: &Story, mode: Mode) -> Self {
        Self {
            story_name: story.story_name.clone(),
            mode,
            total: story.len(),
            completed: Vec::new(),
            mistakes: Vec::new(),
            started_at: Utc::now(),
        }
    }

    /// Records a completed sentence.
    pub fn record_completed(&mut self, german: &str) {
        self.completed.push(german.to_string());
    }

    /// Records a wrong answer; each sentence is listed once.
    pub fn record_mistake(&mut self, german: &str) {
        if !self.mistakes.iter().any(|m| m == german) {
            self.mistakes.push(german.to_string());
        }
    }

    /// Returns `true` once every sentence is completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed.len() >= self.total
    }

    /// Returns the duration since the session started.
    #[must_use]
    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }
}

// ============================================================================
// Learner
// ============================================================================

/// Something the session wants the learner to see.
#[derive(Debug, Clone, Copy)]
pub enum SessionEvent<'a> {
    /// A new phase of a sentence begins.
    Header {
        /// Current progress.
        context: &'a SessionContext,
        /// Index of the sentence in the story.
        index: usize,
        /// Phase that is starting.
        phase: Phase,
    },
    /// The German sentence to translate.
    Sentence {
        /// German text.
        german: &'a str,
    },
    /// Wait before revealing the translation.
    Pause(Duration),
    /// The translation, shown in the preview phase.
    Reveal {
        /// English text.
        english: &'a str,
    },
    /// The answer was turned away by the word-count check.
    LengthRejected(LengthVerdict),
    /// The answer was accepted.
    Correct,
    /// The answer was rejected.
    Incorrect {
        /// Advice for the learner, absent in test mode.
        feedback: Option<&'a str>,
    },
    /// Every sentence is done.
    Finished {
        /// Final progress.
        context: &'a SessionContext,
    },
}

/// The learner side of a session: shows events and supplies answers.
#[async_trait]
pub trait Learner: Send {
    /// Shows an event to the learner.
    async fn notify(&mut self, event: SessionEvent<'_>) -> Result<()>;

    /// Reads the learner's next answer.
    async fn answer(&mut self, phase: Phase) -> Result<String>;
}

// ============================================================================
// Session
// ============================================================================

/// Settings of a single session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Difficulty mode.
    pub mode: Mode,
    /// Pause between showing the German and revealing the English.
    pub preview_pause: Duration,
}

impl SessionOptions {
    /// Options for `mode` with the given preview pause.
    #[must_use]
    pub const fn new(mode: Mode, preview_pause: Duration) -> Self {
        Self {
            mode,
            preview_pause,
        }
    }
}

/// Drives one story through the exercise loop.
pub struct Session<'a, L> {
    story: &'a Story,
    story_text: String,
    checker: &'a AnswerChecker,
    learner: &'a mut L,
    options: SessionOptions,
    context: SessionContext,
}

impl<'a, L: Learner> Session<'a, L> {
    /// Creates a session over `story`.
    pub fn new(
        story: &'a Story,
        checker: &'a AnswerChecker,
        learner: &'a mut L,
        options: SessionOptions,
    ) -> Self {
        Self {
            story,
            story_text: story.german_text(),
            checker,
            learner,
            options,
            context: SessionContext::new(story, options.mode),
        }
    }

    /// Runs the session to completion and returns the final progress.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error from grading or from the learner.
    pub async fn run(mut self) -> Result<SessionContext> {
        let story = self.story;
        tracing::info!(
            story = %story.story_name,
            mode = %self.options.mode,
            sentences = story.len(),
            "Session started"
        );

        for (index, sentence) in story.sentences.iter().enumerate() {
            for &phase in self.options.mode.phases() {
                self.drill(index, sentence, phase).await?;
            }
            self.context.record_completed(&sentence.german);
            tracing::debug!(
                completed = self.context.completed.len(),
                total = self.context.total,
                "Sentence completed"
            );
        }

        self.learner
            .notify(SessionEvent::Finished {
                context: &self.context,
            })
            .await?;
        tracing::info!(mistakes = self.context.mistakes.len(), "Session finished");
        Ok(self.context)
    }

    /// Runs one phase of one sentence until an answer is accepted.
    async fn drill(&mut self, index: usize, sentence: &StorySentence, phase: Phase) -> Result<()> {
        self.learner
            .notify(SessionEvent::Header {
                context: &self.context,
                index,
                phase,
            })
            .await?;
        self.learner
            .notify(SessionEvent::Sentence {
                german: &sentence.german,
            })
            .await?;
        if phase == Phase::Preview {
            self.learner
                .notify(SessionEvent::Pause(self.options.preview_pause))
                .await?;
            self.learner
                .notify(SessionEvent::Reveal {
                    english: &sentence.english,
                })
                .await?;
        }

        let range = LengthRange::for_translation(&sentence.english);
        loop {
            let answer = self.plausible_answer(&range, phase).await?;
            let feedback = self
                .checker
                .check(&AnswerCheck {
                    german: &sentence.german,
                    english: &sentence.english,
                    answer: &answer,
                    story_text: &self.story_text,
                })
                .await?;

            if feedback.correct {
                self.learner.notify(SessionEvent::Correct).await?;
                return Ok(());
            }

            self.context.record_mistake(&sentence.german);
            let advice = (self.options.mode.shows_feedback() && !feedback.feedback.is_empty())
                .then_some(feedback.feedback.as_str());
            self.learner
                .notify(SessionEvent::Incorrect { feedback: advice })
                .await?;
        }
    }

    /// Reads answers until one passes the word-count check.
    async fn plausible_answer(&mut self, range: &LengthRange, phase: Phase) -> Result<String> {
        loop {
            let answer = self.learner.answer(phase).await?;
            match range.check(&answer) {
                LengthVerdict::Plausible => return Ok(answer),
                verdict => {
                    tracing::debug!(?verdict, "Answer rejected by length check");
                    self.learner
                        .notify(SessionEvent::LengthRejected(verdict))
                        .await?;
                }
            }
        }
    }
}
