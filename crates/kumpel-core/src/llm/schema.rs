//! Response schemas the backend is asked to produce.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::LlmError;
use crate::story::Story;

/// The schemas a structured call can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaTag {
    /// A generated [`Story`].
    Story,
    /// Grading [`Feedback`].
    Feedback,
}

impl SchemaTag {
    /// Response schema in the backend's OpenAPI subset.
    #[must_use]
    pub fn response_schema(&self) -> Value {
        match self {
            Self::Story => json!({
                "type": "OBJECT",
                "properties": {
                    "story_name": { "type": "STRING" },
                    "sentences": {
                        "type": "ARRAY",
                        "items": {
                            "type": "OBJECT",
                            "properties": {
                                "german": { "type": "STRING" },
                                "english": { "type": "STRING" }
                            },
                            "required": ["german", "english"],
                            "propertyOrdering": ["german", "english"]
                        }
                    }
                },
                "required": ["story_name", "sentences"],
                "propertyOrdering": ["story_name", "sentences"]
            }),
            Self::Feedback => json!({
                "type": "OBJECT",
                "properties": {
                    "correct": { "type": "BOOLEAN" },
                    "feedback": { "type": "STRING" }
                },
                "required": ["correct"],
                "propertyOrdering": ["correct", "feedback"]
            }),
        }
    }
}

impl std::fmt::Display for SchemaTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Story => write!(f, "story"),
            Self::Feedback => write!(f, "feedback"),
        }
    }
}

/// Verdict on one translation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    /// Whether the translation was accepted.
    pub correct: bool,
    /// Advice for the learner. Empty when `correct` is true.
    #[serde(default)]
    pub feedback: String,
}

impl Feedback {
    /// An accepted answer.
    #[must_use]
    pub const fn correct() -> Self {
        Self {
            correct: true,
            feedback: String::new(),
        }
    }

    /// A rejected answer with advice.
    #[must_use]
    pub fn incorrect(feedback: impl Into<String>) -> Self {
        Self {
            correct: false,
            feedback: feedback.into(),
        }
    }
}

/// A type the backend can be asked to return.
pub trait StructuredOutput: DeserializeOwned + Send {
    /// Schema requested from the backend.
    const SCHEMA: SchemaTag;

    /// Checks invariants serde cannot express and normalizes the value.
    fn validate(self) -> Result<Self, String>;

    /// Deserializes and validates a raw response.
    fn decode(raw: &str) -> Result<Self, LlmError> {
        let value: Self = serde_json::from_str(raw.trim())
            .map_err(|e| LlmError::invalid_schema(Self::SCHEMA, e.to_string()))?;
        value
            .validate()
            .map_err(|message| LlmError::invalid_schema(Self::SCHEMA, message))
    }
}

impl StructuredOutput for Story {
    const SCHEMA: SchemaTag = SchemaTag::Story;

    fn validate(self) -> Result<Self, String> {
        if self.story_name.trim().is_empty() {
            return Err("story_name is empty".to_string());
        }
        if self.sentences.is_empty() {
            return Err("story has no sentences".to_string());
        }
        if let Some(index) = self
            .sentences
            .iter()
            .position(|s| s.german.trim().is_empty() || s.english.trim().is_empty())
        {
            return Err(format!("sentence {index} has an empty side"));
        }
        Ok(self)
    }
}

impl StructuredOutput for Feedback {
    const SCHEMA: SchemaTag = SchemaTag::Feedback;

    fn validate(mut self) -> Result<Self, String> {
        if self.correct {
            self.feedback.clear();
        }
        Ok(self)
    }
}
