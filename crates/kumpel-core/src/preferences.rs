//! Learner preferences collected once at the start of a session.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{KumpelError, Result};

/// Maximum length, in characters, of the free-text topic and style.
pub const MAX_FREE_TEXT_CHARS: usize = 140;

/// CEFR level of the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    /// Complete beginner, below A1.
    #[serde(rename = "below-A1")]
    BelowA1,
    /// A1.
    A1,
    /// A2.
    A2,
    /// B1.
    B1,
    /// B2.
    B2,
    /// C1.
    C1,
    /// C2.
    C2,
}

impl Level {
    /// All levels, easiest first.
    pub const ALL: [Self; 7] = [
        Self::BelowA1,
        Self::A1,
        Self::A2,
        Self::B1,
        Self::B2,
        Self::C1,
        Self::C2,
    ];

    /// Short label used for storage and menus.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BelowA1 => "below-A1",
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::C1 => "C1",
            Self::C2 => "C2",
        }
    }

    /// Wording used in the generation prompt.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::BelowA1 => "below A1 (a complete beginner)",
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::C1 => "C1",
            Self::C2 => "C2",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = KumpelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| KumpelError::invalid_preference(format!("unknown level '{s}'")))
    }
}

/// Gemini model family used for generation and grading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelChoice {
    /// Balanced speed and quality.
    Flash,
    /// Fastest and cheapest.
    #[default]
    FlashLite,
    /// Highest quality, slowest.
    Pro,
}

impl ModelChoice {
    /// All model choices in menu order.
    pub const ALL: [Self; 3] = [Self::Flash, Self::FlashLite, Self::Pro];

    /// Short label used in menus.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Flash => "flash",
            Self::FlashLite => "flash-lite",
            Self::Pro => "pro",
        }
    }

    /// Backend model identifier.
    #[must_use]
    pub const fn model_id(&self) -> &'static str {
        match self {
            Self::Flash => "gemini-2.5-flash",
            Self::FlashLite => "gemini-2.5-flash-lite",
            Self::Pro => "gemini-2.5-pro",
        }
    }
}

impl std::fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelChoice {
    type Err = KumpelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s) || m.model_id() == s)
            .ok_or_else(|| KumpelError::invalid_preference(format!("unknown model '{s}'")))
    }
}

/// What the learner asked for: level, optional topic and style, and model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerPreferences {
    /// CEFR level.
    pub level: Level,
    /// Optional topic for the story.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Optional writing style for the story.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Model used for generation and grading.
    pub model: ModelChoice,
}

impl LearnerPreferences {
    /// Creates validated preferences.
    ///
    /// Blank topics and styles are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns `KumpelError::InvalidPreference` if the topic or style is longer
    /// than [`MAX_FREE_TEXT_CHARS`] characters.
    pub fn new(
        level: Level,
        topic: Option<String>,
        style: Option<String>,
        model: ModelChoice,
    ) -> Result<Self> {
        let preferences = Self {
            level,
            topic: non_blank(topic),
            style: non_blank(style),
            model,
        };
        preferences.validate()?;
        Ok(preferences)
    }

    /// Checks the length limits on the free-text fields.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("topic", &self.topic), ("style", &self.style)] {
            if let Some(text) = value {
                let chars = text.chars().count();
                if chars > MAX_FREE_TEXT_CHARS {
                    return Err(KumpelError::invalid_preference(format!(
                        "{name} is {chars} characters long (maximum {MAX_FREE_TEXT_CHARS})"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
