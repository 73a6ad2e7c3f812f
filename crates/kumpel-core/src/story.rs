//! Story types shared by generation, grading, sessions and storage.

use serde::{Deserialize, Serialize};

/// A German sentence aligned with its English translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorySentence {
    /// The sentence in German.
    pub german: String,
    /// The canonical English translation.
    pub english: String,
}

impl StorySentence {
    /// Creates a new sentence pair.
    #[must_use]
    pub fn new(german: impl Into<String>, english: impl Into<String>) -> Self {
        Self {
            german: german.into(),
            english: english.into(),
        }
    }
}

/// A short story split into aligned sentences.
///
/// Sentence order is both narrative order and exercise order. Nothing in the
/// crate reorders `sentences` after a story is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    /// Title of the story.
    pub story_name: String,
    /// Sentences in story order.
    pub sentences: Vec<StorySentence>,
}

impl Story {
    /// Creates a story from a title and its sentences.
    #[must_use]
    pub fn new(story_name: impl Into<String>, sentences: Vec<StorySentence>) -> Self {
        Self {
            story_name: story_name.into(),
            sentences,
        }
    }

    /// The whole German text, sentences joined by single spaces.
    ///
    /// # Examples
    ///
    /// ```
    /// use kumpel_core::{Story, StorySentence};
    ///
    /// let story = Story::new(
    ///     "Gruß",
    ///     vec![
    ///         StorySentence::new("Hallo!", "Hello!"),
    ///         StorySentence::new("Tschüss!", "Goodbye!"),
    ///     ],
    /// );
    /// assert_eq!(story.german_text(), "Hallo! Tschüss!");
    /// ```
    #[must_use]
    pub fn german_text(&self) -> String {
        self.sentences
            .iter()
            .map(|s| s.german.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Number of sentences in the story.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    /// Returns `true` if the story has no sentences.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }
}
