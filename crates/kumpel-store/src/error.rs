//! Error types for the story library.

use std::path::PathBuf;

/// A specialized `Result` type for story library operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors from the story library.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database file could not be opened or created.
    #[error("Cannot open story library '{path}': {source}\n\nSuggestion: Check that the directory exists and is writable, or change databasePath in your kumpel.json")]
    Open {
        /// Path of the database file.
        path: PathBuf,
        /// Underlying driver error.
        #[source]
        source: sqlx::Error,
    },

    /// A query failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The stored sentences are not valid JSON.
    #[error("Corrupt sentences for story {id}: {source}")]
    CorruptSentences {
        /// Id of the story.
        id: i64,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The stored story cannot be practiced.
    #[error("Story {id} cannot be practiced: {reason}\n\nSuggestion: Generate a new story instead")]
    InvalidStory {
        /// Id of the story.
        id: i64,
        /// What is wrong with it.
        reason: String,
    },

    /// Sentences could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No story has the requested id.
    #[error("Story {id} not found")]
    NotFound {
        /// Requested id.
        id: i64,
    },
}

impl StoreError {
    /// Creates a new `Open` error.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>, source: sqlx::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }
}
