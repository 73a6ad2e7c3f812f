//! The `story` table.
//!
//! Each row holds a story's title, the preferences it was generated with and
//! its sentences as one JSON array of `{german, english}` objects. Rows are
//! written once and never updated.

use std::path::Path;

use kumpel_core::{LearnerPreferences, Story, StorySentence, StructuredOutput};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::error::{Result, StoreError};

/// A saved story without its sentences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct StorySummary {
    /// Row id.
    pub id: i64,
    /// Story title.
    pub name: String,
    /// CEFR level the story was written for.
    pub level: String,
    /// Requested topic, if any.
    pub topic: Option<String>,
    /// Requested style, if any.
    pub style: Option<String>,
    /// Model that wrote the story.
    pub model: Option<String>,
}

/// SQLite-backed story library.
#[derive(Debug, Clone)]
pub struct StoryStore {
    pool: Pool<Sqlite>,
}

impl StoryStore {
    /// Opens the library at `path`, creating the file and table if missing.
    pub async fn open(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::open(path, e))?;

        Self::init_schema(&pool).await?;
        tracing::debug!(path = %path.display(), "Opened story library");
        Ok(Self { pool })
    }

    /// Opens a private in-memory library.
    pub async fn in_memory() -> Result<Self> {
        // One connection that never expires: each new connection would see
        // a fresh, empty database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::init_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn init_schema(pool: &Pool<Sqlite>) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS story (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                level TEXT NOT NULL,
                topic TEXT,
                style TEXT,
                model TEXT,
                jsonstring TEXT NOT NULL
            )
            ",
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Saves a generated story and returns its id.
    pub async fn save_story(&self, story: &Story, preferences: &LearnerPreferences) -> Result<i64> {
        let sentences = serde_json::to_string(&story.sentences)?;

        let id = sqlx::query(
            r"
            INSERT INTO story (name, level, topic, style, model, jsonstring)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(&story.story_name)
        .bind(preferences.level.as_str())
        .bind(preferences.topic.as_deref())
        .bind(preferences.style.as_deref())
        .bind(preferences.model.model_id())
        .bind(sentences)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        tracing::info!(id, name = %story.story_name, "Saved story");
        Ok(id)
    }

    /// Lists every saved story, oldest first.
    pub async fn load_all_story_summaries(&self) -> Result<Vec<StorySummary>> {
        let summaries = sqlx::query_as::<_, StorySummary>(
            "SELECT id, name, level, topic, style, model FROM story ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        tracing::debug!(count = summaries.len(), "Loaded story summaries");
        Ok(summaries)
    }

    /// Loads the sentences of a saved story, in story order.
    pub async fn load_story_sentences(&self, id: i64) -> Result<Vec<StorySentence>> {
        let json = sqlx::query_scalar::<_, String>("SELECT jsonstring FROM story WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound { id })?;

        serde_json::from_str(&json).map_err(|source| StoreError::CorruptSentences { id, source })
    }

    /// Loads a saved story with its title.
    ///
    /// Rows are checked like a freshly generated story; a blank title or an
    /// empty sentence side is reported as [`StoreError::InvalidStory`].
    pub async fn load_story(&self, id: i64) -> Result<Story> {
        let name = sqlx::query_scalar::<_, String>("SELECT name FROM story WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound { id })?;
        let sentences = self.load_story_sentences(id).await?;
        Story::new(name, sentences)
            .validate()
            .map_err(|reason| StoreError::InvalidStory { id, reason })
    }

    /// Closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
