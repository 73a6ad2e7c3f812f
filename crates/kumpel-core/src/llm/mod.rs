//! Structured-output access to the LLM backend.
//!
//! A backend performs one raw call and reports failures with an optional
//! HTTP status. [`StructuredClient`] classifies those failures into
//! [`LlmError`] and decodes successful responses into a typed schema.

mod client;
mod gemini;
mod schema;

use async_trait::async_trait;

pub use client::{StructuredClient, RETRYABLE_STATUS_CODES};
pub use gemini::{GeminiBackend, DEFAULT_GEMINI_BASE_URL};
pub use schema::{Feedback, SchemaTag, StructuredOutput};

/// A single request to the LLM backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmRequest {
    /// Backend model identifier (e.g. `gemini-2.5-flash`).
    pub model_id: String,
    /// System instruction sent alongside the content.
    pub system_instruction: String,
    /// Schema the response must conform to.
    pub schema: SchemaTag,
    /// User content of the request.
    pub content: String,
}

/// Failure reported by a backend before classification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct BackendError {
    /// HTTP status code, if the backend answered at all.
    pub status: Option<u16>,
    /// Description of the failure.
    pub message: String,
}

impl BackendError {
    /// Creates a failure with an HTTP status.
    #[must_use]
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Creates a failure without a status (connection, decoding, ...).
    #[must_use]
    pub fn without_status(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }
}

/// The raw LLM call seam.
///
/// Implementations return the response text (expected to be JSON matching
/// `request.schema`) without interpreting it.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Performs one call to the backend.
    async fn generate(&self, request: &LlmRequest) -> Result<String, BackendError>;
}

/// Classified failure of one structured LLM call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    /// The backend answered with a retryable status code.
    #[error("transport error (status {status}): {message}")]
    Transport {
        /// HTTP status code (one of [`RETRYABLE_STATUS_CODES`]).
        status: u16,
        /// Description from the backend.
        message: String,
    },

    /// Any other backend failure. Never retried.
    #[error("unrecoverable error: {message}")]
    Unrecoverable {
        /// Description of the failure.
        message: String,
    },

    /// The call succeeded but the response does not fit the schema.
    #[error("response does not match the {schema} schema: {message}")]
    InvalidSchema {
        /// The schema that was requested.
        schema: SchemaTag,
        /// Why decoding or validation failed.
        message: String,
    },
}

impl LlmError {
    /// Creates a new `Unrecoverable` error.
    #[must_use]
    pub fn unrecoverable(message: impl Into<String>) -> Self {
        Self::Unrecoverable {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidSchema` error.
    #[must_use]
    pub fn invalid_schema(schema: SchemaTag, message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            schema,
            message: message.into(),
        }
    }

    /// Returns `true` for transport failures worth retrying.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}
