//! Error types for the Kumpel core.
//!
//! [`KumpelError`] is the single fatal error of a learning session. Anything
//! that reaches the binary as a `KumpelError` ends the process; the binary
//! asks [`KumpelError::exit_code`] which status to use.

use std::path::PathBuf;

use crate::llm::LlmError;

/// A specialized `Result` type for Kumpel core operations.
pub type Result<T> = std::result::Result<T, KumpelError>;

/// Errors that end a Kumpel session.
///
/// Error variants include actionable suggestions where the learner can fix
/// the problem themselves.
#[derive(Debug, thiserror::Error)]
pub enum KumpelError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in the configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your kumpel.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    /// The API key environment variable is unset or empty.
    #[error("Environment variable '{var}' is not set\n\nSuggestion: Export your Gemini API key, e.g. 'export {var}=...'")]
    MissingApiKey {
        /// Name of the environment variable that was checked.
        var: String,
    },

    /// A learner preference is out of range.
    #[error("Invalid preference: {message}")]
    InvalidPreference {
        /// Description of the invalid preference.
        message: String,
    },

    // ========================================================================
    // LLM Errors
    // ========================================================================
    /// An LLM call failed in a way that is never retried.
    #[error("LLM request failed: {0}")]
    Llm(#[from] LlmError),

    /// A retry budget ran out.
    #[error("Giving up after {attempts} attempts ({stage} failures): {message}\n\nSuggestion: Wait a few minutes and start a new session")]
    RetriesExhausted {
        /// Which retry budget was exhausted.
        stage: RetryStage,
        /// Number of attempts made.
        attempts: u32,
        /// Description of the last failure.
        message: String,
    },

    // ========================================================================
    // Learner Input
    // ========================================================================
    /// Standard input was closed while waiting for the learner.
    #[error("Input closed")]
    InputClosed,

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The two independent retry budgets of an LLM request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStage {
    /// Retryable HTTP status codes from the backend.
    Transport,
    /// Responses that did not match the requested schema.
    Schema,
}

impl std::fmt::Display for RetryStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport => write!(f, "transport"),
            Self::Schema => write!(f, "schema"),
        }
    }
}

impl KumpelError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `MissingApiKey` error.
    #[must_use]
    pub fn missing_api_key(var: impl Into<String>) -> Self {
        Self::MissingApiKey { var: var.into() }
    }

    /// Creates a new `InvalidPreference` error.
    #[must_use]
    pub fn invalid_preference(message: impl Into<String>) -> Self {
        Self::InvalidPreference {
            message: message.into(),
        }
    }

    /// Creates a new `RetriesExhausted` error.
    #[must_use]
    pub fn retries_exhausted(stage: RetryStage, attempts: u32, message: impl Into<String>) -> Self {
        Self::RetriesExhausted {
            stage,
            attempts,
            message: message.into(),
        }
    }

    /// Returns `true` if this error is a schema mismatch that the schema
    /// retry loop may try again.
    #[must_use]
    pub const fn is_invalid_schema(&self) -> bool {
        matches!(self, Self::Llm(LlmError::InvalidSchema { .. }))
    }

    /// Returns `true` if the learner ended the session rather than a failure.
    #[must_use]
    pub const fn is_user_exit(&self) -> bool {
        matches!(self, Self::InputClosed)
    }

    /// Process exit status for this error.
    ///
    /// Closing standard input counts as leaving the session and exits with 0;
    /// everything else is a failure and exits with 1.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        if self.is_user_exit() {
            0
        } else {
            1
        }
    }
}
