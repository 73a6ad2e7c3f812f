use std::sync::Arc;

use super::{BackendError, LlmBackend, LlmError, LlmRequest, StructuredOutput};

/// HTTP status codes that are classified as transport errors.
///
/// 429 Too Many Requests, 500 Internal Server Error, 503 Service
/// Unavailable and 504 Gateway Timeout.
pub const RETRYABLE_STATUS_CODES: [u16; 4] = [429, 500, 503, 504];

/// Issues single structured calls against a backend.
#[derive(Clone)]
pub struct StructuredClient {
    backend: Arc<dyn LlmBackend>,
}

impl std::fmt::Debug for StructuredClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructuredClient").finish_non_exhaustive()
    }
}

impl StructuredClient {
    /// Creates a client over the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    /// Builds a request for the schema of `T`.
    #[must_use]
    pub fn request_for<T: StructuredOutput>(
        model_id: &str,
        system_instruction: impl Into<String>,
        content: impl Into<String>,
    ) -> LlmRequest {
        LlmRequest {
            model_id: model_id.to_string(),
            system_instruction: system_instruction.into(),
            schema: T::SCHEMA,
            content: content.into(),
        }
    }

    /// Performs one raw call and classifies any failure.
    pub async fn fetch(&self, request: &LlmRequest) -> Result<String, LlmError> {
        self.backend.generate(request).await.map_err(classify)
    }
}

fn classify(error: BackendError) -> LlmError {
    match error.status {
        Some(status) if RETRYABLE_STATUS_CODES.contains(&status) => LlmError::Transport {
            status,
            message: error.message,
        },
        Some(status) => LlmError::unrecoverable(format!("status {status}: {}", error.message)),
        None => LlmError::unrecoverable(error.message),
    }
}
