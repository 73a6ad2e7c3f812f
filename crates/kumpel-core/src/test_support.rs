//! Test doubles shared by the unit tests of this crate.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::llm::{BackendError, LlmBackend, LlmRequest};

/// A successful backend reply.
pub fn reply(text: &str) -> Result<String, BackendError> {
    Ok(text.to_string())
}

/// A backend failure with the given HTTP status.
pub fn fail(status: u16) -> Result<String, BackendError> {
    Err(BackendError::with_status(status, format!("status {status}")))
}

/// Backend that plays back a fixed list of replies.
///
/// Once the script is used up it keeps returning the fallback reply, or an
/// unrecoverable error when there is none.
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<String, BackendError>>>,
    fallback: Option<Result<String, BackendError>>,
    requests: Mutex<Vec<LlmRequest>>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(script: impl IntoIterator<Item = Result<String, BackendError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn repeating(response: Result<String, BackendError>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(response),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    #[allow(clippy::unwrap_used)]
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    #[allow(clippy::unwrap_used)]
    async fn generate(&self, request: &LlmRequest) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();
        next.or_else(|| self.fallback.clone())
            .unwrap_or_else(|| Err(BackendError::without_status("script exhausted")))
    }
}
