//! Bounded exponential-backoff retry around structured LLM calls.
//!
//! Every structured request runs through two nested [`retry`] loops that
//! share one [`RetryPolicy`] but keep separate budgets:
//!
//! - the inner loop retries transport failures (retryable HTTP statuses);
//! - the outer loop re-issues the whole inner loop when the response does
//!   not decode into the requested schema.
//!
//! Unrecoverable failures abort both loops at once. Running out of either
//! budget is fatal for the session.

use std::future::Future;
use std::time::Duration;

use tokio_retry::strategy::ExponentialBackoff;

use crate::error::{KumpelError, Result, RetryStage};
use crate::llm::{LlmError, LlmRequest, StructuredClient, StructuredOutput};

/// Default number of attempts per retry budget.
pub const MAX_RETRIES: u32 = 5;

/// Default delay before the first retry, in seconds.
pub const INITIAL_DELAY_SECONDS: u64 = 15;

/// Attempt budget and backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts allowed, including the first.
    pub max_attempts: u32,
    /// Delay after the first failure; doubles after each further failure.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRIES,
            initial_delay: Duration::from_secs(INITIAL_DELAY_SECONDS),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the given budget and initial delay.
    #[must_use]
    pub const fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
        }
    }

    /// Delays between consecutive attempts: `initial_delay`, then doubling,
    /// one fewer than `max_attempts`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use kumpel_core::RetryPolicy;
    ///
    /// let delays: Vec<Duration> = RetryPolicy::default().backoff().collect();
    /// assert_eq!(delays.len(), 4);
    /// assert_eq!(delays[0], Duration::from_secs(15));
    /// assert_eq!(delays[2], Duration::from_secs(60));
    /// ```
    pub fn backoff(&self) -> impl Iterator<Item = Duration> {
        // Base 2 yields 2f, 4f, 8f, ...; halving gives f, 2f, 4f, ...
        let initial_ms = u64::try_from(self.initial_delay.as_millis()).unwrap_or(u64::MAX);
        ExponentialBackoff::from_millis(2)
            .factor(initial_ms)
            .map(|delay| delay / 2)
            .take(self.max_attempts.saturating_sub(1) as usize)
    }
}

/// Why [`retry`] gave up.
#[derive(Debug, PartialEq, Eq)]
pub enum RetryError<E> {
    /// The operation failed with an error that is not retried.
    Aborted(E),
    /// Every attempt failed with a retryable error.
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
        /// The last error seen.
        last: E,
    },
}

impl<E> RetryError<E>
where
    E: std::fmt::Display + Into<KumpelError>,
{
    /// Converts the outcome into the fatal session error.
    pub fn escalate(self, stage: RetryStage) -> KumpelError {
        match self {
            Self::Aborted(error) => error.into(),
            Self::Exhausted { attempts, last } => {
                KumpelError::retries_exhausted(stage, attempts, last.to_string())
            }
        }
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// the policy's attempt budget is used up.
///
/// Sleeps for the next delay of [`RetryPolicy::backoff`] after each
/// retryable failure. No sleep follows the final attempt.
pub async fn retry<T, E, F, Fut, P>(
    stage: RetryStage,
    policy: &RetryPolicy,
    mut operation: F,
    is_retryable: P,
) -> std::result::Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut delays = policy.backoff();
    let mut attempt = 0;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if !is_retryable(&error) => return Err(RetryError::Aborted(error)),
            Err(error) => {
                let Some(delay) = delays.next() else {
                    tracing::error!(%stage, attempts = attempt, error = %error, "Retry budget exhausted");
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: error,
                    });
                };
                tracing::warn!(
                    %stage,
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_secs = delay.as_secs(),
                    error = %error,
                    "Request failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Obtains validated structured values from the backend.
#[derive(Debug, Clone)]
pub struct RetryController {
    client: StructuredClient,
    policy: RetryPolicy,
}

impl RetryController {
    /// Creates a controller over a client with the given policy.
    #[must_use]
    pub const fn new(client: StructuredClient, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Requests a value of type `T`, retrying transport and schema failures
    /// independently.
    ///
    /// # Errors
    ///
    /// Returns `KumpelError::Llm` for unrecoverable failures and
    /// `KumpelError::RetriesExhausted` when a budget runs out.
    pub async fn request<T: StructuredOutput>(&self, request: &LlmRequest) -> Result<T> {
        let controller = self;
        retry(
            RetryStage::Schema,
            &self.policy,
            move || async move {
                let raw = controller.fetch(request).await?;
                T::decode(&raw).map_err(KumpelError::from)
            },
            KumpelError::is_invalid_schema,
        )
        .await
        .map_err(|e| e.escalate(RetryStage::Schema))
    }

    async fn fetch(&self, request: &LlmRequest) -> Result<String> {
        retry(
            RetryStage::Transport,
            &self.policy,
            move || self.client.fetch(request),
            LlmError::is_transient,
        )
        .await
        .map_err(|e| e.escalate(RetryStage::Transport))
    }
}
