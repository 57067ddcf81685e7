// src/provider/retry.rs - Retry with linear backoff for judge providers
//
// Retries: rate limits (429) and service unavailable (503).
// Does NOT retry: any other HTTP status, transport errors, malformed output.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{ChatRequest, ChatResponse, ModelProvider};
use crate::infra::errors::JudgeBenchError;

const MAX_ATTEMPTS: u32 = 5;
const DELAY_STEP_MS: u64 = 1_000;

/// Attempt ceiling plus a linear delay schedule: after failed attempt `i`
/// (0-indexed) wait `(i + 1) * step`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            step: Duration::from_millis(DELAY_STEP_MS),
        }
    }
}

impl RetryPolicy {
    pub fn linear(max_attempts: u32, step: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            step,
        }
    }

    /// Delay after the failed attempt with 0-based index `attempt`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.step * (attempt + 1)
    }
}

/// How a retried operation ultimately failed.
#[derive(Debug)]
pub enum RetryFailure<E> {
    /// Classified as not worth retrying; returned as-is.
    Fatal(E),
    /// Still transient when the attempt ceiling was hit.
    Exhausted { attempts: u32, last: E },
}

/// Run `op` until it succeeds, fails fatally, or the policy runs out.
///
/// `should_retry` classifies errors. `on_retry` sees every backoff before it
/// is slept (attempt number starting at 1, the delay, the error).
pub async fn retry_with<T, E, Op, Fut>(
    policy: &RetryPolicy,
    should_retry: impl Fn(&E) -> bool,
    mut on_retry: impl FnMut(u32, Duration, &E),
    mut op: Op,
) -> Result<T, RetryFailure<E>>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if !should_retry(&e) => return Err(RetryFailure::Fatal(e)),
            Err(e) if attempt + 1 >= max_attempts => {
                return Err(RetryFailure::Exhausted {
                    attempts: attempt + 1,
                    last: e,
                })
            }
            Err(e) => {
                let delay = policy.delay_for_attempt(attempt);
                on_retry(attempt + 1, delay, &e);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// A provider wrapper that retries `chat()` on transient errors.
pub struct RetryProvider {
    inner: Arc<dyn ModelProvider>,
    policy: RetryPolicy,
}

impl RetryProvider {
    pub fn new(inner: Arc<dyn ModelProvider>) -> Self {
        Self {
            inner,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(inner: Arc<dyn ModelProvider>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl ModelProvider for RetryProvider {
    fn id(&self) -> &str {
        self.inner.id()
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, JudgeBenchError> {
        let provider = self.inner.id();
        let result = retry_with(
            &self.policy,
            JudgeBenchError::is_retriable,
            |attempt, delay, e| {
                tracing::warn!(
                    provider,
                    attempt,
                    max_attempts = self.policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying after error: {}",
                    e
                );
            },
            || self.inner.chat(request.clone()),
        )
        .await;

        result.map_err(|failure| match failure {
            RetryFailure::Fatal(e) => e,
            RetryFailure::Exhausted { attempts, last } => {
                let (status, body) = last
                    .transient_status()
                    .map(|(s, b)| (s, b.to_string()))
                    .unwrap_or_default();
                JudgeBenchError::RetriesExhausted {
                    provider: provider.to_string(),
                    attempts,
                    status,
                    body,
                }
            }
        })
    }
}
