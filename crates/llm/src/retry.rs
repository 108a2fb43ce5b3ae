//! Bounded retry on provider unavailability.

use crate::provider::{GenerationError, TextGenerator};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Upper bound on retries after the first attempt.
pub const MAX_RETRIES: u32 = 2;

/// Backoff parameters for `Unavailable` responses.
///
/// Delay per attempt: the provider's suggested delay when it reports one,
/// otherwise `default_delay`; always clamped to `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one. Capped at [`MAX_RETRIES`].
    pub max_retries: u32,
    pub default_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            default_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn no_retry() -> Self {
        Self { max_retries: 0, ..Self::default() }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.min(MAX_RETRIES) + 1
    }

    pub fn delay_for(&self, suggested: Option<Duration>) -> Duration {
        suggested.unwrap_or(self.default_delay).min(self.max_delay)
    }
}

/// Source of waiting, swapped for a recording fake in tests.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Fake clock: records requested delays and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: std::sync::Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        if let Ok(mut slept) = self.slept.lock() {
            slept.push(duration);
        }
        Box::pin(std::future::ready(()))
    }
}

impl<S: Sleeper + ?Sized> Sleeper for std::sync::Arc<S> {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        (**self).sleep(duration)
    }
}

/// Wraps a generator and retries it on `Unavailable` only.
/// Every other error is returned immediately.
pub struct RetryingGenerator<G, S = TokioSleeper> {
    inner: G,
    policy: RetryPolicy,
    sleeper: S,
}

impl<G: TextGenerator> RetryingGenerator<G> {
    pub fn new(inner: G, policy: RetryPolicy) -> Self {
        Self { inner, policy, sleeper: TokioSleeper }
    }
}

impl<G: TextGenerator, S: Sleeper> RetryingGenerator<G, S> {
    pub fn with_sleeper(inner: G, policy: RetryPolicy, sleeper: S) -> Self {
        Self { inner, policy, sleeper }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    async fn run(&self, prompt: &str) -> Result<String, GenerationError> {
        let attempts = self.policy.max_attempts();
        let mut attempt = 1;
        loop {
            tracing::debug!(provider = self.inner.name(), attempt, attempts, "generation attempt");
            match self.inner.generate(prompt).await {
                Ok(text) => return Ok(text),
                Err(GenerationError::Unavailable { message, retry_after }) if attempt < attempts => {
                    let delay = self.policy.delay_for(retry_after);
                    tracing::info!(
                        provider = self.inner.name(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        reason = %message,
                        "provider unavailable, retrying"
                    );
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl<G: TextGenerator, S: Sleeper> TextGenerator for RetryingGenerator<G, S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>> {
        Box::pin(self.run(prompt))
    }
}
