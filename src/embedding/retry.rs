//! Bounded retry with injectable backoff around embedding calls.
//!
//! Rate-limit responses wait a linearly increasing delay (attempt number times the base
//! delay); other failures wait a shorter fixed delay. The sleep function is injected so
//! retry behavior is unit-testable without real elapsed time.

use super::{EmbeddingClient, EmbeddingError, normalize_for_embedding};
use crate::config::RetryConfig;
use async_trait::async_trait;
use std::time::Duration;

/// Injectable sleep used between retry attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Wait for the given duration.
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Delay to apply after a failed attempt, per the configured policy.
pub fn delay_for(policy: &RetryConfig, attempt: u32, rate_limited: bool) -> Duration {
    if rate_limited {
        policy.rate_limit_base_delay * attempt
    } else {
        policy.failure_delay
    }
}

/// Normalize the input and embed it, retrying per the configured policy.
///
/// The input is rejected up front when normalization leaves nothing to send. After the final
/// attempt the last error propagates to the caller for this chunk only.
pub async fn embed_with_retry(
    client: &dyn EmbeddingClient,
    policy: &RetryConfig,
    sleeper: &dyn Sleeper,
    text: &str,
) -> Result<Vec<f32>, EmbeddingError> {
    let normalized = normalize_for_embedding(text);
    if normalized.is_empty() {
        return Err(EmbeddingError::EmptyInput);
    }

    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match client.embed(&normalized).await {
            Ok(vector) => return Ok(vector),
            Err(error) if attempt >= max_attempts => {
                tracing::warn!(attempt, error = %error, "Embedding failed; attempts exhausted");
                return Err(error);
            }
            Err(error) => {
                let delay = delay_for(policy, attempt, error.is_rate_limit());
                tracing::debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    rate_limited = error.is_rate_limit(),
                    "Embedding attempt failed; backing off"
                );
                sleeper.sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Sleeper that records requested delays instead of waiting.
    pub(crate) struct RecordingSleeper {
        delays: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        pub(crate) fn new() -> Self {
            Self {
                delays: Mutex::new(Vec::new()),
            }
        }

        fn recorded(&self) -> Vec<Duration> {
            self.delays.lock().expect("sleeper lock").clone()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.delays.lock().expect("sleeper lock").push(duration);
        }
    }

    /// Client that fails a fixed number of times before succeeding.
    struct FlakyClient {
        failures_remaining: AtomicU32,
        error: fn() -> EmbeddingError,
    }

    #[async_trait]
    impl EmbeddingClient for FlakyClient {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            let remaining = self.failures_remaining.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
                Err((self.error)())
            } else {
                Ok(vec![1.0, 0.0])
            }
        }
    }

    fn policy() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            rate_limit_base_delay: Duration::from_millis(100),
            failure_delay: Duration::from_millis(25),
        }
    }

    #[tokio::test]
    async fn rate_limits_back_off_linearly_then_succeed() {
        let client = FlakyClient {
            failures_remaining: AtomicU32::new(2),
            error: || EmbeddingError::RateLimited,
        };
        let sleeper = RecordingSleeper::new();

        let vector = embed_with_retry(&client, &policy(), &sleeper, "hello world")
            .await
            .expect("third attempt succeeds");

        assert_eq!(vector, vec![1.0, 0.0]);
        assert_eq!(
            sleeper.recorded(),
            vec![Duration::from_millis(100), Duration::from_millis(200)]
        );
    }

    #[tokio::test]
    async fn persistent_rate_limits_exhaust_attempts() {
        let client = FlakyClient {
            failures_remaining: AtomicU32::new(u32::MAX),
            error: || EmbeddingError::RateLimited,
        };
        let sleeper = RecordingSleeper::new();

        let error = embed_with_retry(&client, &policy(), &sleeper, "hello world")
            .await
            .unwrap_err();

        assert!(error.is_rate_limit());
        // Three attempts means two backoff sleeps.
        assert_eq!(sleeper.recorded().len(), 2);
    }

    #[tokio::test]
    async fn non_rate_limit_failures_use_the_short_delay() {
        let client = FlakyClient {
            failures_remaining: AtomicU32::new(1),
            error: || EmbeddingError::MissingVector,
        };
        let sleeper = RecordingSleeper::new();

        embed_with_retry(&client, &policy(), &sleeper, "hello world")
            .await
            .expect("second attempt succeeds");

        assert_eq!(sleeper.recorded(), vec![Duration::from_millis(25)]);
    }

    #[tokio::test]
    async fn blank_input_is_rejected_without_calling_the_provider() {
        let client = FlakyClient {
            failures_remaining: AtomicU32::new(0),
            error: || EmbeddingError::MissingVector,
        };
        let sleeper = RecordingSleeper::new();

        let error = embed_with_retry(&client, &policy(), &sleeper, " \n ")
            .await
            .unwrap_err();
        assert!(matches!(error, EmbeddingError::EmptyInput));
        assert!(sleeper.recorded().is_empty());
    }
}
