use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

/// Bounded exponential backoff: the delay before retry `n` (0-based) is
/// `base * 3^n`, plus up to a second of jitter when enabled.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Retry without sleeping. Used by tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            jitter: false,
        }
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        let backoff = self.base_delay * 3u32.saturating_pow(attempt);
        if self.jitter {
            backoff + Duration::from_millis(rand::rng().random_range(0..1000))
        } else {
            backoff
        }
    }
}

/// Whether an error from one of the API clients is worth retrying.
/// Unknown error types are treated as permanent.
pub fn is_transient(err: &anyhow::Error) -> bool {
    if let Some(e) = err.downcast_ref::<hn_client::HnError>() {
        return e.is_transient();
    }
    if let Some(e) = err.downcast_ref::<reddit_client::RedditError>() {
        return e.is_transient();
    }
    if let Some(e) = err.downcast_ref::<ai_client::AiError>() {
        return e.is_transient();
    }
    false
}

/// Run `op` until it succeeds, fails permanently, or the policy's attempts
/// are used up. The last error is returned.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, what: &str, mut op: F) -> anyhow::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt + 1 < policy.max_attempts && is_transient(&e) => {
                let delay = policy.delay(attempt);
                warn!(
                    what,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn transient() -> anyhow::Error {
        hn_client::HnError::Network("connection reset".into()).into()
    }

    fn permanent() -> anyhow::Error {
        hn_client::HnError::Api {
            status: 404,
            message: "gone".into(),
        }
        .into()
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = retry(&RetryPolicy::immediate(3), "test", || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(transient())
            } else {
                Ok(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: anyhow::Result<()> = retry(&RetryPolicy::immediate(3), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(transient())
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: anyhow::Result<()> = retry(&RetryPolicy::immediate(5), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(permanent())
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn delay_grows_by_factor_three() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            jitter: false,
        };
        assert_eq!(policy.delay(0), Duration::from_secs(1));
        assert_eq!(policy.delay(1), Duration::from_secs(3));
        assert_eq!(policy.delay(2), Duration::from_secs(9));
    }

    #[test]
    fn classifies_client_errors() {
        assert!(is_transient(&transient()));
        assert!(!is_transient(&permanent()));
        let overloaded = ai_client::AiError::Api {
            status: 500,
            message: String::new(),
        };
        assert!(is_transient(&overloaded.into()));
        assert!(!is_transient(&anyhow::anyhow!("something else")));
    }
}
