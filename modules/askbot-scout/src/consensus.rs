use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use ai_client::Completion;

use crate::retry::{retry, RetryPolicy};

/// Condenses a prompt into a short plain-text answer.
#[async_trait]
pub trait ConsensusGenerator: Send + Sync {
    async fn summarize(&self, prompt: &str) -> Result<String>;
}

/// A [`ConsensusGenerator`] backed by a chat model, retrying transient
/// failures.
pub struct LlmConsensus<C> {
    llm: C,
    retry: RetryPolicy,
}

impl<C: Completion> LlmConsensus<C> {
    pub fn new(llm: C) -> Self {
        Self {
            llm,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl<C: Completion> ConsensusGenerator for LlmConsensus<C> {
    async fn summarize(&self, prompt: &str) -> Result<String> {
        debug!(prompt_chars = prompt.chars().count(), "Requesting consensus");
        let answer = retry(&self.retry, "consensus", || async {
            self.llm.complete(prompt).await.map_err(anyhow::Error::from)
        })
        .await?;
        Ok(answer.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_client::AiError;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Flaky {
        failures: u32,
        calls: AtomicU32,
        status: u16,
    }

    #[async_trait]
    impl Completion for Flaky {
        async fn complete(&self, _prompt: &str) -> ai_client::Result<String> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                Err(AiError::Api {
                    status: self.status,
                    message: "nope".into(),
                })
            } else {
                Ok("  The consensus is yes.  \n".into())
            }
        }
    }

    #[tokio::test]
    async fn retries_rate_limits_and_trims() {
        let generator = LlmConsensus::new(Flaky {
            failures: 2,
            calls: AtomicU32::new(0),
            status: 429,
        })
        .with_retry(RetryPolicy::immediate(3));

        assert_eq!(generator.summarize("p").await.unwrap(), "The consensus is yes.");
        assert_eq!(generator.llm.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn auth_failure_is_fatal_immediately() {
        let generator = LlmConsensus::new(Flaky {
            failures: 1,
            calls: AtomicU32::new(0),
            status: 401,
        })
        .with_retry(RetryPolicy::immediate(3));

        assert!(generator.summarize("p").await.is_err());
        assert_eq!(generator.llm.calls.load(Ordering::SeqCst), 1);
    }
}
