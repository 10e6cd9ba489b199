use std::fmt::Write;
use std::sync::Arc;

use async_trait::async_trait;

use askbot_common::LedgerRow;

use crate::stats::Failure;

/// What a run has to report: the answers it added and anything that went
/// wrong after an answer was recorded.
#[derive(Debug, Clone, Default)]
pub struct Digest {
    pub answers: Vec<LedgerRow>,
    pub failures: Vec<Failure>,
}

impl Digest {
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty() && self.failures.is_empty()
    }

    pub fn subject(&self) -> String {
        format!("{} New Answers", self.answers.len())
    }

    /// One paragraph per answer, then a failure section if any.
    pub fn body(&self) -> String {
        let mut body = String::new();
        for row in &self.answers {
            let _ = writeln!(
                body,
                "{}: {}\n{}\n{}\n",
                row.author, row.question, row.answer, row.url
            );
        }
        if !self.failures.is_empty() {
            body.push_str("Failures:\n");
            for failure in &self.failures {
                let _ = writeln!(body, "{failure}");
            }
        }
        body
    }
}

/// Pluggable destination for run digests.
#[async_trait]
pub trait NotifyBackend: Send + Sync {
    async fn send_digest(&self, digest: &Digest) -> anyhow::Result<()>;
}

#[async_trait]
impl<T: NotifyBackend + ?Sized> NotifyBackend for Arc<T> {
    async fn send_digest(&self, digest: &Digest) -> anyhow::Result<()> {
        (**self).send_digest(digest).await
    }
}
