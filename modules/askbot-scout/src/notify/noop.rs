use async_trait::async_trait;
use tracing::info;

use super::backend::{Digest, NotifyBackend};

/// Drops every digest. Used when no backend is configured.
pub struct NoopBackend;

#[async_trait]
impl NotifyBackend for NoopBackend {
    async fn send_digest(&self, _digest: &Digest) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Writes the digest to the log instead of sending it. Used for dry runs.
pub struct LogBackend;

#[async_trait]
impl NotifyBackend for LogBackend {
    async fn send_digest(&self, digest: &Digest) -> anyhow::Result<()> {
        info!(subject = %digest.subject(), "Dry run digest\n{}", digest.body());
        Ok(())
    }
}
