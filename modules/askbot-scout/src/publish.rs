use async_trait::async_trait;
use tracing::info;

use x_client::XClient;

/// Where finished tweets go.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish one tweet, returning an id for logging.
    async fn publish(&self, text: &str) -> anyhow::Result<String>;
}

#[async_trait]
impl Publisher for XClient {
    async fn publish(&self, text: &str) -> anyhow::Result<String> {
        let tweet = self.post_tweet(text).await?;
        Ok(tweet.id)
    }
}

/// Logs tweets instead of posting them. Used for dry runs and when no X
/// credentials are configured.
pub struct LogPublisher;

#[async_trait]
impl Publisher for LogPublisher {
    async fn publish(&self, text: &str) -> anyhow::Result<String> {
        info!(chars = text.chars().count(), "Would tweet:\n{text}");
        Ok("dry-run".to_string())
    }
}
