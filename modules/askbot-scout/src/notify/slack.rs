use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use super::backend::{Digest, NotifyBackend};

/// Slack incoming webhook notification backend.
pub struct SlackWebhook {
    webhook_url: String,
    http: reqwest::Client,
}

impl SlackWebhook {
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    async fn post(&self, payload: serde_json::Value) -> anyhow::Result<()> {
        let resp = self
            .http
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Slack webhook returned non-success");
            anyhow::bail!("Slack webhook returned {status}");
        }

        Ok(())
    }
}

#[async_trait]
impl NotifyBackend for SlackWebhook {
    async fn send_digest(&self, digest: &Digest) -> anyhow::Result<()> {
        if digest.is_empty() {
            return Ok(());
        }

        let text = format!(":speech_balloon: *{}*\n\n{}", digest.subject(), digest.body());
        let payload = json!({
            "text": text,
            "unfurl_links": false,
        });

        self.post(payload).await
    }
}
