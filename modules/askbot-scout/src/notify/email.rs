use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use askbot_common::EmailConfig;

use super::backend::{Digest, NotifyBackend};

const DEFAULT_API_URL: &str = "https://api.resend.com";

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: String,
    text: String,
}

/// Sends the digest as a plain-text email through an HTTP email API
/// (`POST {api_url}/emails` with a bearer key).
pub struct EmailBackend {
    api_key: String,
    api_url: String,
    from: String,
    recipient: String,
    http: reqwest::Client,
}

impl EmailBackend {
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            api_url: config
                .api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            from: config.from.clone(),
            recipient: config.recipient.clone(),
            http: reqwest::Client::new(),
        }
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }
}

#[async_trait]
impl NotifyBackend for EmailBackend {
    async fn send_digest(&self, digest: &Digest) -> anyhow::Result<()> {
        if digest.is_empty() {
            return Ok(());
        }

        let request = SendEmailRequest {
            from: &self.from,
            to: [&self.recipient],
            subject: digest.subject(),
            text: digest.body(),
        };

        let resp = self
            .http
            .post(format!("{}/emails", self.api_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Email API returned non-success");
            anyhow::bail!("Email API returned {status}");
        }

        info!(recipient = %self.recipient, subject = %request.subject, "Digest emailed");
        Ok(())
    }
}
