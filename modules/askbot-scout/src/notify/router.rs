use async_trait::async_trait;
use tracing::{info, warn};

use askbot_common::Config;

use super::backend::{Digest, NotifyBackend};
use super::email::EmailBackend;
use super::slack::SlackWebhook;

/// Sends each digest to every configured backend. A backend failure is
/// logged and does not stop the others.
pub struct NotifyRouter {
    backends: Vec<(&'static str, Box<dyn NotifyBackend>)>,
}

impl NotifyRouter {
    pub fn new() -> Self {
        Self { backends: Vec::new() }
    }

    pub fn with_backend(mut self, name: &'static str, backend: Box<dyn NotifyBackend>) -> Self {
        self.backends.push((name, backend));
        self
    }

    /// Build a router from configuration. Returns `None` when neither email
    /// nor Slack is configured.
    pub fn from_config(config: &Config, http: reqwest::Client) -> Option<Self> {
        let mut router = Self::new();

        if let Some(email) = &config.email {
            info!(recipient = %email.recipient, "Email digest enabled");
            router = router.with_backend(
                "email",
                Box::new(EmailBackend::new(email).with_http_client(http.clone())),
            );
        }
        if let Some(url) = &config.slack_webhook_url {
            info!("Slack digest enabled");
            router = router.with_backend(
                "slack",
                Box::new(SlackWebhook::new(url.clone()).with_http_client(http)),
            );
        }

        if router.backends.is_empty() {
            None
        } else {
            Some(router)
        }
    }
}

impl Default for NotifyRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotifyBackend for NotifyRouter {
    async fn send_digest(&self, digest: &Digest) -> anyhow::Result<()> {
        for (name, backend) in &self.backends {
            if let Err(e) = backend.send_digest(digest).await {
                warn!(backend = *name, error = %e, "Failed to send digest notification");
            }
        }
        Ok(())
    }
}
