mod client;
pub(crate) mod types;

use async_trait::async_trait;

use crate::error::{AiError, Result};
use crate::traits::{Completion, Message};

use client::{OpenAiClient, OPENAI_API_URL};
use types::ChatRequest;

const DEFAULT_MAX_TOKENS: u32 = 1024;

// =============================================================================
// OpenAi Agent
// =============================================================================

#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
    http: reqwest::Client,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: OPENAI_API_URL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Share a preconfigured HTTP client (timeouts, proxies).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn client(&self) -> OpenAiClient<'_> {
        OpenAiClient::new(&self.api_key, &self.http, &self.base_url)
    }

    /// Send a full conversation and return the first choice's content.
    pub async fn chat(&self, messages: &[Message]) -> Result<String> {
        let request = ChatRequest::new(&self.model)
            .messages(messages)
            .token_limit(self.max_tokens);

        let response = self.client().chat(&request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(AiError::EmptyResponse)
    }
}

// =============================================================================
// Completion Implementation
// =============================================================================

#[async_trait]
impl Completion for OpenAi {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.chat(&[Message::user(prompt)]).await
    }
}
