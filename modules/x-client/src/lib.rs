pub mod error;
pub mod oauth;

pub use error::{Result, XError};
pub use oauth::OAuthCredentials;

use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};

const BASE_URL: &str = "https://api.twitter.com";

#[derive(Debug, Serialize)]
struct CreateTweetRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateTweetResponse {
    data: PostedTweet,
}

/// The created tweet as echoed back by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct PostedTweet {
    pub id: String,
    pub text: String,
}

pub struct XClient {
    client: reqwest::Client,
    credentials: OAuthCredentials,
    base_url: String,
}

impl XClient {
    pub fn new(credentials: OAuthCredentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Post a tweet. Any non-2xx answer is an error; the caller decides
    /// whether that is worth retrying.
    pub async fn post_tweet(&self, text: &str) -> Result<PostedTweet> {
        let url = format!("{}/2/tweets", self.base_url);
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let timestamp = chrono::Utc::now().timestamp();
        let auth = oauth::authorization_header(&self.credentials, "POST", &url, &nonce, timestamp)?;

        let resp = self
            .client
            .post(&url)
            .header(AUTHORIZATION, auth)
            .json(&CreateTweetRequest { text })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Tweet rejected");
            return Err(XError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let created: CreateTweetResponse = resp.json().await?;
        tracing::info!(tweet_id = %created.data.id, "Tweet posted");
        Ok(created.data)
    }
}
