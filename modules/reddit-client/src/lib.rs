pub mod error;
pub mod types;

pub use error::{RedditError, Result};
pub use types::{Comment, Link, Listing, Thing, Thread};

use reqwest::header::USER_AGENT;
use serde::de::DeserializeOwned;

const BASE_URL: &str = "https://www.reddit.com";

/// Read-only client for Reddit's public `.json` endpoints.
///
/// Reddit throttles or blocks generic user agents, so one identifying the
/// bot and its operator is required.
#[derive(Clone)]
pub struct RedditClient {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
}

impl RedditClient {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: BASE_URL.to_string(),
            user_agent: user_agent.into(),
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

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .header(USER_AGENT, &self.user_agent)
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RedditError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Posts currently on a subreddit's hot page, in page order.
    pub async fn hot(&self, subreddit: &str, limit: u32) -> Result<Vec<Link>> {
        let path = format!("/r/{subreddit}/hot.json");
        let listing: Listing<Link> = self
            .get_json(
                &path,
                &[("limit", limit.to_string()), ("raw_json", "1".to_string())],
            )
            .await?;

        let links: Vec<Link> = listing
            .data
            .children
            .into_iter()
            .filter(|thing| thing.kind == "t3")
            .map(|thing| thing.data)
            .collect();
        tracing::info!(subreddit, count = links.len(), "Fetched hot posts");
        Ok(links)
    }

    /// A post and its full loaded comment tree.
    pub async fn thread(&self, post_id: &str) -> Result<Thread> {
        let path = format!("/comments/{post_id}.json");
        let (links, comments): (Listing<Link>, Listing<Comment>) = self
            .get_json(&path, &[("raw_json", "1".to_string())])
            .await?;

        let link = links
            .data
            .children
            .into_iter()
            .next()
            .map(|thing| thing.data)
            .ok_or_else(|| RedditError::NotFound(post_id.to_string()))?;

        Ok(Thread {
            link,
            comments: comments.data.children,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn link_json(id: &str, score: i64) -> serde_json::Value {
        serde_json::json!({
            "kind": "t3",
            "data": {
                "id": id,
                "title": format!("Question {id}?"),
                "url": format!("https://www.reddit.com/r/AskReddit/comments/{id}/q/"),
                "permalink": format!("/r/AskReddit/comments/{id}/q/"),
                "author": "asker",
                "score": score,
                "created_utc": 1704067200.0
            }
        })
    }

    #[tokio::test]
    async fn hot_sends_user_agent_and_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/r/AskReddit/hot.json"))
            .and(query_param("limit", "25"))
            .and(header("user-agent", "askbot-test/0.1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "kind": "Listing",
                "data": {"after": null, "children": [link_json("a1", 5000), link_json("a2", 12)]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = RedditClient::new("askbot-test/0.1").with_base_url(server.uri());
        let links = client.hot("AskReddit", 25).await.unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].id, "a1");
        assert_eq!(links[1].score, 12);
    }

    #[tokio::test]
    async fn thread_splits_link_and_comments() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/comments/a1.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"kind": "Listing", "data": {"after": null, "children": [link_json("a1", 5000)]}},
                {"kind": "Listing", "data": {"after": null, "children": [
                    {"kind": "t1", "data": {
                        "id": "c1", "author": "x", "body": "first", "replies": ""
                    }}
                ]}}
            ])))
            .mount(&server)
            .await;

        let client = RedditClient::new("askbot-test/0.1").with_base_url(server.uri());
        let thread = client.thread("a1").await.unwrap();
        assert_eq!(thread.link.id, "a1");
        assert_eq!(thread.comments.len(), 1);
        assert_eq!(thread.comments[0].data.body.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn rate_limit_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = RedditClient::new("askbot-test/0.1").with_base_url(server.uri());
        let err = client.hot("AskReddit", 5).await.unwrap_err();
        assert!(err.is_transient());
    }
}
