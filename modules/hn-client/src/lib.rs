pub mod error;
pub mod types;

pub use error::{HnError, Result};
pub use types::{AskHnQuery, Item, SearchHit, SearchResponse};

const ITEM_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";
const SEARCH_BASE_URL: &str = "https://hn.algolia.com/api/v1";
const STORY_BASE_URL: &str = "https://news.ycombinator.com/item?id=";

/// Public url of a story or comment.
pub fn item_url(id: u64) -> String {
    format!("{STORY_BASE_URL}{id}")
}

#[derive(Clone)]
pub struct HnClient {
    client: reqwest::Client,
    item_base: String,
    search_base: String,
}

impl HnClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            item_base: ITEM_BASE_URL.to_string(),
            search_base: SEARCH_BASE_URL.to_string(),
        }
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Point both APIs at another host (used against mock servers).
    pub fn with_base_urls(
        mut self,
        item_base: impl Into<String>,
        search_base: impl Into<String>,
    ) -> Self {
        self.item_base = item_base.into();
        self.search_base = search_base.into();
        self
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let resp = self.client.get(url).query(query).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(HnError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Fetch one item. The API answers `null` for ids it does not know.
    pub async fn item(&self, id: u64) -> Result<Option<Item>> {
        let url = format!("{}/item/{}.json", self.item_base, id);
        let item: Option<Item> = self.get_json(&url, &[]).await?;
        if item.is_none() {
            tracing::debug!(id, "HN item not found");
        }
        Ok(item)
    }

    /// Most recent Ask HN stories matching `query`, newest first.
    pub async fn search_ask_hn(&self, query: &AskHnQuery) -> Result<Vec<SearchHit>> {
        let url = format!("{}/search_by_date", self.search_base);
        let params = [
            ("tags", "ask_hn".to_string()),
            ("numericFilters", query.numeric_filters()),
        ];

        let resp: SearchResponse = self.get_json(&url, &params).await?;
        tracing::info!(
            count = resp.hits.len(),
            total = resp.nb_hits,
            min_points = query.min_points,
            "Fetched Ask HN stories"
        );
        Ok(resp.hits)
    }
}

impl Default for HnClient {
    fn default() -> Self {
        Self::new()
    }
}
