use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A single item from the Firebase API (`/v0/item/{id}.json`).
///
/// Stories, comments, jobs and polls share this shape. Deleted items keep
/// their id and kids but lose `by` and `text`.
#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    pub id: u64,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub by: Option<String>,
    pub text: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub kids: Vec<u64>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub dead: bool,
    pub time: Option<i64>,
}

/// Algolia search response wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub hits: Vec<SearchHit>,
    #[serde(rename = "nbHits", default)]
    pub nb_hits: u64,
}

/// One story from `search_by_date`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "objectID")]
    pub object_id: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
    pub points: Option<i64>,
    pub num_comments: Option<i64>,
    pub story_id: Option<u64>,
    pub story_text: Option<String>,
    pub url: Option<String>,
}

impl SearchHit {
    /// The numeric story id, preferring `story_id` and falling back to
    /// the Algolia object id.
    pub fn id(&self) -> Option<u64> {
        self.story_id.or_else(|| self.object_id.parse().ok())
    }
}

/// Parameters for an Ask HN listing query.
#[derive(Debug, Clone, Default)]
pub struct AskHnQuery {
    /// Only stories with strictly more points than this.
    pub min_points: i64,
    /// Only stories created strictly before this instant.
    pub created_before: Option<DateTime<Utc>>,
}

impl AskHnQuery {
    /// Algolia `numericFilters` value, e.g. `points>40,created_at_i<1700000000`.
    pub fn numeric_filters(&self) -> String {
        let mut filters = format!("points>{}", self.min_points);
        if let Some(before) = self.created_before {
            filters.push_str(&format!(",created_at_i<{}", before.timestamp()));
        }
        filters
    }
}
