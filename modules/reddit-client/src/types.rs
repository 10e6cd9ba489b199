use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Authors Reddit substitutes for removed accounts or content.
const MISSING_AUTHORS: &[&str] = &["[deleted]", "[removed]"];

// --- Listing envelope ---

#[derive(Debug, Clone, Deserialize)]
pub struct Listing<T> {
    pub data: ListingData<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingData<T> {
    pub children: Vec<Thing<T>>,
    pub after: Option<String>,
}

/// A `{kind, data}` pair. `kind` is `t3` for links, `t1` for comments and
/// `more` for collapsed reply stubs.
#[derive(Debug, Clone, Deserialize)]
pub struct Thing<T> {
    pub kind: String,
    pub data: T,
}

// --- Links (posts) ---

#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    pub id: String,
    pub title: String,
    pub url: String,
    pub permalink: String,
    pub author: String,
    pub score: i64,
    pub created_utc: f64,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub stickied: bool,
    #[serde(default)]
    pub num_comments: i64,
}

impl Link {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created_utc as i64, 0)
    }

    pub fn author(&self) -> Option<&str> {
        present_author(&self.author)
    }
}

// --- Comments ---

/// Comment data. `more` stubs deserialize into this shape too, with every
/// field empty, so callers must check [`Thing::kind`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub id: String,
    pub author: Option<String>,
    pub body: Option<String>,
    pub score: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_replies")]
    pub replies: Vec<Thing<Comment>>,
}

impl Comment {
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref().and_then(present_author)
    }
}

/// Reddit sends `"replies": ""` for leaves and a full listing otherwise.
fn deserialize_replies<'de, D>(deserializer: D) -> Result<Vec<Thing<Comment>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if !value.is_object() {
        return Ok(Vec::new());
    }
    let listing: Listing<Comment> =
        serde_json::from_value(value).map_err(serde::de::Error::custom)?;
    Ok(listing.data.children)
}

fn present_author(author: &str) -> Option<&str> {
    if author.is_empty() || MISSING_AUTHORS.contains(&author) {
        None
    } else {
        Some(author)
    }
}

/// A post together with its top-level comments, as returned by
/// `/comments/{id}.json`.
#[derive(Debug, Clone)]
pub struct Thread {
    pub link: Link,
    pub comments: Vec<Thing<Comment>>,
}
