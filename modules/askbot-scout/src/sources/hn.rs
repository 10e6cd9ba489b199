use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{info, warn};

use askbot_common::{CommentNode, Post, SourceKind};
use hn_client::{item_url, AskHnQuery, HnClient, SearchHit};

use super::DiscussionSource;
use crate::fetcher::{ItemContent, ItemFetcher, TreeFetcher};
use crate::prompt::PromptTemplate;
use crate::retry::{retry, RetryPolicy};
use crate::selector::PostFilter;

/// Title prefix of Ask HN stories. Matched case-sensitively, both when
/// selecting candidates and when stripping it from the question.
pub const ASK_HN_PREFIX: &str = "Ask HN:";

/// Wide enough that comment text is never hard-wrapped.
const TEXT_WIDTH: usize = 10_000;

/// Item lookups against the Firebase API.
pub struct HnItems(HnClient);

#[async_trait]
impl ItemFetcher for HnItems {
    type Id = u64;

    async fn item(&self, id: &u64) -> Result<Option<ItemContent<u64>>> {
        let item = self.0.item(*id).await?;
        Ok(item.map(|item| ItemContent {
            author: item.by,
            text: item.text.map(|t| html_to_text(&t)),
            child_ids: item.kids,
        }))
    }
}

pub struct HackerNewsSource {
    client: HnClient,
    tree: TreeFetcher<HnItems>,
    min_points: i64,
    before: Option<NaiveDate>,
    retry: RetryPolicy,
    template: PromptTemplate,
}

impl HackerNewsSource {
    pub fn new(client: HnClient, min_points: i64) -> Self {
        Self {
            tree: TreeFetcher::new(HnItems(client.clone())),
            client,
            min_points,
            before: None,
            retry: RetryPolicy::default(),
            template: PromptTemplate::hacker_news(),
        }
    }

    /// Only consider stories created before the start of `date` (UTC).
    pub fn with_before(mut self, before: Option<NaiveDate>) -> Self {
        self.before = before;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.tree = self.tree.with_retry(retry.clone());
        self.retry = retry;
        self
    }

    fn query(&self) -> AskHnQuery {
        AskHnQuery {
            min_points: self.min_points,
            created_before: self
                .before
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|midnight| midnight.and_utc()),
        }
    }
}

fn hit_to_post(hit: SearchHit) -> Option<Post> {
    let id = hit.id()?;
    Some(Post {
        id: id.to_string(),
        source: SourceKind::HackerNews,
        title: hit.title?,
        url: item_url(id),
        author: hit.author?,
        created_at: hit.created_at.date_naive(),
        score: hit.points,
        story_text: hit
            .story_text
            .map(|t| html_to_text(&t))
            .filter(|t| !t.trim().is_empty()),
    })
}

#[async_trait]
impl DiscussionSource for HackerNewsSource {
    fn kind(&self) -> SourceKind {
        SourceKind::HackerNews
    }

    async fn list_candidates(&self) -> Result<Vec<Post>> {
        let query = self.query();
        let hits = retry(&self.retry, "ask hn search", || async {
            self.client
                .search_ask_hn(&query)
                .await
                .map_err(anyhow::Error::from)
        })
        .await?;
        let total = hits.len();
        let posts: Vec<Post> = hits.into_iter().filter_map(hit_to_post).collect();
        if posts.len() < total {
            warn!(dropped = total - posts.len(), "Ask HN hits without id, title or author");
        }
        info!(count = posts.len(), "Ask HN candidates");
        Ok(posts)
    }

    fn candidate_filter(&self) -> PostFilter {
        PostFilter::TitlePrefix(ASK_HN_PREFIX.to_string())
    }

    async fn fetch_tree(&self, post: &Post) -> Result<CommentNode> {
        let id: u64 = post
            .id
            .parse()
            .with_context(|| format!("invalid HN story id {}", post.id))?;
        self.tree.fetch_tree(&id).await
    }

    fn question(&self, post: &Post) -> String {
        strip_ask_prefix(&post.title).to_string()
    }

    fn prompt_template(&self) -> &PromptTemplate {
        &self.template
    }

    fn tweet_includes_question(&self) -> bool {
        true
    }
}

/// `"Ask HN: Foo?"` → `"Foo?"`. Titles without the exact prefix are only trimmed.
pub fn strip_ask_prefix(title: &str) -> &str {
    title.strip_prefix(ASK_HN_PREFIX).unwrap_or(title).trim()
}

/// HN bodies are HTML fragments. Paragraphs become single newlines and
/// every entity is decoded.
pub fn html_to_text(html: &str) -> String {
    let text = html2text::from_read(html.as_bytes(), TEXT_WIDTH).unwrap_or_default();
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
