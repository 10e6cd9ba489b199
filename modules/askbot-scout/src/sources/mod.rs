// Discussion sources: where candidate posts and their reply trees come from.
//
// The pipeline is written once against `DiscussionSource`; each site only
// supplies its listing query, tree retrieval, question wording, selection
// rules and prompt template.

pub mod hn;
pub mod reddit;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use askbot_common::{CommentNode, Config, Post, SourceKind};

use crate::prompt::PromptTemplate;
use crate::selector::PostFilter;

pub use hn::HackerNewsSource;
pub use reddit::RedditSource;

#[async_trait]
pub trait DiscussionSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Posts the source considers recent and popular enough to look at.
    async fn list_candidates(&self) -> Result<Vec<Post>>;

    /// Selection rules applied to the candidates before processing.
    fn candidate_filter(&self) -> PostFilter;

    /// The post with its full reply tree. The returned root is the post.
    async fn fetch_tree(&self, post: &Post) -> Result<CommentNode>;

    /// The question text shown to the model and stored in the ledger.
    fn question(&self, post: &Post) -> String;

    fn prompt_template(&self) -> &PromptTemplate;

    /// Whether tweets lead with the question line.
    fn tweet_includes_question(&self) -> bool;
}

/// Build the configured source, sharing one HTTP client.
pub fn build_source(
    kind: SourceKind,
    config: &Config,
    http: reqwest::Client,
    before: Option<NaiveDate>,
) -> Arc<dyn DiscussionSource> {
    match kind {
        SourceKind::HackerNews => {
            let client = hn_client::HnClient::new().with_http_client(http);
            Arc::new(HackerNewsSource::new(client, config.hn.min_points).with_before(before))
        }
        SourceKind::Reddit => {
            let client =
                reddit_client::RedditClient::new(&config.reddit.user_agent).with_http_client(http);
            Arc::new(RedditSource::new(
                client,
                &config.reddit.subreddit,
                config.reddit.limit,
                config.reddit.min_score,
            ))
        }
    }
}
