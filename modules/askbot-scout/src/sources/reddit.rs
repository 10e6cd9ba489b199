use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use askbot_common::{CommentNode, Post, SourceKind};
use reddit_client::{Comment, Link, RedditClient, Thing};

use super::DiscussionSource;
use crate::prompt::PromptTemplate;
use crate::retry::{retry, RetryPolicy};
use crate::selector::PostFilter;

const DELETED_AUTHOR: &str = "[deleted]";

/// Hot posts from one subreddit. Reddit serves the whole loaded comment
/// tree in a single request, so no per-node fan-out is needed; collapsed
/// `more` stubs are not expanded.
pub struct RedditSource {
    client: RedditClient,
    subreddit: String,
    limit: u32,
    min_score: i64,
    retry: RetryPolicy,
    template: PromptTemplate,
}

impl RedditSource {
    pub fn new(client: RedditClient, subreddit: &str, limit: u32, min_score: i64) -> Self {
        Self {
            client,
            subreddit: subreddit.to_string(),
            limit,
            min_score,
            retry: RetryPolicy::default(),
            template: PromptTemplate::reddit(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

fn link_to_post(link: Link) -> Option<Post> {
    let created_at = link.created_at()?.date_naive();
    let author = link.author().unwrap_or(DELETED_AUTHOR).to_string();
    let story_text = Some(link.selftext.trim().to_string()).filter(|t| !t.is_empty());
    Some(Post {
        id: link.id,
        source: SourceKind::Reddit,
        title: link.title,
        url: link.url,
        author,
        created_at,
        score: Some(link.score),
        story_text,
    })
}

fn comment_tree(things: Vec<Thing<Comment>>) -> Vec<CommentNode> {
    things
        .into_iter()
        .filter(|thing| thing.kind == "t1")
        .map(|thing| {
            let comment = thing.data;
            CommentNode {
                author: comment.author().map(str::to_string),
                text: comment.body,
                children: comment_tree(comment.replies),
            }
        })
        .collect()
}

#[async_trait]
impl DiscussionSource for RedditSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Reddit
    }

    async fn list_candidates(&self) -> Result<Vec<Post>> {
        let links = retry(&self.retry, "reddit hot", || async {
            self.client
                .hot(&self.subreddit, self.limit)
                .await
                .map_err(anyhow::Error::from)
        })
        .await?;

        let posts: Vec<Post> = links.into_iter().filter_map(link_to_post).collect();
        info!(subreddit = %self.subreddit, count = posts.len(), "Reddit candidates");
        Ok(posts)
    }

    fn candidate_filter(&self) -> PostFilter {
        PostFilter::MinScore(self.min_score)
    }

    async fn fetch_tree(&self, post: &Post) -> Result<CommentNode> {
        let thread = retry(&self.retry, "reddit thread", || async {
            self.client
                .thread(&post.id)
                .await
                .map_err(anyhow::Error::from)
        })
        .await?;

        Ok(CommentNode {
            author: thread.link.author().map(str::to_string),
            text: Some(thread.link.selftext.clone()),
            children: comment_tree(thread.comments),
        })
    }

    fn question(&self, post: &Post) -> String {
        post.title.trim().to_string()
    }

    fn prompt_template(&self) -> &PromptTemplate {
        &self.template
    }

    fn tweet_includes_question(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;

    fn comment(author: Option<&str>, body: &str, replies: Vec<Thing<Comment>>) -> Thing<Comment> {
        Thing {
            kind: "t1".into(),
            data: Comment {
                id: body.into(),
                author: author.map(str::to_string),
                body: Some(body.into()),
                score: None,
                replies,
            },
        }
    }

    #[test]
    fn deleted_authors_and_more_stubs_are_handled() {
        let more = Thing {
            kind: "more".into(),
            data: Comment::default(),
        };
        let things = vec![
            comment(
                Some("alice"),
                "top",
                vec![comment(
                    Some("[deleted]"),
                    "[deleted]",
                    vec![comment(Some("bob"), "under", vec![])],
                )],
            ),
            more,
            comment(Some("carol"), "second", vec![]),
        ];

        let root = CommentNode::new(Some("op"), None, comment_tree(things));
        assert_eq!(flatten(&root), vec!["alice:top", "\tbob:under", "carol:second"]);
    }

    #[test]
    fn link_maps_to_post_with_canonical_url() {
        let link: Link = serde_json::from_value(serde_json::json!({
            "id": "18abc",
            "title": "What's a skill everyone should learn?",
            "url": "https://www.reddit.com/r/AskReddit/comments/18abc/whats_a_skill/",
            "permalink": "/r/AskReddit/comments/18abc/whats_a_skill/",
            "author": "[deleted]",
            "score": 15000,
            "created_utc": 1704153600.0,
            "selftext": ""
        }))
        .unwrap();

        let post = link_to_post(link).unwrap();
        assert_eq!(post.url, "https://www.reddit.com/r/AskReddit/comments/18abc/whats_a_skill/");
        assert_eq!(post.author, "[deleted]");
        assert_eq!(post.score, Some(15000));
        assert_eq!(post.story_text, None);
        assert_eq!(post.created_at.to_string(), "2024-01-02");
    }
}
