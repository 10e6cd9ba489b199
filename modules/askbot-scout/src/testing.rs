// Test mocks for the askbot pipeline.
//
// One mock per trait boundary:
// - MockItems (ItemFetcher): id → item, with optional delay or failure
// - MockSource (DiscussionSource): fixed candidates and trees
// - ScriptedGenerator (ConsensusGenerator): queued or repeated replies
// - MemoryLedger (LedgerStore): rows in memory, counts saves
// - RecordingPublisher (Publisher): records tweets, can reject some
// - RecordingNotifier (NotifyBackend): records digests

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::NaiveDate;

use askbot_common::{CommentNode, LedgerRow, Post, SourceKind};

use crate::consensus::ConsensusGenerator;
use crate::fetcher::{ItemContent, ItemFetcher};
use crate::ledger::LedgerStore;
use crate::notify::{Digest, NotifyBackend};
use crate::prompt::PromptTemplate;
use crate::publish::Publisher;
use crate::selector::PostFilter;
use crate::sources::DiscussionSource;

/// Date every test post is created on.
pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

/// A Hacker News style post keyed by `url`.
pub fn post(url: &str, title: &str, score: Option<i64>) -> Post {
    Post {
        id: url.to_string(),
        source: SourceKind::HackerNews,
        title: title.to_string(),
        url: url.to_string(),
        author: "asker".to_string(),
        created_at: test_date(),
        score,
        story_text: None,
    }
}

// ---------------------------------------------------------------------------
// MockItems
// ---------------------------------------------------------------------------

/// Item lookup over a map of ids. Unknown ids are `Ok(None)`; ids marked
/// with [`MockItems::failing`] return a transient network error every time.
#[derive(Default)]
pub struct MockItems {
    items: HashMap<u64, (ItemContent<u64>, Duration)>,
    failing: HashSet<u64>,
}

impl MockItems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, id: u64, content: ItemContent<u64>) -> Self {
        self.with_delayed(id, content, Duration::ZERO)
    }

    pub fn with_delayed(mut self, id: u64, content: ItemContent<u64>, delay: Duration) -> Self {
        self.items.insert(id, (content, delay));
        self
    }

    pub fn failing(mut self, id: u64) -> Self {
        self.failing.insert(id);
        self
    }
}

#[async_trait]
impl ItemFetcher for MockItems {
    type Id = u64;

    async fn item(&self, id: &u64) -> Result<Option<ItemContent<u64>>> {
        if self.failing.contains(id) {
            return Err(hn_client::HnError::Network(format!("connection reset on {id}")).into());
        }
        match self.items.get(id) {
            Some((content, delay)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(*delay).await;
                }
                Ok(Some(content.clone()))
            }
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// MockSource
// ---------------------------------------------------------------------------

/// A source with a fixed candidate list. Trees are looked up by post url;
/// a post with no registered tree fails to fetch.
pub struct MockSource {
    kind: SourceKind,
    posts: Vec<Post>,
    trees: HashMap<String, CommentNode>,
    slow: HashMap<String, Duration>,
    filter: PostFilter,
    template: PromptTemplate,
    include_question: bool,
}

impl MockSource {
    pub fn new(posts: Vec<Post>) -> Self {
        Self {
            kind: SourceKind::HackerNews,
            posts,
            trees: HashMap::new(),
            slow: HashMap::new(),
            filter: PostFilter::Any,
            template: PromptTemplate::hacker_news(),
            include_question: true,
        }
    }

    pub fn with_tree(mut self, url: &str, tree: CommentNode) -> Self {
        self.trees.insert(url.to_string(), tree);
        self
    }

    /// Register a tree that takes `delay` to arrive.
    pub fn with_slow_tree(mut self, url: &str, tree: CommentNode, delay: Duration) -> Self {
        self.slow.insert(url.to_string(), delay);
        self.with_tree(url, tree)
    }

    pub fn with_filter(mut self, filter: PostFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn without_question_in_tweet(mut self) -> Self {
        self.include_question = false;
        self
    }
}

#[async_trait]
impl DiscussionSource for MockSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn list_candidates(&self) -> Result<Vec<Post>> {
        Ok(self.posts.clone())
    }

    fn candidate_filter(&self) -> PostFilter {
        self.filter.clone()
    }

    async fn fetch_tree(&self, post: &Post) -> Result<CommentNode> {
        if let Some(delay) = self.slow.get(&post.url) {
            tokio::time::sleep(*delay).await;
        }
        match self.trees.get(&post.url) {
            Some(tree) => Ok(tree.clone()),
            None => bail!("MockSource: no tree registered for {}", post.url),
        }
    }

    fn question(&self, post: &Post) -> String {
        post.title.clone()
    }

    fn prompt_template(&self) -> &PromptTemplate {
        &self.template
    }

    fn tweet_includes_question(&self) -> bool {
        self.include_question
    }
}

// ---------------------------------------------------------------------------
// ScriptedGenerator
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Script {
    replies: VecDeque<String>,
    repeat: Option<String>,
    prompts: Vec<String>,
}

/// Generator that answers from a script and records every prompt. Queued
/// replies are used first, then the repeated reply; with neither it fails.
/// Clones share the same script.
#[derive(Clone, Default)]
pub struct ScriptedGenerator {
    script: Arc<Mutex<Script>>,
}

impl ScriptedGenerator {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let generator = Self::default();
        generator.lock().replies = replies.into_iter().map(Into::into).collect();
        generator
    }

    pub fn repeating(reply: impl Into<String>) -> Self {
        let generator = Self::default();
        generator.lock().repeat = Some(reply.into());
        generator
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.lock().prompts.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ConsensusGenerator for ScriptedGenerator {
    async fn summarize(&self, prompt: &str) -> Result<String> {
        let mut script = self.lock();
        script.prompts.push(prompt.to_string());
        if let Some(reply) = script.replies.pop_front() {
            return Ok(reply);
        }
        match &script.repeat {
            Some(reply) => Ok(reply.clone()),
            None => bail!("ScriptedGenerator: out of replies"),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryLedger
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryLedger {
    rows: Mutex<Vec<LedgerRow>>,
    saves: Mutex<u32>,
}

impl MemoryLedger {
    pub fn new(rows: Vec<LedgerRow>) -> Self {
        Self {
            rows: Mutex::new(rows),
            saves: Mutex::new(0),
        }
    }

    pub fn rows(&self) -> Vec<LedgerRow> {
        self.rows.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn saves(&self) -> u32 {
        *self.saves.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn load(&self) -> Result<Vec<LedgerRow>> {
        Ok(self.rows())
    }

    async fn save(&self, rows: &[LedgerRow]) -> Result<()> {
        *self.rows.lock().unwrap_or_else(|e| e.into_inner()) = rows.to_vec();
        *self.saves.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingPublisher / RecordingNotifier
// ---------------------------------------------------------------------------

/// Records published tweets. Tweets containing a rejected marker fail.
#[derive(Default)]
pub struct RecordingPublisher {
    tweets: Mutex<Vec<String>>,
    reject_containing: Option<String>,
}

impl RecordingPublisher {
    pub fn rejecting(marker: &str) -> Self {
        Self {
            tweets: Mutex::new(Vec::new()),
            reject_containing: Some(marker.to_string()),
        }
    }

    pub fn tweets(&self) -> Vec<String> {
        self.tweets.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, text: &str) -> Result<String> {
        if let Some(marker) = &self.reject_containing {
            if text.contains(marker.as_str()) {
                bail!("403 Forbidden: duplicate content");
            }
        }
        let mut tweets = self.tweets.lock().unwrap_or_else(|e| e.into_inner());
        tweets.push(text.to_string());
        Ok(format!("tweet-{}", tweets.len()))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    digests: Mutex<Vec<Digest>>,
}

impl RecordingNotifier {
    pub fn digests(&self) -> Vec<Digest> {
        self.digests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl NotifyBackend for RecordingNotifier {
    async fn send_digest(&self, digest: &Digest) -> Result<()> {
        self.digests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(digest.clone());
        Ok(())
    }
}
