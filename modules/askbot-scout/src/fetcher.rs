//! Concurrent retrieval of reply trees from item-by-id APIs.
//!
//! Each node is fetched, then all of its children are fetched concurrently
//! and reassembled in the order the source listed them. A semaphore caps
//! in-flight requests across the whole tree; permits are held only around a
//! single item request, never across the recursive wait on children.

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::{try_join_all, BoxFuture, FutureExt};
use tokio::sync::Semaphore;
use tracing::debug;

use askbot_common::CommentNode;

use crate::retry::{retry, RetryPolicy};

/// Default cap on concurrent item requests per tree.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 16;

/// A node's own content plus the ids of its children, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemContent<Id> {
    pub author: Option<String>,
    pub text: Option<String>,
    pub child_ids: Vec<Id>,
}

/// Looks up a single item. `Ok(None)` means the source does not know the id.
#[async_trait]
pub trait ItemFetcher: Send + Sync {
    type Id: Clone + fmt::Display + Send + Sync + 'static;

    async fn item(&self, id: &Self::Id) -> Result<Option<ItemContent<Self::Id>>>;
}

pub struct TreeFetcher<F: ItemFetcher> {
    items: F,
    permits: Arc<Semaphore>,
    retry: RetryPolicy,
}

impl<F: ItemFetcher> TreeFetcher<F> {
    pub fn new(items: F) -> Self {
        Self {
            items,
            permits: Arc::new(Semaphore::new(DEFAULT_MAX_IN_FLIGHT)),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.permits = Arc::new(Semaphore::new(max.max(1)));
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch the tree rooted at `root`. Any item that still fails after
    /// retries fails the whole tree; no partial trees are returned.
    pub async fn fetch_tree(&self, root: &F::Id) -> Result<CommentNode> {
        let tree = self.fetch_node(root.clone()).await?;
        debug!(root = %root, nodes = tree.descendant_count() + 1, "Fetched discussion tree");
        Ok(tree)
    }

    fn fetch_node(&self, id: F::Id) -> BoxFuture<'_, Result<CommentNode>> {
        async move {
            let Some(content) = self.fetch_item(&id).await? else {
                return Ok(CommentNode::default());
            };

            let children =
                try_join_all(content.child_ids.into_iter().map(|child| self.fetch_node(child)))
                    .await?;

            Ok(CommentNode {
                author: content.author,
                text: content.text,
                children,
            })
        }
        .boxed()
    }

    async fn fetch_item(&self, id: &F::Id) -> Result<Option<ItemContent<F::Id>>> {
        retry(&self.retry, "item", || async {
            let _permit = self
                .permits
                .acquire()
                .await
                .context("item semaphore closed")?;
            self.items.item(id).await
        })
        .await
        .with_context(|| format!("fetching item {id}"))
    }
}
