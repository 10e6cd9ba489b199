//! The ledger of answered posts, keyed by url.
//!
//! One run loads the ledger once, threads it through [`merge`], and writes it
//! back once. Rows are kept newest first.

use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use askbot_common::{LedgerRow, Post};

use crate::stats::Failure;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    rows: Vec<LedgerRow>,
    urls: HashSet<String>,
}

impl Ledger {
    /// Build a ledger from stored rows. The first row seen for a url wins;
    /// later duplicates are dropped.
    pub fn from_rows(rows: impl IntoIterator<Item = LedgerRow>) -> Self {
        let mut urls = HashSet::new();
        let mut kept: Vec<LedgerRow> = rows
            .into_iter()
            .filter(|row| urls.insert(row.url.clone()))
            .collect();
        kept.sort_by(|a, b| b.date.cmp(&a.date));
        Self { rows: kept, urls }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Insert a row keeping date-descending order. Returns false if the url
    /// is already present.
    pub fn insert(&mut self, row: LedgerRow) -> bool {
        if !self.urls.insert(row.url.clone()) {
            return false;
        }
        let at = self.rows.partition_point(|existing| existing.date >= row.date);
        self.rows.insert(at, row);
        true
    }

    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<LedgerRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug)]
pub struct MergeOutcome {
    pub ledger: Ledger,
    /// Rows added by this merge, in processing order.
    pub new_rows: Vec<LedgerRow>,
    /// Candidates whose url was already in the ledger.
    pub skipped: usize,
    pub failures: Vec<Failure>,
}

/// Process every candidate whose url is not yet in the ledger and insert the
/// resulting rows.
///
/// `process` is only called for unseen urls. A failed post is recorded in
/// [`MergeOutcome::failures`] and left out of the ledger so the next run
/// picks it up again.
pub async fn merge<F, Fut>(ledger: Ledger, candidates: Vec<Post>, mut process: F) -> MergeOutcome
where
    F: FnMut(Post) -> Fut,
    Fut: Future<Output = std::result::Result<LedgerRow, Failure>>,
{
    let mut ledger = ledger;
    let mut new_rows = Vec::new();
    let mut failures = Vec::new();
    let mut skipped = 0;

    for post in candidates {
        if ledger.contains(&post.url) {
            debug!(url = %post.url, "Already answered, skipping");
            skipped += 1;
            continue;
        }

        let url = post.url.clone();
        match process(post).await {
            Ok(row) => {
                if row.url != url {
                    warn!(expected = %url, actual = %row.url, "Processed row has a different url");
                }
                if ledger.insert(row.clone()) {
                    new_rows.push(row);
                }
            }
            Err(failure) => {
                warn!(
                    url = %failure.url,
                    stage = %failure.stage,
                    error = %failure.error,
                    "Post failed"
                );
                failures.push(failure);
            }
        }
    }

    MergeOutcome {
        ledger,
        new_rows,
        skipped,
        failures,
    }
}

// --- Persistence ---

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn load(&self) -> Result<Vec<LedgerRow>>;
    async fn save(&self, rows: &[LedgerRow]) -> Result<()>;
}

/// Ledger stored as a pretty-printed JSON array. A missing file is an empty
/// ledger. Saves go through a temp file and a rename.
pub struct JsonFileLedger {
    path: PathBuf,
}

impl JsonFileLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "ledger.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl LedgerStore for JsonFileLedger {
    async fn load(&self) -> Result<Vec<LedgerRow>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No ledger yet, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()));
            }
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        let rows: Vec<LedgerRow> = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        info!(path = %self.path.display(), rows = rows.len(), "Loaded ledger");
        Ok(rows)
    }

    async fn save(&self, rows: &[LedgerRow]) -> Result<()> {
        let json = serde_json::to_vec_pretty(rows)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &json)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;
        info!(path = %self.path.display(), rows = rows.len(), "Saved ledger");
        Ok(())
    }
}
