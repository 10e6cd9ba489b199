//! One askbot run: list candidates, answer the unseen ones, record them,
//! then publish and report.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, info_span, warn, Instrument};

use askbot_common::{LedgerRow, Post};

use crate::consensus::ConsensusGenerator;
use crate::flatten::flatten;
use crate::ledger::{merge, Ledger, LedgerStore};
use crate::notify::{Digest, NotifyBackend};
use crate::publish::Publisher;
use crate::selector::select;
use crate::sources::DiscussionSource;
use crate::stats::{Failure, RunStats, Stage};
use crate::tweet::TweetFormatter;

pub const DEFAULT_POST_DEADLINE: Duration = Duration::from_secs(300);

pub struct AnswerBot {
    source: Arc<dyn DiscussionSource>,
    generator: Arc<dyn ConsensusGenerator>,
    store: Arc<dyn LedgerStore>,
    publisher: Arc<dyn Publisher>,
    notifier: Arc<dyn NotifyBackend>,
    formatter: TweetFormatter,
    post_deadline: Duration,
    dry_run: bool,
}

impl AnswerBot {
    pub fn new(
        source: Arc<dyn DiscussionSource>,
        generator: Arc<dyn ConsensusGenerator>,
        store: Arc<dyn LedgerStore>,
        publisher: Arc<dyn Publisher>,
        notifier: Arc<dyn NotifyBackend>,
    ) -> Self {
        Self {
            source,
            formatter: TweetFormatter::new(generator.clone()),
            generator,
            store,
            publisher,
            notifier,
            post_deadline: DEFAULT_POST_DEADLINE,
            dry_run: false,
        }
    }

    pub fn with_post_deadline(mut self, deadline: Duration) -> Self {
        self.post_deadline = deadline;
        self
    }

    /// Leave the ledger file untouched. The publisher and notifier passed in
    /// are still called; the binary swaps in logging stand-ins.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn run(&self) -> Result<RunStats> {
        let kind = self.source.kind();
        let mut stats = RunStats {
            source: Some(kind),
            dry_run: self.dry_run,
            ..Default::default()
        };

        // 1. Candidates
        let candidates = self
            .source
            .list_candidates()
            .await
            .with_context(|| format!("listing {kind} candidates"))?;
        stats.candidates = candidates.len() as u32;

        let filter = self.source.candidate_filter();
        let selected = select(candidates, |post| filter.matches(post));
        stats.selected = selected.len() as u32;
        info!(
            source = %kind,
            candidates = stats.candidates,
            selected = stats.selected,
            "Candidates selected"
        );

        // 2. Ledger merge
        let ledger = Ledger::from_rows(self.store.load().await.context("loading ledger")?);
        let outcome = merge(ledger, selected, |post| self.answer_with_deadline(post)).await;
        stats.already_answered = outcome.skipped as u32;
        stats.answered = outcome.new_rows.len() as u32;
        stats.failures = outcome.failures;

        if self.dry_run {
            info!(rows = outcome.ledger.len(), "Dry run, ledger not saved");
        } else if !outcome.new_rows.is_empty() {
            self.store
                .save(outcome.ledger.rows())
                .await
                .context("saving ledger")?;
        }

        // 3. Publish
        for row in &outcome.new_rows {
            match self.publish(row).await {
                Ok(id) => {
                    stats.published += 1;
                    info!(url = %row.url, tweet_id = %id, "Published");
                }
                Err(e) => {
                    warn!(url = %row.url, error = %e, "Publish failed");
                    stats.failures.push(Failure::new(&row.url, Stage::Publish, format!("{e:#}")));
                }
            }
        }

        // 4. Digest
        let digest = Digest {
            answers: outcome.new_rows,
            failures: stats.failures.clone(),
        };
        if digest.is_empty() {
            info!("Nothing new to report");
        } else if let Err(e) = self.notifier.send_digest(&digest).await {
            warn!(error = %e, "Failed to send digest");
        }

        Ok(stats)
    }

    async fn answer_with_deadline(&self, post: Post) -> std::result::Result<LedgerRow, Failure> {
        let url = post.url.clone();
        let span = info_span!("post", url = %url);
        match tokio::time::timeout(self.post_deadline, self.answer(post))
            .instrument(span)
            .await
        {
            Ok(result) => result,
            Err(_) => Err(Failure::new(
                &url,
                Stage::Deadline,
                format!("no answer within {:?}", self.post_deadline),
            )),
        }
    }

    /// Fetch the discussion, build the prompt and ask for a consensus.
    async fn answer(&self, post: Post) -> std::result::Result<LedgerRow, Failure> {
        let tree = self
            .source
            .fetch_tree(&post)
            .await
            .map_err(|e| Failure::new(&post.url, Stage::Fetch, format!("{e:#}")))?;
        let lines = flatten(&tree);

        let question = self.source.question(&post);
        let prompt = self.source.prompt_template().build(
            &lines,
            &question,
            &post.author,
            post.story_text.as_deref(),
        );
        info!(comments = lines.len(), prompt_chars = prompt.chars().count(), "Generating answer");

        let answer = self
            .generator
            .summarize(&prompt)
            .await
            .map_err(|e| Failure::new(&post.url, Stage::Generate, format!("{e:#}")))?;
        if answer.trim().is_empty() {
            return Err(Failure::new(&post.url, Stage::Generate, "empty answer"));
        }

        Ok(LedgerRow {
            date: post.created_at,
            url: post.url,
            author: post.author,
            score: post.score,
            question,
            answer: answer.trim().to_string(),
        })
    }

    async fn publish(&self, row: &LedgerRow) -> Result<String> {
        let question = self
            .source
            .tweet_includes_question()
            .then_some(row.question.as_str());
        let tweet = self.formatter.format(question, &row.answer, &row.url).await;
        self.publisher.publish(&tweet).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        post, MemoryLedger, MockSource, RecordingNotifier, RecordingPublisher, ScriptedGenerator,
    };
    use askbot_common::CommentNode;

    fn tree() -> CommentNode {
        CommentNode::new(Some("asker"), Some("?"), vec![CommentNode::leaf("alice", "use vim")])
    }

    #[tokio::test]
    async fn prompt_carries_flattened_discussion() {
        let source =
            MockSource::new(vec![post("u1", "Best editor?", Some(10))]).with_tree("u1", tree());
        let generator = ScriptedGenerator::repeating("Vim.");
        let bot = AnswerBot::new(
            Arc::new(source),
            Arc::new(generator.clone()),
            Arc::new(MemoryLedger::default()),
            Arc::new(RecordingPublisher::default()),
            Arc::new(RecordingNotifier::default()),
        );

        let stats = bot.run().await.unwrap();
        assert_eq!(stats.answered, 1);
        let prompt = &generator.prompts()[0];
        assert!(prompt.contains("alice:use vim"));
        assert!(prompt.contains("Formulate an answer to this question: Best editor?\nfrom asker."));
    }

    #[tokio::test]
    async fn slow_post_hits_the_deadline() {
        let source = MockSource::new(vec![post("u1", "Slow?", Some(10))]).with_slow_tree(
            "u1",
            tree(),
            Duration::from_millis(500),
        );
        let store = Arc::new(MemoryLedger::default());
        let bot = AnswerBot::new(
            Arc::new(source),
            Arc::new(ScriptedGenerator::repeating("x")),
            store.clone(),
            Arc::new(RecordingPublisher::default()),
            Arc::new(RecordingNotifier::default()),
        )
        .with_post_deadline(Duration::from_millis(20));

        let stats = bot.run().await.unwrap();
        assert_eq!(stats.answered, 0);
        assert_eq!(stats.failed(Stage::Deadline), 1);
        assert!(store.rows().is_empty());
    }
}
