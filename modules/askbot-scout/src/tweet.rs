use std::sync::Arc;

use tracing::{debug, warn};

use ai_client::{char_len, truncate_chars};

use crate::consensus::ConsensusGenerator;

pub const TWEET_LIMIT: usize = 280;
/// Length X charges for a link, whatever its real length.
pub const SHORT_LINK_LEN: usize = 24;
const SEPARATORS: usize = 2;

/// Questions longer than this are summarised.
const QUESTION_MAX: usize = 40;
const QUESTION_TARGET: usize = 35;
/// Answers this close to the budget are re-summarised.
const RESUMMARIZE_MARGIN: usize = 30;
const RESUMMARIZE_SLACK: usize = 20;
/// The question gives way before the answer gets shorter than this.
const MIN_ANSWER: usize = 40;

const ELLIPSIS: &str = "...";

/// Cut `s` to at most `max` chars, marking the cut with `...`.
pub fn ellipsize(s: &str, max: usize) -> String {
    if char_len(s) <= max {
        return s.to_string();
    }
    if max < ELLIPSIS.len() {
        return truncate_chars(s, max).to_string();
    }
    format!("{}{ELLIPSIS}", truncate_chars(s, max - ELLIPSIS.len()).trim_end())
}

/// Fits a question, answer and link into one tweet, asking the generator to
/// shorten text first and cutting it mechanically when that is not enough.
pub struct TweetFormatter {
    generator: Arc<dyn ConsensusGenerator>,
}

impl TweetFormatter {
    pub fn new(generator: Arc<dyn ConsensusGenerator>) -> Self {
        Self { generator }
    }

    /// Produce `[question\n]answer\nurl`, never longer than [`TWEET_LIMIT`]
    /// chars.
    pub async fn format(&self, question: Option<&str>, answer: &str, url: &str) -> String {
        let link_cost = SHORT_LINK_LEN.max(char_len(url));
        let room = TWEET_LIMIT.saturating_sub(link_cost + SEPARATORS);

        let question = match question.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => self.fit_question(q, room).await,
            None => None,
        };

        let budget = room.saturating_sub(question.as_deref().map_or(0, char_len));
        let answer = self.fit_answer(answer.trim(), budget).await;

        let tweet = match question {
            Some(q) => format!("{q}\n{answer}\n{url}"),
            None => format!("{answer}\n{url}"),
        };
        if char_len(&tweet) > TWEET_LIMIT {
            warn!(url, "Link alone exceeds the tweet limit, cutting");
            return ellipsize(&tweet, TWEET_LIMIT);
        }
        tweet
    }

    async fn fit_question(&self, question: &str, room: usize) -> Option<String> {
        let mut question = question.to_string();
        if char_len(&question) > QUESTION_MAX {
            let prompt =
                format!("Summarize this question to {QUESTION_TARGET} characters: {question}");
            match self.generator.summarize(&prompt).await {
                Ok(short) if !short.trim().is_empty() => question = short.trim().to_string(),
                Ok(_) => warn!("Empty question summary, keeping original"),
                Err(e) => warn!(error = %e, "Question summary failed, keeping original"),
            }
        }

        let max_question = room.saturating_sub(MIN_ANSWER);
        if max_question <= ELLIPSIS.len() {
            return None;
        }
        Some(ellipsize(&question, max_question))
    }

    async fn fit_answer(&self, answer: &str, budget: usize) -> String {
        let mut answer = answer.to_string();
        if char_len(&answer) > budget.saturating_sub(RESUMMARIZE_MARGIN) {
            let target = budget.saturating_sub(RESUMMARIZE_SLACK);
            debug!(len = char_len(&answer), target, "Answer too long, re-summarising");
            let prompt = format!("Summarize this answer to {target} characters: {answer}");
            match self.generator.summarize(&prompt).await {
                Ok(short) if !short.trim().is_empty() => answer = short.trim().to_string(),
                Ok(_) => warn!("Empty answer summary, truncating instead"),
                Err(e) => warn!(error = %e, "Answer summary failed, truncating instead"),
            }
        }
        ellipsize(&answer, budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGenerator;
    use proptest::prelude::*;

    fn formatter(generator: ScriptedGenerator) -> TweetFormatter {
        TweetFormatter::new(Arc::new(generator))
    }

    #[tokio::test]
    async fn long_answer_is_truncated_when_summariser_fails() {
        let answer = "x".repeat(400);
        let tweet = formatter(ScriptedGenerator::failing())
            .format(None, &answer, "http://a")
            .await;

        assert!(char_len(&tweet) <= TWEET_LIMIT);
        let (body, url) = tweet.rsplit_once('\n').unwrap();
        assert_eq!(url, "http://a");
        assert!(body.ends_with("..."));
    }

    #[tokio::test]
    async fn short_input_is_untouched() {
        let generator = ScriptedGenerator::failing();
        let tweet = formatter(generator.clone())
            .format(Some("Best editor?"), "Vim or Emacs.", "https://news.ycombinator.com/item?id=1")
            .await;

        assert_eq!(tweet, "Best editor?\nVim or Emacs.\nhttps://news.ycombinator.com/item?id=1");
        assert!(generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn long_question_is_summarised() {
        let generator = ScriptedGenerator::new(["Best way to learn Rust?"]);
        let tweet = formatter(generator.clone())
            .format(
                Some("What is the best way to learn Rust if you already know C++ well?"),
                "Read the book.",
                "https://a.b",
            )
            .await;

        assert_eq!(tweet, "Best way to learn Rust?\nRead the book.\nhttps://a.b");
        assert!(generator.prompts()[0].starts_with("Summarize this question to 35 characters: "));
    }

    #[tokio::test]
    async fn near_budget_answer_is_resummarised_with_target() {
        let generator = ScriptedGenerator::new(["Short consensus."]);
        let tweet = formatter(generator.clone())
            .format(None, &"word ".repeat(50), "https://a.b")
            .await;

        assert_eq!(tweet, "Short consensus.\nhttps://a.b");
        // 280 - 24 - 2 = 254 budget, asks for 234.
        assert!(generator.prompts()[0].starts_with("Summarize this answer to 234 characters: "));
    }

    #[tokio::test]
    async fn long_urls_cost_their_real_length() {
        let url = format!("https://example.com/{}", "p".repeat(100));
        let tweet = formatter(ScriptedGenerator::failing())
            .format(Some("Why?"), &"y".repeat(300), &url)
            .await;
        assert!(char_len(&tweet) <= TWEET_LIMIT);
        assert!(tweet.ends_with(&url));
    }

    #[test]
    fn ellipsize_counts_chars() {
        assert_eq!(ellipsize("héllo wörld", 8), "héllo...");
        assert_eq!(ellipsize("short", 10), "short");
        assert_eq!(ellipsize("abcdef", 2), "ab");
    }

    proptest! {
        #[test]
        fn tweets_never_exceed_the_limit(
            question in proptest::option::of(".{0,200}"),
            answer in ".{0,600}",
            url in "https?://[a-z]{1,300}",
            summary in proptest::option::of(".{0,400}"),
        ) {
            let generator = match summary {
                Some(text) => ScriptedGenerator::repeating(text),
                None => ScriptedGenerator::failing(),
            };
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let tweet = runtime.block_on(
                formatter(generator).format(question.as_deref(), &answer, &url),
            );
            prop_assert!(char_len(&tweet) <= TWEET_LIMIT);
        }
    }
}
