use ai_client::truncate_chars;

/// Discussion budget for Hacker News threads, in characters.
pub const HN_DISCUSSION_CAP: usize = 2500;
/// Discussion budget for Reddit threads, in characters.
pub const REDDIT_DISCUSSION_CAP: usize = 3500;

const PREAMBLE: &str = "Given this threaded discussion:\n\n";
const QUESTION_INTRO: &str = "\n\nFormulate an answer to this question: ";
const ASKER_INTRO: &str = "\nfrom ";
const BACKGROUND_INTRO: &str = "\nwith this background from the author: ";

const INSTRUCTIONS: &str = "Try to get to a consensus answer in 60 words. \
Some questions ask for personal replies, like how did you spend your summer? \
Others ask for a general answer, like what is the best way to spend a summer. \
In the first case, return an overview of the answers given. \
In the second case, return a summary. \
Formulate the answer as an actual answer to the question that makes sense to \
somebody who doesn't know there was a discussion. Don't use markdown.";

/// Per-source wording and size limits for the consensus prompt.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub discussion_cap: usize,
    pub preamble: String,
    pub instructions: String,
}

impl PromptTemplate {
    pub fn new(discussion_cap: usize) -> Self {
        Self {
            discussion_cap,
            preamble: PREAMBLE.to_string(),
            instructions: INSTRUCTIONS.to_string(),
        }
    }

    pub fn hacker_news() -> Self {
        Self::new(HN_DISCUSSION_CAP)
    }

    pub fn reddit() -> Self {
        Self::new(REDDIT_DISCUSSION_CAP)
    }

    /// Assemble the prompt: discussion excerpt, question, asker, optional
    /// background from the asker, then the fixed instructions.
    pub fn build(
        &self,
        discussion_lines: &[String],
        question: &str,
        asker: &str,
        story_text: Option<&str>,
    ) -> String {
        let discussion = discussion_lines.join("\n");
        let discussion = truncate_chars(&discussion, self.discussion_cap);

        let mut prompt = String::with_capacity(
            self.preamble.len() + discussion.len() + question.len() + self.instructions.len() + 128,
        );
        prompt.push_str(&self.preamble);
        prompt.push_str(discussion);
        prompt.push_str(QUESTION_INTRO);
        prompt.push_str(question);
        prompt.push_str(ASKER_INTRO);
        prompt.push_str(asker);

        match story_text.map(str::trim) {
            Some(background) if !background.is_empty() => {
                prompt.push_str(BACKGROUND_INTRO);
                prompt.push_str(background.trim_end_matches('.'));
                prompt.push_str(".\n");
            }
            _ => prompt.push_str(".\n"),
        }

        prompt.push_str(&self.instructions);
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sections_appear_in_fixed_order() {
        let prompt = PromptTemplate::hacker_news().build(
            &lines(&["alice:use rust", "\tbob:agreed"]),
            "What language for CLIs?",
            "carol",
            Some("I write a lot of small tools."),
        );

        let positions: Vec<usize> = [
            "Given this threaded discussion",
            "alice:use rust\n\tbob:agreed",
            "Formulate an answer to this question: What language for CLIs?",
            "from carol",
            "with this background from the author: I write a lot of small tools.",
            "consensus answer in 60 words",
            "Don't use markdown.",
        ]
        .iter()
        .map(|needle| prompt.find(needle).unwrap_or_else(|| panic!("missing {needle:?}")))
        .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
        assert!(prompt.ends_with("Don't use markdown."));
    }

    #[test]
    fn background_block_only_when_present() {
        let template = PromptTemplate::reddit();
        let without = template.build(&lines(&["a:b"]), "Q?", "op", None);
        let blank = template.build(&lines(&["a:b"]), "Q?", "op", Some("   "));
        assert!(!without.contains("background"));
        assert_eq!(without, blank);
    }

    #[test]
    fn discussion_is_capped_in_characters() {
        let template = PromptTemplate::new(10);
        let prompt = template.build(&lines(&["ééééé", "ééééé"]), "Q?", "op", None);
        let excerpt = &prompt[PREAMBLE.len()..prompt.find(QUESTION_INTRO).unwrap()];
        assert_eq!(excerpt.chars().count(), 10);
        assert_eq!(excerpt, "ééééé\néééé");
    }

    #[test]
    fn caps_differ_per_source() {
        assert_eq!(PromptTemplate::hacker_news().discussion_cap, 2500);
        assert_eq!(PromptTemplate::reddit().discussion_cap, 3500);

        let long: Vec<String> = (0..400).map(|i| format!("user{i}:{}", "x".repeat(20))).collect();
        let hn = PromptTemplate::hacker_news().build(&long, "Q?", "op", None);
        let reddit = PromptTemplate::reddit().build(&long, "Q?", "op", None);
        assert_eq!(reddit.chars().count() - hn.chars().count(), 1000);
    }
}
