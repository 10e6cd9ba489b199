use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AskbotError;

// --- Sources ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    HackerNews,
    Reddit,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HackerNews => write!(f, "hn"),
            Self::Reddit => write!(f, "reddit"),
        }
    }
}

impl FromStr for SourceKind {
    type Err = AskbotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hn" | "hackernews" | "hacker_news" => Ok(Self::HackerNews),
            "reddit" => Ok(Self::Reddit),
            other => Err(AskbotError::Config(format!("unknown source '{other}'"))),
        }
    }
}

// --- Posts and discussion trees ---

/// A top-level question from a discussion source.
///
/// `url` is the canonical ledger key; sources fill it in before handing the
/// post to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub source: SourceKind,
    pub title: String,
    pub url: String,
    pub author: String,
    pub created_at: NaiveDate,
    pub score: Option<i64>,
    pub story_text: Option<String>,
}

/// One node of a reply tree. A missing author marks a deleted or unknown
/// comment; its children are still part of the discussion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentNode {
    pub author: Option<String>,
    pub text: Option<String>,
    pub children: Vec<CommentNode>,
}

impl CommentNode {
    pub fn new(author: Option<&str>, text: Option<&str>, children: Vec<CommentNode>) -> Self {
        Self {
            author: author.map(str::to_string),
            text: text.map(str::to_string),
            children,
        }
    }

    /// A node with author and text and no replies.
    pub fn leaf(author: &str, text: &str) -> Self {
        Self::new(Some(author), Some(text), Vec::new())
    }

    /// Number of nodes below this one (excluding itself).
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }
}

// --- Ledger ---

/// One processed post. The ledger holds at most one row per `url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub date: NaiveDate,
    pub url: String,
    pub author: String,
    #[serde(default)]
    pub score: Option<i64>,
    pub question: String,
    pub answer: String,
}

impl fmt::Display for LedgerRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.date, self.author, self.question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_kind_round_trips_through_display() {
        for kind in [SourceKind::HackerNews, SourceKind::Reddit] {
            assert_eq!(kind.to_string().parse::<SourceKind>().unwrap(), kind);
        }
        assert!("mastodon".parse::<SourceKind>().is_err());
    }

    #[test]
    fn descendant_count_includes_all_levels() {
        let tree = CommentNode::new(
            None,
            None,
            vec![
                CommentNode::new(Some("a"), Some("x"), vec![CommentNode::leaf("b", "y")]),
                CommentNode::leaf("c", "z"),
            ],
        );
        assert_eq!(tree.descendant_count(), 3);
    }

    #[test]
    fn ledger_row_deserializes_without_score() {
        let json = r#"{"date":"2024-01-01","url":"u","author":"a","question":"q","answer":"x"}"#;
        let row: LedgerRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.score, None);
        assert_eq!(row.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }
}
