use thiserror::Error;

pub type Result<T> = std::result::Result<T, RedditError>;

#[derive(Debug, Error)]
pub enum RedditError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Post {0} not found")]
    NotFound(String),
}

impl RedditError {
    pub fn is_transient(&self) -> bool {
        match self {
            RedditError::Network(_) => true,
            RedditError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for RedditError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RedditError::Parse(err.to_string())
        } else {
            RedditError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RedditError {
    fn from(err: serde_json::Error) -> Self {
        RedditError::Parse(err.to_string())
    }
}
