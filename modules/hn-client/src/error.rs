use thiserror::Error;

pub type Result<T> = std::result::Result<T, HnError>;

#[derive(Debug, Error)]
pub enum HnError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl HnError {
    pub fn is_transient(&self) -> bool {
        match self {
            HnError::Network(_) => true,
            HnError::Api { status, .. } => *status == 429 || *status >= 500,
            HnError::Parse(_) => false,
        }
    }
}

impl From<reqwest::Error> for HnError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            HnError::Parse(err.to_string())
        } else {
            HnError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for HnError {
    fn from(err: serde_json::Error) -> Self {
        HnError::Parse(err.to_string())
    }
}
