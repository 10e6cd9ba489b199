use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use crate::error::AskbotError;

type Result<T> = std::result::Result<T, AskbotError>;

const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_LEDGER_PATH: &str = "ledger.json";
const X_CREDENTIAL_KEYS: [&str; 4] = [
    "X_CONSUMER_KEY",
    "X_CONSUMER_SECRET",
    "X_ACCESS_TOKEN",
    "X_ACCESS_TOKEN_SECRET",
];
const DEFAULT_USER_AGENT: &str = "askbot/0.1 (consensus answers for discussion threads)";

/// Application configuration loaded from environment variables.
/// Contains secrets and deployment-specific values; prompt wording and
/// tweet budgets are compiled in.
#[derive(Debug, Clone)]
pub struct Config {
    // AI / LLM
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: Option<String>,

    // Storage
    pub ledger_path: PathBuf,

    // Timeouts
    pub http_timeout: Duration,
    pub post_deadline: Duration,

    // Publishing
    pub x: Option<XCredentials>,

    // Notification
    pub email: Option<EmailConfig>,
    pub slack_webhook_url: Option<String>,

    // Sources
    pub hn: HnConfig,
    pub reddit: RedditConfig,
}

#[derive(Debug, Clone)]
pub struct XCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub api_key: String,
    pub api_url: Option<String>,
    pub from: String,
    pub recipient: String,
}

#[derive(Debug, Clone)]
pub struct HnConfig {
    pub min_points: i64,
}

#[derive(Debug, Clone)]
pub struct RedditConfig {
    pub user_agent: String,
    pub subreddit: String,
    pub limit: u32,
    pub min_score: i64,
}

impl Config {
    /// Load configuration from the process environment, reading `.env`
    /// first if one exists.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.log_keys();
        Ok(config)
    }

    /// Ledger location alone, for commands that only read the ledger and
    /// should not require API keys.
    pub fn ledger_path_from_env() -> PathBuf {
        dotenvy::dotenv().ok();
        std::env::var("ASKBOT_LEDGER_PATH")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER_PATH))
    }

    /// Build configuration from an arbitrary key lookup. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let x = match (
            get("X_CONSUMER_KEY"),
            get("X_CONSUMER_SECRET"),
            get("X_ACCESS_TOKEN"),
            get("X_ACCESS_TOKEN_SECRET"),
        ) {
            (
                Some(consumer_key),
                Some(consumer_secret),
                Some(access_token),
                Some(access_token_secret),
            ) => Some(XCredentials {
                consumer_key,
                consumer_secret,
                access_token,
                access_token_secret,
            }),
            (None, None, None, None) => None,
            _ => {
                return Err(AskbotError::Config(format!(
                    "{} must be set together",
                    X_CREDENTIAL_KEYS.join(", ")
                )))
            }
        };

        let email = match (get("EMAIL_API_KEY"), get("EMAIL_FROM"), get("DIGEST_RECIPIENT")) {
            (Some(api_key), Some(from), Some(recipient)) => Some(EmailConfig {
                api_key,
                api_url: get("EMAIL_API_URL"),
                from,
                recipient,
            }),
            _ => None,
        };

        Ok(Self {
            openai_api_key: get("OPENAI_API_KEY").ok_or_else(|| {
                AskbotError::Config("OPENAI_API_KEY environment variable is required".into())
            })?,
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            openai_base_url: get("OPENAI_BASE_URL"),
            ledger_path: get("ASKBOT_LEDGER_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER_PATH)),
            http_timeout: Duration::from_secs(parse_or(&get, "HTTP_TIMEOUT_SECS", 30u64)?),
            post_deadline: Duration::from_secs(parse_or(&get, "POST_DEADLINE_SECS", 300u64)?),
            x,
            email,
            slack_webhook_url: get("SLACK_WEBHOOK_URL"),
            hn: HnConfig {
                min_points: parse_or(&get, "HN_MIN_POINTS", 40i64)?,
            },
            reddit: RedditConfig {
                user_agent: get("REDDIT_USER_AGENT")
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
                subreddit: get("REDDIT_SUBREDDIT").unwrap_or_else(|| "AskReddit".to_string()),
                limit: parse_or(&get, "REDDIT_LIMIT", 25u32)?,
                min_score: parse_or(&get, "REDDIT_MIN_SCORE", 3000i64)?,
            },
        })
    }

    fn log_keys(&self) {
        fn preview(val: &str) -> String {
            let n = val.chars().count().min(5);
            let head: String = val.chars().take(n).collect();
            format!("{head}...")
        }

        info!(
            openai_api_key = %preview(&self.openai_api_key),
            model = %self.openai_model,
            ledger = %self.ledger_path.display(),
            publishing = self.x.is_some(),
            email_digest = self.email.is_some(),
            slack = self.slack_webhook_url.is_some(),
            "Configuration loaded"
        );
    }
}

fn parse_or<T, F>(get: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AskbotError::Config(format!("{key} must be a number: {e}"))),
        None => Ok(default),
    }
}
