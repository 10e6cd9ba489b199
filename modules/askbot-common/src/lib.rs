pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, EmailConfig, HnConfig, RedditConfig, XCredentials};
pub use error::AskbotError;
pub use types::*;
