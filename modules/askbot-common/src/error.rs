use thiserror::Error;

#[derive(Error, Debug)]
pub enum AskbotError {
    #[error("Configuration error: {0}")]
    Config(String),
}
