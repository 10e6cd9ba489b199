use serde::{Deserialize, Serialize};

use crate::traits::{Message, MessageRole};

// =============================================================================
// Chat Completion
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Role {
    System,
    User,
    Assistant,
}

impl From<MessageRole> for Role {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::System => Role::System,
            MessageRole::User => Role::User,
            MessageRole::Assistant => Role::Assistant,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
}

impl From<&Message> for WireMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.into(),
            content: Some(msg.content.clone()),
        }
    }
}

// =============================================================================
// Chat Request
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            max_tokens: None,
            max_completion_tokens: None,
        }
    }

    pub fn messages<'a>(mut self, messages: impl IntoIterator<Item = &'a Message>) -> Self {
        self.messages.extend(messages.into_iter().map(WireMessage::from));
        self
    }

    /// Apply the token limit under whichever field the model family accepts.
    pub fn token_limit(mut self, limit: u32) -> Self {
        if uses_max_completion_tokens(&self.model) {
            self.max_completion_tokens = Some(limit);
        } else {
            self.max_tokens = Some(limit);
        }
        self
    }
}

// =============================================================================
// Chat Response
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatResponse {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Choice {
    pub message: WireMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

// =============================================================================
// Utilities
// =============================================================================

/// Reasoning models reject `max_tokens`.
pub(crate) fn uses_max_completion_tokens(model: &str) -> bool {
    model.starts_with("o1")
        || model.starts_with("o3")
        || model.starts_with("o4")
        || model.starts_with("gpt-5")
}
