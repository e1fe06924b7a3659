use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a displayed message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Agent,
    Error,
}

/// A single entry in the conversation log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self::with_role(MessageRole::User, text)
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self::with_role(MessageRole::Agent, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::with_role(MessageRole::Error, text)
    }

    fn with_role(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            content: text.into(),
            timestamp: Utc::now(),
        }
    }
}
