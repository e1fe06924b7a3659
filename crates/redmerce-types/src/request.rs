//! Outbound chat request sent to the recommendation backend.
//!
//! Wire shape (`POST /api/chat`):
//! `{ "message": ..., "context": { "original_query", "chat_history", "current_products" } }`

use serde::{Deserialize, Serialize};

use crate::error::RedmerceError;
use crate::message::{ChatMessage, MessageRole};
use crate::product::Product;

/// Role of a replayed turn, as the backend names it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: HistoryRole,
    pub content: String,
}

impl HistoryEntry {
    /// Map a logged message onto a replayed turn. Error entries are not
    /// model-authored and yield `None`.
    pub fn from_message(msg: &ChatMessage) -> Option<Self> {
        let role = match msg.role {
            MessageRole::User => HistoryRole::User,
            MessageRole::Agent => HistoryRole::Assistant,
            MessageRole::Error => return None,
        };
        Some(Self {
            role,
            content: msg.content.clone(),
        })
    }
}

/// Context accompanying every turn after the first
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConversationContext {
    pub original_query: String,
    #[serde(default)]
    pub chat_history: Vec<HistoryEntry>,
    #[serde(default)]
    pub current_products: Vec<Product>,
}

impl ConversationContext {
    pub fn new(original_query: impl Into<String>, log: &[ChatMessage], products: &[Product]) -> Self {
        Self {
            original_query: original_query.into(),
            chat_history: log.iter().filter_map(HistoryEntry::from_message).collect(),
            current_products: products.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub context: Option<ConversationContext>,
}

impl ChatRequest {
    pub fn first_turn(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
        }
    }

    pub fn follow_up(message: impl Into<String>, context: ConversationContext) -> Self {
        Self {
            message: message.into(),
            context: Some(context),
        }
    }

    /// Apply the same checks the backend applies before accepting a request,
    /// so a malformed request fails locally instead of as an HTTP 400.
    pub fn validate(&self) -> Result<(), RedmerceError> {
        if self.message.trim().is_empty() {
            return Err(RedmerceError::InvalidRequest("message is required".to_string()));
        }
        Ok(())
    }
}
