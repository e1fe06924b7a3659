use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::ChatMessage;
use crate::product::Product;

/// Events emitted by the conversation session.
/// UI subscribes to these for reactive updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    /// A new session began from an initial query
    SessionStarted { session_id: Uuid, original_query: String },

    /// The session was cleared and waits for a fresh query
    SessionReset,

    /// A request for this turn is about to be dispatched
    TurnStart { turn_id: u64 },

    /// A message was appended to the log
    MessageAppended { message: ChatMessage },

    /// The displayed product set was replaced
    ProductsReplaced { products: Vec<Product> },

    /// The turn settled (reply or failure)
    TurnEnd { turn_id: u64 },

    /// Transport-level failure; drives the dismissible banner
    SessionError { message: String },

    /// The session-level error flag was cleared
    ErrorCleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SavedItemsChangeKind {
    Added,
    Removed,
    /// The whole list was replaced, e.g. after loading from storage
    Loaded,
}

/// Notification delivered to saved-items subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedItemsChange {
    pub kind: SavedItemsChangeKind,
    /// Key of the affected item; `None` for `Loaded`
    pub url: Option<String>,
    /// Number of saved items after the change
    pub count: usize,
}
