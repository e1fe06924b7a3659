//! Conversation session — the state machine behind one shopping chat.
//!
//! ```text
//! Idle ──start(q)──▶ AwaitingFirstReply ──settle──▶ Settled
//!                                                    │  ▲
//!                                          submit(t) ▼  │ settle
//!                                            AwaitingFollowUp
//! ```
//!
//! The session never does I/O. `start`/`submit` hand back a [`PendingTurn`]
//! whose request the caller sends; the outcome is folded back with
//! [`ConversationSession::settle`]. Splitting the turn this way lets the app
//! release its `RefCell` borrow while the request is in flight.

use serde_json::Value;
use uuid::Uuid;
use redmerce_types::{
    RedmerceError, Result,
    event::SessionEvent,
    message::ChatMessage,
    product::Product,
    reply::TRANSPORT_FAILURE_MESSAGE,
    request::{ChatRequest, ConversationContext},
};
use crate::event_bus::EventBus;
use crate::normalizer;
use crate::ports::BackendPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingFirstReply,
    AwaitingFollowUp,
    Settled,
}

/// Identifies the turn a reply belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnTicket {
    pub session_id: Uuid,
    pub turn_id: u64,
}

/// A turn that has been logged and must now be sent
#[derive(Debug, Clone)]
pub struct PendingTurn {
    pub ticket: TurnTicket,
    pub request: ChatRequest,
}

pub struct ConversationSession {
    id: Uuid,
    original_query: Option<String>,
    messages: Vec<ChatMessage>,
    products: Vec<Product>,
    state: SessionState,
    /// Session-level transport error, distinct from the error entries in the log
    error: Option<String>,
    in_flight: Option<u64>,
    turn_counter: u64,
    event_bus: EventBus,
}

impl ConversationSession {
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            id: Uuid::new_v4(),
            original_query: None,
            messages: Vec::new(),
            products: Vec::new(),
            state: SessionState::Idle,
            error: None,
            in_flight: None,
            turn_counter: 0,
            event_bus,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn original_query(&self) -> Option<&str> {
        self.original_query.as_deref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Begin a new session from an initial query.
    ///
    /// An empty query re-initializes the session and makes no call.
    pub fn start(&mut self, query: &str) -> Result<Option<PendingTurn>> {
        let query = query.trim();
        if query.is_empty() {
            self.reset();
            return Ok(None);
        }
        if self.is_busy() {
            return Err(RedmerceError::SessionBusy);
        }

        self.clear();
        self.original_query = Some(query.to_string());
        self.event_bus.emit(SessionEvent::SessionStarted {
            session_id: self.id,
            original_query: query.to_string(),
        });
        log::info!("Session {} started: {}", self.id, query);

        let turn = self.begin_turn(query, None);
        self.state = SessionState::AwaitingFirstReply;
        Ok(Some(turn))
    }

    /// Submit a follow-up message.
    ///
    /// Empty input is a no-op. While a reply is pending the submission is
    /// rejected, not queued. Without an active session this starts one.
    pub fn submit(&mut self, text: &str) -> Result<Option<PendingTurn>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        if self.is_busy() {
            return Err(RedmerceError::SessionBusy);
        }
        if self.state == SessionState::Idle {
            return self.start(text);
        }

        // Context covers the turns before this one, so build it before
        // logging the new user message.
        let context = self.build_context();
        let turn = self.begin_turn(text, Some(context));
        self.state = SessionState::AwaitingFollowUp;
        Ok(Some(turn))
    }

    /// Fold the outcome of a dispatched turn back into the session.
    ///
    /// Returns `false` if the ticket is stale (the session was reset or the
    /// turn already settled); the session is left untouched in that case.
    pub fn settle(&mut self, ticket: TurnTicket, outcome: Result<Value>) -> bool {
        if ticket.session_id != self.id || self.in_flight != Some(ticket.turn_id) {
            log::warn!(
                "Dropping stale reply for session {} turn {}",
                ticket.session_id,
                ticket.turn_id
            );
            return false;
        }

        match outcome {
            Ok(raw) => {
                let reply = normalizer::normalize(raw);
                let entry = if reply.is_error {
                    ChatMessage::error(reply.message)
                } else {
                    ChatMessage::agent(reply.message)
                };
                self.append(entry);

                // An empty or missing product list is a conversational answer,
                // not a retraction of what is on screen.
                if let Some(products) = reply.products.filter(|p| !p.is_empty()) {
                    log::info!("Received {} products", products.len());
                    self.products = products;
                    self.event_bus.emit(SessionEvent::ProductsReplaced {
                        products: self.products.clone(),
                    });
                }

                if self.error.take().is_some() {
                    self.event_bus.emit(SessionEvent::ErrorCleared);
                }
            }
            Err(e) => {
                log::error!("Chat turn {} failed: {}", ticket.turn_id, e);
                self.append(ChatMessage::error(TRANSPORT_FAILURE_MESSAGE));
                self.error = Some(e.to_string());
                self.event_bus.emit(SessionEvent::SessionError {
                    message: e.to_string(),
                });
            }
        }

        self.in_flight = None;
        self.state = SessionState::Settled;
        self.event_bus.emit(SessionEvent::TurnEnd {
            turn_id: ticket.turn_id,
        });
        true
    }

    /// Run one full turn against a backend: submit → send → settle.
    ///
    /// Failures of the call itself end up in the log and the error flag; only
    /// local rejections (busy) are returned.
    pub async fn run_turn(&mut self, text: &str, backend: &dyn BackendPort) -> Result<()> {
        let Some(turn) = self.submit(text)? else {
            return Ok(());
        };
        let outcome = backend.send_chat(&turn.request).await;
        self.settle(turn.ticket, outcome);
        Ok(())
    }

    /// Context for the next outbound turn, reflecting the log and product set
    /// as they stand now.
    pub fn build_context(&self) -> ConversationContext {
        ConversationContext::new(
            self.original_query.clone().unwrap_or_default(),
            &self.messages,
            &self.products,
        )
    }

    /// Clear the session-level error flag (banner dismissed).
    pub fn dismiss_error(&mut self) {
        if self.error.take().is_some() {
            self.event_bus.emit(SessionEvent::ErrorCleared);
        }
    }

    /// Drop the whole conversation and wait for a fresh query. A reply still
    /// in flight will be ignored when it arrives.
    pub fn reset(&mut self) {
        self.clear();
        self.event_bus.emit(SessionEvent::SessionReset);
    }

    fn clear(&mut self) {
        self.id = Uuid::new_v4();
        self.original_query = None;
        self.messages.clear();
        self.products.clear();
        self.error = None;
        self.in_flight = None;
        self.state = SessionState::Idle;
    }

    fn begin_turn(&mut self, text: &str, context: Option<ConversationContext>) -> PendingTurn {
        self.turn_counter += 1;
        let turn_id = self.turn_counter;
        self.in_flight = Some(turn_id);
        self.event_bus.emit(SessionEvent::TurnStart { turn_id });

        self.append(ChatMessage::user(text));

        let request = match context {
            Some(ctx) => ChatRequest::follow_up(text, ctx),
            None => ChatRequest::first_turn(text),
        };
        PendingTurn {
            ticket: TurnTicket {
                session_id: self.id,
                turn_id,
            },
            request,
        }
    }

    fn append(&mut self, mut message: ChatMessage) {
        if let Some(last) = self.messages.last() {
            if message.timestamp < last.timestamp {
                message.timestamp = last.timestamp;
            }
        }
        self.messages.push(message.clone());
        self.event_bus.emit(SessionEvent::MessageAppended { message });
    }
}
