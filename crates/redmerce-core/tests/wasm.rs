//! WASM-target tests for redmerce-core.
//!
//! Runs the EventBus, normalizer, session and saved-items checks under
//! wasm32-unknown-unknown via `wasm-pack test --node`.

use wasm_bindgen_test::*;

use redmerce_core::event_bus::EventBus;
use redmerce_core::normalizer::normalize;
use redmerce_core::ports::BackendPort;
use redmerce_core::saved_items::SavedItems;
use redmerce_core::session::{ConversationSession, SessionState};
use redmerce_types::event::SessionEvent;
use redmerce_types::message::MessageRole;
use redmerce_types::product::Product;
use redmerce_types::reply::{HealthStatus, TRANSPORT_FAILURE_MESSAGE};
use redmerce_types::request::ChatRequest;
use redmerce_types::RedmerceError;

use async_trait::async_trait;
use serde_json::{json, Value};
use std::cell::RefCell;

// ─── EventBus Tests ──────────────────────────────────────

#[wasm_bindgen_test]
fn event_bus_emit_and_drain() {
    let bus: EventBus = EventBus::new();
    bus.emit(SessionEvent::TurnStart { turn_id: 1 });
    bus.emit(SessionEvent::TurnEnd { turn_id: 1 });
    assert_eq!(bus.drain().len(), 2);
    assert!(!bus.has_pending());
}

// ─── Normalizer Tests ────────────────────────────────────

#[wasm_bindgen_test]
fn normalize_each_dialect() {
    assert_eq!(normalize(json!("hello")).message, "hello");
    assert_eq!(
        normalize(json!({ "status": "success", "response": "r", "products": [{ "name": "A" }] }))
            .products
            .map(|p| p.len()),
        Some(1)
    );
    assert_eq!(
        normalize(json!({ "recommendations_ready": true, "products": [] })).message,
        "Here are your product recommendations!"
    );
    assert_eq!(normalize(json!({ "response": "q?" })).message, "q?");
    assert!(normalize(json!({ "error": "rate limited" })).is_error);
    assert_eq!(normalize(json!({ "x": true })).message, r#"{"x":true}"#);
}

// ─── Session Tests ───────────────────────────────────────

struct ScriptedBackend {
    replies: RefCell<Vec<redmerce_types::Result<Value>>>,
}

#[async_trait(?Send)]
impl BackendPort for ScriptedBackend {
    async fn send_chat(&self, _req: &ChatRequest) -> redmerce_types::Result<Value> {
        self.replies.borrow_mut().remove(0)
    }

    async fn health(&self) -> redmerce_types::Result<HealthStatus> {
        Err(RedmerceError::Network("not probed".into()))
    }

    fn endpoint(&self) -> &str {
        "scripted"
    }
}

#[wasm_bindgen_test]
async fn session_run_turn_success_then_failure() {
    let bus: EventBus = EventBus::new();
    let mut session = ConversationSession::new(bus);
    let backend = ScriptedBackend {
        replies: RefCell::new(vec![
            Ok(json!({ "status": "success", "response": "Found", "products": [{ "name": "A" }] })),
            Err(RedmerceError::Network("offline".into())),
        ]),
    };

    session.run_turn("tv", &backend).await.unwrap();
    assert_eq!(session.state(), SessionState::Settled);
    assert_eq!(session.products().len(), 1);

    session.run_turn("more", &backend).await.unwrap();
    let last = session.messages().last().unwrap();
    assert_eq!(last.role, MessageRole::Error);
    assert_eq!(last.content, TRANSPORT_FAILURE_MESSAGE);
    assert_eq!(session.products().len(), 1);
    assert!(session.error().is_some());
}

#[wasm_bindgen_test]
fn session_busy_rejects_submit() {
    let bus: EventBus = EventBus::new();
    let mut session = ConversationSession::new(bus);
    let _turn = session.start("tv").unwrap();
    assert!(matches!(session.submit("again"), Err(RedmerceError::SessionBusy)));
}

// ─── Saved Items Tests ───────────────────────────────────

#[wasm_bindgen_test]
fn saved_items_add_remove() {
    let saved = SavedItems::new();
    let mut p = Product::named("A");
    p.url = Some("https://a".into());
    assert!(saved.add(p.clone()));
    assert!(!saved.add(p));
    assert!(saved.remove("https://a"));
    assert!(saved.is_empty());
}
