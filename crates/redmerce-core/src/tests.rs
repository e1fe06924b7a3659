#[cfg(test)]
mod tests {
    use crate::event_bus::EventBus;
    use crate::normalizer::{classify, normalize, parse_reply_body, redact_secrets};
    use crate::ports::*;
    use crate::saved_items::*;
    use crate::session::{ConversationSession, SessionState, TurnTicket};
    use redmerce_types::event::{SavedItemsChange, SavedItemsChangeKind, SessionEvent};
    use redmerce_types::message::MessageRole;
    use redmerce_types::product::Product;
    use redmerce_types::reply::*;
    use redmerce_types::request::{ChatRequest, HistoryRole};
    use redmerce_types::RedmerceError;
    use async_trait::async_trait;
    use futures::executor::block_on;
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::collections::{HashMap, VecDeque};
    use std::rc::Rc;

    // ─── Mocks ───────────────────────────────────────────────

    /// Backend that replays scripted outcomes and records every request
    struct MockBackend {
        replies: RefCell<VecDeque<redmerce_types::Result<Value>>>,
        requests: RefCell<Vec<ChatRequest>>,
    }

    impl MockBackend {
        fn new(replies: Vec<redmerce_types::Result<Value>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                requests: RefCell::new(Vec::new()),
            }
        }

        fn sent(&self) -> Vec<ChatRequest> {
            self.requests.borrow().clone()
        }
    }

    #[async_trait(?Send)]
    impl BackendPort for MockBackend {
        async fn send_chat(&self, req: &ChatRequest) -> redmerce_types::Result<Value> {
            self.requests.borrow_mut().push(req.clone());
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(json!("no more scripted replies")))
        }

        async fn health(&self) -> redmerce_types::Result<HealthStatus> {
            Ok(HealthStatus {
                status: "healthy".into(),
                timestamp: None,
                service: Some("mock".into()),
            })
        }

        fn endpoint(&self) -> &str {
            "mock://backend"
        }
    }

    #[derive(Default)]
    struct MockStorage {
        data: RefCell<HashMap<String, Vec<u8>>>,
    }

    #[async_trait(?Send)]
    impl StoragePort for MockStorage {
        async fn get(&self, key: &str) -> redmerce_types::Result<Option<Vec<u8>>> {
            Ok(self.data.borrow().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &[u8]) -> redmerce_types::Result<()> {
            self.data.borrow_mut().insert(key.to_string(), value.to_vec());
            Ok(())
        }

        fn backend_name(&self) -> &str {
            "mock"
        }
    }

    fn new_session() -> (ConversationSession, EventBus) {
        let bus: EventBus = EventBus::new();
        (ConversationSession::new(bus.clone()), bus)
    }

    fn tv_reply() -> Value {
        json!({
            "status": "success",
            "response": "Found 2 TVs",
            "products": [
                { "name": "A", "price": 499, "url": "https://shop.example/a" },
                { "name": "B", "price": "899,00", "purchase_link": "https://shop.example/b" }
            ]
        })
    }

    fn linked(name: &str, url: &str) -> Product {
        let mut p = Product::named(name);
        p.url = Some(url.to_string());
        p
    }

    // ─── EventBus Tests ──────────────────────────────────────

    #[test]
    fn test_event_bus_new_is_empty() {
        let bus: EventBus = EventBus::new();
        assert!(!bus.has_pending());
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_event_bus_drain_preserves_order() {
        let bus: EventBus = EventBus::new();
        bus.emit(SessionEvent::TurnStart { turn_id: 1 });
        bus.emit(SessionEvent::TurnEnd { turn_id: 1 });
        assert_eq!(bus.pending(), 2);

        let events = bus.drain();
        assert!(matches!(events[0], SessionEvent::TurnStart { turn_id: 1 }));
        assert!(matches!(events[1], SessionEvent::TurnEnd { turn_id: 1 }));
        assert!(!bus.has_pending());
    }

    #[test]
    fn test_event_bus_clone_shares_queue() {
        let a: EventBus = EventBus::new();
        let b = a.clone();
        a.emit(SessionEvent::SessionReset);
        assert!(b.has_pending());
        assert_eq!(b.drain().len(), 1);
        assert!(!a.has_pending());
    }

    #[test]
    fn test_event_bus_other_event_type() {
        let bus = EventBus::<u32>::new();
        bus.emit(7);
        assert_eq!(bus.drain(), vec![7]);
    }

    // ─── Normalizer Tests ────────────────────────────────────

    #[test]
    fn test_normalize_bare_string() {
        let reply = normalize(json!("hello"));
        assert_eq!(reply.message, "hello");
        assert!(reply.products.is_none());
        assert!(!reply.is_error);
    }

    #[test]
    fn test_normalize_success_with_products() {
        let reply = normalize(tv_reply());
        assert_eq!(reply.message, "Found 2 TVs");
        let products = reply.products.unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].name, "A");
        assert_eq!(products[1].purchase_link(), Some("https://shop.example/b"));
    }

    #[test]
    fn test_normalize_success_without_response_uses_fallback() {
        let reply = normalize(json!({ "status": "success", "products": [{ "name": "A" }] }));
        assert_eq!(reply.message, PRODUCTS_FALLBACK_MESSAGE);
        assert_eq!(reply.products.unwrap().len(), 1);
    }

    #[test]
    fn test_normalize_success_empty_products() {
        let reply = normalize(json!({ "status": "success", "response": "Hi!", "products": [] }));
        assert_eq!(reply.message, "Hi!");
        assert_eq!(reply.products, Some(vec![]));
    }

    #[test]
    fn test_normalize_legacy_falls_back_to_summary_then_default() {
        let with_summary = normalize(json!({
            "recommendations_ready": true,
            "summary": "Top picks",
            "products": [{ "name": "C" }]
        }));
        assert_eq!(with_summary.message, "Top picks");

        let bare = normalize(json!({
            "recommendations_ready": true,
            "products": [{ "name": "C" }]
        }));
        assert_eq!(bare.message, PRODUCTS_FALLBACK_MESSAGE);
        assert_eq!(bare.products.unwrap()[0].name, "C");
    }

    #[test]
    fn test_normalize_legacy_message_wins_over_summary() {
        let reply = normalize(json!({
            "recommendations_ready": 1,
            "message": "Here you go",
            "summary": "ignored",
            "products": []
        }));
        assert_eq!(reply.message, "Here you go");
    }

    #[test]
    fn test_normalize_legacy_flag_without_products_is_conversational() {
        let reply = normalize(json!({ "recommendations_ready": true, "response": "Which size?" }));
        assert_eq!(reply.message, "Which size?");
        assert!(reply.products.is_none());
    }

    #[test]
    fn test_classify_order_success_before_legacy() {
        let raw = json!({
            "status": "success",
            "recommendations_ready": true,
            "response": "new",
            "message": "old",
            "products": []
        });
        assert_eq!(classify(raw).dialect(), "success");
    }

    #[test]
    fn test_classify_status_without_products_is_conversational() {
        let raw = json!({ "status": "success", "response": "Tell me more" });
        assert_eq!(classify(raw).dialect(), "conversational");
    }

    #[test]
    fn test_normalize_conversational() {
        let reply = normalize(json!({ "response": "What's your budget?" }));
        assert_eq!(reply.message, "What's your budget?");
        assert!(reply.products.is_none());
    }

    #[test]
    fn test_normalize_upstream_error() {
        let reply = normalize(json!({ "error": "rate limited" }));
        assert_eq!(reply.message, "Sorry, I encountered an error: rate limited");
        assert!(reply.is_error);
        assert!(reply.products.is_none());
    }

    #[test]
    fn test_normalize_response_wins_over_error() {
        // The backend's error path carries both.
        let reply = normalize(json!({
            "status": "error",
            "response": "I apologize, please try again.",
            "products": [],
            "error": "boom"
        }));
        assert_eq!(reply.message, "I apologize, please try again.");
        assert!(!reply.is_error);
    }

    #[test]
    fn test_normalize_falsy_error_is_unrecognized() {
        let reply = normalize(json!({ "error": "" }));
        assert_eq!(reply.message, r#"{"error":""}"#);
        assert!(!reply.is_error);
    }

    #[test]
    fn test_normalize_unrecognized_shows_serialized_value() {
        let reply = normalize(json!({ "foo": 1 }));
        assert_eq!(reply.message, r#"{"foo":1}"#);
        assert!(reply.products.is_none());

        assert_eq!(normalize(json!(42)).message, "42");
        assert_eq!(normalize(Value::Null).message, "null");
    }

    #[test]
    fn test_normalize_unrecognized_keeps_credential_like_text() {
        let raw = json!({ "items": [{ "link": "https://shop.example/p?token=abc123" }] });
        let expected = raw.to_string();
        let reply = normalize(raw);
        assert_eq!(reply.message, expected);
        assert!(serde_json::from_str::<Value>(&reply.message).is_ok());
    }

    #[test]
    fn test_normalize_blank_string_is_unrecognized() {
        assert_eq!(classify(json!("   ")).dialect(), "unrecognized");
    }

    #[test]
    fn test_normalize_skips_non_object_products() {
        let reply = normalize(json!({
            "status": "success",
            "products": [{ "name": "ok" }, "junk", 3, null]
        }));
        assert_eq!(reply.products.unwrap().len(), 1);
    }

    #[test]
    fn test_normalize_redacts_secrets_in_errors() {
        let reply = normalize(json!({ "error": "GET /search?q=tv&api_key=abc123 failed" }));
        assert!(!reply.message.contains("abc123"));
        assert!(reply.message.contains("[REDACTED]"));
    }

    #[test]
    fn test_redact_secrets_variants() {
        assert_eq!(redact_secrets("password: hunter2"), "[REDACTED]");
        assert_eq!(redact_secrets("TOKEN=xyz, next"), "[REDACTED], next");
        assert_eq!(redact_secrets("nothing to hide"), "nothing to hide");
    }

    #[test]
    fn test_redact_secrets_stops_at_structure() {
        assert_eq!(
            redact_secrets(r#"{"url":"x?token=abc"}, tail"#),
            r#"{"url":"x?[REDACTED]"}, tail"#
        );
        assert_eq!(redact_secrets("[secret=s3cr3t] done"), "[[REDACTED]] done");
        assert_eq!(redact_secrets("see api_key=k1] and more"), "see [REDACTED]] and more");
    }

    #[test]
    fn test_parse_reply_body() {
        assert_eq!(parse_reply_body(r#"{"response":"hi"}"#), json!({ "response": "hi" }));
        assert_eq!(parse_reply_body(r#""quoted""#), json!("quoted"));
        assert_eq!(parse_reply_body("plain text"), json!("plain text"));
    }

    // ─── Session Tests ───────────────────────────────────────

    #[test]
    fn test_session_starts_idle() {
        let (session, _bus) = new_session();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.messages().is_empty());
        assert!(session.products().is_empty());
        assert!(session.original_query().is_none());
        assert!(!session.is_busy());
    }

    #[test]
    fn test_session_start_sends_first_turn_without_context() {
        let (mut session, _bus) = new_session();
        let turn = session.start("  4k TV under 1000  ").unwrap().unwrap();

        assert_eq!(turn.request.message, "4k TV under 1000");
        assert!(turn.request.context.is_none());
        assert_eq!(session.state(), SessionState::AwaitingFirstReply);
        assert_eq!(session.original_query(), Some("4k TV under 1000"));
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].role, MessageRole::User);
        assert!(session.is_busy());
    }

    #[test]
    fn test_session_empty_query_is_noop() {
        let (mut session, bus) = new_session();
        let backend = MockBackend::new(vec![]);
        assert!(session.start("   ").unwrap().is_none());
        block_on(session.run_turn("", &backend)).unwrap();

        assert!(backend.sent().is_empty());
        assert!(session.messages().is_empty());
        assert_eq!(session.state(), SessionState::Idle);
        assert!(bus.drain().iter().all(|e| matches!(e, SessionEvent::SessionReset)));
    }

    #[test]
    fn test_session_bare_string_reply() {
        let (mut session, _bus) = new_session();
        let backend = MockBackend::new(vec![Ok(json!("hello"))]);
        block_on(session.run_turn("hi", &backend)).unwrap();

        let last = session.messages().last().unwrap();
        assert_eq!(last.role, MessageRole::Agent);
        assert_eq!(last.content, "hello");
        assert!(session.products().is_empty());
        assert_eq!(session.state(), SessionState::Settled);
    }

    #[test]
    fn test_session_success_reply_replaces_products() {
        let (mut session, bus) = new_session();
        let backend = MockBackend::new(vec![Ok(tv_reply())]);
        block_on(session.run_turn("tv", &backend)).unwrap();

        assert_eq!(session.messages().last().unwrap().content, "Found 2 TVs");
        let names: Vec<&str> = session.products().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert!(bus
            .drain()
            .iter()
            .any(|e| matches!(e, SessionEvent::ProductsReplaced { products } if products.len() == 2)));
    }

    #[test]
    fn test_session_legacy_reply_uses_fallback_message() {
        let (mut session, _bus) = new_session();
        let backend = MockBackend::new(vec![Ok(json!({
            "recommendations_ready": true,
            "products": [{ "name": "C" }]
        }))]);
        block_on(session.run_turn("shoes", &backend)).unwrap();

        assert_eq!(session.messages().last().unwrap().content, PRODUCTS_FALLBACK_MESSAGE);
        assert_eq!(session.products().len(), 1);
        assert_eq!(session.products()[0].name, "C");
    }

    #[test]
    fn test_session_upstream_error_is_logged_not_flagged() {
        let (mut session, _bus) = new_session();
        let backend = MockBackend::new(vec![Ok(json!({ "error": "rate limited" }))]);
        block_on(session.run_turn("tv", &backend)).unwrap();

        let last = session.messages().last().unwrap();
        assert_eq!(last.role, MessageRole::Error);
        assert_eq!(last.content, "Sorry, I encountered an error: rate limited");
        assert!(session.error().is_none());
        assert_eq!(session.state(), SessionState::Settled);
    }

    #[test]
    fn test_session_conversational_follow_up_keeps_products() {
        let (mut session, _bus) = new_session();
        let backend = MockBackend::new(vec![
            Ok(tv_reply()),
            Ok(json!({ "response": "The A has HDMI 2.1" })),
            Ok(json!({ "status": "success", "response": "Anything else?", "products": [] })),
        ]);
        block_on(session.run_turn("tv", &backend)).unwrap();
        let before = session.products().to_vec();

        block_on(session.run_turn("which has hdmi 2.1?", &backend)).unwrap();
        assert_eq!(session.products(), before.as_slice());

        block_on(session.run_turn("thanks", &backend)).unwrap();
        assert_eq!(session.products(), before.as_slice());
        assert_eq!(session.messages().last().unwrap().content, "Anything else?");
    }

    #[test]
    fn test_session_transport_failure_appends_one_error_entry() {
        let (mut session, bus) = new_session();
        let backend = MockBackend::new(vec![Err(RedmerceError::Network("connection refused".into()))]);
        block_on(session.run_turn("tv", &backend)).unwrap();

        let errors: Vec<_> = session
            .messages()
            .iter()
            .filter(|m| m.role == MessageRole::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].content, TRANSPORT_FAILURE_MESSAGE);
        assert_eq!(session.error(), Some("Network error: connection refused"));
        assert!(!session.is_busy());
        assert!(bus.drain().iter().any(|e| matches!(e, SessionEvent::SessionError { .. })));
    }

    #[test]
    fn test_session_success_after_failure_clears_error_flag() {
        let (mut session, bus) = new_session();
        let backend = MockBackend::new(vec![
            Err(RedmerceError::Http { status: 500, body: "oops".into() }),
            Ok(json!("recovered")),
        ]);
        block_on(session.run_turn("tv", &backend)).unwrap();
        assert!(session.error().is_some());
        let _ = bus.drain();

        block_on(session.run_turn("again", &backend)).unwrap();
        assert!(session.error().is_none());
        assert!(bus.drain().iter().any(|e| matches!(e, SessionEvent::ErrorCleared)));
    }

    #[test]
    fn test_session_dismiss_error() {
        let (mut session, _bus) = new_session();
        let backend = MockBackend::new(vec![Err(RedmerceError::Network("down".into()))]);
        block_on(session.run_turn("tv", &backend)).unwrap();
        session.dismiss_error();
        assert!(session.error().is_none());
        // The log entry stays.
        assert_eq!(session.messages().last().unwrap().role, MessageRole::Error);
    }

    #[test]
    fn test_session_context_excludes_errors_and_current_message() {
        let (mut session, _bus) = new_session();
        let backend = MockBackend::new(vec![
            Ok(tv_reply()),
            Ok(json!({ "error": "rate limited" })),
            Err(RedmerceError::Network("down".into())),
            Ok(json!("fine")),
        ]);
        block_on(session.run_turn("tv", &backend)).unwrap();
        block_on(session.run_turn("cheaper?", &backend)).unwrap();
        block_on(session.run_turn("hello?", &backend)).unwrap();
        block_on(session.run_turn("last one", &backend)).unwrap();

        let sent = backend.sent();
        assert!(sent[0].context.is_none());

        let ctx = sent[3].context.as_ref().unwrap();
        assert_eq!(ctx.original_query, "tv");
        let roles: Vec<HistoryRole> = ctx.chat_history.iter().map(|h| h.role).collect();
        assert_eq!(
            roles,
            vec![HistoryRole::User, HistoryRole::Assistant, HistoryRole::User, HistoryRole::User]
        );
        let contents: Vec<&str> = ctx.chat_history.iter().map(|h| h.content.as_str()).collect();
        assert_eq!(contents, vec!["tv", "Found 2 TVs", "cheaper?", "hello?"]);
        assert!(!contents.contains(&"last one"));
        assert_eq!(ctx.current_products.len(), 2);
    }

    #[test]
    fn test_session_context_wire_shape() {
        let (mut session, _bus) = new_session();
        let backend = MockBackend::new(vec![Ok(tv_reply()), Ok(json!("ok"))]);
        block_on(session.run_turn("tv", &backend)).unwrap();
        block_on(session.run_turn("more", &backend)).unwrap();

        let wire = serde_json::to_value(&backend.sent()[1]).unwrap();
        assert_eq!(wire["message"], "more");
        assert_eq!(wire["context"]["original_query"], "tv");
        assert_eq!(wire["context"]["chat_history"][1]["role"], "assistant");
        assert_eq!(wire["context"]["current_products"][0]["name"], "A");
    }

    #[test]
    fn test_session_timestamps_non_decreasing() {
        let (mut session, _bus) = new_session();
        let backend = MockBackend::new(vec![Ok(json!("a")), Ok(json!("b")), Ok(json!("c"))]);
        for text in ["one", "two", "three"] {
            block_on(session.run_turn(text, &backend)).unwrap();
        }
        let msgs = session.messages();
        assert_eq!(msgs.len(), 6);
        for pair in msgs.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn test_session_rejects_submit_while_busy() {
        let (mut session, _bus) = new_session();
        let turn = session.start("tv").unwrap().unwrap();

        let err = session.submit("another").unwrap_err();
        assert!(matches!(err, RedmerceError::SessionBusy));
        assert_eq!(session.messages().len(), 1);

        assert!(session.settle(turn.ticket, Ok(json!("done"))));
        assert!(session.submit("another").unwrap().is_some());
        assert_eq!(session.state(), SessionState::AwaitingFollowUp);
    }

    #[test]
    fn test_session_start_while_busy_is_rejected() {
        let (mut session, _bus) = new_session();
        let _turn = session.start("tv").unwrap().unwrap();
        assert!(matches!(session.start("laptop"), Err(RedmerceError::SessionBusy)));
        assert_eq!(session.original_query(), Some("tv"));
    }

    #[test]
    fn test_session_stale_reply_after_reset_is_dropped() {
        let (mut session, _bus) = new_session();
        let turn = session.start("tv").unwrap().unwrap();
        session.start("").unwrap();

        assert!(!session.settle(turn.ticket, Ok(tv_reply())));
        assert!(session.messages().is_empty());
        assert!(session.products().is_empty());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_session_submit_after_reset_starts_new_session() {
        let (mut session, _bus) = new_session();
        let turn = session.start("tv").unwrap().unwrap();
        session.settle(turn.ticket, Ok(tv_reply()));
        session.reset();
        assert_eq!(session.state(), SessionState::Idle);

        let turn = session.submit("laptop").unwrap().unwrap();
        assert!(turn.request.context.is_none());
        assert_eq!(session.original_query(), Some("laptop"));
        assert_eq!(session.state(), SessionState::AwaitingFirstReply);
    }

    #[test]
    fn test_session_settle_twice_is_ignored() {
        let (mut session, _bus) = new_session();
        let turn = session.start("tv").unwrap().unwrap();
        assert!(session.settle(turn.ticket, Ok(json!("first"))));
        assert!(!session.settle(turn.ticket, Ok(json!("second"))));
        assert_eq!(session.messages().len(), 2);
    }

    #[test]
    fn test_session_settle_unknown_session() {
        let (mut session, _bus) = new_session();
        let turn = session.start("tv").unwrap().unwrap();
        let forged = TurnTicket {
            session_id: uuid::Uuid::new_v4(),
            turn_id: turn.ticket.turn_id,
        };
        assert!(!session.settle(forged, Ok(json!("x"))));
        assert!(session.is_busy());
    }

    #[test]
    fn test_session_start_replaces_previous_conversation() {
        let (mut session, _bus) = new_session();
        let backend = MockBackend::new(vec![Ok(tv_reply()), Ok(json!("laptops!"))]);
        block_on(session.run_turn("tv", &backend)).unwrap();
        let first_id = session.id();

        let turn = session.start("laptop").unwrap().unwrap();
        assert_ne!(session.id(), first_id);
        assert!(session.products().is_empty());
        assert_eq!(session.messages().len(), 1);
        assert!(turn.request.context.is_none());
    }

    #[test]
    fn test_session_event_sequence() {
        let (mut session, bus) = new_session();
        let backend = MockBackend::new(vec![Ok(json!("hello"))]);
        block_on(session.run_turn("hi", &backend)).unwrap();

        let events = bus.drain();
        assert!(matches!(events[0], SessionEvent::SessionStarted { .. }));
        assert!(matches!(events[1], SessionEvent::TurnStart { turn_id: 1 }));
        assert!(matches!(&events[2], SessionEvent::MessageAppended { message } if message.role == MessageRole::User));
        assert!(matches!(&events[3], SessionEvent::MessageAppended { message } if message.content == "hello"));
        assert!(matches!(events[4], SessionEvent::TurnEnd { turn_id: 1 }));
    }

    #[test]
    fn test_backend_health_port() {
        let backend = MockBackend::new(vec![]);
        let health = block_on(backend.health()).unwrap();
        assert!(health.is_healthy());
        assert_eq!(backend.endpoint(), "mock://backend");
    }

    // ─── Saved Items Tests ───────────────────────────────────

    #[test]
    fn test_saved_items_add_and_dedupe() {
        let saved = SavedItems::new();
        assert!(saved.add(linked("A", "https://shop.example/a")));
        assert!(!saved.add(linked("A again", "https://shop.example/a")));
        assert_eq!(saved.len(), 1);
        assert!(saved.contains("https://shop.example/a"));
    }

    #[test]
    fn test_saved_items_requires_link() {
        let saved = SavedItems::new();
        assert!(!saved.add(Product::named("no link")));
        assert!(saved.is_empty());
    }

    #[test]
    fn test_saved_items_key_follows_link_precedence() {
        let mut p = Product::named("P");
        p.link = Some("https://c".into());
        p.purchase_link = Some("https://b".into());
        assert_eq!(saved_key(&p), Some("https://b"));
        p.url = Some("https://a".into());
        assert_eq!(saved_key(&p), Some("https://a"));
    }

    #[test]
    fn test_saved_items_remove() {
        let saved = SavedItems::new();
        saved.add(linked("A", "https://a"));
        saved.add(linked("B", "https://b"));
        assert!(saved.remove("https://a"));
        assert!(!saved.remove("https://a"));
        let names: Vec<String> = saved.list().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["B"]);
    }

    #[test]
    fn test_saved_items_notifies_subscribers() {
        let saved = SavedItems::new();
        let seen: Rc<RefCell<Vec<SavedItemsChange>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        saved.subscribe(move |change| sink.borrow_mut().push(change.clone()));

        saved.add(linked("A", "https://a"));
        saved.add(linked("A", "https://a"));
        saved.remove("https://a");
        saved.remove("https://missing");

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].kind, SavedItemsChangeKind::Added);
        assert_eq!(seen[0].count, 1);
        assert_eq!(seen[1].kind, SavedItemsChangeKind::Removed);
        assert_eq!(seen[1].url.as_deref(), Some("https://a"));
        assert_eq!(seen[1].count, 0);
    }

    #[test]
    fn test_saved_items_unsubscribe() {
        let saved = SavedItems::new();
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        let id = saved.subscribe(move |_| *counter.borrow_mut() += 1);

        saved.add(linked("A", "https://a"));
        assert!(saved.unsubscribe(id));
        assert!(!saved.unsubscribe(id));
        saved.add(linked("B", "https://b"));
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn test_saved_items_listener_can_read_list() {
        let saved = Rc::new(SavedItems::new());
        let observed = Rc::new(RefCell::new(0));
        let (inner, out) = (Rc::clone(&saved), Rc::clone(&observed));
        saved.subscribe(move |_| *out.borrow_mut() = inner.list().len());

        saved.add(linked("A", "https://a"));
        assert_eq!(*observed.borrow(), 1);
    }

    #[test]
    fn test_saved_items_replace_all_dedupes_and_notifies() {
        let saved = SavedItems::new();
        let kinds = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&kinds);
        saved.subscribe(move |c| sink.borrow_mut().push(c.kind));

        saved.replace_all(vec![
            linked("A", "https://a"),
            linked("A dup", "https://a"),
            Product::named("keyless"),
            linked("B", "https://b"),
        ]);
        assert_eq!(saved.len(), 2);
        assert_eq!(*kinds.borrow(), vec![SavedItemsChangeKind::Loaded]);
    }

    #[test]
    fn test_saved_items_merge_loaded_keeps_early_saves() {
        let saved = SavedItems::new();
        saved.add(linked("Early", "https://early"));
        saved.add(linked("Both", "https://both"));

        let behind = saved.merge_loaded(vec![linked("Stored", "https://stored"), linked("Both", "https://both")]);
        assert!(behind);
        let keys: Vec<String> = saved.list().iter().filter_map(|p| p.url.clone()).collect();
        assert_eq!(keys, vec!["https://stored", "https://both", "https://early"]);
    }

    #[test]
    fn test_saved_items_merge_loaded_without_early_saves() {
        let saved = SavedItems::new();
        assert!(!saved.merge_loaded(vec![linked("Stored", "https://stored")]));
        assert_eq!(saved.len(), 1);
    }

    #[test]
    fn test_saved_items_persist_and_load() {
        let storage = MockStorage::default();
        assert!(block_on(load_saved_items(&storage)).unwrap().is_empty());

        let items = vec![linked("A", "https://a"), linked("B", "https://b")];
        block_on(persist_saved_items(&storage, &items)).unwrap();
        assert!(block_on(storage.get(SAVED_ITEMS_KEY)).unwrap().is_some());

        let loaded = block_on(load_saved_items(&storage)).unwrap();
        assert_eq!(loaded, items);
    }

    #[test]
    fn test_saved_items_load_skips_garbage_entries() {
        let storage = MockStorage::default();
        block_on(storage.set(
            SAVED_ITEMS_KEY,
            br#"[{"name":"A","url":"https://a"}, 5, "x", {"name":"B","image_url":"i.png"}]"#,
        ))
        .unwrap();
        let loaded = block_on(load_saved_items(&storage)).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].image(), Some("i.png"));
    }

    #[test]
    fn test_saved_items_load_corrupt_is_error() {
        let storage = MockStorage::default();
        block_on(storage.set(SAVED_ITEMS_KEY, b"not json")).unwrap();
        assert!(matches!(
            block_on(load_saved_items(&storage)),
            Err(RedmerceError::Serialization(_))
        ));
    }
}
