//! Main egui application — composes the panels and drives the session.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use egui::{self, CentralPanel, SidePanel, TopBottomPanel};

use redmerce_core::event_bus::EventBus;
use redmerce_core::ports::{BackendPort, StoragePort};
use redmerce_core::saved_items::{load_saved_items, persist_saved_items, SavedItems};
use redmerce_core::session::{ConversationSession, PendingTurn};
use redmerce_platform::backend::HttpBackend;
use redmerce_platform::storage::{auto_detect_storage, open_storage};
use redmerce_types::{
    RedmerceError, Result,
    config::{BackendConfig, ClientConfig},
    event::SavedItemsChangeKind,
    reply::HealthStatus,
    request::ChatRequest,
};
use redmerce_ui::panels::products::ProductAction;
use redmerce_ui::panels::settings::{SaveFeedback, SettingsAction};
use redmerce_ui::panels::top_bar::TopBarAction;
use redmerce_ui::panels::{banner, chat, products, saved, settings, top_bar};
use redmerce_ui::state::{BackendHealth, UiState};
use redmerce_ui::theme;

const CONFIG_STORAGE_KEY: &str = "redmerce:config";

type Slot<T> = Rc<RefCell<Option<T>>>;

pub struct RedmerceApp {
    ui_state: UiState,
    config: ClientConfig,
    /// Edited by the settings panel, applied on Save
    draft_config: ClientConfig,
    save_feedback: Option<SaveFeedback>,
    event_bus: EventBus,
    session: Rc<RefCell<ConversationSession>>,
    backend: Rc<dyn BackendPort>,
    saved_items: Rc<SavedItems>,
    saved_changed: Rc<Cell<bool>>,
    /// Holds the configuration; always the auto-detected backend
    config_store: Slot<Rc<dyn StoragePort>>,
    /// Holds the saved list; the backend chosen in settings
    items_store: Slot<Rc<dyn StoragePort>>,
    restored_config: Slot<ClientConfig>,
    health_result: Slot<BackendHealth>,
    first_frame: bool,
}

impl RedmerceApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let config = ClientConfig::default();
        let event_bus: EventBus = EventBus::new();
        let session = ConversationSession::new(event_bus.clone());

        let saved_items = Rc::new(SavedItems::new());
        let saved_changed = Rc::new(Cell::new(false));
        let items_store: Slot<Rc<dyn StoragePort>> = Rc::new(RefCell::new(None));
        Self::persist_on_change(&saved_items, items_store.clone(), saved_changed.clone(), cc.egui_ctx.clone());

        let app = Self {
            ui_state: UiState::new(),
            backend: build_backend(&config.backend),
            draft_config: config.clone(),
            config,
            save_feedback: None,
            event_bus,
            session: Rc::new(RefCell::new(session)),
            saved_items,
            saved_changed,
            config_store: Rc::new(RefCell::new(None)),
            items_store,
            restored_config: Rc::new(RefCell::new(None)),
            health_result: Rc::new(RefCell::new(None)),
            first_frame: true,
        };
        app.bootstrap(cc.egui_ctx.clone());
        app
    }

    /// Every effective change to the saved list is written back to storage
    /// and flagged for the UI snapshot.
    fn persist_on_change(
        saved_items: &Rc<SavedItems>,
        store: Slot<Rc<dyn StoragePort>>,
        changed: Rc<Cell<bool>>,
        ctx: egui::Context,
    ) {
        let items = Rc::downgrade(saved_items);
        saved_items.subscribe(move |change| {
            log::debug!("Saved items {:?}: now {}", change.kind, change.count);
            changed.set(true);
            ctx.request_repaint();

            // A load came from storage; nothing to write back.
            if change.kind == SavedItemsChangeKind::Loaded {
                return;
            }
            let Some(list) = items.upgrade().map(|s| s.list()) else {
                return;
            };
            let Some(storage) = store.borrow().clone() else {
                log::warn!("Storage not ready; saved change not persisted");
                return;
            };
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(e) = persist_saved_items(storage.as_ref(), &list).await {
                    log::error!("Failed to persist saved items: {}", e);
                }
            });
        });
    }

    /// Open storage, restore configuration, then load the saved list from
    /// the configured backend.
    fn bootstrap(&self, ctx: egui::Context) {
        let config_store = self.config_store.clone();
        let items_store = self.items_store.clone();
        let restored = self.restored_config.clone();
        let saved_items = self.saved_items.clone();

        wasm_bindgen_futures::spawn_local(async move {
            let storage = auto_detect_storage().await;
            *config_store.borrow_mut() = Some(storage.clone());

            let config = match restore_config(storage.as_ref()).await {
                Ok(Some(config)) => {
                    log::info!("Config restored from {}", storage.backend_name());
                    *restored.borrow_mut() = Some(config.clone());
                    config
                }
                Ok(None) => ClientConfig::default(),
                Err(e) => {
                    log::warn!("Ignoring stored config: {}", e);
                    ClientConfig::default()
                }
            };

            let items = match open_storage(&config.storage.backend).await {
                Ok(s) => s,
                Err(e) => {
                    log::warn!("{} unavailable ({}), using auto-detected storage", config.storage.backend.label(), e);
                    storage
                }
            };
            *items_store.borrow_mut() = Some(items.clone());

            match load_saved_items(items.as_ref()).await {
                Ok(list) => {
                    log::info!("Loaded {} saved items", list.len());
                    // Saves made before storage opened were never written.
                    if saved_items.merge_loaded(list) {
                        if let Err(e) = persist_saved_items(items.as_ref(), &saved_items.list()).await {
                            log::error!("Failed to persist saved items: {}", e);
                        }
                    }
                }
                Err(e) => log::error!("Failed to load saved items: {}", e),
            }
            ctx.request_repaint();
        });
    }

    fn check_health(&mut self, ctx: &egui::Context) {
        self.ui_state.backend_health = BackendHealth::Checking;
        let backend = self.backend.clone();
        let slot = self.health_result.clone();
        let ctx = ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let probe = backend.health().await.map_err(|e| e.to_string());
            if let Err(e) = &probe {
                log::warn!("Health check against {} failed: {}", backend.endpoint(), e);
            }
            *slot.borrow_mut() = Some(BackendHealth::from_probe(probe));
            ctx.request_repaint();
        });
    }

    /// Apply the draft settings: validate, swap the backend, persist.
    fn save_settings(&mut self, ctx: &egui::Context) {
        if let Err(e) = self.draft_config.validate() {
            self.save_feedback = Some(SaveFeedback::failed(e.to_string()));
            return;
        }
        let storage_changed = self.draft_config.storage != self.config.storage;
        self.apply_config(self.draft_config.clone(), ctx);

        let Some(storage) = self.config_store.borrow().clone() else {
            self.save_feedback = Some(SaveFeedback::failed("Storage is not ready yet"));
            return;
        };
        match serde_json::to_vec(&self.config) {
            Ok(bytes) => {
                wasm_bindgen_futures::spawn_local(async move {
                    match storage.set(CONFIG_STORAGE_KEY, &bytes).await {
                        Ok(()) => log::info!("Config saved to {}", storage.backend_name()),
                        Err(e) => log::error!("Failed to save config: {}", e),
                    }
                });
                let message = if storage_changed { "Saved. Reload to switch storage." } else { "Saved." };
                self.save_feedback = Some(SaveFeedback::ok(message));
            }
            Err(e) => self.save_feedback = Some(SaveFeedback::failed(e.to_string())),
        }
    }

    fn apply_config(&mut self, config: ClientConfig, ctx: &egui::Context) {
        if config.backend != self.config.backend {
            self.backend = build_backend(&config.backend);
            log::info!("Backend endpoint: {}", self.backend.endpoint());
            self.check_health(ctx);
        }
        self.draft_config = config.clone();
        self.config = config;
    }

    /// Start a new session. An empty query resets it.
    fn dispatch_search(&mut self, query: String, ctx: &egui::Context) {
        let turn = self.session.borrow_mut().start(&query);
        self.dispatch(turn, ctx);
    }

    fn dispatch_follow_up(&mut self, text: String, ctx: &egui::Context) {
        let turn = self.session.borrow_mut().submit(&text);
        self.dispatch(turn, ctx);
    }

    /// Send a logged turn and fold the outcome back into the session. The
    /// session is not borrowed while the request is in flight.
    fn dispatch(&mut self, turn: Result<Option<PendingTurn>>, ctx: &egui::Context) {
        let turn = match turn {
            Ok(Some(turn)) => turn,
            Ok(None) => return,
            Err(e) => {
                log::warn!("Turn rejected: {}", e);
                self.ui_state.status_text = e.to_string();
                return;
            }
        };

        let session = self.session.clone();
        let backend = self.backend.clone();
        let ctx = ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let outcome = backend.send_chat(&turn.request).await;
            session.borrow_mut().settle(turn.ticket, outcome);
            ctx.request_repaint();
        });
    }

    fn handle_product_action(&mut self, action: ProductAction) {
        match action {
            ProductAction::Save(product) => {
                self.saved_items.add(product);
            }
            ProductAction::Remove(key) => {
                self.saved_items.remove(&key);
            }
        }
    }
}

impl eframe::App for RedmerceApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.first_frame {
            theme::apply_theme(ctx);
            self.check_health(ctx);
            self.first_frame = false;
        }

        // Results of async work
        let restored = self.restored_config.borrow_mut().take();
        if let Some(config) = restored {
            if let Err(e) = config.validate() {
                log::warn!("Stored config rejected: {}", e);
            } else {
                self.apply_config(config, ctx);
            }
        }
        let health = self.health_result.borrow_mut().take();
        if let Some(health) = health {
            self.ui_state.backend_health = health;
        }
        if self.saved_changed.replace(false) {
            self.ui_state.set_saved(self.saved_items.list());
        }

        if self.event_bus.has_pending() {
            self.ui_state.process_events(self.event_bus.drain());
            ctx.request_repaint();
        }
        if self.ui_state.is_busy() {
            ctx.request_repaint();
        }

        // ── Top bar ──────────────────────────────────────────
        let top_action = TopBottomPanel::top("top_bar")
            .show(ctx, |ui| top_bar::top_bar(ui, &mut self.ui_state))
            .inner;
        match top_action {
            TopBarAction::Search(query) => self.dispatch_search(query, ctx),
            TopBarAction::CheckHealth => self.check_health(ctx),
            TopBarAction::None => {}
        }

        if self.ui_state.error_banner.is_some() {
            let dismissed = TopBottomPanel::top("error_banner")
                .show(ctx, |ui| banner::error_banner(ui, &self.ui_state))
                .inner;
            if dismissed {
                self.session.borrow_mut().dismiss_error();
            }
        }

        // ── Right side: settings or saved items ──────────────
        if self.ui_state.show_settings {
            let action = SidePanel::right("settings_panel")
                .min_width(280.0)
                .max_width(360.0)
                .show(ctx, |ui| {
                    settings::settings_panel(ui, &mut self.draft_config, self.save_feedback.as_ref())
                })
                .inner;
            match action {
                SettingsAction::SaveClicked => self.save_settings(ctx),
                SettingsAction::ResetClicked => {
                    self.draft_config = ClientConfig::default();
                    self.save_feedback = None;
                }
                SettingsAction::Changed => self.save_feedback = None,
                SettingsAction::None => {}
            }
        } else if self.ui_state.show_saved {
            let removed = SidePanel::right("saved_panel")
                .min_width(260.0)
                .max_width(320.0)
                .show(ctx, |ui| saved::saved_panel(ui, &self.ui_state))
                .inner;
            if let Some(key) = removed {
                self.saved_items.remove(&key);
            }
        }

        // ── Chat (left) and products (centre) ────────────────
        let follow_up = SidePanel::left("chat_panel")
            .default_width(380.0)
            .min_width(300.0)
            .show(ctx, |ui| chat::chat_panel(ui, &mut self.ui_state))
            .inner;
        if let Some(text) = follow_up {
            self.dispatch_follow_up(text, ctx);
        }

        let actions = CentralPanel::default()
            .show(ctx, |ui| products::products_panel(ui, &self.ui_state))
            .inner;
        for action in actions {
            self.handle_product_action(action);
        }
    }
}

async fn restore_config(storage: &dyn StoragePort) -> Result<Option<ClientConfig>> {
    match storage.get(CONFIG_STORAGE_KEY).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

fn build_backend(config: &BackendConfig) -> Rc<dyn BackendPort> {
    match HttpBackend::new(config) {
        Ok(backend) => Rc::new(backend),
        Err(e) => {
            log::error!("Backend not configured: {}", e);
            Rc::new(UnconfiguredBackend { reason: e.to_string() })
        }
    }
}

// ─── Stand-in backend for an unusable configuration ──────────

struct UnconfiguredBackend {
    reason: String,
}

#[async_trait::async_trait(?Send)]
impl BackendPort for UnconfiguredBackend {
    async fn send_chat(&self, _req: &ChatRequest) -> Result<serde_json::Value> {
        Err(RedmerceError::Config(self.reason.clone()))
    }

    async fn health(&self) -> Result<HealthStatus> {
        Err(RedmerceError::Config(self.reason.clone()))
    }

    fn endpoint(&self) -> &str {
        "(unconfigured)"
    }
}
