//! UI-level state that drives rendering.
//! A read-only projection of the conversation session, updated each frame
//! from drained events, plus the widget state the panels edit.

use redmerce_core::saved_items::saved_key;
use redmerce_types::event::SessionEvent;
use redmerce_types::message::ChatMessage;
use redmerce_types::product::Product;
use redmerce_types::reply::HealthStatus;

/// Result of the last backend liveness probe
#[derive(Debug, Clone, PartialEq)]
pub enum BackendHealth {
    Unknown,
    Checking,
    Healthy { service: Option<String> },
    Unhealthy { status: String },
    Unreachable { reason: String },
}

impl BackendHealth {
    pub fn from_probe(result: Result<HealthStatus, String>) -> Self {
        match result {
            Ok(h) if h.is_healthy() => BackendHealth::Healthy { service: h.service },
            Ok(h) => BackendHealth::Unhealthy { status: h.status },
            Err(reason) => BackendHealth::Unreachable { reason },
        }
    }

    pub fn label(&self) -> String {
        match self {
            BackendHealth::Unknown => "Backend: unknown".to_string(),
            BackendHealth::Checking => "Backend: checking…".to_string(),
            BackendHealth::Healthy { service: Some(s) } => format!("Backend: online ({})", s),
            BackendHealth::Healthy { service: None } => "Backend: online".to_string(),
            BackendHealth::Unhealthy { status } => format!("Backend: {}", status),
            BackendHealth::Unreachable { .. } => "Backend: offline".to_string(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, BackendHealth::Healthy { .. })
    }
}

/// State visible to UI panels
pub struct UiState {
    /// Conversation log, mirrored from the session
    pub messages: Vec<ChatMessage>,
    /// Products currently on display
    pub products: Vec<Product>,
    pub original_query: Option<String>,
    /// A reply is pending; input is disabled
    pub busy: bool,
    pub status_text: String,
    /// Dismissible transport-failure banner
    pub error_banner: Option<String>,
    /// Follow-up input field
    pub input_text: String,
    /// New-search field in the top bar
    pub search_text: String,
    pub show_settings: bool,
    pub show_saved: bool,
    /// Snapshot of the saved list, refreshed on change notifications
    pub saved: Vec<Product>,
    pub backend_health: BackendHealth,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            products: Vec::new(),
            original_query: None,
            busy: false,
            status_text: "Ready".to_string(),
            error_banner: None,
            input_text: String::new(),
            search_text: String::new(),
            show_settings: false,
            show_saved: false,
            saved: Vec::new(),
            backend_health: BackendHealth::Unknown,
        }
    }

    /// Fold drained session events into the display state
    pub fn process_events(&mut self, events: Vec<SessionEvent>) {
        for event in events {
            match event {
                SessionEvent::SessionStarted { original_query, .. } => {
                    self.messages.clear();
                    self.products.clear();
                    self.error_banner = None;
                    self.original_query = Some(original_query);
                }
                SessionEvent::SessionReset => {
                    self.messages.clear();
                    self.products.clear();
                    self.error_banner = None;
                    self.original_query = None;
                    self.busy = false;
                    self.status_text = "Ready".to_string();
                }
                SessionEvent::TurnStart { .. } => {
                    self.busy = true;
                    self.status_text = "Looking for products...".to_string();
                }
                SessionEvent::MessageAppended { message } => {
                    self.messages.push(message);
                }
                SessionEvent::ProductsReplaced { products } => {
                    self.status_text = format!("{} products", products.len());
                    self.products = products;
                }
                SessionEvent::TurnEnd { .. } => {
                    self.busy = false;
                    if self.status_text.starts_with("Looking") {
                        self.status_text = "Ready".to_string();
                    }
                }
                SessionEvent::SessionError { message } => {
                    self.status_text = "Request failed".to_string();
                    self.error_banner = Some(message);
                }
                SessionEvent::ErrorCleared => {
                    self.error_banner = None;
                }
            }
        }
    }

    /// Replace the saved-list snapshot
    pub fn set_saved(&mut self, saved: Vec<Product>) {
        self.saved = saved;
    }

    pub fn saved_count(&self) -> usize {
        self.saved.len()
    }

    pub fn is_saved(&self, product: &Product) -> bool {
        match saved_key(product) {
            Some(key) => self.saved.iter().any(|p| saved_key(p) == Some(key)),
            None => false,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// True before the first query of a session has been sent
    pub fn is_landing(&self) -> bool {
        self.original_query.is_none()
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}
