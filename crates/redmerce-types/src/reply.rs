use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::product::Product;

/// Shown when a product reply carries no text of its own.
pub const PRODUCTS_FALLBACK_MESSAGE: &str = "Here are your product recommendations!";

/// Prefix for errors the backend reports inside a successful response.
pub const UPSTREAM_ERROR_PREFIX: &str = "Sorry, I encountered an error: ";

/// Shown when the backend could not be reached or answered with a non-2xx status.
pub const TRANSPORT_FAILURE_MESSAGE: &str =
    "Sorry, I couldn't reach the shopping assistant. Please try again.";

/// One backend reply, classified by dialect.
///
/// Variants are listed in detection order: when a reply matches several
/// shapes, the earlier variant wins.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendReply {
    /// The body was a bare string
    Text(String),
    /// `{ "status": "success", "products": [...], "response"? }`
    Success {
        response: Option<String>,
        products: Vec<Product>,
    },
    /// `{ "recommendations_ready": true, "products": [...], "message"?, "summary"? }`
    LegacyRecommendations {
        message: Option<String>,
        products: Vec<Product>,
    },
    /// `{ "response": "..." }` with no product payload
    Conversational { response: String },
    /// `{ "error": ... }` inside a 2xx response
    UpstreamError { error: String },
    /// Anything else, kept verbatim for display
    Unrecognized(Value),
}

impl BackendReply {
    pub fn dialect(&self) -> &'static str {
        match self {
            BackendReply::Text(_) => "text",
            BackendReply::Success { .. } => "success",
            BackendReply::LegacyRecommendations { .. } => "legacy_recommendations",
            BackendReply::Conversational { .. } => "conversational",
            BackendReply::UpstreamError { .. } => "upstream_error",
            BackendReply::Unrecognized(_) => "unrecognized",
        }
    }

    pub fn into_normalized(self) -> NormalizedReply {
        match self {
            BackendReply::Text(text) => NormalizedReply::message(text),
            BackendReply::Success { response, products } => NormalizedReply {
                message: response.unwrap_or_else(|| PRODUCTS_FALLBACK_MESSAGE.to_string()),
                products: Some(products),
                is_error: false,
            },
            BackendReply::LegacyRecommendations { message, products } => NormalizedReply {
                message: message.unwrap_or_else(|| PRODUCTS_FALLBACK_MESSAGE.to_string()),
                products: Some(products),
                is_error: false,
            },
            BackendReply::Conversational { response } => NormalizedReply::message(response),
            BackendReply::UpstreamError { error } => NormalizedReply {
                message: format!("{}{}", UPSTREAM_ERROR_PREFIX, error),
                products: None,
                is_error: true,
            },
            BackendReply::Unrecognized(raw) => NormalizedReply::message(raw.to_string()),
        }
    }
}

/// The canonical `{ message, products }` result of one reply
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedReply {
    pub message: String,
    /// `None` means the reply is conversational and must not touch the
    /// products already on display.
    pub products: Option<Vec<Product>>,
    /// The backend reported an error inside an otherwise successful response
    pub is_error: bool,
}

impl NormalizedReply {
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            message: text.into(),
            products: None,
            is_error: false,
        }
    }
}

/// Body of the backend liveness probe (`GET /health`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}
