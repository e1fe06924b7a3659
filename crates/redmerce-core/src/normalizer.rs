//! Reply normalizer — classifies a raw backend reply into a dialect.
//!
//! The backend has shipped two product-reply formats (`status: "success"`
//! and the older `recommendations_ready` flag), and both may carry a generic
//! `response` field. Detection therefore runs in a fixed order, most
//! specific first:
//!
//! 1. bare string
//! 2. `status == "success"` with a `products` array
//! 3. truthy `recommendations_ready` with a `products` array
//! 4. non-empty `response` string
//! 5. truthy `error`
//! 6. anything else (shown verbatim)

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use redmerce_types::{
    product::Product,
    reply::{BackendReply, NormalizedReply},
};

/// Classify and map a reply in one step.
pub fn normalize(raw: Value) -> NormalizedReply {
    let reply = classify(raw);
    log::debug!("Backend reply dialect: {}", reply.dialect());

    // Unrecognized replies are shown verbatim, so only upstream errors are masked.
    let is_upstream_error = matches!(reply, BackendReply::UpstreamError { .. });
    let mut normalized = reply.into_normalized();
    if is_upstream_error {
        normalized.message = redact_secrets(&normalized.message);
    }
    normalized
}

/// Decide which dialect a reply is written in.
pub fn classify(raw: Value) -> BackendReply {
    let obj = match raw {
        Value::String(text) if !text.trim().is_empty() => return BackendReply::Text(text),
        Value::Object(obj) => obj,
        other => return BackendReply::Unrecognized(other),
    };

    if obj.get("status").and_then(Value::as_str) == Some("success") {
        if let Some(items) = obj.get("products").and_then(Value::as_array) {
            return BackendReply::Success {
                response: non_empty_str(&obj, "response"),
                products: parse_products(items),
            };
        }
    }

    if obj.get("recommendations_ready").is_some_and(is_truthy) {
        if let Some(items) = obj.get("products").and_then(Value::as_array) {
            return BackendReply::LegacyRecommendations {
                message: non_empty_str(&obj, "message").or_else(|| non_empty_str(&obj, "summary")),
                products: parse_products(items),
            };
        }
    }

    if let Some(response) = non_empty_str(&obj, "response") {
        return BackendReply::Conversational { response };
    }

    if let Some(error) = obj.get("error").filter(|e| is_truthy(e)) {
        let error = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return BackendReply::UpstreamError { error };
    }

    BackendReply::Unrecognized(Value::Object(obj))
}

/// Turn a reply body into a JSON value. Bodies that do not parse are the
/// bare-string dialect.
pub fn parse_reply_body(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

/// Convert a `products` array element-wise, skipping entries that are not
/// objects.
pub fn parse_products(items: &[Value]) -> Vec<Product> {
    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let product = Product::from_value(item.clone());
            if product.is_none() {
                log::warn!("Skipping product #{}: expected an object, got {}", i, item);
            }
            product
        })
        .collect()
}

/// Mask credentials that upstream error strings sometimes echo back
/// (e.g. a failed search URL with `api_key=` in its query string).
pub fn redact_secrets(text: &str) -> String {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)(api[_-]?key|password|token|secret)[=:]\s*[^\s&,;"'}\]]+"#).ok()
    });
    match pattern {
        Some(re) => re.replace_all(text, "[REDACTED]").into_owned(),
        None => text.to_string(),
    }
}

/// JavaScript truthiness, which is what the backend contract was written against.
fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn non_empty_str(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}
