//! HTTP adapter for the recommendation backend.
//!
//! `POST {base}/api/chat` carries one turn, `GET {base}/health` is the
//! liveness probe. Uses browser `fetch()` via gloo-net.

use async_trait::async_trait;
use gloo_net::http::{Request, Response};
use serde_json::Value;

use redmerce_core::normalizer::parse_reply_body;
use redmerce_core::ports::BackendPort;
use redmerce_types::{
    Result, RedmerceError,
    config::BackendConfig,
    reply::HealthStatus,
    request::ChatRequest,
};

pub struct HttpBackend {
    base_url: String,
    chat_url: String,
    health_url: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            base_url: config.base_url.trim().to_string(),
            chat_url: config.chat_url(),
            health_url: config.health_url(),
        })
    }
}

#[async_trait(?Send)]
impl BackendPort for HttpBackend {
    async fn send_chat(&self, req: &ChatRequest) -> Result<Value> {
        req.validate()?;
        log::debug!(
            "POST {} (history: {})",
            self.chat_url,
            req.context.as_ref().map_or(0, |c| c.chat_history.len())
        );

        let response = Request::post(&self.chat_url)
            .header("Content-Type", "application/json")
            .json(req)
            .map_err(|e| RedmerceError::Serialization(e.to_string()))?
            .send()
            .await
            .map_err(|e| RedmerceError::Network(e.to_string()))?;

        let body = ok_body(response).await?;
        Ok(parse_reply_body(&body))
    }

    async fn health(&self) -> Result<HealthStatus> {
        let response = Request::get(&self.health_url)
            .send()
            .await
            .map_err(|e| RedmerceError::Network(e.to_string()))?;

        let body = ok_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }
}

/// Body text of a 2xx response, or an `Http` error carrying the status.
async fn ok_body(response: Response) -> Result<String> {
    if !response.ok() {
        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        return Err(RedmerceError::Http {
            status,
            body: error_detail(&text),
        });
    }
    response
        .text()
        .await
        .map_err(|e| RedmerceError::Network(e.to_string()))
}

/// The backend answers 4xx/5xx with `{"error": "..."}`; prefer that message
/// over the raw body.
pub fn error_detail(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(obj)) => match obj.get("error") {
            Some(Value::String(msg)) => msg.clone(),
            _ => body.trim().to_string(),
        },
        _ => body.trim().to_string(),
    }
}
