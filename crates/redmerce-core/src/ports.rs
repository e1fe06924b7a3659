//! Ports between the conversation core and the outside world.
//!
//! Browser implementations live in `redmerce-platform`; tests supply mocks.
//! Nothing in this crate depends on the platform crate.

use async_trait::async_trait;
use serde_json::Value;
use redmerce_types::{
    Result,
    reply::HealthStatus,
    request::ChatRequest,
};

// ─── Backend Port ────────────────────────────────────────────

#[async_trait(?Send)]
pub trait BackendPort {
    /// Send one chat turn and return the raw reply body.
    ///
    /// A body that is not JSON comes back as `Value::String`. Network
    /// failures and non-2xx statuses are errors; the shape of a 2xx body is
    /// never an error here.
    async fn send_chat(&self, req: &ChatRequest) -> Result<Value>;

    /// Liveness probe; not part of the conversation protocol.
    async fn health(&self) -> Result<HealthStatus>;

    /// Base URL this backend talks to (for logging/debug)
    fn endpoint(&self) -> &str;
}

// ─── Storage Port ────────────────────────────────────────────

/// Byte-valued key-value store. Holds the client configuration and the
/// saved-items list; values are JSON.
#[async_trait(?Send)]
pub trait StoragePort {
    /// `None` if the key was never written
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Short identifier used in logs and settings feedback
    fn backend_name(&self) -> &str;
}
