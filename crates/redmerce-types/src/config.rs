use serde::{Deserialize, Serialize};

use crate::error::RedmerceError;

/// Top-level client configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    pub backend: BackendConfig,
    pub storage: StorageConfig,
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), RedmerceError> {
        self.backend.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    pub chat_path: String,
    pub health_path: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            chat_path: "/api/chat".to_string(),
            health_path: "/health".to_string(),
        }
    }
}

impl BackendConfig {
    pub fn chat_url(&self) -> String {
        join_url(&self.base_url, &self.chat_path)
    }

    pub fn health_url(&self) -> String {
        join_url(&self.base_url, &self.health_path)
    }

    pub fn validate(&self) -> Result<(), RedmerceError> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(RedmerceError::Config("backend URL is empty".to_string()));
        }
        if !(base.starts_with("http://") || base.starts_with("https://") || base.starts_with('/')) {
            return Err(RedmerceError::Config(format!(
                "backend URL must be http(s) or a same-origin path: {}",
                base
            )));
        }
        Ok(())
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim().trim_end_matches('/'),
        path.trim().trim_start_matches('/')
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackendType,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendType::Auto,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackendType {
    /// Auto-detect best available backend
    Auto,
    Memory,
    IndexedDb,
    LocalStorage,
}

impl StorageBackendType {
    pub fn all() -> &'static [StorageBackendType] {
        &[
            StorageBackendType::Auto,
            StorageBackendType::Memory,
            StorageBackendType::IndexedDb,
            StorageBackendType::LocalStorage,
        ]
    }

    pub fn label(&self) -> &str {
        match self {
            StorageBackendType::Auto => "Auto-detect",
            StorageBackendType::Memory => "Memory",
            StorageBackendType::IndexedDb => "IndexedDB",
            StorageBackendType::LocalStorage => "localStorage",
        }
    }

    pub fn description(&self) -> &str {
        match self {
            StorageBackendType::Auto => "Tries localStorage, then IndexedDB, falls back to Memory.",
            StorageBackendType::Memory => "Fast but volatile. Saved items are lost on page reload.",
            StorageBackendType::IndexedDb => "Persistent browser database. Survives reloads and restarts.",
            StorageBackendType::LocalStorage => "Persistent per-origin key-value store. Survives reloads.",
        }
    }
}

const DEFAULT_BACKEND_URL: &str = "http://localhost:5001";
