//! `window.localStorage` backend.
//!
//! Synchronous under the hood and limited to a few MB per origin, which is
//! plenty for configuration and the saved list. Values must be UTF-8 since
//! localStorage only holds strings; everything this client stores is JSON.

use async_trait::async_trait;
use web_sys::Storage;

use redmerce_core::ports::StoragePort;
use redmerce_types::{RedmerceError, Result};

pub struct LocalStorage {
    storage: Storage,
}

impl LocalStorage {
    pub fn open() -> Result<Self> {
        let window = web_sys::window()
            .ok_or_else(|| RedmerceError::Storage("No window object".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|e| RedmerceError::Storage(format!("{:?}", e)))?
            .ok_or_else(|| RedmerceError::Storage("localStorage not available".to_string()))?;
        Ok(Self { storage })
    }
}

#[async_trait(?Send)]
impl StoragePort for LocalStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.storage
            .get_item(key)
            .map(|v| v.map(String::into_bytes))
            .map_err(|e| RedmerceError::Storage(format!("{:?}", e)))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let text = std::str::from_utf8(value)
            .map_err(|e| RedmerceError::Storage(format!("value for '{}' is not UTF-8: {}", key, e)))?;
        // Fails when the origin quota is exhausted.
        self.storage
            .set_item(key, text)
            .map_err(|e| RedmerceError::Storage(format!("{:?}", e)))
    }

    fn backend_name(&self) -> &str {
        "localstorage"
    }
}
