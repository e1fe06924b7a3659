//! Volatile key-value store. Used when nothing persistent is available and
//! in tests; everything is gone after a reload.

use std::cell::RefCell;
use std::collections::BTreeMap;
use async_trait::async_trait;
use redmerce_core::ports::StoragePort;
use redmerce_types::Result;

#[derive(Default)]
pub struct MemoryStorage {
    entries: RefCell<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait(?Send)]
impl StoragePort for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
