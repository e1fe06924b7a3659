//! Storage backend selection.
//!
//! Auto-detect priority: localStorage → IndexedDB → Memory.

use std::rc::Rc;
use redmerce_core::ports::StoragePort;
use redmerce_types::{Result, config::StorageBackendType};
use super::{IndexedDbStorage, LocalStorage, MemoryStorage};

/// Open the first persistent backend the browser offers, falling back to
/// memory. Never fails; the fallback is logged.
pub async fn auto_detect_storage() -> Rc<dyn StoragePort> {
    match LocalStorage::open() {
        Ok(local) => {
            log::info!("Storage backend: localStorage");
            return Rc::new(local);
        }
        Err(e) => log::warn!("localStorage unavailable ({}), trying IndexedDB", e),
    }
    match IndexedDbStorage::open().await {
        Ok(idb) => {
            log::info!("Storage backend: IndexedDB");
            Rc::new(idb)
        }
        Err(e) => {
            log::warn!("IndexedDB unavailable ({}), falling back to memory", e);
            Rc::new(MemoryStorage::new())
        }
    }
}

/// Open the backend named in configuration. An explicit choice that cannot
/// be opened is an error rather than a silent fallback.
pub async fn open_storage(kind: &StorageBackendType) -> Result<Rc<dyn StoragePort>> {
    let storage: Rc<dyn StoragePort> = match kind {
        StorageBackendType::Auto => return Ok(auto_detect_storage().await),
        StorageBackendType::Memory => Rc::new(MemoryStorage::new()),
        StorageBackendType::LocalStorage => Rc::new(LocalStorage::open()?),
        StorageBackendType::IndexedDb => Rc::new(IndexedDbStorage::open().await?),
    };
    log::info!("Storage backend: {}", storage.backend_name());
    Ok(storage)
}
