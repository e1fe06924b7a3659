//! IndexedDB backend: one object store of byte values keyed by string.
//!
//! Requests are callback based; [`settle`] turns one into a promise so it
//! can be awaited through `JsFuture`.

use async_trait::async_trait;
use js_sys::{Promise, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{IdbDatabase, IdbObjectStore, IdbRequest, IdbTransactionMode};

use redmerce_core::ports::StoragePort;
use redmerce_types::{RedmerceError, Result};

const DB_NAME: &str = "redmerce_storage";
const STORE_NAME: &str = "kv";
const DB_VERSION: u32 = 1;

pub struct IndexedDbStorage {
    db: IdbDatabase,
}

impl IndexedDbStorage {
    pub async fn open() -> Result<Self> {
        let factory = web_sys::window()
            .ok_or_else(|| RedmerceError::Storage("No window object".to_string()))?
            .indexed_db()
            .map_err(js_err)?
            .ok_or_else(|| RedmerceError::Storage("IndexedDB not available".to_string()))?;

        let open_req = factory.open_with_u32(DB_NAME, DB_VERSION).map_err(js_err)?;

        // First open (or version bump): create the store.
        let upgrading = open_req.clone();
        let on_upgrade = Closure::once(move |_: web_sys::Event| {
            let db = upgrading
                .result()
                .ok()
                .and_then(|r| r.dyn_into::<IdbDatabase>().ok());
            match db {
                Some(db) if !db.object_store_names().contains(STORE_NAME) => {
                    if let Err(e) = db.create_object_store(STORE_NAME) {
                        log::error!("Failed to create object store: {:?}", e);
                    }
                }
                Some(_) => {}
                None => log::error!("IndexedDB upgrade without a database handle"),
            }
        });
        open_req.set_onupgradeneeded(Some(on_upgrade.as_ref().unchecked_ref()));
        on_upgrade.forget();

        let db = JsFuture::from(settle(&open_req))
            .await
            .map_err(js_err)?
            .dyn_into::<IdbDatabase>()
            .map_err(js_err)?;
        log::debug!("Opened IndexedDB '{}' v{}", DB_NAME, DB_VERSION);
        Ok(Self { db })
    }

    fn store(&self, mode: IdbTransactionMode) -> Result<IdbObjectStore> {
        self.db
            .transaction_with_str_and_mode(STORE_NAME, mode)
            .and_then(|tx| tx.object_store(STORE_NAME))
            .map_err(js_err)
    }
}

#[async_trait(?Send)]
impl StoragePort for IndexedDbStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let req = self
            .store(IdbTransactionMode::Readonly)?
            .get(&JsValue::from_str(key))
            .map_err(js_err)?;
        let value = JsFuture::from(settle(&req)).await.map_err(js_err)?;

        if value.is_undefined() || value.is_null() {
            Ok(None)
        } else {
            Ok(Some(Uint8Array::new(&value).to_vec()))
        }
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let req = self
            .store(IdbTransactionMode::Readwrite)?
            .put_with_key(&Uint8Array::from(value), &JsValue::from_str(key))
            .map_err(js_err)?;
        JsFuture::from(settle(&req)).await.map_err(js_err)?;
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "indexeddb"
    }
}

/// Promise resolving with the request's result, or rejecting on its error event.
fn settle(req: &IdbRequest) -> Promise {
    let req = req.clone();
    Promise::new(&mut move |resolve, reject| {
        let done = req.clone();
        let on_success = Closure::once(move |_: web_sys::Event| {
            let result = done.result().unwrap_or(JsValue::UNDEFINED);
            let _ = resolve.call1(&JsValue::NULL, &result);
        });
        let on_error = Closure::once(move |_: web_sys::Event| {
            let _ = reject.call1(&JsValue::NULL, &JsValue::from_str("IndexedDB request failed"));
        });
        req.set_onsuccess(Some(on_success.as_ref().unchecked_ref()));
        req.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        on_success.forget();
        on_error.forget();
    })
}

fn js_err(e: JsValue) -> RedmerceError {
    RedmerceError::Storage(format!("{:?}", e))
}
