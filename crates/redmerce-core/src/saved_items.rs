//! Saved items — products the user bookmarked, keyed by purchase link.
//!
//! Anything that shows saved state (the header badge, the saved panel, the
//! persistence writer) subscribes here instead of listening for a global
//! broadcast. Subscribers are called after every effective change, with no
//! internal borrow held, so a callback may read the list again.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::Value;
use redmerce_types::{
    RedmerceError, Result,
    event::{SavedItemsChange, SavedItemsChangeKind},
    product::Product,
};
use crate::ports::StoragePort;

/// Storage key for the persisted list
pub const SAVED_ITEMS_KEY: &str = "redmerce:saved_items";

pub type SubscriptionId = u64;

type Listener = Rc<dyn Fn(&SavedItemsChange)>;

pub struct SavedItems {
    items: RefCell<Vec<Product>>,
    listeners: RefCell<Vec<(SubscriptionId, Listener)>>,
    next_id: Cell<SubscriptionId>,
}

/// Uniqueness key of a saved product. Products without a link cannot be saved.
pub fn saved_key(product: &Product) -> Option<&str> {
    product.purchase_link()
}

impl SavedItems {
    pub fn new() -> Self {
        Self {
            items: RefCell::new(Vec::new()),
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        }
    }

    /// Save a product. No-op (returns `false`) if one with the same key is
    /// already saved or the product has no link.
    pub fn add(&self, product: Product) -> bool {
        let Some(url) = saved_key(&product).map(str::to_string) else {
            log::warn!("Cannot save '{}': product has no link", product.name);
            return false;
        };
        if self.contains(&url) {
            return false;
        }
        let count = {
            let mut items = self.items.borrow_mut();
            items.push(product);
            items.len()
        };
        self.notify(SavedItemsChange {
            kind: SavedItemsChangeKind::Added,
            url: Some(url),
            count,
        });
        true
    }

    pub fn remove(&self, url: &str) -> bool {
        let count = {
            let mut items = self.items.borrow_mut();
            let before = items.len();
            items.retain(|p| saved_key(p) != Some(url));
            if items.len() == before {
                return false;
            }
            items.len()
        };
        self.notify(SavedItemsChange {
            kind: SavedItemsChangeKind::Removed,
            url: Some(url.to_string()),
            count,
        });
        true
    }

    /// Replace the whole list, e.g. with what was loaded from storage.
    /// Duplicates and keyless products are dropped.
    pub fn replace_all(&self, products: Vec<Product>) {
        let count = {
            let mut items = self.items.borrow_mut();
            items.clear();
            for product in products {
                let Some(key) = saved_key(&product) else {
                    continue;
                };
                if !items.iter().any(|p| saved_key(p) == Some(key)) {
                    items.push(product);
                }
            }
            items.len()
        };
        self.notify(SavedItemsChange {
            kind: SavedItemsChangeKind::Loaded,
            url: None,
            count,
        });
    }

    /// Fold a stored list under what is already held. Items saved before the
    /// load finished are kept after the stored ones. Returns `true` when such
    /// items survived, meaning storage is now behind and should be rewritten.
    pub fn merge_loaded(&self, stored: Vec<Product>) -> bool {
        let pending: Vec<Product> = self
            .list()
            .into_iter()
            .filter(|p| !stored.iter().any(|s| saved_key(s) == saved_key(p)))
            .collect();
        let behind = !pending.is_empty();
        self.replace_all(stored.into_iter().chain(pending).collect());
        behind
    }

    pub fn contains(&self, url: &str) -> bool {
        self.items.borrow().iter().any(|p| saved_key(p) == Some(url))
    }

    pub fn list(&self) -> Vec<Product> {
        self.items.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub fn subscribe(&self, listener: impl Fn(&SavedItemsChange) + 'static) -> SubscriptionId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    fn notify(&self, change: SavedItemsChange) {
        // Snapshot so listeners can subscribe/unsubscribe while being called.
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in listeners {
            listener(&change);
        }
    }
}

impl Default for SavedItems {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Persistence ─────────────────────────────────────────────

/// Load the saved list. A missing key is an empty list.
pub async fn load_saved_items(storage: &dyn StoragePort) -> Result<Vec<Product>> {
    let Some(bytes) = storage.get(SAVED_ITEMS_KEY).await? else {
        return Ok(Vec::new());
    };
    let values: Vec<Value> = serde_json::from_slice(&bytes)?;
    Ok(values.into_iter().filter_map(Product::from_value).collect())
}

pub async fn persist_saved_items(storage: &dyn StoragePort, items: &[Product]) -> Result<()> {
    let bytes = serde_json::to_vec(items)
        .map_err(|e| RedmerceError::Serialization(e.to_string()))?;
    storage.set(SAVED_ITEMS_KEY, &bytes).await
}
