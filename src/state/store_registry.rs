use std::sync::Arc;

use dashmap::DashMap;

use crate::types::Store;

/// Registry of linked seller accounts, keyed by store id. An explicit
/// object handed to whoever needs it; the only process-wide state in the
/// pipeline, and the entries themselves are immutable once inserted
/// (re-registering the same id replaces the entry wholesale).
pub struct StoreRegistry {
    stores: DashMap<String, Store>,
}

impl StoreRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            stores: DashMap::new(),
        })
    }

    pub fn add(&self, store: Store) {
        self.stores.insert(store.id.clone(), store);
    }

    pub fn get(&self, store_id: &str) -> Option<Store> {
        self.stores.get(store_id).map(|s| s.clone())
    }

    /// Access token for a linked store, if any. The orchestrator gates on
    /// this before touching the network.
    pub fn token_for(&self, store_id: &str) -> Option<String> {
        self.stores.get(store_id).map(|s| s.token.clone())
    }

    pub fn list(&self) -> Vec<Store> {
        self.stores.iter().map(|s| s.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self {
            stores: DashMap::new(),
        }
    }
}
