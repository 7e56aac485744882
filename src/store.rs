use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// An in-memory key-value store shared by every handler on a node.
///
/// Values are opaque byte payloads; the store never interprets them. Each
/// operation takes the lock exactly once, so a reader can never observe a
/// half-applied write.
#[derive(Debug, Clone, Default)]
pub struct Store {
    data: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl Store {
    pub fn new() -> Store {
        Store::default()
    }

    /// Insert or replace the value for a key. Never fails.
    pub fn set(&self, key: String, value: Vec<u8>) {
        self.data.lock().unwrap().insert(key, value);
    }

    /// Retrieve the value of a key from the store.
    /// If the key does not exist, then [`None`] is returned.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.data.lock().unwrap().get(key).cloned()
    }

    /// Full copy of the store taken under a single lock acquisition.
    ///
    /// The returned map is detached from live state, so the caller can iterate
    /// it without holding anything and without seeing concurrent mutation.
    pub fn snapshot(&self) -> HashMap<String, Vec<u8>> {
        self.data.lock().unwrap().clone()
    }
}
