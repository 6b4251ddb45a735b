//! In-memory preference store for tests and demos.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::PreferenceStore;

/// Volatile store with the same contract as the durable implementations.
#[derive(Default)]
pub struct MemoryStore {
    strings: RwLock<HashMap<String, String>>,
    bools: RwLock<HashMap<String, bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get_string(&self, key: &str) -> Option<String> {
        self.strings.read().get(key).cloned()
    }

    fn put_string(&self, key: &str, value: &str) {
        self.strings
            .write()
            .insert(key.to_string(), value.to_string());
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.bools.read().get(key).copied().unwrap_or(default)
    }

    fn put_bool(&self, key: &str, value: bool) {
        self.bools.write().insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.strings.write().remove(key);
        self.bools.write().remove(key);
    }
}
