//! JSON-file-backed preference store.

use std::path::PathBuf;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::warn;

use super::{PreferenceStore, StoreResult};

/// Preference store persisted as a single JSON object on disk.
///
/// The whole map is rewritten on every mutation; it only ever holds a
/// handful of keys. Write failures are logged and the in-memory view stays
/// authoritative for the rest of the process lifetime.
pub struct JsonFileStore {
    path: PathBuf,
    values: RwLock<Map<String, Value>>,
}

impl JsonFileStore {
    /// Open a store at the given path, loading any existing contents.
    ///
    /// An unreadable or corrupted file is logged and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let values = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(map)) => map,
                Ok(_) | Err(_) => {
                    warn!(path = %path.display(), "Preference file is not a JSON object; starting empty");
                    Map::new()
                }
            }
        } else {
            Map::new()
        };

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    /// Path this store persists to.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn persist(&self, values: &Map<String, Value>) {
        let json = match serde_json::to_string_pretty(&Value::Object(values.clone())) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize preferences");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, json) {
            warn!(path = %self.path.display(), error = %e, "Failed to persist preferences");
        }
    }
}

impl PreferenceStore for JsonFileStore {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .get(key)
            .and_then(|value| value.as_str().map(String::from))
    }

    fn put_string(&self, key: &str, value: &str) {
        let mut values = self.values.write();
        values.insert(key.to_string(), Value::String(value.to_string()));
        self.persist(&values);
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.values
            .read()
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(default)
    }

    fn put_bool(&self, key: &str, value: bool) {
        let mut values = self.values.write();
        values.insert(key.to_string(), Value::Bool(value));
        self.persist(&values);
    }

    fn remove(&self, key: &str) {
        let mut values = self.values.write();
        values.remove(key);
        self.persist(&values);
    }
}
