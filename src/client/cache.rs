use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::RwLock;

/// Read cache keyed by route path.
///
/// Values are kept as raw JSON so one cache serves every response type.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: RwLock<HashMap<String, Value>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn put(&self, key: &str, value: Value) {
        self.entries.write().await.insert(key.to_string(), value);
    }

    /// Drop `key` and every key nested under it (`/api/doctors` also drops `/api/doctors/3`)
    pub async fn invalidate(&self, key: &str) {
        let nested = format!("{}/", key);
        self.entries
            .write()
            .await
            .retain(|k, _| k != key && !k.starts_with(&nested));
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }
}
