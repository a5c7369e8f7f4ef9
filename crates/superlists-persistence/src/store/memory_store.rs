use crate::traits::{KeyValueStore, StoreMap};
use async_trait::async_trait;
use parking_lot::Mutex;
use superlists_core::SuperListsResult;

/// In-process store, used by tests and by the CLI when no file is given.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<StoreMap>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: StoreMap) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    pub fn snapshot(&self) -> StoreMap {
        self.entries.lock().clone()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, keys: &[String]) -> SuperListsResult<StoreMap> {
        let entries = self.entries.lock();
        Ok(keys
            .iter()
            .filter_map(|key| entries.get(key).map(|value| (key.clone(), value.clone())))
            .collect())
    }

    async fn set(&self, entries: StoreMap) -> SuperListsResult<()> {
        self.entries.lock().extend(entries);
        Ok(())
    }

    async fn remove(&self, key: &str) -> SuperListsResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }

    async fn clear(&self) -> SuperListsResult<()> {
        self.entries.lock().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_set_remove_clear() {
        let store = MemoryStore::new();
        let mut entries = StoreMap::new();
        entries.insert("a".into(), json!(1));
        entries.insert("b".into(), json!({"x": true}));
        store.set(entries).await.unwrap();

        let got = store
            .get(&["a".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got["a"], json!(1));

        store.remove("a").await.unwrap();
        assert_eq!(store.snapshot().len(), 1);
        store.clear().await.unwrap();
        assert!(store.snapshot().is_empty());
    }
}
