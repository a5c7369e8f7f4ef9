use crate::store::atomic_writer::AtomicWriter;
use crate::traits::{KeyValueStore, StoreMap};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use superlists_core::{SuperListsError, SuperListsResult};
use tokio::sync::Mutex;

/// Keeps the whole key space as one pretty-printed JSON object on disk.
///
/// Every write is read-modify-write under a lock and lands atomically.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> SuperListsResult<StoreMap> {
        let Some(bytes) = AtomicWriter::read_optional(&self.path).await? else {
            return Ok(StoreMap::new());
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(StoreMap::new());
        }
        match serde_json::from_slice::<Value>(&bytes)
            .map_err(|e| SuperListsError::Serialization(e.to_string()))?
        {
            Value::Object(map) => Ok(map),
            other => Err(SuperListsError::Storage(format!(
                "{} does not hold a JSON object (found {})",
                self.path.display(),
                type_name(&other)
            ))),
        }
    }

    async fn write(&self, entries: &StoreMap) -> SuperListsResult<()> {
        let bytes = serde_json::to_vec_pretty(entries)
            .map_err(|e| SuperListsError::Serialization(e.to_string()))?;
        AtomicWriter::write_atomic(&self.path, &bytes).await?;
        tracing::info!("Saved {} keys to {}", entries.len(), self.path.display());
        Ok(())
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, keys: &[String]) -> SuperListsResult<StoreMap> {
        let _guard = self.lock.lock().await;
        let mut all = self.read().await?;
        Ok(keys
            .iter()
            .filter_map(|key| all.remove(key).map(|value| (key.clone(), value)))
            .collect())
    }

    async fn set(&self, entries: StoreMap) -> SuperListsResult<()> {
        let _guard = self.lock.lock().await;
        let mut all = self.read().await?;
        all.extend(entries);
        self.write(&all).await
    }

    async fn remove(&self, key: &str) -> SuperListsResult<()> {
        let _guard = self.lock.lock().await;
        let mut all = self.read().await?;
        if all.remove(key).is_some() {
            self.write(&all).await?;
        }
        Ok(())
    }

    async fn clear(&self) -> SuperListsResult<()> {
        let _guard = self.lock.lock().await;
        self.write(&StoreMap::new()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_entries_survive_a_new_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("superlists.json");

        let store = JsonFileStore::new(&path);
        let mut entries = StoreMap::new();
        entries.insert("board1".into(), json!({"Todo": {"collapsed": true}}));
        entries.insert("settings".into(), json!({"sectionRepeat": 2}));
        store.set(entries).await.unwrap();
        store.remove("settings").await.unwrap();

        let reopened = JsonFileStore::new(&path);
        let got = reopened
            .get(&["board1".to_string(), "settings".to_string()])
            .await
            .unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got["board1"]["Todo"]["collapsed"], json!(true));
    }

    #[tokio::test]
    async fn test_missing_or_empty_file_is_empty_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.json");
        let store = JsonFileStore::new(&path);
        assert!(store.get(&["x".to_string()]).await.unwrap().is_empty());

        tokio::fs::write(&path, b"  \n").await.unwrap();
        assert!(store.get(&["x".to_string()]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_object_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        tokio::fs::write(&path, b"[1, 2]").await.unwrap();
        let store = JsonFileStore::new(&path);
        assert!(matches!(
            store.get(&["x".to_string()]).await,
            Err(SuperListsError::Storage(_))
        ));

        tokio::fs::write(&path, b"{not json").await.unwrap();
        assert!(matches!(
            store.get(&["x".to_string()]).await,
            Err(SuperListsError::Serialization(_))
        ));
    }
}
