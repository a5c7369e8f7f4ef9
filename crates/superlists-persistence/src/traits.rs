use async_trait::async_trait;
use serde_json::{Map, Value};
use superlists_core::SuperListsResult;

/// A flat JSON object: top-level keys map to stored values.
pub type StoreMap = Map<String, Value>;

/// External key-value storage, shaped like a browser extension's local storage.
/// Implementations decide where the blob lives; callers never assume ordering
/// between keys.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the entries present for `keys`; missing keys are omitted.
    async fn get(&self, keys: &[String]) -> SuperListsResult<StoreMap>;

    /// Inserts or replaces every entry of `entries`.
    async fn set(&self, entries: StoreMap) -> SuperListsResult<()>;

    async fn remove(&self, key: &str) -> SuperListsResult<()>;

    async fn clear(&self) -> SuperListsResult<()>;
}
