use crate::traits::{KeyValueStore, StoreMap};
use superlists_core::{Settings, SuperListsError, SuperListsResult};

/// Key of the global settings entry.
pub const SETTINGS_KEY: &str = "settings";

/// Reads the stored settings. A missing, unreadable or invalid entry yields
/// `fallback`.
pub async fn load_settings(store: &dyn KeyValueStore, fallback: &Settings) -> Settings {
    let entries = match store.get(&[SETTINGS_KEY.to_string()]).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Failed to read settings, using defaults: {}", e);
            return fallback.clone();
        }
    };
    let Some(value) = entries.get(SETTINGS_KEY) else {
        return fallback.clone();
    };
    let parsed = serde_json::from_value::<Settings>(value.clone())
        .map_err(|e| SuperListsError::Serialization(e.to_string()))
        .and_then(|settings| settings.validate().map(|()| settings));
    match parsed {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("Ignoring stored settings: {}", e);
            fallback.clone()
        }
    }
}

pub async fn save_settings(store: &dyn KeyValueStore, settings: &Settings) -> SuperListsResult<()> {
    settings.validate()?;
    let value =
        serde_json::to_value(settings).map_err(|e| SuperListsError::Serialization(e.to_string()))?;
    let mut entries = StoreMap::new();
    entries.insert(SETTINGS_KEY.to_string(), value);
    store.set(entries).await
}
