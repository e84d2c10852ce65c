use dashmap::DashMap;
use std::collections::HashMap;

/// Key-value settings, namespaced by plugin identity.
pub trait SettingsStore: Send + Sync {
    fn get(&self, plugin_id: &str, key: &str) -> Option<String>;
    fn set(&self, plugin_id: &str, key: &str, value: String);
}

/// In-process settings store.
#[derive(Default)]
pub struct MemorySettingsStore {
    values: DashMap<(String, String), String>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(plugin_id: &str, settings: &HashMap<String, String>) -> Self {
        let store = Self::new();
        for (key, value) in settings {
            store.set(plugin_id, key, value.clone());
        }
        store
    }
}

impl SettingsStore for MemorySettingsStore {
    /// Blank values read as unset.
    fn get(&self, plugin_id: &str, key: &str) -> Option<String> {
        self.values
            .get(&(plugin_id.to_string(), key.to_string()))
            .map(|entry| entry.value().trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn set(&self, plugin_id: &str, key: &str, value: String) {
        self.values
            .insert((plugin_id.to_string(), key.to_string()), value);
    }
}
