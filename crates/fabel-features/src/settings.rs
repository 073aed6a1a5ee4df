//! User-interface settings.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::FeatureResult;
use crate::store::KeyValueStore;

/// Colour schemes the client knows how to draw.
pub const COLOUR_SCHEMES: [&str; 4] = ["default", "dark", "light", "sepia"];

/// Layouts the client knows how to draw.
pub const UI_SCHEMES: [&str; 2] = ["classic", "compact"];

/// Settings persisted between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// One of [`COLOUR_SCHEMES`].
    pub colour_scheme: String,
    /// One of [`UI_SCHEMES`].
    pub ui_scheme: String,
    /// Whether debug output is shown.
    pub dev_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            colour_scheme: COLOUR_SCHEMES[0].to_string(),
            ui_scheme: UI_SCHEMES[0].to_string(),
            dev_mode: false,
        }
    }
}

impl Settings {
    /// The settings as a JSON object, for `ApplySettings` directives.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "colourScheme": self.colour_scheme,
            "uiScheme": self.ui_scheme,
            "devMode": self.dev_mode,
        })
    }
}

/// Settings backed by a store, cached after the first read.
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
    cached: Mutex<Option<Settings>>,
}

impl SettingsStore {
    /// Keep settings in `store` under `key`.
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            cached: Mutex::new(None),
        }
    }

    /// Current settings. Unreadable settings fall back to the defaults.
    pub fn load(&self) -> Settings {
        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(settings) = cached.as_ref() {
            return settings.clone();
        }
        let settings = match self.read() {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "ignoring stored settings");
                Settings::default()
            }
        };
        *cached = Some(settings.clone());
        settings
    }

    fn read(&self) -> FeatureResult<Settings> {
        match self.store.get_item(&self.key)? {
            Some(text) => Ok(serde_json::from_str(&text)?),
            None => Ok(Settings::default()),
        }
    }

    /// Change settings and persist them. Returns the new settings.
    pub fn update(&self, change: impl FnOnce(&mut Settings)) -> FeatureResult<Settings> {
        let mut settings = self.load();
        change(&mut settings);
        self.store
            .set_item(&self.key, &serde_json::to_string(&settings)?)?;
        *self.cached.lock().unwrap_or_else(PoisonError::into_inner) = Some(settings.clone());
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn defaults_when_nothing_stored() {
        let settings = SettingsStore::new(Arc::new(MemoryStore::new()), "settings");
        assert_eq!(settings.load(), Settings::default());
        assert_eq!(settings.load().colour_scheme, "default");
        assert_eq!(settings.load().ui_scheme, "classic");
    }

    #[test]
    fn updates_persist() {
        let store = Arc::new(MemoryStore::new());
        SettingsStore::new(store.clone(), "settings")
            .update(|s| s.colour_scheme = "sepia".to_string())
            .unwrap();

        let reopened = SettingsStore::new(store, "settings");
        assert_eq!(reopened.load().colour_scheme, "sepia");
        assert!(!reopened.load().dev_mode);
    }

    #[test]
    fn partial_settings_fill_in_defaults() {
        let store = Arc::new(MemoryStore::new());
        store.set_item("settings", r#"{"devMode":true}"#).unwrap();
        let settings = SettingsStore::new(store, "settings").load();
        assert!(settings.dev_mode);
        assert_eq!(settings.ui_scheme, "classic");
    }

    #[test]
    fn corrupt_settings_fall_back() {
        let store = Arc::new(MemoryStore::new());
        store.set_item("settings", "{").unwrap();
        assert_eq!(SettingsStore::new(store, "settings").load(), Settings::default());
    }

    #[test]
    fn value_uses_wire_names() {
        let value = Settings::default().to_value();
        assert_eq!(value["colourScheme"], "default");
        assert_eq!(value["devMode"], false);
    }
}
