//! User settings record.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::provider::Provider;
use crate::providers::{Accent, ProviderConfig, DEFAULT_DEEPSEEK_MODEL};
use crate::storage::{load_json, save_json, StorageBackend, StorageContext, SETTINGS_KEY};
use crate::translation_cache::DEFAULT_TARGET_LANG;

/// Persisted settings. Fields missing from the stored record take their
/// defaults; a field with an unreadable value is reset on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    #[serde(deserialize_with = "lenient")]
    pub accent: Accent,
    #[serde(deserialize_with = "lenient")]
    pub target_language: String,
    /// Show translations beside words with status 1-4
    #[serde(deserialize_with = "lenient")]
    pub show_translations: bool,
    #[serde(deserialize_with = "active_provider")]
    pub translation_provider: Provider,
    #[serde(deserialize_with = "lenient")]
    pub deepseek_api_key: String,
    #[serde(deserialize_with = "lenient")]
    pub deepseek_model: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            accent: Accent::Us,
            target_language: DEFAULT_TARGET_LANG.to_string(),
            show_translations: false,
            translation_provider: Provider::Default,
            deepseek_api_key: String::new(),
            deepseek_model: DEFAULT_DEEPSEEK_MODEL.to_string(),
        }
    }
}

/// Parse one field, falling back to the type's default. Blank strings are
/// already treated as unset by the accessors below.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw).unwrap_or_else(|e| {
        warn!(error = %e, "ignoring invalid settings field");
        T::default()
    }))
}

/// Only two engines are selectable; anything else reads as the free one
fn active_provider<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Provider, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(match raw.as_deref().map(Provider::normalize) {
        Some(Provider::DeepSeek) => Provider::DeepSeek,
        _ => Provider::Default,
    })
}

impl Settings {
    /// Translation engine for lookups
    pub fn provider(&self) -> Provider {
        match self.translation_provider {
            Provider::DeepSeek => Provider::DeepSeek,
            _ => Provider::Default,
        }
    }

    /// Target language tag, falling back to the default when blank
    pub fn target_lang(&self) -> &str {
        let trimmed = self.target_language.trim();
        if trimmed.is_empty() {
            DEFAULT_TARGET_LANG
        } else {
            trimmed
        }
    }

    pub fn provider_config(&self) -> ProviderConfig {
        match self.provider() {
            Provider::DeepSeek => {
                let model = if self.deepseek_model.trim().is_empty() {
                    DEFAULT_DEEPSEEK_MODEL
                } else {
                    self.deepseek_model.trim()
                };
                ProviderConfig::deepseek(self.deepseek_api_key.trim(), model)
            }
            _ => ProviderConfig::free(),
        }
    }
}

/// Loads and persists [`Settings`]
pub struct SettingsStore {
    backend: Arc<dyn StorageBackend>,
    settings: Settings,
}

impl SettingsStore {
    pub fn load(storage: &StorageContext) -> Self {
        let backend = Arc::clone(&storage.local);
        let settings = load_json(backend.as_ref(), SETTINGS_KEY).unwrap_or_default();
        SettingsStore { backend, settings }
    }

    pub fn reload(&mut self) {
        self.settings = load_json(self.backend.as_ref(), SETTINGS_KEY).unwrap_or_default();
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    /// Apply a change and persist it; the change is undone if the write fails
    pub fn update<F>(&mut self, change: F) -> Result<&Settings, StorageError>
    where
        F: FnOnce(&mut Settings),
    {
        let mut next = self.settings.clone();
        change(&mut next);
        save_json(self.backend.as_ref(), SETTINGS_KEY, &next)?;
        debug!(provider = %next.translation_provider, "settings updated");
        self.settings = next;
        Ok(&self.settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    #[test]
    fn test_defaults() {
        let store = SettingsStore::load(&StorageContext::in_memory());
        let settings = store.get();
        assert_eq!(settings.accent, Accent::Us);
        assert_eq!(settings.target_language, "zh-Hans");
        assert!(!settings.show_translations);
        assert_eq!(settings.provider(), Provider::Default);
        assert_eq!(settings.deepseek_model, "deepseek-chat");
    }

    #[test]
    fn test_partial_record_is_merged() {
        let storage = StorageContext::in_memory();
        storage
            .local
            .save(SETTINGS_KEY, r#"{"accent":"uk","translationProvider":"deepseek"}"#)
            .unwrap();
        let store = SettingsStore::load(&storage);
        assert_eq!(store.get().accent, Accent::Uk);
        assert_eq!(store.get().provider(), Provider::DeepSeek);
        assert_eq!(store.get().target_language, "zh-Hans");
    }

    #[test]
    fn test_invalid_field_keeps_the_rest() {
        let storage = StorageContext::in_memory();
        storage
            .local
            .save(
                SETTINGS_KEY,
                r#"{"accent":"au","showTranslations":"yes","translationProvider":"deepseek","deepseekApiKey":"sk-live","targetLanguage":"fr"}"#,
            )
            .unwrap();
        let store = SettingsStore::load(&storage);
        let settings = store.get();
        assert_eq!(settings.accent, Accent::Us);
        assert!(!settings.show_translations);
        assert_eq!(settings.deepseek_api_key, "sk-live");
        assert_eq!(settings.target_lang(), "fr");
        assert!(settings.provider_config().validate().is_ok());
    }

    #[test]
    fn test_unknown_provider_reads_as_default() {
        let storage = StorageContext::in_memory();
        storage.local.save(SETTINGS_KEY, r#"{"translationProvider":"lingva"}"#).unwrap();
        assert_eq!(SettingsStore::load(&storage).get().provider(), Provider::Default);
    }

    #[test]
    fn test_update_persists() {
        let storage = StorageContext::in_memory();
        let mut store = SettingsStore::load(&storage);
        store
            .update(|s| {
                s.show_translations = true;
                s.translation_provider = Provider::DeepSeek;
            })
            .unwrap();

        let json = storage.local.load(SETTINGS_KEY).unwrap();
        assert!(json.contains("\"showTranslations\":true"));
        assert!(json.contains("\"translationProvider\":\"deepseek\""));
        assert!(SettingsStore::load(&storage).get().show_translations);
    }

    #[test]
    fn test_provider_config_requires_key() {
        let settings = Settings {
            translation_provider: Provider::DeepSeek,
            ..Default::default()
        };
        assert_eq!(
            settings.provider_config().validate(),
            Err(ConfigError::MissingCredential { provider: "DeepSeek" })
        );

        let settings = Settings {
            deepseek_api_key: "sk-test".into(),
            ..settings
        };
        let config = settings.provider_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.model, "deepseek-chat");
    }
}
