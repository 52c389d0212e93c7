//! Whole-state export and import.
//!
//! The document is `{version, exportedAt, local: {label: value}, session:
//! {label: value}}` where each value is the parsed JSON stored under the
//! label's key, or null when absent.

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::{BackupError, StorageError};
use crate::storage::{
    StorageBackend, StorageContext, ARTICLES_KEY, PROGRESS_KEY, SENTENCE_FAST_CACHE_KEY, SETTINGS_KEY,
    TRANSLATION_CACHE_KEY, VOCABULARY_KEY,
};

pub const BACKUP_VERSION: u64 = 1;

const LOCAL_KEYS: &[(&str, &str)] = &[
    ("articles", ARTICLES_KEY),
    ("vocabulary", VOCABULARY_KEY),
    ("translationCache", TRANSLATION_CACHE_KEY),
    ("settings", SETTINGS_KEY),
    ("articleProgress", PROGRESS_KEY),
];

const SESSION_KEYS: &[(&str, &str)] = &[("sentenceCache", SENTENCE_FAST_CACHE_KEY)];

fn read_value(backend: &dyn StorageBackend, key: &str) -> Value {
    let Some(raw) = backend.load(key) else {
        return Value::Null;
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!(key, error = %e, "skipping unreadable key in export");
        Value::Null
    })
}

fn collect(backend: &dyn StorageBackend, keys: &[(&str, &str)]) -> Map<String, Value> {
    keys.iter()
        .map(|(label, key)| (label.to_string(), read_value(backend, key)))
        .collect()
}

/// Snapshot every known key
pub fn export(storage: &StorageContext) -> Value {
    let mut doc = Map::new();
    doc.insert("version".into(), Value::from(BACKUP_VERSION));
    doc.insert(
        "exportedAt".into(),
        Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    doc.insert("local".into(), Value::Object(collect(storage.local.as_ref(), LOCAL_KEYS)));
    doc.insert(
        "session".into(),
        Value::Object(collect(storage.session.as_ref(), SESSION_KEYS)),
    );
    Value::Object(doc)
}

fn section<'a>(doc: &'a Map<String, Value>, name: &str) -> Result<Option<&'a Map<String, Value>>, BackupError> {
    match doc.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(BackupError::Malformed(format!("'{name}' is not an object"))),
    }
}

fn write_section(
    backend: &dyn StorageBackend,
    keys: &[(&str, &str)],
    values: Option<&Map<String, Value>>,
) -> Result<usize, StorageError> {
    let Some(values) = values else {
        return Ok(0);
    };
    let mut written = 0;
    for (label, key) in keys {
        match values.get(*label) {
            None => continue,
            Some(Value::Null) => backend.remove(key)?,
            Some(value) => {
                let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
                    key: key.to_string(),
                    source,
                })?;
                backend.save(key, &raw)?;
            }
        }
        written += 1;
    }
    Ok(written)
}

/// Write back the labels present in `doc`; a null value removes its key.
/// Returns how many keys were touched.
///
/// Stores built from `storage` must be reloaded afterwards.
pub fn import(storage: &StorageContext, doc: &Value) -> Result<usize, BackupError> {
    let doc = doc
        .as_object()
        .ok_or_else(|| BackupError::Malformed("document is not an object".into()))?;
    let version = doc
        .get("version")
        .and_then(Value::as_u64)
        .ok_or_else(|| BackupError::Malformed("missing version".into()))?;
    if version != BACKUP_VERSION {
        return Err(BackupError::UnsupportedVersion(version));
    }

    let local = section(doc, "local")?;
    let session = section(doc, "session")?;
    let written = write_section(storage.local.as_ref(), LOCAL_KEYS, local)?
        + write_section(storage.session.as_ref(), SESSION_KEYS, session)?;
    info!(keys = written, "imported backup");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_export_shape() {
        let storage = StorageContext::in_memory();
        storage.local.save(VOCABULARY_KEY, r#"{"cat":{"status":2}}"#).unwrap();
        storage.session.save(SENTENCE_FAST_CACHE_KEY, r#"{"English::Hi.":"嗨。"}"#).unwrap();

        let doc = export(&storage);
        assert_eq!(doc["version"], json!(1));
        assert!(doc["exportedAt"].as_str().unwrap().ends_with('Z'));
        assert_eq!(doc["local"]["vocabulary"]["cat"]["status"], json!(2));
        assert_eq!(doc["local"]["articles"], Value::Null);
        assert_eq!(doc["session"]["sentenceCache"]["English::Hi."], json!("嗨。"));
    }

    #[test]
    fn test_import_only_present_labels() {
        let storage = StorageContext::in_memory();
        storage.local.save(SETTINGS_KEY, r#"{"accent":"uk"}"#).unwrap();
        storage.local.save(PROGRESS_KEY, r#"{"1":4}"#).unwrap();

        let doc = json!({
            "version": 1,
            "local": { "vocabulary": { "dog": { "status": 5 } }, "articleProgress": null }
        });
        assert_eq!(import(&storage, &doc).unwrap(), 2);
        assert_eq!(storage.local.load(VOCABULARY_KEY).as_deref(), Some(r#"{"dog":{"status":5}}"#));
        assert_eq!(storage.local.load(SETTINGS_KEY).as_deref(), Some(r#"{"accent":"uk"}"#));
        assert_eq!(storage.local.load(PROGRESS_KEY), None);
    }

    #[test]
    fn test_round_trip_between_contexts() {
        let source = StorageContext::in_memory();
        source.local.save(ARTICLES_KEY, r#"[{"id":1,"title":"T","content":"Hi."}]"#).unwrap();
        let target = StorageContext::in_memory();
        import(&target, &export(&source)).unwrap();
        let parsed = |ctx: &StorageContext| -> Value {
            serde_json::from_str(&ctx.local.load(ARTICLES_KEY).unwrap()).unwrap()
        };
        assert_eq!(parsed(&target), parsed(&source));
    }

    #[test]
    fn test_rejects_bad_documents() {
        let storage = StorageContext::in_memory();
        assert!(matches!(
            import(&storage, &json!({"version": 2})),
            Err(BackupError::UnsupportedVersion(2))
        ));
        assert!(matches!(import(&storage, &json!([1])), Err(BackupError::Malformed(_))));
        assert!(matches!(
            import(&storage, &json!({"version": 1, "local": 3})),
            Err(BackupError::Malformed(_))
        ));
    }
}
