//! Two-tier translation cache.
//!
//! Word translations are cheap to reuse across lessons and persist in the
//! local scope. Sentence translations are lesson-specific and numerous, so
//! they live in the session scope and vanish with it. Both tiers are keyed
//! by `normalize(text) + "::" + normalize(lang)` and filtered by provider
//! on lookup: an entry from another provider is a miss.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use crate::error::StorageError;
use crate::provider::Provider;
use crate::providers::TranslationResult;
use crate::storage::{
    load_json, load_json_or_default, save_json, StorageBackend, StorageContext, SENTENCE_CACHE_KEY,
    TRANSLATION_CACHE_KEY,
};

/// Canonical target language when none is configured
pub const DEFAULT_TARGET_LANG: &str = "zh-Hans";

/// A cached translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub text: String,

    /// Human-readable source as reported by the engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, deserialize_with = "provider_or_default")]
    pub provider: Provider,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub cached_at: DateTime<Utc>,

    pub target_lang: String,
}

fn provider_or_default<'de, D>(deserializer: D) -> Result<Provider, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .and_then(|r| Provider::recognized(&r))
        .unwrap_or(Provider::Default))
}

/// Persisted layout of the local cache key
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheDocument {
    #[serde(default)]
    pub words: BTreeMap<String, CacheEntry>,
    #[serde(default)]
    pub sentences: BTreeMap<String, CacheEntry>,
}

/// Collapse regional Chinese tags; empty means the default target
pub fn normalize_lang(lang: &str) -> String {
    let lower = lang.trim().to_lowercase();
    match lower.as_str() {
        "" | "zh" | "zh-cn" | "zh-hans" => DEFAULT_TARGET_LANG.to_string(),
        _ => lang.trim().to_string(),
    }
}

/// Cache key for a word: lower-cased, NFC-composed
pub fn word_key(word: &str, lang: &str) -> Option<String> {
    if word.is_empty() {
        return None;
    }
    let normalized: String = word.nfc().collect::<String>().to_lowercase();
    Some(format!("{}::{}", normalized, normalize_lang(lang)))
}

/// Cache key for a sentence: trimmed, case preserved, NFC-composed
pub fn sentence_key(sentence: &str, lang: &str) -> Option<String> {
    let trimmed = sentence.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized: String = trimmed.nfc().collect();
    Some(format!("{}::{}", normalized, normalize_lang(lang)))
}

/// Explicit provider first, then whatever the payload reports, then Default
fn resolve_provider(explicit: Provider, payload: &TranslationResult) -> Provider {
    match explicit {
        Provider::Unknown => payload
            .source
            .as_deref()
            .and_then(Provider::recognized)
            .unwrap_or(Provider::Default),
        known => known,
    }
}

/// Word (local) and sentence (session) translation caches
pub struct TranslationCache {
    local: Arc<dyn StorageBackend>,
    session: Arc<dyn StorageBackend>,
    words: BTreeMap<String, CacheEntry>,
    sentences: BTreeMap<String, CacheEntry>,
}

impl TranslationCache {
    /// Load both tiers; corrupt data yields empty tiers
    pub fn load(storage: &StorageContext) -> Self {
        let local = Arc::clone(&storage.local);
        let session = Arc::clone(&storage.session);
        let document: CacheDocument = load_json(local.as_ref(), TRANSLATION_CACHE_KEY).unwrap_or_default();
        let sentences = load_json_or_default(session.as_ref(), SENTENCE_CACHE_KEY);
        TranslationCache {
            local,
            session,
            words: document.words,
            sentences,
        }
    }

    /// Re-read persisted state (after a backup import)
    pub fn reload(&mut self) {
        let document: CacheDocument =
            load_json(self.local.as_ref(), TRANSLATION_CACHE_KEY).unwrap_or_default();
        self.words = document.words;
        self.sentences = load_json_or_default(self.session.as_ref(), SENTENCE_CACHE_KEY);
    }

    /// Upsert a word translation. Returns false (and writes nothing) for an
    /// empty word or translation.
    pub fn save_word_translation(
        &mut self,
        word: &str,
        translation: &TranslationResult,
        target_lang: &str,
        provider: Provider,
    ) -> Result<bool, StorageError> {
        let Some(key) = word_key(word, target_lang) else {
            return Ok(false);
        };
        if translation.text.is_empty() {
            return Ok(false);
        }
        let entry = make_entry(translation, target_lang, provider);
        let previous = self.words.insert(key.clone(), entry);
        if let Err(e) = self.flush_words() {
            restore(&mut self.words, key, previous);
            return Err(e);
        }
        Ok(true)
    }

    /// Cached word translation for this provider, if any
    pub fn get_cached_word_translation(
        &self,
        word: &str,
        target_lang: &str,
        provider: Provider,
    ) -> Option<&CacheEntry> {
        let key = word_key(word, target_lang)?;
        lookup(&self.words, &key, provider)
    }

    /// Upsert a sentence translation into the session tier
    pub fn save_sentence_translation(
        &mut self,
        sentence: &str,
        translation: &TranslationResult,
        target_lang: &str,
        provider: Provider,
    ) -> Result<bool, StorageError> {
        let Some(key) = sentence_key(sentence, target_lang) else {
            return Ok(false);
        };
        if translation.text.is_empty() {
            return Ok(false);
        }
        let entry = make_entry(translation, target_lang, provider);
        let previous = self.sentences.insert(key.clone(), entry);
        if let Err(e) = save_json(self.session.as_ref(), SENTENCE_CACHE_KEY, &self.sentences) {
            restore(&mut self.sentences, key, previous);
            return Err(e);
        }
        Ok(true)
    }

    /// Cached sentence translation for this provider, if any
    pub fn get_cached_sentence_translation(
        &self,
        sentence: &str,
        target_lang: &str,
        provider: Provider,
    ) -> Option<&CacheEntry> {
        let key = sentence_key(sentence, target_lang)?;
        lookup(&self.sentences, &key, provider)
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }

    fn flush_words(&self) -> Result<(), StorageError> {
        let document = CacheDocument {
            words: self.words.clone(),
            sentences: BTreeMap::new(),
        };
        save_json(self.local.as_ref(), TRANSLATION_CACHE_KEY, &document)
    }
}

fn make_entry(translation: &TranslationResult, target_lang: &str, provider: Provider) -> CacheEntry {
    CacheEntry {
        text: translation.text.clone(),
        source: translation.source.clone(),
        provider: resolve_provider(provider, translation),
        cached_at: Utc::now(),
        target_lang: normalize_lang(target_lang),
    }
}

fn lookup<'a>(
    map: &'a BTreeMap<String, CacheEntry>,
    key: &str,
    provider: Provider,
) -> Option<&'a CacheEntry> {
    let entry = map.get(key)?;
    if entry.provider != provider {
        debug!(key, cached = %entry.provider, requested = %provider, "provider mismatch, cache miss");
        return None;
    }
    Some(entry)
}

fn restore(map: &mut BTreeMap<String, CacheEntry>, key: String, previous: Option<CacheEntry>) {
    match previous {
        Some(prev) => {
            map.insert(key, prev);
        }
        None => {
            map.remove(&key);
        }
    }
}
