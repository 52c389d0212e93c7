//! Session-only sentence fast path.
//!
//! Keyed by `lang::sentence` with no provider distinction, so flipping
//! between reading and learning views in one sitting re-displays a
//! sentence translation without another lookup.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use crate::storage::{load_json_or_default, save_json, StorageBackend, StorageContext, SENTENCE_FAST_CACHE_KEY};

fn fast_key(sentence: &str, language: &str) -> String {
    let lang = if language.is_empty() { "unknown" } else { language };
    format!("{}::{}", lang, sentence.trim())
}

/// `lang::sentence` -> translation text, session scope
pub struct SentenceFastCache {
    backend: Arc<dyn StorageBackend>,
    entries: HashMap<String, String>,
}

impl SentenceFastCache {
    pub fn load(storage: &StorageContext) -> Self {
        let backend = Arc::clone(&storage.session);
        let entries = load_json_or_default(backend.as_ref(), SENTENCE_FAST_CACHE_KEY);
        SentenceFastCache { backend, entries }
    }

    pub fn reload(&mut self) {
        self.entries = load_json_or_default(self.backend.as_ref(), SENTENCE_FAST_CACHE_KEY);
    }

    /// Cached translation for a sentence in a lesson language
    pub fn get(&self, sentence: &str, language: &str) -> Option<&str> {
        if sentence.is_empty() {
            return None;
        }
        self.entries.get(&fast_key(sentence, language)).map(String::as_str)
    }

    /// Store a translation; `None` removes the entry.
    ///
    /// Write failures are logged and otherwise ignored: this is a
    /// convenience layer and the in-memory copy still serves the session.
    pub fn set(&mut self, sentence: &str, language: &str, translation: Option<&str>) {
        if sentence.is_empty() {
            return;
        }
        let key = fast_key(sentence, language);
        match translation {
            Some(text) => {
                self.entries.insert(key, text.to_string());
            }
            None => {
                self.entries.remove(&key);
            }
        }
        if let Err(e) = save_json(self.backend.as_ref(), SENTENCE_FAST_CACHE_KEY, &self.entries) {
            warn!(error = %e, "failed to write sentence fast cache");
        }
    }

    /// Index -> cached translation for a list of sentences
    pub fn build_map(&self, sentences: &[String], language: &str) -> HashMap<usize, String> {
        sentences
            .iter()
            .enumerate()
            .filter_map(|(idx, sentence)| {
                self.get(sentence, language).map(|text| (idx, text.to_string()))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
