//! Vocabulary store: word -> learning status record.
//!
//! The store key is the word exactly as clicked (case preserved). Updates
//! merge into the existing record so that different surfaces (popup,
//! review, vocabulary table) can each write a subset of fields without
//! erasing what another surface wrote.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::provider::Provider;
use crate::status::Status;
use crate::storage::{load_json, save_json, StorageBackend, StorageContext, VOCABULARY_KEY};

/// Per-word learning record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordEntry {
    pub status: Status,

    /// Last example sentence the word was tagged from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence: Option<String>,

    /// Display translation, user-editable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient_provider",
        skip_serializing_if = "Option::is_none"
    )]
    pub translation_source: Option<Provider>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,

    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_reviewed: Option<DateTime<Utc>>,
}

impl WordEntry {
    /// A bare record holding only a status
    pub fn with_status(status: Status) -> Self {
        WordEntry {
            status,
            ..Default::default()
        }
    }

    /// Whether translation or phonetic is still missing
    pub fn is_incomplete(&self) -> bool {
        self.translation.is_none() || self.phonetic.is_none()
    }
}

fn lenient_provider<'de, D>(deserializer: D) -> Result<Option<Provider>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|r| Provider::recognized(&r)))
}

/// Fields to merge into a word's record. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct StatusUpdate {
    pub status: Status,
    pub sentence: Option<String>,
    pub translation: Option<String>,
    pub phonetic: Option<String>,
    /// Free-form provenance; only consulted when `translation` is set
    pub translation_source: Option<String>,
    /// Drop the stored translation and provenance when no new one is given
    pub clear_translation: bool,
}

impl StatusUpdate {
    pub fn new(status: Status) -> Self {
        StatusUpdate {
            status,
            ..Default::default()
        }
    }

    pub fn sentence(mut self, sentence: impl Into<String>) -> Self {
        self.sentence = Some(sentence.into());
        self
    }

    pub fn translation(mut self, translation: impl Into<String>) -> Self {
        self.translation = Some(translation.into());
        self
    }

    pub fn phonetic(mut self, phonetic: impl Into<String>) -> Self {
        self.phonetic = Some(phonetic.into());
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.translation_source = Some(source.into());
        self
    }

    pub fn without_translation(mut self) -> Self {
        self.translation = None;
        self.translation_source = None;
        self.clear_translation = true;
        self
    }
}

/// Vocabulary table filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VocabFilter {
    #[default]
    All,
    /// Status 1-4
    Learning,
    /// Status 5
    Known,
}

impl VocabFilter {
    fn accepts(self, status: Status) -> bool {
        match self {
            VocabFilter::All => true,
            VocabFilter::Learning => status.is_lingq(),
            VocabFilter::Known => status == Status::Known,
        }
    }
}

/// Summary counters for the vocabulary table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VocabStats {
    pub total: usize,
    pub learning: usize,
    pub known: usize,
    /// Entries without a translation or a phonetic
    pub missing_data: usize,
}

/// Persistent word -> [`WordEntry`] mapping
pub struct VocabularyStore {
    backend: Arc<dyn StorageBackend>,
    entries: BTreeMap<String, WordEntry>,
}

impl VocabularyStore {
    /// Load from the local scope; corrupt data yields an empty store
    pub fn load(storage: &StorageContext) -> Self {
        let backend = Arc::clone(&storage.local);
        let entries = read_entries(backend.as_ref());
        VocabularyStore { backend, entries }
    }

    /// Re-read persisted state (after a backup import)
    pub fn reload(&mut self) {
        self.entries = read_entries(self.backend.as_ref());
    }

    /// Stored record, if the word was ever tagged
    pub fn lookup(&self, word: &str) -> Option<&WordEntry> {
        self.entries.get(word)
    }

    /// Status of a word; untagged words are `Status::New`
    pub fn get_status(&self, word: &str) -> Status {
        Status::or_new(self.lookup(word).map(|e| e.status))
    }

    /// Full record of a word, a bare `New` record if absent
    pub fn get_word_data(&self, word: &str) -> WordEntry {
        self.lookup(word).cloned().unwrap_or_default()
    }

    /// Merge an update into a word's record and persist.
    ///
    /// Status always overwrites and `last_reviewed` is refreshed. Every
    /// other field keeps its stored value unless the update carries a
    /// non-empty replacement, or asks to clear the translation. The
    /// provenance tag changes only together with the translation: an explicit source is normalized
    /// (unrecognized -> absent), a missing one means the user typed it.
    pub fn update_status(&mut self, word: &str, update: StatusUpdate) -> Result<&WordEntry, StorageError> {
        let current = self.get_word_data(word);

        let (translation, translation_source) = match non_empty(update.translation) {
            Some(text) => {
                let source = match update.translation_source.as_deref() {
                    Some(raw) => Provider::recognized(raw),
                    None => Some(Provider::Custom),
                };
                (Some(text), source)
            }
            None if update.clear_translation => (None, None),
            None => (current.translation, current.translation_source),
        };

        let next = WordEntry {
            status: update.status,
            sentence: non_empty(update.sentence).or(current.sentence),
            translation,
            translation_source,
            phonetic: non_empty(update.phonetic).or(current.phonetic),
            last_reviewed: Some(Utc::now()),
        };

        debug!(word, status = %next.status, "updating word status");
        self.commit(word, next)
    }

    /// Set only the status, keeping everything else
    pub fn set_status(&mut self, word: &str, status: Status) -> Result<&WordEntry, StorageError> {
        self.update_status(word, StatusUpdate::new(status))
    }

    /// Remove a word's translation and its provenance.
    ///
    /// Returns false if the word has no record.
    pub fn clear_translation(&mut self, word: &str) -> Result<bool, StorageError> {
        let Some(current) = self.lookup(word).cloned() else {
            return Ok(false);
        };
        let next = WordEntry {
            translation: None,
            translation_source: None,
            last_reviewed: Some(Utc::now()),
            ..current
        };
        self.commit(word, next)?;
        Ok(true)
    }

    /// Attach a freshly fetched translation to an already-tagged word.
    ///
    /// Untagged words are left untagged and nothing is written. Status and
    /// `last_reviewed` are not touched.
    pub fn record_translation(
        &mut self,
        word: &str,
        text: &str,
        provider: Provider,
    ) -> Result<bool, StorageError> {
        if text.is_empty() {
            return Ok(false);
        }
        let Some(current) = self.lookup(word).cloned() else {
            return Ok(false);
        };
        let next = WordEntry {
            translation: Some(text.to_string()),
            translation_source: Some(provider),
            ..current
        };
        self.commit(word, next)?;
        Ok(true)
    }

    /// Set every currently-untagged word to `Known`; returns how many changed
    pub fn mark_all_known<'a, I>(&mut self, words: I) -> Result<usize, StorageError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let snapshot = self.entries.clone();
        let now = Utc::now();
        let mut changed = 0;
        for word in words {
            if self.get_status(word) != Status::New {
                continue;
            }
            let entry = self.entries.entry(word.to_string()).or_default();
            entry.status = Status::Known;
            entry.last_reviewed = Some(now);
            changed += 1;
        }
        if changed > 0 {
            if let Err(e) = self.flush() {
                self.entries = snapshot;
                return Err(e);
            }
        }
        Ok(changed)
    }

    /// All records, ordered by word
    pub fn entries(&self) -> impl Iterator<Item = (&str, &WordEntry)> {
        self.entries.iter().map(|(w, e)| (w.as_str(), e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Words due for flashcard review (status 1-4)
    pub fn review_list(&self) -> Vec<(&str, &WordEntry)> {
        self.entries().filter(|(_, e)| e.status.is_lingq()).collect()
    }

    /// Filtered rows, learning words first (by status), known words last
    pub fn table(&self, filter: VocabFilter) -> Vec<(&str, &WordEntry)> {
        let mut rows: Vec<_> = self.entries().filter(|(_, e)| filter.accepts(e.status)).collect();
        rows.sort_by(|(wa, a), (wb, b)| {
            let known_a = a.status == Status::Known;
            let known_b = b.status == Status::Known;
            known_a
                .cmp(&known_b)
                .then(a.status.cmp(&b.status))
                .then(wa.cmp(wb))
        });
        rows
    }

    pub fn stats(&self) -> VocabStats {
        let mut stats = VocabStats {
            total: self.entries.len(),
            ..Default::default()
        };
        for entry in self.entries.values() {
            if entry.status.is_lingq() {
                stats.learning += 1;
            } else if entry.status == Status::Known {
                stats.known += 1;
            }
            if entry.is_incomplete() {
                stats.missing_data += 1;
            }
        }
        stats
    }

    fn commit(&mut self, word: &str, next: WordEntry) -> Result<&WordEntry, StorageError> {
        let previous = self.entries.insert(word.to_string(), next);
        if let Err(e) = self.flush() {
            match previous {
                Some(prev) => self.entries.insert(word.to_string(), prev),
                None => self.entries.remove(word),
            };
            return Err(e);
        }
        Ok(&self.entries[word])
    }

    fn flush(&self) -> Result<(), StorageError> {
        save_json(self.backend.as_ref(), VOCABULARY_KEY, &self.entries)
    }
}

/// Parse stored entries one by one; a bare integer is a legacy status-only
/// record, and invalid entries are skipped rather than failing the load.
fn read_entries(backend: &dyn StorageBackend) -> BTreeMap<String, WordEntry> {
    let raw: BTreeMap<String, serde_json::Value> = load_json(backend, VOCABULARY_KEY).unwrap_or_default();
    raw.into_iter()
        .filter_map(|(word, value)| {
            let parsed = match value {
                serde_json::Value::Number(n) => n
                    .as_u64()
                    .and_then(|level| u8::try_from(level).ok())
                    .and_then(|level| Status::try_from(level).ok())
                    .map(WordEntry::with_status),
                other => serde_json::from_value(other).ok(),
            };
            if parsed.is_none() {
                warn!(word = %word, "skipping malformed vocabulary entry");
            }
            parsed.map(|entry| (word, entry))
        })
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> VocabularyStore {
        VocabularyStore::load(&StorageContext::in_memory())
    }

    #[test]
    fn test_absent_word_is_new() {
        let vocab = store();
        assert_eq!(vocab.get_status("anything"), Status::New);
        assert!(vocab.lookup("anything").is_none());
        assert_eq!(vocab.get_word_data("anything"), WordEntry::default());
    }

    #[test]
    fn test_update_merges_fields() {
        let mut vocab = store();
        vocab
            .update_status(
                "w",
                StatusUpdate::new(Status::Hard)
                    .sentence("s1")
                    .translation("t1")
                    .phonetic("ph1")
                    .source("default"),
            )
            .unwrap();
        let first_review = vocab.lookup("w").unwrap().last_reviewed;

        vocab.set_status("w", Status::Familiar).unwrap();
        let entry = vocab.lookup("w").unwrap();
        assert_eq!(entry.status, Status::Familiar);
        assert_eq!(entry.sentence.as_deref(), Some("s1"));
        assert_eq!(entry.translation.as_deref(), Some("t1"));
        assert_eq!(entry.phonetic.as_deref(), Some("ph1"));
        assert_eq!(entry.translation_source, Some(Provider::Default));
        assert!(entry.last_reviewed >= first_review);
    }

    #[test]
    fn test_source_only_changes_with_translation() {
        let mut vocab = store();
        vocab
            .update_status("w", StatusUpdate::new(Status::Hard).translation("t").source("DeepSeek"))
            .unwrap();
        vocab
            .update_status("w", StatusUpdate::new(Status::Learning).source("custom"))
            .unwrap();
        assert_eq!(vocab.lookup("w").unwrap().translation_source, Some(Provider::DeepSeek));
    }

    #[test]
    fn test_translation_without_source_is_custom() {
        let mut vocab = store();
        vocab
            .update_status("w", StatusUpdate::new(Status::Hard).translation("typed"))
            .unwrap();
        assert_eq!(vocab.lookup("w").unwrap().translation_source, Some(Provider::Custom));
    }

    #[test]
    fn test_unrecognized_source_is_absent() {
        let mut vocab = store();
        vocab
            .update_status("w", StatusUpdate::new(Status::Hard).translation("t").source("Lingva"))
            .unwrap();
        assert_eq!(vocab.lookup("w").unwrap().translation_source, None);
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let mut vocab = store();
        vocab.set_status("The", Status::Known).unwrap();
        assert_eq!(vocab.get_status("The"), Status::Known);
        assert_eq!(vocab.get_status("the"), Status::New);
    }

    #[test]
    fn test_clear_translation() {
        let mut vocab = store();
        assert!(!vocab.clear_translation("w").unwrap());
        vocab
            .update_status("w", StatusUpdate::new(Status::Learning).translation("t").phonetic("p"))
            .unwrap();
        assert!(vocab.clear_translation("w").unwrap());
        let entry = vocab.lookup("w").unwrap();
        assert_eq!(entry.translation, None);
        assert_eq!(entry.translation_source, None);
        assert_eq!(entry.phonetic.as_deref(), Some("p"));
        assert_eq!(entry.status, Status::Learning);
    }

    #[test]
    fn test_record_translation_only_for_tagged_words() {
        let mut vocab = store();
        assert!(!vocab.record_translation("w", "t", Provider::Default).unwrap());
        assert!(vocab.lookup("w").is_none());

        vocab.set_status("w", Status::Familiar).unwrap();
        let reviewed = vocab.lookup("w").unwrap().last_reviewed;
        assert!(vocab.record_translation("w", "t", Provider::DeepSeek).unwrap());
        let entry = vocab.lookup("w").unwrap();
        assert_eq!(entry.translation.as_deref(), Some("t"));
        assert_eq!(entry.translation_source, Some(Provider::DeepSeek));
        assert_eq!(entry.status, Status::Familiar);
        assert_eq!(entry.last_reviewed, reviewed);
    }

    #[test]
    fn test_update_can_clear_translation() {
        let mut vocab = store();
        vocab
            .update_status("w", StatusUpdate::new(Status::Hard).translation("t").phonetic("p"))
            .unwrap();
        vocab
            .update_status("w", StatusUpdate::new(Status::Known).without_translation())
            .unwrap();
        let entry = vocab.lookup("w").unwrap();
        assert_eq!(entry.status, Status::Known);
        assert_eq!(entry.translation, None);
        assert_eq!(entry.translation_source, None);
        assert_eq!(entry.phonetic.as_deref(), Some("p"));
    }

    #[test]
    fn test_persists_and_reloads() {
        let storage = StorageContext::in_memory();
        let mut vocab = VocabularyStore::load(&storage);
        vocab
            .update_status("cat", StatusUpdate::new(Status::Learning).translation("猫"))
            .unwrap();

        let reloaded = VocabularyStore::load(&storage);
        assert_eq!(reloaded.get_status("cat"), Status::Learning);
        assert_eq!(reloaded.lookup("cat").unwrap().translation.as_deref(), Some("猫"));
    }

    #[test]
    fn test_legacy_and_malformed_entries() {
        let storage = StorageContext::in_memory();
        storage
            .local
            .save(
                VOCABULARY_KEY,
                r#"{"old":3,"bad":9,"weird":"x","ok":{"status":2,"translationSource":"MyMemory"}}"#,
            )
            .unwrap();
        let vocab = VocabularyStore::load(&storage);
        assert_eq!(vocab.get_status("old"), Status::Familiar);
        assert!(vocab.lookup("bad").is_none());
        assert!(vocab.lookup("weird").is_none());
        assert_eq!(vocab.lookup("ok").unwrap().translation_source, Some(Provider::Default));
    }

    #[test]
    fn test_corrupt_store_is_empty() {
        let storage = StorageContext::in_memory();
        storage.local.save(VOCABULARY_KEY, "[[[").unwrap();
        assert!(VocabularyStore::load(&storage).is_empty());
    }

    #[test]
    fn test_mark_all_known_skips_tagged() {
        let mut vocab = store();
        vocab.set_status("cat", Status::Learning).unwrap();
        let changed = vocab.mark_all_known(["The", "cat", "sat"]).unwrap();
        assert_eq!(changed, 2);
        assert_eq!(vocab.get_status("cat"), Status::Learning);
        assert_eq!(vocab.get_status("sat"), Status::Known);
    }

    #[test]
    fn test_table_and_stats() {
        let mut vocab = store();
        vocab.set_status("zeta", Status::Known).unwrap();
        vocab.set_status("beta", Status::Familiar).unwrap();
        vocab
            .update_status("alpha", StatusUpdate::new(Status::Hard).translation("a").phonetic("æ"))
            .unwrap();

        let all: Vec<_> = vocab.table(VocabFilter::All).into_iter().map(|(w, _)| w).collect();
        assert_eq!(all, vec!["alpha", "beta", "zeta"]);
        assert_eq!(vocab.table(VocabFilter::Known).len(), 1);
        assert_eq!(vocab.table(VocabFilter::Learning).len(), 2);
        assert_eq!(vocab.review_list().len(), 2);

        let stats = vocab.stats();
        assert_eq!(stats, VocabStats { total: 3, learning: 2, known: 1, missing_data: 2 });
    }
}
