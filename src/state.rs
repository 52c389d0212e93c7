//! All stores of one reader, built from one [`StorageContext`].

use crate::backup;
use crate::error::BackupError;
use crate::lessons::LessonStore;
use crate::orchestrator::LookupContext;
use crate::progress::ProgressTracker;
use crate::sentence_cache::SentenceFastCache;
use crate::settings::SettingsStore;
use crate::storage::StorageContext;
use crate::translation_cache::TranslationCache;
use crate::vocabulary::VocabularyStore;

pub struct ReaderState {
    storage: StorageContext,
    pub lessons: LessonStore,
    pub vocabulary: VocabularyStore,
    pub cache: TranslationCache,
    pub fast_cache: SentenceFastCache,
    pub settings: SettingsStore,
    pub progress: ProgressTracker,
}

impl ReaderState {
    pub fn open(storage: StorageContext) -> Self {
        ReaderState {
            lessons: LessonStore::load(&storage),
            vocabulary: VocabularyStore::load(&storage),
            cache: TranslationCache::load(&storage),
            fast_cache: SentenceFastCache::load(&storage),
            settings: SettingsStore::load(&storage),
            progress: ProgressTracker::load(&storage),
            storage,
        }
    }

    pub fn storage(&self) -> &StorageContext {
        &self.storage
    }

    /// Lookup context for a lesson language under the current settings
    pub fn lookup_context(&self, source_language: &str) -> LookupContext {
        LookupContext::new(source_language, self.settings.get())
    }

    pub fn export(&self) -> serde_json::Value {
        backup::export(&self.storage)
    }

    /// Import a backup and reload every store from the new state
    pub fn import(&mut self, doc: &serde_json::Value) -> Result<usize, BackupError> {
        let written = backup::import(&self.storage, doc)?;
        self.reload();
        Ok(written)
    }

    pub fn reload(&mut self) {
        self.lessons.reload();
        self.vocabulary.reload();
        self.cache.reload();
        self.fast_cache.reload();
        self.settings.reload();
        self.progress.reload();
    }
}
