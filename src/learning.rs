//! Sentence-by-sentence learning mode.

use std::collections::HashMap;
use tracing::debug;

use crate::error::{ConfigError, StorageError};
use crate::lessons::Lesson;
use crate::orchestrator::{LookupContext, Orchestrator, SentenceOutcome};
use crate::progress::ProgressTracker;
use crate::sentence::split_sentences;
use crate::sentence_cache::SentenceFastCache;
use crate::translation_cache::TranslationCache;

/// A lesson opened in learning mode
#[derive(Debug)]
pub struct LearningSession {
    lesson_id: i64,
    language: String,
    sentences: Vec<String>,
    index: usize,
    translations: HashMap<usize, String>,
}

impl LearningSession {
    /// Split the lesson, resume after the last completed sentence and pick
    /// up any sentence translations from this session
    pub fn open(lesson: &Lesson, progress: &ProgressTracker, fast: &SentenceFastCache) -> Self {
        let sentences = split_sentences(&lesson.content);
        let index = progress.resume_index(lesson.id, sentences.len());
        let translations = fast.build_map(&sentences, &lesson.language);
        debug!(lesson = lesson.id, total = sentences.len(), index, "opening learning session");
        LearningSession {
            lesson_id: lesson.id,
            language: lesson.language.clone(),
            sentences,
            index,
            translations,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&str> {
        self.sentences.get(self.index).map(String::as_str)
    }

    /// Translation of the current sentence, if known this session
    pub fn translation(&self) -> Option<&str> {
        self.translations.get(&self.index).map(String::as_str)
    }

    /// Advance one sentence; completing sentence `i` records `i + 1` when
    /// that exceeds the stored progress. Stays on the last sentence.
    pub fn next(&mut self, progress: &mut ProgressTracker) -> Result<usize, StorageError> {
        if self.sentences.is_empty() {
            return Ok(0);
        }
        let completed = (self.index + 1) as u64;
        if completed > progress.get(self.lesson_id) {
            progress.set(self.lesson_id, completed as i64)?;
        }
        self.index = (self.index + 1).min(self.sentences.len() - 1);
        Ok(self.index)
    }

    pub fn prev(&mut self) -> usize {
        self.index = self.index.saturating_sub(1);
        self.index
    }

    /// Replace the current sentence's translation with the learner's text
    pub fn set_translation(&mut self, fast: &mut SentenceFastCache, text: &str) {
        let Some(sentence) = self.sentences.get(self.index) else {
            return;
        };
        fast.set(sentence, &self.language, Some(text));
        self.translations.insert(self.index, text.to_string());
    }

    /// Translate the current sentence through the orchestrator's sentence path
    pub fn translate_current(
        &mut self,
        orchestrator: &Orchestrator<'_>,
        cache: &mut TranslationCache,
        fast: &mut SentenceFastCache,
        ctx: &LookupContext,
    ) -> Result<SentenceOutcome, ConfigError> {
        let Some(sentence) = self.sentences.get(self.index).cloned() else {
            return Ok(SentenceOutcome::Unavailable);
        };
        let outcome = orchestrator.translate_sentence(cache, fast, &sentence, ctx)?;
        if let Some(text) = outcome.text() {
            self.translations.insert(self.index, text.to_string());
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lessons::{LessonStore, NewLesson};
    use crate::storage::StorageContext;

    struct Setup {
        storage: StorageContext,
        lesson: Lesson,
    }

    fn setup(content: &str) -> Setup {
        let storage = StorageContext::in_memory();
        let mut lessons = LessonStore::load(&storage);
        let lesson = lessons.add(NewLesson::new("L", content)).unwrap().clone();
        Setup { storage, lesson }
    }

    #[test]
    fn test_progress_is_max() {
        let s = setup("One. Two. Three.");
        let mut progress = ProgressTracker::load(&s.storage);
        let fast = SentenceFastCache::load(&s.storage);
        let mut session = LearningSession::open(&s.lesson, &progress, &fast);
        assert_eq!(session.len(), 3);
        assert_eq!(session.current(), Some("One."));

        session.next(&mut progress).unwrap();
        session.next(&mut progress).unwrap();
        assert_eq!(progress.get(s.lesson.id), 2);

        session.prev();
        session.prev();
        session.next(&mut progress).unwrap();
        assert_eq!(progress.get(s.lesson.id), 2);

        session.next(&mut progress).unwrap();
        assert_eq!(session.next(&mut progress).unwrap(), 2);
        assert_eq!(progress.get(s.lesson.id), 3);
    }

    #[test]
    fn test_resume_shows_last_completed() {
        let s = setup("One. Two. Three. Four.");
        let mut progress = ProgressTracker::load(&s.storage);
        progress.set(s.lesson.id, 3).unwrap();
        let fast = SentenceFastCache::load(&s.storage);
        let session = LearningSession::open(&s.lesson, &progress, &fast);
        assert_eq!(session.index(), 2);
        assert_eq!(session.current(), Some("Three."));
    }

    #[test]
    fn test_translations_survive_reopen() {
        let s = setup("One. Two.");
        let progress = ProgressTracker::load(&s.storage);
        let mut fast = SentenceFastCache::load(&s.storage);
        let mut session = LearningSession::open(&s.lesson, &progress, &fast);
        session.set_translation(&mut fast, "一。");

        let reopened = LearningSession::open(&s.lesson, &progress, &fast);
        assert_eq!(reopened.translation(), Some("一。"));
    }

    #[test]
    fn test_prev_clamps() {
        let s = setup("Only one.");
        let progress = ProgressTracker::load(&s.storage);
        let fast = SentenceFastCache::load(&s.storage);
        let mut session = LearningSession::open(&s.lesson, &progress, &fast);
        assert_eq!(session.prev(), 0);
    }
}
