//! Word popup state: stale-response guard, translation editing and
//! status assignment.

use tracing::debug;

use crate::error::{ConfigError, StorageError};
use crate::orchestrator::{LookupContext, Orchestrator, SentenceOutcome, WordCard};
use crate::provider::Provider;
use crate::renderer::WordSelection;
use crate::sentence_cache::SentenceFastCache;
use crate::status::Status;
use crate::translation_cache::TranslationCache;
use crate::vocabulary::{StatusUpdate, VocabularyStore};

/// Identifies one lookup started by a popup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// Hands out tokens; only the latest one is current
#[derive(Debug, Default)]
pub struct RequestTracker {
    issued: u64,
    current: Option<u64>,
}

impl RequestTracker {
    pub fn begin(&mut self) -> RequestToken {
        self.issued += 1;
        self.current = Some(self.issued);
        RequestToken(self.issued)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.current == Some(token.0)
    }

    /// Make every issued token stale
    pub fn invalidate(&mut self) {
        self.current = None;
    }
}

/// What committing a draft did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftCommit {
    Unchanged,
    Saved(String),
    Cleared,
}

/// A translation being edited, with dirty tracking against the loaded text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationDraft {
    initial: String,
    text: String,
}

impl TranslationDraft {
    pub fn load(initial: Option<&str>) -> Self {
        let initial = initial.unwrap_or_default().to_string();
        TranslationDraft {
            text: initial.clone(),
            initial,
        }
    }

    pub fn edit(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_dirty(&self) -> bool {
        self.text != self.initial
    }

    /// What committing would write, without writing anything
    pub fn pending(&self) -> DraftCommit {
        if !self.is_dirty() {
            return DraftCommit::Unchanged;
        }
        match self.text.trim() {
            "" => DraftCommit::Cleared,
            trimmed => DraftCommit::Saved(trimmed.to_string()),
        }
    }

    /// Write a changed draft to the vocabulary as a custom translation.
    ///
    /// Blank text clears the stored translation instead. An untagged word
    /// edited to a non-empty translation is tagged `Hard`.
    pub fn commit(&mut self, vocab: &mut VocabularyStore, word: &str) -> Result<DraftCommit, StorageError> {
        let trimmed = match self.pending() {
            DraftCommit::Unchanged => return Ok(DraftCommit::Unchanged),
            DraftCommit::Cleared => {
                vocab.clear_translation(word)?;
                *self = TranslationDraft::default();
                return Ok(DraftCommit::Cleared);
            }
            DraftCommit::Saved(text) => text,
        };

        let status = match vocab.get_status(word) {
            Status::New => Status::Hard,
            status => status,
        };
        vocab.update_status(
            word,
            StatusUpdate::new(status)
                .translation(trimmed.clone())
                .source(Provider::Custom.as_str()),
        )?;
        debug!(word, "saved custom translation");
        *self = TranslationDraft::load(Some(&trimmed));
        Ok(DraftCommit::Saved(trimmed))
    }
}

/// State of the popup shown for a clicked word
#[derive(Debug, Default)]
pub struct WordPopup {
    tracker: RequestTracker,
    selection: Option<WordSelection>,
    card: Option<WordCard>,
    draft: TranslationDraft,
    sentence_translation: Option<String>,
}

impl WordPopup {
    pub fn new() -> Self {
        WordPopup::default()
    }

    /// Show a new word; the returned token must accompany its lookup result.
    ///
    /// A sentence translation already in the session fast cache is shown
    /// immediately.
    pub fn open(&mut self, selection: WordSelection, fast: &SentenceFastCache, language: &str) -> RequestToken {
        self.sentence_translation = selection
            .sentence
            .as_deref()
            .and_then(|s| fast.get(s, language))
            .map(str::to_string);
        self.selection = Some(selection);
        self.card = None;
        self.draft = TranslationDraft::default();
        self.tracker.begin()
    }

    /// Show a finished lookup unless the popup has moved on. Returns whether
    /// the card was applied.
    pub fn apply(&mut self, token: RequestToken, card: WordCard) -> bool {
        if !self.tracker.is_current(token) {
            debug!(word = %card.word, "dropping stale lookup");
            return false;
        }
        self.draft = TranslationDraft::load(card.translation.as_ref().map(|t| t.text.as_str()));
        self.card = Some(card);
        true
    }

    pub fn is_open(&self) -> bool {
        self.selection.is_some()
    }

    pub fn selection(&self) -> Option<&WordSelection> {
        self.selection.as_ref()
    }

    pub fn card(&self) -> Option<&WordCard> {
        self.card.as_ref()
    }

    pub fn draft(&self) -> &TranslationDraft {
        &self.draft
    }

    pub fn sentence_translation(&self) -> Option<&str> {
        self.sentence_translation.as_deref()
    }

    pub fn edit_translation(&mut self, text: impl Into<String>) {
        self.draft.edit(text);
    }

    /// Translate the selected word's sentence, if not already shown
    pub fn translate_sentence(
        &mut self,
        orchestrator: &Orchestrator<'_>,
        cache: &mut TranslationCache,
        fast: &mut SentenceFastCache,
        ctx: &LookupContext,
    ) -> Result<Option<&str>, ConfigError> {
        if self.sentence_translation.is_none() {
            let Some(sentence) = self.selection.as_ref().and_then(|s| s.sentence.clone()) else {
                return Ok(None);
            };
            if let SentenceOutcome::Translated { text, .. } =
                orchestrator.translate_sentence(cache, fast, &sentence, ctx)?
            {
                self.sentence_translation = Some(text);
            }
        }
        Ok(self.sentence_translation.as_deref())
    }

    /// Commit any pending edit and close
    pub fn close(&mut self, vocab: &mut VocabularyStore) -> Result<DraftCommit, StorageError> {
        let commit = match &self.selection {
            Some(selection) => self.draft.commit(vocab, &selection.word)?,
            None => DraftCommit::Unchanged,
        };
        self.reset();
        Ok(commit)
    }

    /// Tag the word with `status`, storing the pending edit (or the
    /// displayed translation), phonetic and provider in a single write,
    /// then close. On failure nothing is stored and the popup stays open.
    pub fn assign_status(&mut self, vocab: &mut VocabularyStore, status: Status) -> Result<(), StorageError> {
        let Some(selection) = self.selection.clone() else {
            return Ok(());
        };

        let mut update = StatusUpdate::new(status);
        if let Some(sentence) = &selection.sentence {
            update = update.sentence(sentence.clone());
        }
        match self.draft.pending() {
            DraftCommit::Saved(text) => {
                update = update.translation(text).source(Provider::Custom.as_str());
            }
            DraftCommit::Cleared => update = update.without_translation(),
            DraftCommit::Unchanged => {
                if let Some(shown) = self.card.as_ref().and_then(|c| c.translation.as_ref()) {
                    update = update.translation(shown.text.clone()).source(shown.provider.as_str());
                }
            }
        }
        if let Some(phonetic) = self.card.as_ref().and_then(|c| c.dictionary.phonetic.clone()) {
            update = update.phonetic(phonetic);
        }

        vocab.update_status(&selection.word, update)?;
        self.reset();
        Ok(())
    }

    fn reset(&mut self) {
        self.tracker.invalidate();
        self.selection = None;
        self.card = None;
        self.draft = TranslationDraft::default();
        self.sentence_translation = None;
    }
}
