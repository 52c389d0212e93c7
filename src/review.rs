//! Flashcard review over words with status 1-4.

use tracing::warn;

use crate::error::{ConfigError, StorageError};
use crate::orchestrator::{LookupContext, Orchestrator};
use crate::status::Status;
use crate::translation_cache::TranslationCache;
use crate::vocabulary::{StatusUpdate, VocabularyStore};

/// Snapshot of one word under review
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewCard {
    pub word: String,
    pub status: Status,
    pub sentence: Option<String>,
    pub translation: Option<String>,
    pub phonetic: Option<String>,
}

/// Walks the review list once, card by card
#[derive(Debug)]
pub struct ReviewSession {
    cards: Vec<ReviewCard>,
    index: usize,
    revealed: bool,
    finished: bool,
    fetched_translation: Option<String>,
    fetched_phonetic: Option<String>,
}

impl ReviewSession {
    pub fn start(vocab: &VocabularyStore) -> Self {
        let cards = vocab
            .review_list()
            .into_iter()
            .map(|(word, entry)| ReviewCard {
                word: word.to_string(),
                status: entry.status,
                sentence: entry.sentence.clone(),
                translation: entry.translation.clone(),
                phonetic: entry.phonetic.clone(),
            })
            .collect();
        ReviewSession {
            cards,
            index: 0,
            revealed: false,
            finished: false,
            fetched_translation: None,
            fetched_phonetic: None,
        }
    }

    /// Nothing to review
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// 1-based position of the current card
    pub fn position(&self) -> usize {
        (self.index + 1).min(self.cards.len())
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn current(&self) -> Option<&ReviewCard> {
        if self.finished {
            return None;
        }
        self.cards.get(self.index)
    }

    /// Translation shown on the back of the card
    pub fn answer(&self) -> Option<&str> {
        let card = self.current()?;
        card.translation.as_deref().or(self.fetched_translation.as_deref())
    }

    pub fn answer_phonetic(&self) -> Option<&str> {
        let card = self.current()?;
        card.phonetic.as_deref().or(self.fetched_phonetic.as_deref())
    }

    /// Turn the card over, fetching a translation if the word has none.
    ///
    /// Lookup order: stored translation, word cache, provider. A fetched
    /// translation is cached; the phonetic is fetched alongside it.
    pub fn reveal(
        &mut self,
        orchestrator: &Orchestrator<'_>,
        cache: &mut TranslationCache,
        ctx: &LookupContext,
    ) -> Result<Option<&str>, ConfigError> {
        let Some(card) = self.current().cloned() else {
            return Ok(None);
        };
        self.revealed = true;

        if card.translation.is_none() && self.fetched_translation.is_none() {
            let cached = cache
                .get_cached_word_translation(&card.word, &ctx.target_lang, ctx.provider())
                .map(|entry| entry.text.clone());
            match cached {
                Some(text) => self.fetched_translation = Some(text),
                None => {
                    ctx.config.validate()?;
                    let fetched = orchestrator.fetch_word(&card.word, ctx, true);
                    if let Some(result) = &fetched.translation {
                        if let Err(e) =
                            cache.save_word_translation(&card.word, result, &ctx.target_lang, ctx.provider())
                        {
                            warn!(word = %card.word, error = %e, "failed to cache word translation");
                        }
                    }
                    self.fetched_translation = fetched.translation.map(|r| r.text);
                    self.fetched_phonetic = fetched.dictionary.phonetic;
                }
            }
        }
        Ok(self.answer())
    }

    /// Record a new status for the current card (keeping its sentence) and
    /// move on. Returns true when the session is finished.
    pub fn grade(&mut self, vocab: &mut VocabularyStore, status: Status) -> Result<bool, StorageError> {
        let Some(card) = self.current() else {
            return Ok(self.finished);
        };
        let mut update = StatusUpdate::new(status);
        if let Some(sentence) = &card.sentence {
            update = update.sentence(sentence.clone());
        }
        vocab.update_status(&card.word, update)?;

        if self.index + 1 < self.cards.len() {
            self.index += 1;
        } else {
            self.finished = true;
        }
        self.revealed = false;
        self.fetched_translation = None;
        self.fetched_phonetic = None;
        Ok(self.finished)
    }

    /// Start over with the current review list
    pub fn restart(&mut self, vocab: &VocabularyStore) {
        *self = ReviewSession::start(vocab);
    }
}
