//! Translation lookup precedence, provider calls and cache write-back.
//!
//! A word lookup runs in three phases so that a front end can run the
//! network part off its event loop:
//!
//! 1. [`Orchestrator::plan_word`] decides from local state alone whether a
//!    translation is already available.
//! 2. [`Orchestrator::fetch_word`] calls the providers; translation and
//!    dictionary requests run concurrently.
//! 3. [`Orchestrator::complete_word`] writes successful results back to the
//!    stores. This always runs, even if the caller no longer shows the word.

use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::ConfigError;
use crate::provider::Provider;
use crate::providers::{Accent, DictionaryData, Lexicon, ProviderConfig, TranslationResult, Translator};
use crate::sentence_cache::SentenceFastCache;
use crate::settings::Settings;
use crate::translation_cache::{CacheEntry, TranslationCache};
use crate::vocabulary::{StatusUpdate, VocabularyStore, WordEntry};

/// Text used to check that a provider answers
const PROBE_TEXT: &str = "hello world";

/// Everything a lookup needs to know about the reader's current setup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupContext {
    /// Lesson language name, e.g. "English"
    pub source_language: String,
    pub target_lang: String,
    pub config: ProviderConfig,
    pub accent: Accent,
}

impl LookupContext {
    pub fn new(source_language: impl Into<String>, settings: &Settings) -> Self {
        LookupContext {
            source_language: source_language.into(),
            target_lang: settings.target_lang().to_string(),
            config: settings.provider_config(),
            accent: settings.accent,
        }
    }

    /// Active translation provider
    pub fn provider(&self) -> Provider {
        self.config.provider
    }
}

/// A translation as shown to the learner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayedTranslation {
    pub text: String,
    pub source: Option<String>,
    pub provider: Provider,
}

impl DisplayedTranslation {
    fn custom(text: impl Into<String>) -> Self {
        DisplayedTranslation {
            text: text.into(),
            source: Some(Provider::Custom.as_str().to_string()),
            provider: Provider::Custom,
        }
    }

    /// Label for the provenance line
    pub fn source_label(&self) -> String {
        Provider::display_label(self.source.as_deref().unwrap_or(self.provider.as_str()))
    }
}

impl From<&CacheEntry> for DisplayedTranslation {
    fn from(entry: &CacheEntry) -> Self {
        DisplayedTranslation {
            text: entry.text.clone(),
            source: entry.source.clone(),
            provider: entry.provider,
        }
    }
}

/// Which precedence step produced a translation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationOrigin {
    /// User-typed translation in the vocabulary
    Custom,
    /// Provider-matching word cache entry
    Cache,
    /// Vocabulary translation recorded from the active provider
    Stored,
    /// Fresh provider call
    Fetched,
}

/// Outcome of the local-state phase of a word lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordPlan {
    Resolved {
        translation: DisplayedTranslation,
        origin: TranslationOrigin,
    },
    Fetch,
}

impl WordPlan {
    pub fn needs_fetch(&self) -> bool {
        matches!(self, WordPlan::Fetch)
    }
}

/// Raw provider results for one word
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedWord {
    pub translation: Option<TranslationResult>,
    pub dictionary: DictionaryData,
}

/// A completed word lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordCard {
    pub word: String,
    /// `None` when every source failed
    pub translation: Option<DisplayedTranslation>,
    pub origin: Option<TranslationOrigin>,
    pub dictionary: DictionaryData,
}

/// Where a sentence translation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceOrigin {
    /// Session fast path
    Session,
    /// Provider-matching sentence cache entry
    Cache,
    Fetched,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentenceOutcome {
    Translated { text: String, origin: SentenceOrigin },
    /// Provider failed; nothing was cached
    Unavailable,
}

impl SentenceOutcome {
    pub fn text(&self) -> Option<&str> {
        match self {
            SentenceOutcome::Translated { text, .. } => Some(text),
            SentenceOutcome::Unavailable => None,
        }
    }
}

/// Result of probing the active provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderCheck {
    /// The free engine has nothing to validate
    NotRequired,
    Available,
    Failed,
}

/// Summary of a bulk fill
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillReport {
    pub updated: usize,
    pub failed: usize,
}

/// Stored translation of a word with its effective provider. A
/// translation without provenance was typed by the user.
fn stored_translation(entry: Option<&WordEntry>) -> Option<DisplayedTranslation> {
    let entry = entry?;
    let text = entry.translation.as_ref()?;
    let provider = entry.translation_source.unwrap_or(Provider::Custom);
    Some(DisplayedTranslation {
        text: text.clone(),
        source: Some(provider.as_str().to_string()),
        provider,
    })
}

/// Drives the translator and lexicon against the stores
pub struct Orchestrator<'p> {
    translator: &'p dyn Translator,
    lexicon: &'p dyn Lexicon,
}

impl<'p> Orchestrator<'p> {
    pub fn new(translator: &'p dyn Translator, lexicon: &'p dyn Lexicon) -> Self {
        Orchestrator { translator, lexicon }
    }

    /// Decide from local state whether `word` needs a provider call.
    ///
    /// Precedence: a custom translation always wins, then a word cache entry
    /// for the active provider, then a vocabulary translation recorded from
    /// the active provider.
    pub fn plan_word(
        &self,
        vocab: &VocabularyStore,
        cache: &TranslationCache,
        word: &str,
        ctx: &LookupContext,
    ) -> WordPlan {
        let provider = ctx.provider();
        let stored = stored_translation(vocab.lookup(word));

        if let Some(saved) = stored.as_ref().filter(|s| s.provider == Provider::Custom) {
            debug!(word, "using custom translation");
            return WordPlan::Resolved {
                translation: DisplayedTranslation::custom(saved.text.clone()),
                origin: TranslationOrigin::Custom,
            };
        }
        if let Some(entry) = cache.get_cached_word_translation(word, &ctx.target_lang, provider) {
            debug!(word, %provider, "word cache hit");
            return WordPlan::Resolved {
                translation: entry.into(),
                origin: TranslationOrigin::Cache,
            };
        }
        if let Some(saved) = stored.filter(|s| s.provider == provider) {
            debug!(word, %provider, "reusing stored translation");
            return WordPlan::Resolved {
                translation: saved,
                origin: TranslationOrigin::Stored,
            };
        }
        debug!(word, %provider, "word cache miss");
        WordPlan::Fetch
    }

    /// Call the providers. The dictionary lookup always runs; the
    /// translation only when `translate` is set. Both run concurrently.
    pub fn fetch_word(&self, word: &str, ctx: &LookupContext, translate: bool) -> FetchedWord {
        thread::scope(|scope| {
            let dictionary = scope.spawn(|| self.lexicon.lookup(word, &ctx.source_language, ctx.accent));
            let translation = if translate {
                self.translate(word, ctx)
            } else {
                None
            };
            let dictionary = dictionary.join().unwrap_or_else(|_| {
                warn!(word, "dictionary lookup panicked");
                DictionaryData::default()
            });
            FetchedWord {
                translation,
                dictionary,
            }
        })
    }

    /// Apply a lookup: persist a fetched translation into the word cache and
    /// onto an existing vocabulary entry, then build the card.
    ///
    /// Storage failures are logged; the card still shows the result.
    pub fn complete_word(
        &self,
        vocab: &mut VocabularyStore,
        cache: &mut TranslationCache,
        word: &str,
        ctx: &LookupContext,
        plan: WordPlan,
        fetched: FetchedWord,
    ) -> WordCard {
        let (translation, origin) = match plan {
            WordPlan::Resolved { translation, origin } => (Some(translation), Some(origin)),
            WordPlan::Fetch => match fetched.translation {
                Some(result) => {
                    let provider = ctx.provider();
                    if let Err(e) = cache.save_word_translation(word, &result, &ctx.target_lang, provider) {
                        warn!(word, error = %e, "failed to cache word translation");
                    }
                    if let Err(e) = vocab.record_translation(word, &result.text, provider) {
                        warn!(word, error = %e, "failed to record translation");
                    }
                    let shown = DisplayedTranslation {
                        text: result.text,
                        source: result.source,
                        provider,
                    };
                    (Some(shown), Some(TranslationOrigin::Fetched))
                }
                None => (None, None),
            },
        };
        WordCard {
            word: word.to_string(),
            translation,
            origin,
            dictionary: fetched.dictionary,
        }
    }

    /// All three phases in one call
    pub fn lookup_word(
        &self,
        vocab: &mut VocabularyStore,
        cache: &mut TranslationCache,
        word: &str,
        ctx: &LookupContext,
    ) -> Result<WordCard, ConfigError> {
        let plan = self.plan_word(vocab, cache, word, ctx);
        if plan.needs_fetch() {
            ctx.config.validate()?;
        }
        let fetched = self.fetch_word(word, ctx, plan.needs_fetch());
        Ok(self.complete_word(vocab, cache, word, ctx, plan, fetched))
    }

    /// Translate a sentence: session fast path, then the provider-matching
    /// sentence cache, then the provider. Failures are not cached.
    pub fn translate_sentence(
        &self,
        cache: &mut TranslationCache,
        fast: &mut SentenceFastCache,
        sentence: &str,
        ctx: &LookupContext,
    ) -> Result<SentenceOutcome, ConfigError> {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            return Ok(SentenceOutcome::Unavailable);
        }
        if let Some(text) = fast.get(sentence, &ctx.source_language) {
            return Ok(SentenceOutcome::Translated {
                text: text.to_string(),
                origin: SentenceOrigin::Session,
            });
        }

        let provider = ctx.provider();
        if let Some(entry) = cache.get_cached_sentence_translation(sentence, &ctx.target_lang, provider) {
            let text = entry.text.clone();
            fast.set(sentence, &ctx.source_language, Some(&text));
            return Ok(SentenceOutcome::Translated {
                text,
                origin: SentenceOrigin::Cache,
            });
        }

        ctx.config.validate()?;
        let Some(result) = self.translate(sentence, ctx) else {
            return Ok(SentenceOutcome::Unavailable);
        };
        if let Err(e) = cache.save_sentence_translation(sentence, &result, &ctx.target_lang, provider) {
            warn!(error = %e, "failed to cache sentence translation");
        }
        fast.set(sentence, &ctx.source_language, Some(&result.text));
        Ok(SentenceOutcome::Translated {
            text: result.text,
            origin: SentenceOrigin::Fetched,
        })
    }

    /// Check that the active provider is usable
    pub fn validate_provider(&self, ctx: &LookupContext) -> Result<ProviderCheck, ConfigError> {
        if ctx.provider() == Provider::Default {
            return Ok(ProviderCheck::NotRequired);
        }
        ctx.config.validate()?;
        match self.translate(PROBE_TEXT, ctx) {
            Some(_) => Ok(ProviderCheck::Available),
            None => Ok(ProviderCheck::Failed),
        }
    }

    /// Fetch translations and phonetics for every vocabulary entry missing
    /// one of them, keeping whatever each entry already has.
    ///
    /// `delay` is slept between words to stay under provider rate limits.
    pub fn fill_missing(
        &self,
        vocab: &mut VocabularyStore,
        cache: &mut TranslationCache,
        ctx: &LookupContext,
        delay: Duration,
    ) -> Result<FillReport, ConfigError> {
        ctx.config.validate()?;
        let provider = ctx.provider();
        let pending: Vec<(String, WordEntry)> = vocab
            .entries()
            .filter(|(_, entry)| entry.is_incomplete())
            .map(|(word, entry)| (word.to_string(), entry.clone()))
            .collect();
        info!(count = pending.len(), "filling missing vocabulary data");

        let mut report = FillReport::default();
        for (i, (word, entry)) in pending.iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                thread::sleep(delay);
            }

            let cached = match entry.translation {
                Some(_) => None,
                None => cache
                    .get_cached_word_translation(word, &ctx.target_lang, provider)
                    .map(|c| c.text.clone()),
            };
            let needs_translation = entry.translation.is_none() && cached.is_none();
            let fetched = self.fetch_word(word, ctx, needs_translation);

            let translation = match (cached, fetched.translation) {
                (Some(text), _) => Some(text),
                (None, Some(result)) => {
                    if let Err(e) = cache.save_word_translation(word, &result, &ctx.target_lang, provider) {
                        warn!(word = %word, error = %e, "failed to cache word translation");
                    }
                    Some(result.text)
                }
                (None, None) => None,
            };
            let phonetic = match entry.phonetic {
                Some(_) => None,
                None => fetched.dictionary.phonetic,
            };
            if translation.is_none() && phonetic.is_none() {
                report.failed += 1;
                continue;
            }

            let mut update = StatusUpdate::new(entry.status);
            if let Some(text) = translation {
                update = update.translation(text).source(provider.as_str());
            }
            if let Some(phonetic) = phonetic {
                update = update.phonetic(phonetic);
            }
            match vocab.update_status(word, update) {
                Ok(_) => report.updated += 1,
                Err(e) => {
                    warn!(word = %word, error = %e, "failed to store filled data");
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    /// Provider translation, with empty results treated as failure
    pub fn translate(&self, text: &str, ctx: &LookupContext) -> Option<TranslationResult> {
        let result = self
            .translator
            .translate(text, &ctx.source_language, &ctx.target_lang, &ctx.config)
            .filter(|r| !r.text.trim().is_empty());
        if result.is_none() {
            warn!(provider = %ctx.provider(), chars = text.chars().count(), "translation unavailable");
        }
        result
    }
}
