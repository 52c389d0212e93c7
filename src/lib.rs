//! # lingreader
//!
//! Core of a vocabulary-tracking reader: tokenizes foreign-language text,
//! tracks a learning status per word, and layers translation caches in
//! front of pluggable translation, dictionary and speech providers.
//!
//! ## Quick Start
//!
//! ```rust
//! use lingreader::{click, Status, StatusUpdate, StorageContext, TextRenderer, Tokenizer, VocabularyStore};
//!
//! let storage = StorageContext::in_memory();
//! let mut vocab = VocabularyStore::load(&storage);
//!
//! let tokens = Tokenizer::tokenize("The cat sat. It was happy.");
//! let cat = tokens.iter().position(|t| t.text == "cat").unwrap();
//! let selection = click(&tokens, cat).unwrap();
//! assert_eq!(selection.sentence.as_deref(), Some("The cat sat."));
//!
//! vocab
//!     .update_status("cat", StatusUpdate::new(Status::Learning).translation("猫").source("custom"))
//!     .unwrap();
//!
//! for rendered in TextRenderer::new(&vocab, true).render(&tokens) {
//!     if let Some(highlight) = rendered.highlight {
//!         println!("{} -> {}", rendered.token.text, highlight.level());
//!     }
//! }
//! ```
//!
//! ## Providers
//!
//! With the default `providers` feature, [`http`] supplies network
//! implementations of [`Translator`], [`PhoneticSource`] and
//! [`SpeechSynthesizer`]. Without it the crate has no network stack and
//! callers plug in their own.

pub mod backup;
pub mod char_categories;
pub mod error;
pub mod learning;
pub mod lessons;
pub mod lexicon;
pub mod orchestrator;
pub mod popup;
pub mod progress;
pub mod provider;
pub mod providers;
pub mod renderer;
pub mod review;
pub mod sentence;
pub mod sentence_cache;
pub mod settings;
pub mod speech;
pub mod state;
pub mod status;
pub mod storage;
pub mod token;
pub mod tokenizer;
pub mod translation_cache;
pub mod vocabulary;

// Network providers (only compiled when the "providers" feature is enabled)
#[cfg(feature = "providers")]
pub mod http;

// Re-export main types for convenience
pub use char_categories::{get_char_category, CharCategory};
pub use error::{BackupError, ConfigError, LessonError, ProviderError, SpeechError, StorageError};
pub use learning::LearningSession;
pub use lessons::{lesson_stats, Course, Lesson, LessonStats, LessonStore, NewLesson};
pub use lexicon::{FallbackLexicon, NoPhonetics, PhoneticSource};
pub use orchestrator::{
    DisplayedTranslation, FetchedWord, FillReport, LookupContext, Orchestrator, ProviderCheck, SentenceOrigin,
    SentenceOutcome, TranslationOrigin, WordCard, WordPlan,
};
pub use popup::{DraftCommit, RequestToken, RequestTracker, TranslationDraft, WordPopup};
pub use progress::ProgressTracker;
pub use provider::Provider;
pub use providers::{Accent, DictionaryData, Lexicon, ProviderConfig, TranslationResult, Translator};
pub use renderer::{click, word_style, Highlight, RenderedToken, TextRenderer, WordSelection};
pub use review::{ReviewCard, ReviewSession};
pub use sentence::{sentence_around, split_sentences, split_translation_lines, Sentence};
pub use sentence_cache::SentenceFastCache;
pub use settings::{Settings, SettingsStore};
pub use speech::{AudioOutput, Playback, Speaker, SpeechConfig, SpeechSynthesizer};
pub use state::ReaderState;
pub use status::Status;
pub use storage::{FileBackend, MemoryBackend, StorageBackend, StorageContext};
pub use token::{Token, TokenKind};
pub use tokenizer::Tokenizer;
pub use translation_cache::{CacheEntry, TranslationCache};
pub use vocabulary::{StatusUpdate, VocabFilter, VocabStats, VocabularyStore, WordEntry};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
