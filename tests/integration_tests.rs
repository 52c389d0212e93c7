//! End-to-end tests across the stores, the orchestrator and the reader
//! views, using in-process fake providers.

use lingreader::{
    click, split_sentences, Accent, DictionaryData, DraftCommit, Highlight, LearningSession, Lexicon,
    LookupContext, NewLesson, Orchestrator, Provider, ProviderConfig, ReaderState, Settings, Status,
    StatusUpdate, StorageContext, TextRenderer, Tokenizer, TranslationCache, TranslationOrigin,
    TranslationResult, Translator, VocabularyStore, WordPopup,
};
use std::collections::HashMap;
use std::sync::Mutex;

/// Answers from a fixed table and counts requests
struct FakeTranslator {
    answers: HashMap<&'static str, &'static str>,
    calls: Mutex<Vec<(String, Provider)>>,
}

impl FakeTranslator {
    fn new(answers: &[(&'static str, &'static str)]) -> Self {
        FakeTranslator {
            answers: answers.iter().copied().collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Translator for FakeTranslator {
    fn translate(
        &self,
        text: &str,
        _source_language: &str,
        _target_lang: &str,
        config: &ProviderConfig,
    ) -> Option<TranslationResult> {
        self.calls.lock().unwrap().push((text.to_string(), config.provider));
        let source = match config.provider {
            Provider::DeepSeek => "DeepSeek",
            _ => "MyMemory",
        };
        self.answers.get(text).map(|t| TranslationResult::new(*t, source))
    }
}

struct FakeLexicon;

impl Lexicon for FakeLexicon {
    fn lookup(&self, word: &str, _source_language: &str, _accent: Accent) -> DictionaryData {
        DictionaryData {
            phonetic: Some(format!("/{}/", word.to_lowercase())),
            audio_url: None,
        }
    }
}

fn deepseek_settings() -> Settings {
    Settings {
        translation_provider: Provider::DeepSeek,
        deepseek_api_key: "sk-test".to_string(),
        ..Settings::default()
    }
}

// =============================================================================
// Tokenizer Properties
// =============================================================================

#[test]
fn test_tokens_concatenate_to_input() {
    let samples = [
        "The cat sat. It was happy.",
        "  leading and trailing  ",
        "l'été — c'est «magnifique»!",
        "混合 text, 日本語も。",
        "",
        "\n\n",
    ];
    for text in samples {
        let tokens = Tokenizer::tokenize(text);
        let joined: String = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(joined, text);
        let mut offset = 0;
        for token in &tokens {
            assert_eq!(token.start, offset);
            offset = token.end();
        }
    }
}

#[test]
fn test_words_alternate_with_separators() {
    let tokens = Tokenizer::tokenize("Don't panic, friend.");
    let words: Vec<&str> = tokens.iter().filter(|t| t.is_word()).map(|t| t.text.as_str()).collect();
    assert_eq!(words, vec!["Don't", "panic", "friend"]);
    for pair in tokens.windows(2) {
        assert!(!(pair[0].is_word() && pair[1].is_word()));
    }
}

// =============================================================================
// Vocabulary Store
// =============================================================================

#[test]
fn test_unknown_word_is_new() {
    let vocab = VocabularyStore::load(&StorageContext::in_memory());
    assert_eq!(vocab.get_status("anything"), Status::New);
    assert!(vocab.lookup("anything").is_none());
}

#[test]
fn test_status_change_keeps_other_fields() {
    let mut vocab = VocabularyStore::load(&StorageContext::in_memory());
    vocab
        .update_status(
            "cat",
            StatusUpdate::new(Status::Hard)
                .translation("猫")
                .phonetic("kæt")
                .sentence("The cat sat."),
        )
        .unwrap();
    vocab.set_status("cat", Status::Known).unwrap();

    let entry = vocab.lookup("cat").unwrap();
    assert_eq!(entry.status, Status::Known);
    assert_eq!(entry.translation.as_deref(), Some("猫"));
    assert_eq!(entry.phonetic.as_deref(), Some("kæt"));
    assert_eq!(entry.sentence.as_deref(), Some("The cat sat."));
}

#[test]
fn test_vocabulary_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let storage = StorageContext::with_data_dir(dir.path()).unwrap();
        let mut vocab = VocabularyStore::load(&storage);
        vocab.set_status("hund", Status::Familiar).unwrap();
    }
    let storage = StorageContext::with_data_dir(dir.path()).unwrap();
    let vocab = VocabularyStore::load(&storage);
    assert_eq!(vocab.get_status("hund"), Status::Familiar);
}

// =============================================================================
// Translation Caches And Lookup Precedence
// =============================================================================

#[test]
fn test_cache_isolated_per_provider() {
    let mut cache = TranslationCache::load(&StorageContext::in_memory());
    let result = TranslationResult::new("狗", "MyMemory");
    cache
        .save_word_translation("dog", &result, "zh-Hans", Provider::Default)
        .unwrap();

    assert!(cache
        .get_cached_word_translation("dog", "zh-Hans", Provider::Default)
        .is_some());
    assert!(cache
        .get_cached_word_translation("dog", "zh-Hans", Provider::DeepSeek)
        .is_none());
}

#[test]
fn test_custom_translation_beats_every_provider() {
    let storage = StorageContext::in_memory();
    let mut vocab = VocabularyStore::load(&storage);
    let mut cache = TranslationCache::load(&storage);
    vocab
        .update_status("cat", StatusUpdate::new(Status::Learning).translation("小猫").source("custom"))
        .unwrap();
    cache
        .save_word_translation("cat", &TranslationResult::new("猫", "DeepSeek"), "zh-Hans", Provider::DeepSeek)
        .unwrap();

    let translator = FakeTranslator::new(&[("cat", "猫")]);
    let orchestrator = Orchestrator::new(&translator, &FakeLexicon);
    for settings in [Settings::default(), deepseek_settings()] {
        let ctx = LookupContext::new("English", &settings);
        let card = orchestrator.lookup_word(&mut vocab, &mut cache, "cat", &ctx).unwrap();
        assert_eq!(card.origin, Some(TranslationOrigin::Custom));
        assert_eq!(card.translation.unwrap().text, "小猫");
    }
    assert_eq!(translator.call_count(), 0);
}

#[test]
fn test_switching_provider_refetches() {
    let storage = StorageContext::in_memory();
    let mut vocab = VocabularyStore::load(&storage);
    let mut cache = TranslationCache::load(&storage);
    let translator = FakeTranslator::new(&[("dog", "狗")]);
    let orchestrator = Orchestrator::new(&translator, &FakeLexicon);

    let free = LookupContext::new("English", &Settings::default());
    let first = orchestrator.lookup_word(&mut vocab, &mut cache, "dog", &free).unwrap();
    assert_eq!(first.origin, Some(TranslationOrigin::Fetched));
    let again = orchestrator.lookup_word(&mut vocab, &mut cache, "dog", &free).unwrap();
    assert_eq!(again.origin, Some(TranslationOrigin::Cache));
    assert_eq!(translator.call_count(), 1);

    let deepseek = LookupContext::new("English", &deepseek_settings());
    let third = orchestrator.lookup_word(&mut vocab, &mut cache, "dog", &deepseek).unwrap();
    assert_eq!(third.origin, Some(TranslationOrigin::Fetched));
    assert_eq!(third.translation.unwrap().provider, Provider::DeepSeek);
    assert_eq!(translator.call_count(), 2);
}

#[test]
fn test_missing_key_fails_before_any_call() {
    let storage = StorageContext::in_memory();
    let mut vocab = VocabularyStore::load(&storage);
    let mut cache = TranslationCache::load(&storage);
    let translator = FakeTranslator::new(&[("dog", "狗")]);
    let orchestrator = Orchestrator::new(&translator, &FakeLexicon);

    let settings = Settings {
        translation_provider: Provider::DeepSeek,
        ..Settings::default()
    };
    let ctx = LookupContext::new("English", &settings);
    assert!(orchestrator.lookup_word(&mut vocab, &mut cache, "dog", &ctx).is_err());
    assert_eq!(translator.call_count(), 0);
}

// =============================================================================
// Progress
// =============================================================================

#[test]
fn test_progress_clamps_negative() {
    let mut state = ReaderState::open(StorageContext::in_memory());
    state.progress.set(7, -4).unwrap();
    assert_eq!(state.progress.get(7), 0);
    assert_eq!(state.progress.resume_index(7, 3), 0);
}

#[test]
fn test_learning_session_resumes() {
    let mut state = ReaderState::open(StorageContext::in_memory());
    let id = state
        .lessons
        .add(NewLesson::new("Story", "One. Two. Three."))
        .unwrap()
        .id;
    let lesson = state.lessons.get(id).unwrap().clone();

    let mut session = LearningSession::open(&lesson, &state.progress, &state.fast_cache);
    assert_eq!(session.len(), 3);
    session.next(&mut state.progress).unwrap();
    session.next(&mut state.progress).unwrap();
    assert_eq!(state.progress.get(id), 2);

    let reopened = LearningSession::open(&lesson, &state.progress, &state.fast_cache);
    assert_eq!(reopened.index(), 1);
    assert_eq!(reopened.current(), Some("Two."));
}

// =============================================================================
// Reader Flow
// =============================================================================

#[test]
fn test_click_selects_enclosing_sentence() {
    let tokens = Tokenizer::tokenize("The cat sat. It was happy.");
    let idx = tokens.iter().position(|t| t.text == "cat").unwrap();
    let selection = click(&tokens, idx).unwrap();
    assert_eq!(selection.word, "cat");
    assert_eq!(selection.sentence.as_deref(), Some("The cat sat."));

    let space = tokens.iter().position(|t| t.text == " ").unwrap();
    assert!(click(&tokens, space).is_none());
}

#[test]
fn test_tag_word_from_popup_and_render() {
    let mut state = ReaderState::open(StorageContext::in_memory());
    let text = "The cat sat. It was happy.";
    let tokens = Tokenizer::tokenize(text);
    let translator = FakeTranslator::new(&[("cat", "猫科动物"), ("The cat sat.", "猫坐着。")]);
    let orchestrator = Orchestrator::new(&translator, &FakeLexicon);
    let ctx = state.lookup_context("English");

    let idx = tokens.iter().position(|t| t.text == "cat").unwrap();
    let mut popup = WordPopup::new();
    let token = popup.open(click(&tokens, idx).unwrap(), &state.fast_cache, "English");
    let card = orchestrator
        .lookup_word(&mut state.vocabulary, &mut state.cache, "cat", &ctx)
        .unwrap();
    assert!(popup.apply(token, card));
    assert_eq!(popup.draft().text(), "猫科动物");

    let sentence = popup
        .translate_sentence(&orchestrator, &mut state.cache, &mut state.fast_cache, &ctx)
        .unwrap();
    assert_eq!(sentence, Some("猫坐着。"));

    popup.edit_translation("猫");
    popup.assign_status(&mut state.vocabulary, Status::Learning).unwrap();
    assert!(!popup.is_open());

    let entry = state.vocabulary.lookup("cat").unwrap();
    assert_eq!(entry.status, Status::Learning);
    assert_eq!(entry.translation.as_deref(), Some("猫"));
    assert_eq!(entry.translation_source, Some(Provider::Custom));
    assert_eq!(entry.sentence.as_deref(), Some("The cat sat."));
    assert_eq!(entry.phonetic.as_deref(), Some("/cat/"));

    let rendered = TextRenderer::new(&state.vocabulary, true).render(&tokens);
    let highlight = |word: &str| rendered.iter().find(|r| r.token.text == word).and_then(|r| r.highlight);
    assert_eq!(highlight("cat").map(|h| h.level()), Some(2));
    assert_eq!(highlight("The"), Some(Highlight::from(Status::New)));
    assert_eq!(highlight("sat").map(|h| h.level()), Some(0));
    let cat = rendered.iter().find(|r| r.token.text == "cat").unwrap();
    assert_eq!(cat.translation, Some("猫"));
}

#[test]
fn test_stale_lookup_is_dropped() {
    let mut state = ReaderState::open(StorageContext::in_memory());
    let tokens = Tokenizer::tokenize("Big dog. Small cat.");
    let translator = FakeTranslator::new(&[("dog", "狗"), ("cat", "猫")]);
    let orchestrator = Orchestrator::new(&translator, &FakeLexicon);
    let ctx = state.lookup_context("English");
    let at = |w: &str| tokens.iter().position(|t| t.text == w).unwrap();

    let mut popup = WordPopup::new();
    let first = popup.open(click(&tokens, at("dog")).unwrap(), &state.fast_cache, "English");
    let second = popup.open(click(&tokens, at("cat")).unwrap(), &state.fast_cache, "English");

    let dog = orchestrator
        .lookup_word(&mut state.vocabulary, &mut state.cache, "dog", &ctx)
        .unwrap();
    assert!(!popup.apply(first, dog));
    let cat = orchestrator
        .lookup_word(&mut state.vocabulary, &mut state.cache, "cat", &ctx)
        .unwrap();
    assert!(popup.apply(second, cat));
    assert_eq!(popup.card().unwrap().word, "cat");
}

#[test]
fn test_clearing_translation_creates_no_entry() {
    let mut state = ReaderState::open(StorageContext::in_memory());
    let tokens = Tokenizer::tokenize("A bird.");
    let mut popup = WordPopup::new();
    popup.open(click(&tokens, 2).unwrap(), &state.fast_cache, "English");
    popup.edit_translation("   ");
    assert_eq!(popup.close(&mut state.vocabulary).unwrap(), DraftCommit::Cleared);
    assert!(state.vocabulary.lookup("bird").is_none());
}

// =============================================================================
// Backup
// =============================================================================

#[test]
fn test_backup_restores_everything() {
    let mut source = ReaderState::open(StorageContext::in_memory());
    let id = source
        .lessons
        .add(NewLesson::new("Note", "First line. Second line."))
        .unwrap()
        .id;
    source.vocabulary.set_status("line", Status::AlmostKnown).unwrap();
    source.progress.set(id, 1).unwrap();
    source.settings.update(|s| s.accent = Accent::Uk).unwrap();
    let doc = source.export();

    let mut target = ReaderState::open(StorageContext::in_memory());
    target.import(&doc).unwrap();
    let lesson = target.lessons.get(id).unwrap();
    assert_eq!(split_sentences(&lesson.content).len(), 2);
    assert_eq!(target.vocabulary.get_status("line"), Status::AlmostKnown);
    assert_eq!(target.progress.get(id), 1);
    assert_eq!(target.settings.get().accent, Accent::Uk);
}
