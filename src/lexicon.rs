//! Phonetic lookup with a fallback chain.
//!
//! English words go through: exact word, then guessed root forms, then a
//! small built-in table of function words. Audio is a URL rule and needs
//! no lookup at all.

use once_cell::sync::Lazy;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::HashMap;
use tracing::debug;

use crate::providers::{lang_code, Accent, DictionaryData, Lexicon};

/// Same set `encodeURIComponent` leaves alone
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

static COMMON_PHONETICS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("one", "wʌn"),
        ("the", "ðə"),
        ("of", "əv"),
        ("in", "ɪn"),
        ("a", "ə"),
        ("an", "æn"),
        ("to", "tuː"),
        ("on", "ɒn"),
        ("at", "æt"),
        ("for", "fɔːr"),
        ("from", "frɒm"),
        ("by", "baɪ"),
        ("with", "wɪð"),
        ("your", "jɔːr"),
        ("as", "æz"),
        ("is", "ɪz"),
        ("are", "ɑːr"),
        ("was", "wɒz"),
        ("were", "wɜːr"),
        ("be", "biː"),
        ("have", "hæv"),
        ("has", "hæz"),
        ("had", "hæd"),
        ("do", "duː"),
        ("does", "dʌz"),
        ("did", "dɪd"),
        ("will", "wɪl"),
        ("would", "wʊd"),
        ("can", "kæn"),
        ("could", "kʊd"),
        ("should", "ʃʊd"),
        ("may", "meɪ"),
        ("might", "maɪt"),
        ("must", "mʌst"),
    ]
    .into_iter()
    .collect()
});

/// A phonetic dictionary queried one word at a time
pub trait PhoneticSource: Send + Sync {
    fn phonetic(&self, word: &str) -> Option<String>;
}

/// Source that never finds anything; the built-in table still applies
pub struct NoPhonetics;

impl PhoneticSource for NoPhonetics {
    fn phonetic(&self, _word: &str) -> Option<String> {
        None
    }
}

/// Percent-encode a URL component
pub(crate) fn encode_component(text: &str) -> String {
    utf8_percent_encode(text, COMPONENT).to_string()
}

/// Built-in phonetic for a common function word
pub fn common_phonetic(word: &str) -> Option<&'static str> {
    COMMON_PHONETICS.get(word.to_lowercase().as_str()).copied()
}

/// Guessed root forms for an inflected English word, most likely first.
///
/// Only one suffix family is tried: "-ed", else "-s" (but not "-ss"),
/// else "-ing".
pub fn root_candidates(word: &str) -> Vec<String> {
    let strip = |n: usize| -> Option<String> {
        let cut = word.len().checked_sub(n)?;
        word.get(..cut).filter(|s| !s.is_empty()).map(str::to_string)
    };

    let mut candidates = Vec::new();
    if word.ends_with("ed") {
        candidates.extend(strip(2));
        candidates.extend(strip(1));
    } else if word.ends_with('s') && !word.ends_with("ss") {
        candidates.extend(strip(1));
        if word.ends_with("es") {
            candidates.extend(strip(2));
        }
    } else if word.ends_with("ing") {
        candidates.extend(strip(3));
    }
    candidates
}

/// Pronunciation audio URL, if the language has one
pub fn audio_url(word: &str, lang: &str, accent: Accent) -> Option<String> {
    let encoded = encode_component(word);
    match lang {
        "en" => {
            let kind = match accent {
                Accent::Uk => 1,
                Accent::Us => 2,
            };
            Some(format!("https://dict.youdao.com/dictvoice?audio={encoded}&type={kind}"))
        }
        "ja" => Some(format!("https://dict.youdao.com/dictvoice?le=jap&audio={encoded}&type=3")),
        _ => None,
    }
}

/// [`Lexicon`] over a [`PhoneticSource`] with root guessing and the
/// common-word table
pub struct FallbackLexicon<S> {
    source: S,
}

impl<S: PhoneticSource> FallbackLexicon<S> {
    pub fn new(source: S) -> Self {
        FallbackLexicon { source }
    }

    fn english_phonetic(&self, word: &str) -> Option<String> {
        if let Some(found) = self.source.phonetic(word) {
            return Some(found);
        }
        for candidate in root_candidates(word) {
            if let Some(found) = self.source.phonetic(&candidate) {
                debug!(word, root = %candidate, "phonetic found via root form");
                return Some(found);
            }
        }
        common_phonetic(word).map(|p| {
            debug!(word, "using built-in phonetic");
            p.to_string()
        })
    }
}

impl<S: PhoneticSource> Lexicon for FallbackLexicon<S> {
    fn lookup(&self, word: &str, source_language: &str, accent: Accent) -> DictionaryData {
        let lang = lang_code(source_language);
        let phonetic = if lang == "en" {
            self.english_phonetic(word)
        } else {
            None
        };
        DictionaryData {
            phonetic,
            audio_url: audio_url(word, lang, accent),
        }
    }
}
