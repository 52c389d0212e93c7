//! Status-aware view of tokenized text.
//!
//! Produces the per-token highlight classification a front end draws, and
//! turns a click on a word into a selection carrying its sentence.

use crate::sentence::sentence_around;
use crate::status::Status;
use crate::token::Token;
use crate::tokenizer::Tokenizer;
use crate::vocabulary::VocabularyStore;

/// Highlight applied to a word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Highlight {
    /// Never tagged (blue)
    New,
    Hard,
    Learning,
    Familiar,
    AlmostKnown,
    /// No highlight
    Known,
}

impl Highlight {
    /// Colour family used by front ends
    pub fn color(&self) -> &'static str {
        match self {
            Highlight::New => "blue",
            Highlight::Hard => "red",
            Highlight::Learning => "orange",
            Highlight::Familiar => "yellow",
            Highlight::AlmostKnown => "green",
            Highlight::Known => "none",
        }
    }

    pub fn level(&self) -> u8 {
        Status::from(*self).level()
    }
}

impl From<Status> for Highlight {
    fn from(status: Status) -> Self {
        match status {
            Status::New => Highlight::New,
            Status::Hard => Highlight::Hard,
            Status::Learning => Highlight::Learning,
            Status::Familiar => Highlight::Familiar,
            Status::AlmostKnown => Highlight::AlmostKnown,
            Status::Known => Highlight::Known,
        }
    }
}

impl From<Highlight> for Status {
    fn from(highlight: Highlight) -> Self {
        match highlight {
            Highlight::New => Status::New,
            Highlight::Hard => Status::Hard,
            Highlight::Learning => Status::Learning,
            Highlight::Familiar => Status::Familiar,
            Highlight::AlmostKnown => Status::AlmostKnown,
            Highlight::Known => Status::Known,
        }
    }
}

/// Highlight for a word string
pub fn word_style(vocab: &VocabularyStore, word: &str) -> Highlight {
    vocab.get_status(word).into()
}

/// One token ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedToken<'a> {
    pub token: &'a Token,
    /// `None` for separators
    pub highlight: Option<Highlight>,
    /// Inline translation, only for marked words when enabled
    pub translation: Option<&'a str>,
}

/// A clicked word and its surrounding sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSelection {
    pub word: String,
    pub sentence: Option<String>,
    pub index: usize,
}

/// Renders token streams against a vocabulary
pub struct TextRenderer<'a> {
    vocab: &'a VocabularyStore,
    show_translations: bool,
}

impl<'a> TextRenderer<'a> {
    pub fn new(vocab: &'a VocabularyStore, show_translations: bool) -> Self {
        TextRenderer {
            vocab,
            show_translations,
        }
    }

    pub fn render<'t>(&self, tokens: &'t [Token]) -> Vec<RenderedToken<'t>>
    where
        'a: 't,
    {
        let vocab = self.vocab;
        tokens
            .iter()
            .map(|token| {
                if !token.is_word() {
                    return RenderedToken {
                        token,
                        highlight: None,
                        translation: None,
                    };
                }
                let entry = vocab.lookup(&token.text);
                let status = Status::or_new(entry.map(|e| e.status));
                let translation = if self.show_translations && status.is_lingq() {
                    entry.and_then(|e| e.translation.as_deref())
                } else {
                    None
                };
                RenderedToken {
                    token,
                    highlight: Some(status.into()),
                    translation,
                }
            })
            .collect()
    }
}

/// Selection for a click on token `index`; clicks on separators are ignored
pub fn click(tokens: &[Token], index: usize) -> Option<WordSelection> {
    let token = tokens.get(index)?;
    if !token.is_word() || !Tokenizer::is_word(&token.text) {
        return None;
    }
    let sentence = sentence_around(tokens, index)
        .map(|s| s.text())
        .filter(|s| !s.is_empty());
    Some(WordSelection {
        word: token.text.clone(),
        sentence,
        index,
    })
}
