//! Regex-based word tokenizer.
//!
//! Text is split into maximal word runs and the separator runs between
//! them. The split is non-destructive: concatenating every token's text in
//! order gives back the input exactly.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::char_categories::WORD_CLASS;
use crate::token::{Token, TokenKind};

/// A word run, optionally continued across `'` or `’` ("don't", "l'été")
static WORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("{WORD_CLASS}+(?:['\u{2019}]{WORD_CLASS}+)*"))
        .expect("word pattern is valid")
});

static WORD_ONLY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("^{WORD_CLASS}+(?:['\u{2019}]{WORD_CLASS}+)*$"))
        .expect("word pattern is valid")
});

/// Stateless tokenizer for lesson text
pub struct Tokenizer;

impl Tokenizer {
    /// Split text into word and separator tokens
    pub fn tokenize(text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut cursor = 0;

        for m in WORD_RE.find_iter(text) {
            if m.start() > cursor {
                tokens.push(Token::with_text(
                    text[cursor..m.start()].to_string(),
                    cursor,
                    TokenKind::Separator,
                ));
            }
            tokens.push(Token::with_text(
                m.as_str().to_string(),
                m.start(),
                TokenKind::Word,
            ));
            cursor = m.end();
        }

        if cursor < text.len() {
            tokens.push(Token::with_text(
                text[cursor..].to_string(),
                cursor,
                TokenKind::Separator,
            ));
        }

        tokens
    }

    /// Check whether the whole string is a single word
    pub fn is_word(text: &str) -> bool {
        WORD_ONLY_RE.is_match(text)
    }

    /// All word tokens in order, duplicates included
    pub fn words(text: &str) -> Vec<&str> {
        WORD_RE.find_iter(text).map(|m| m.as_str()).collect()
    }

    /// Distinct words in first-seen order (case-sensitive, as typed)
    pub fn unique_words(text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        Self::words(text)
            .into_iter()
            .filter(|w| seen.insert(*w))
            .map(str::to_string)
            .collect()
    }
}
