//! Token representation for lesson text.
//!
//! A Token is either a word the learner can tag, or a separator run
//! (whitespace, punctuation, symbols, CJK) that is rendered as-is.

use serde::{Deserialize, Serialize};

/// The kind of token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TokenKind {
    /// Taggable word (letters, digits, joined contractions)
    Word,
    /// Anything between words
    #[default]
    Separator,
}

impl TokenKind {
    /// Convert to a string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Word => "WORD",
            TokenKind::Separator => "SEP",
        }
    }
}

/// A single token from the tokenization process
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The raw text of the token
    pub text: String,

    /// Starting byte offset in the original string
    pub start: usize,

    /// Length in bytes
    pub len: usize,

    /// Whether this is a word or a separator
    pub kind: TokenKind,
}

impl Token {
    /// Create a token with text and position
    pub fn with_text(text: String, start: usize, kind: TokenKind) -> Self {
        let len = text.len();
        Token {
            text,
            start,
            len,
            kind,
        }
    }

    /// Byte offset one past the end of this token
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Check if this is a word token
    pub fn is_word(&self) -> bool {
        self.kind == TokenKind::Word
    }

    /// Check if this is a separator token
    pub fn is_separator(&self) -> bool {
        self.kind == TokenKind::Separator
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}
