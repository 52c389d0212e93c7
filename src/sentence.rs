//! Sentence extraction.
//!
//! Two different notions of "sentence" are used by the reader:
//! the context around a clicked word (scanned over tokens, stops at any
//! clause punctuation or newline), and the learning-mode split of a whole
//! lesson (only at sentence-final punctuation followed by whitespace).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::char_categories::{contains_boundary, SENTENCE_END_CHARS};
use crate::token::Token;

static LINE_BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\r?\n)+").expect("line break pattern is valid"));

/// Characters after which a translated sentence is broken into display lines
const TRANSLATION_LINE_ENDS: &[char] = &['。', '！', '？', '!', '?', ';', '；', '.'];

/// A run of tokens forming the context sentence of a word
#[derive(Debug, Clone)]
pub struct Sentence {
    /// The tokens in this sentence
    pub tokens: Vec<Token>,
    /// Number of word tokens
    pub word_count: usize,
    /// Start index in the original token list
    pub start_idx: usize,
    /// End index in the original token list (inclusive)
    pub end_idx: usize,
}

impl Sentence {
    /// Get the text of this sentence, trimmed of surrounding whitespace
    pub fn text(&self) -> String {
        self.raw_text().trim().to_string()
    }

    /// Concatenated token text, exactly as in the source
    pub fn raw_text(&self) -> String {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }
}

/// Check whether a token closes a sentence for context extraction
pub fn is_boundary_token(token: &Token) -> bool {
    token.is_separator() && contains_boundary(&token.text)
}

/// Find the sentence surrounding the token at `index`.
///
/// Scans left until the token after a boundary (the boundary itself is
/// excluded), and right until a boundary (included) or the end.
pub fn sentence_around(tokens: &[Token], index: usize) -> Option<Sentence> {
    if index >= tokens.len() {
        return None;
    }

    let mut start = index;
    while start > 0 && !is_boundary_token(&tokens[start - 1]) {
        start -= 1;
    }

    let mut end = index;
    while end + 1 < tokens.len() {
        end += 1;
        if is_boundary_token(&tokens[end]) {
            break;
        }
    }

    let slice = tokens[start..=end].to_vec();
    let word_count = slice.iter().filter(|t| t.is_word()).count();
    Some(Sentence {
        tokens: slice,
        word_count,
        start_idx: start,
        end_idx: end,
    })
}

/// Split lesson content into learning-mode sentences.
///
/// Line breaks collapse to a space; a split happens at whitespace that
/// follows `. ! ? 。 ！ ？`. Pieces are trimmed and empties dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let flattened = LINE_BREAKS.replace_all(text, " ");

    let mut sentences = Vec::new();
    let mut buffer = String::new();
    let mut prev: Option<char> = None;
    let mut chars = flattened.chars().peekable();

    while let Some(c) = chars.next() {
        let after_end = prev.map_or(false, |p| SENTENCE_END_CHARS.contains(&p));
        if c.is_whitespace() && after_end {
            while chars.peek().map_or(false, |n| n.is_whitespace()) {
                chars.next();
            }
            push_trimmed(&mut sentences, &buffer);
            buffer.clear();
            prev = None;
            continue;
        }
        buffer.push(c);
        prev = Some(c);
    }
    push_trimmed(&mut sentences, &buffer);

    sentences
}

/// Break a sentence translation into display lines after each terminal mark
pub fn split_translation_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut buffer = String::new();
    for c in text.chars() {
        buffer.push(c);
        if TRANSLATION_LINE_ENDS.contains(&c) {
            push_trimmed(&mut lines, &buffer);
            buffer.clear();
        }
    }
    push_trimmed(&mut lines, &buffer);
    lines
}

fn push_trimmed(out: &mut Vec<String>, piece: &str) {
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Tokenizer;

    fn index_of(tokens: &[Token], word: &str) -> usize {
        tokens.iter().position(|t| t.text == word).unwrap()
    }

    #[test]
    fn test_sentence_around_first_sentence() {
        let tokens = Tokenizer::tokenize("Hello world. Next sentence!");
        let idx = index_of(&tokens, "world");
        let sentence = sentence_around(&tokens, idx).unwrap();
        assert_eq!(sentence.text(), "Hello world.");
        assert_eq!(sentence.raw_text(), "Hello world. ");
        assert_eq!(sentence.word_count, 2);
    }

    #[test]
    fn test_sentence_around_second_sentence() {
        let tokens = Tokenizer::tokenize("Hello world. Next sentence!");
        let idx = index_of(&tokens, "Next");
        let sentence = sentence_around(&tokens, idx).unwrap();
        assert_eq!(sentence.text(), "Next sentence!");
        assert_eq!(sentence.start_idx, idx);
    }

    #[test]
    fn test_sentence_around_stops_at_comma_and_newline() {
        let tokens = Tokenizer::tokenize("First line\nyes, a clause here");
        let idx = index_of(&tokens, "clause");
        assert_eq!(sentence_around(&tokens, idx).unwrap().text(), "a clause here");
        let idx = index_of(&tokens, "yes");
        assert_eq!(sentence_around(&tokens, idx).unwrap().text(), "yes,");
    }

    #[test]
    fn test_sentence_around_out_of_range() {
        let tokens = Tokenizer::tokenize("one");
        assert!(sentence_around(&tokens, 3).is_none());
    }

    #[test]
    fn test_split_sentences() {
        let text = "The cat sat. It was happy!\nReally?  Yes.\r\n\r\nDone";
        assert_eq!(
            split_sentences(text),
            vec!["The cat sat.", "It was happy!", "Really?", "Yes.", "Done"]
        );
    }

    #[test]
    fn test_split_sentences_keeps_abbreviation_without_space() {
        assert_eq!(split_sentences("Version 1.5 is out."), vec!["Version 1.5 is out."]);
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn test_split_translation_lines() {
        assert_eq!(
            split_translation_lines("猫坐着。它很开心！ 好"),
            vec!["猫坐着。", "它很开心！", "好"]
        );
    }
}
