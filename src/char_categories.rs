//! Character classification for lesson text.
//!
//! Word characters are ASCII letters and digits plus the letters of the
//! Latin-1 supplement. Everything else is separator material; a subset of
//! separators marks sentence boundaries.

/// Regex class matching exactly the characters for which
/// [`is_word_char`] holds
pub(crate) const WORD_CLASS: &str = "[A-Za-z0-9\u{00C0}-\u{00D6}\u{00D8}-\u{00F6}\u{00F8}-\u{00FF}]";

/// Character categories used by the tokenizer and sentence scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CharCategory {
    /// ASCII letter or digit, or Latin-1 letter
    Word,
    /// Punctuation that ends a sentence or clause
    SentencePunct,
    /// Line break, also a sentence boundary
    Newline,
    /// CJK ideographs and symbols (never part of a word)
    Cjk,
    /// Other/unknown character
    #[default]
    Other,
}

impl CharCategory {
    /// Check if a separator containing this character closes a sentence
    pub fn is_boundary(&self) -> bool {
        matches!(self, CharCategory::SentencePunct | CharCategory::Newline)
    }
}

/// Characters that end a sentence or clause when scanning around a word
pub const BOUNDARY_CHARS: &[char] = &[
    '.', '!', '?', ';', ',', '。', '！', '？', '；', '，', '、',
];

/// Characters after which a lesson is split into learning-mode sentences
pub const SENTENCE_END_CHARS: &[char] = &['.', '!', '?', '。', '！', '？'];

/// Check for a Latin-1 supplement letter (excludes × and ÷)
fn is_latin1_letter(c: char) -> bool {
    matches!(c, '\u{00C0}'..='\u{00D6}' | '\u{00D8}'..='\u{00F6}' | '\u{00F8}'..='\u{00FF}')
}

/// Check whether a character can be part of a word run
pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || is_latin1_letter(c)
}

/// Get the category of a character
pub fn get_char_category(c: char) -> CharCategory {
    if is_word_char(c) {
        return CharCategory::Word;
    }
    if c == '\n' {
        return CharCategory::Newline;
    }
    if BOUNDARY_CHARS.contains(&c) {
        return CharCategory::SentencePunct;
    }
    if ('\u{4E00}'..='\u{9FFF}').contains(&c)     // CJK Unified Ideographs
        || ('\u{3400}'..='\u{4DBF}').contains(&c) // CJK Unified Ideographs Extension A
        || ('\u{2E80}'..='\u{2EFF}').contains(&c) // CJK Radicals Supplement
        || ('\u{3000}'..='\u{303F}').contains(&c) // CJK Symbols and Punctuation
        || ('\u{3040}'..='\u{30FF}').contains(&c) // Hiragana + Katakana
        || ('\u{AC00}'..='\u{D7AF}').contains(&c) // Hangul Syllables
        || ('\u{FF00}'..='\u{FFEF}').contains(&c) // Halfwidth and Fullwidth Forms
    {
        return CharCategory::Cjk;
    }

    CharCategory::Other
}

/// Check whether a separator string contains a sentence boundary
pub fn contains_boundary(text: &str) -> bool {
    text.chars().any(|c| get_char_category(c).is_boundary())
}

/// Check whether text contains CJK characters, which are never tokenized
/// into words (per-word status tracking is unavailable for them)
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| get_char_category(c) == CharCategory::Cjk)
}
