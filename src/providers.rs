//! Service interfaces consumed by the orchestrator.
//!
//! Concrete network implementations live in [`crate::http`] behind the
//! `providers` feature. Everything here is plain data plus the traits, so
//! the core builds and tests without a network stack.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::provider::Provider;

/// Default model for the credentialed engine
pub const DEFAULT_DEEPSEEK_MODEL: &str = "deepseek-chat";

/// A translation returned by a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationResult {
    pub text: String,
    /// Self-reported origin, e.g. "MyMemory" or "DeepSeek"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl TranslationResult {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        TranslationResult {
            text: text.into(),
            source: Some(source.into()),
        }
    }
}

/// English accent family for audio and voices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accent {
    #[default]
    Us,
    Uk,
}

impl Accent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Accent::Us => "us",
            Accent::Uk => "uk",
        }
    }
}

impl std::str::FromStr for Accent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "us" => Ok(Accent::Us),
            "uk" => Ok(Accent::Uk),
            other => Err(format!("unknown accent '{other}'")),
        }
    }
}

/// Provider selection plus credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub provider: Provider,
    pub api_key: Option<String>,
    pub model: String,
}

impl ProviderConfig {
    /// Free engine, no credentials
    pub fn free() -> Self {
        ProviderConfig {
            provider: Provider::Default,
            api_key: None,
            model: DEFAULT_DEEPSEEK_MODEL.to_string(),
        }
    }

    pub fn deepseek(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let api_key = api_key.into();
        ProviderConfig {
            provider: Provider::DeepSeek,
            api_key: (!api_key.trim().is_empty()).then_some(api_key),
            model: model.into(),
        }
    }

    /// Reject selections that cannot work before any request is made
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.provider {
            Provider::DeepSeek if self.api_key.is_none() => {
                Err(ConfigError::MissingCredential { provider: "DeepSeek" })
            }
            Provider::Default | Provider::DeepSeek => Ok(()),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

/// Phonetic and pronunciation audio for one word
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryData {
    pub phonetic: Option<String>,
    pub audio_url: Option<String>,
}

/// Text translation. Failures are reported as `None`, never as errors.
pub trait Translator: Send + Sync {
    fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_lang: &str,
        config: &ProviderConfig,
    ) -> Option<TranslationResult>;
}

/// Phonetic and audio lookup for a single word
pub trait Lexicon: Send + Sync {
    fn lookup(&self, word: &str, source_language: &str, accent: Accent) -> DictionaryData;
}

static LANG_CODES: &[(&str, &str)] = &[
    ("English", "en"),
    ("French", "fr"),
    ("Spanish", "es"),
    ("German", "de"),
    ("Chinese", "zh-Hans"),
    ("Japanese", "ja"),
    ("Korean", "ko"),
    ("Italian", "it"),
    ("Russian", "ru"),
    ("Portuguese", "pt"),
];

/// Lesson language name -> ISO code; codes pass through, anything else is "auto"
pub fn lang_code(name: &str) -> &'static str {
    LANG_CODES
        .iter()
        .find(|(full, code)| *full == name || *code == name)
        .map(|(_, code)| *code)
        .unwrap_or("auto")
}

/// Human-readable name of a target language tag
pub fn lang_display_name(tag: &str) -> String {
    match tag {
        "zh" => "中文".to_string(),
        "zh-Hans" | "zh-CN" => "简体中文".to_string(),
        "en" => "English".to_string(),
        other => other.to_string(),
    }
}
