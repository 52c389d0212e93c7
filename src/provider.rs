//! Translation provenance.
//!
//! Source strings arrive in many shapes ("DeepSeek", "MyMemory", "自定义",
//! "custom"...). They are folded into a closed set so that cache lookups
//! and precedence checks compare like with like.

use serde::{Deserialize, Serialize};

/// Where a translation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Free-tier engine, no credentials
    #[default]
    Default,
    /// Credentialed LLM engine
    #[serde(rename = "deepseek")]
    DeepSeek,
    /// Typed by the user
    Custom,
    /// Unrecognized source string
    Unknown,
}

impl Provider {
    /// Map a free-form source string to a provider.
    ///
    /// Matching is a case-insensitive substring test; "custom" wins over
    /// the others so that e.g. "custom (was deepseek)" stays a user edit.
    pub fn normalize(raw: &str) -> Provider {
        let value = raw.to_lowercase();
        if value.contains("custom") || value.contains("自定义") {
            Provider::Custom
        } else if value.contains("deepseek") {
            Provider::DeepSeek
        } else if value.contains("default")
            || value.contains("mymemory")
            || value.contains("dictionary")
            || value.contains("免费")
        {
            Provider::Default
        } else {
            Provider::Unknown
        }
    }

    /// Like [`Provider::normalize`], with `Unknown` collapsed to `None`
    pub fn recognized(raw: &str) -> Option<Provider> {
        match Provider::normalize(raw) {
            Provider::Unknown => None,
            provider => Some(provider),
        }
    }

    /// Lowercase tag as persisted
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Default => "default",
            Provider::DeepSeek => "deepseek",
            Provider::Custom => "custom",
            Provider::Unknown => "unknown",
        }
    }

    /// Human-readable label for a source string
    pub fn display_label(raw: &str) -> String {
        match Provider::normalize(raw) {
            Provider::DeepSeek => "DeepSeek API".to_string(),
            Provider::Default if raw.contains("Dictionary") => "Dictionary API".to_string(),
            Provider::Default => "Free API".to_string(),
            Provider::Custom => "Custom".to_string(),
            Provider::Unknown => raw.to_string(),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
