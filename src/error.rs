//! Error types.
//!
//! Provider failures are deliberately absent from the public surface:
//! translation and lexicon calls report failure as `None`.

use thiserror::Error;

/// Errors from a persistence backend write
#[derive(Error, Debug)]
pub enum StorageError {
    /// Filesystem failure
    #[error("storage I/O error for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Value could not be serialized
    #[error("failed to serialize '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration problems detected before any network call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A credentialed provider was selected without its credential
    #[error("{provider} requires an API key")]
    MissingCredential { provider: &'static str },

    /// Unknown provider name in settings
    #[error("unknown translation provider '{0}'")]
    UnknownProvider(String),
}

/// Lesson collection errors
#[derive(Error, Debug)]
pub enum LessonError {
    /// Required field left empty
    #[error("lesson {0} must not be empty")]
    Validation(&'static str),

    /// No lesson with that id
    #[error("lesson {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Speech synthesis errors; these are always surfaced to the user
#[derive(Error, Debug)]
pub enum SpeechError {
    /// Endpoint or key not configured
    #[error("speech service is not configured")]
    Unconfigured,

    /// Request failed or was rejected
    #[error("speech service unavailable: {0}")]
    Network(String),

    /// Audio output refused to start
    #[error("audio playback failed: {0}")]
    Playback(String),
}

/// Backup document errors
#[derive(Error, Debug)]
pub enum BackupError {
    /// Document declares a version this build cannot read
    #[error("unsupported backup version {0}")]
    UnsupportedVersion(u64),

    /// Document is not a backup object
    #[error("malformed backup document: {0}")]
    Malformed(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failures inside an HTTP provider, never returned past the provider traits
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("empty response")]
    Empty,
}

#[cfg(feature = "providers")]
impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Network(err.to_string())
    }
}
