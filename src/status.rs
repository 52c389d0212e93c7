//! Word learning status.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Learning stage of a word, stored as an integer 0-5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Status {
    /// Never tagged; the implicit status of a word absent from the store
    #[default]
    New = 0,
    /// Explicitly marked new / hard
    Hard = 1,
    Learning = 2,
    Familiar = 3,
    AlmostKnown = 4,
    Known = 5,
}

/// Integer outside 0-5
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid word status {0}, expected 0-5")]
pub struct InvalidStatus(pub u8);

impl Status {
    /// Integer level of this status
    pub fn level(self) -> u8 {
        self as u8
    }

    /// Clamp an arbitrary integer into range
    pub fn clamp_from(value: i64) -> Status {
        let level = value.clamp(0, 5) as u8;
        Status::try_from(level).unwrap_or_default()
    }

    /// Collapse an optional lookup to a status (absent means New)
    pub fn or_new(status: Option<Status>) -> Status {
        status.unwrap_or(Status::New)
    }

    /// Statuses 1-4: words being actively learned
    pub fn is_lingq(self) -> bool {
        matches!(
            self,
            Status::Hard | Status::Learning | Status::Familiar | Status::AlmostKnown
        )
    }

    /// Short display label
    pub fn label(self) -> &'static str {
        match self {
            Status::New => "Unseen",
            Status::Hard => "New",
            Status::Learning => "Learning",
            Status::Familiar => "Familiar",
            Status::AlmostKnown => "Almost",
            Status::Known => "Known",
        }
    }
}

impl TryFrom<u8> for Status {
    type Error = InvalidStatus;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Status::New),
            1 => Ok(Status::Hard),
            2 => Ok(Status::Learning),
            3 => Ok(Status::Familiar),
            4 => Ok(Status::AlmostKnown),
            5 => Ok(Status::Known),
            other => Err(InvalidStatus(other)),
        }
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> u8 {
        status as u8
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.level())
    }
}
