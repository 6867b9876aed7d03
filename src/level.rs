use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Difficulty of the reference text handed out for a test
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    ValueEnum,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Level {
    #[default]
    Easy,
    Medium,
    High,
    Pro,
    Master,
    Grandmaster,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("invalid level `{0}` (expected one of: easy, medium, high, pro, master, grandmaster)")]
    InvalidLevel(String),
}

impl Level {
    pub const ALL: [Level; 6] = [
        Level::Easy,
        Level::Medium,
        Level::High,
        Level::Pro,
        Level::Master,
        Level::Grandmaster,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Next level, wrapping from grandmaster back to easy
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Parse a stored level, falling back to easy for anything unrecognized.
    pub fn parse_or_default(raw: &str) -> Self {
        match raw.parse() {
            Ok(level) => level,
            Err(e) => {
                log::warn!("{e}; falling back to {}", Level::default());
                Level::default()
            }
        }
    }
}

impl FromStr for Level {
    type Err = LevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|level| level.to_string() == wanted)
            .ok_or_else(|| LevelError::InvalidLevel(s.to_string()))
    }
}
