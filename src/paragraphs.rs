use crate::level::{Level, LevelError};
use include_dir::{include_dir, Dir};
use rand::Rng;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

static BANK_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/bank");

const BUILTIN_BANK: &str = "paragraphs.json";

#[derive(Debug, Error)]
pub enum BankError {
    #[error(transparent)]
    InvalidLevel(#[from] LevelError),
    #[error("paragraph bank has no entry for level `{0}`")]
    MissingLevel(Level),
    #[error("paragraph bank has no texts for level `{0}`")]
    EmptyLevel(Level),
    #[error("built-in paragraph bank `{0}` is missing")]
    MissingBuiltin(&'static str),
    #[error("failed to read paragraph bank: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse paragraph bank: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reference texts grouped by level. Every level holds at least one text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphBank {
    texts: [Vec<String>; 6],
}

impl ParagraphBank {
    pub fn builtin() -> Result<Self, BankError> {
        let file = BANK_DIR
            .get_file(BUILTIN_BANK)
            .ok_or(BankError::MissingBuiltin(BUILTIN_BANK))?;
        let raw = file
            .contents_utf8()
            .ok_or(BankError::MissingBuiltin(BUILTIN_BANK))?;
        Self::from_json(raw)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, BankError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, BankError> {
        let by_name: BTreeMap<String, Vec<String>> = serde_json::from_str(raw)?;

        let mut texts: [Vec<String>; 6] = Default::default();
        let mut seen = [false; 6];
        for (name, entries) in by_name {
            let level: Level = name.parse()?;
            texts[level.index()] = entries
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            seen[level.index()] = true;
        }

        for level in Level::ALL {
            if !seen[level.index()] {
                return Err(BankError::MissingLevel(level));
            }
            if texts[level.index()].is_empty() {
                return Err(BankError::EmptyLevel(level));
            }
        }

        Ok(Self { texts })
    }

    pub fn texts(&self, level: Level) -> &[String] {
        &self.texts[level.index()]
    }

    /// Uniformly random text for `level`
    pub fn pick(&self, level: Level) -> &str {
        self.pick_with(level, &mut rand::thread_rng())
    }

    pub fn pick_with<R: Rng>(&self, level: Level, rng: &mut R) -> &str {
        let texts = self.texts(level);
        // non-empty: checked in from_json
        &texts[rng.gen_range(0..texts.len())]
    }
}
