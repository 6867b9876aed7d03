use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Live or final scores of an attempt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub gross_wpm: u32,
    pub net_wpm: u32,
    pub accuracy: u32,
}

/// Whitespace-delimited words; leading, trailing and repeated whitespace
/// never produce empty tokens.
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Number of positions where the typed word equals the reference word
pub fn correct_words(reference: &[&str], typed: &[&str]) -> usize {
    reference
        .iter()
        .zip(typed.iter())
        .filter(|(expected, actual)| expected == actual)
        .count()
}

pub fn accuracy(correct: usize, reference_words: usize) -> u32 {
    if reference_words == 0 {
        return 0;
    }
    (correct.min(reference_words) * 100 / reference_words) as u32
}

/// Typed words per elapsed minute. Zero until a whole second has passed.
pub fn gross_wpm(typed_words: usize, elapsed: Duration) -> u32 {
    if elapsed < Duration::from_secs(1) {
        return 0;
    }
    let millis = elapsed.as_millis();
    (typed_words as u128 * 60_000 / millis).min(u32::MAX as u128) as u32
}

pub fn net_wpm(gross_wpm: u32, accuracy: u32) -> u32 {
    (u64::from(gross_wpm) * u64::from(accuracy.min(100)) / 100) as u32
}

impl Metrics {
    /// Recompute every score from scratch
    pub fn compute(reference: &str, typed: &str, elapsed: Duration) -> Self {
        let reference_tokens = tokenize(reference);
        let typed_tokens = tokenize(typed);

        let correct = correct_words(&reference_tokens, &typed_tokens);
        let accuracy = accuracy(correct, reference_tokens.len());
        let gross_wpm = gross_wpm(typed_tokens.len(), elapsed);

        Self {
            gross_wpm,
            net_wpm: net_wpm(gross_wpm, accuracy),
            accuracy,
        }
    }
}
