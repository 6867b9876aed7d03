use crate::level::Level;
use crate::metrics::Metrics;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

pub const DEFAULT_DURATION: Duration = Duration::from_secs(60);

/// Generation number of a session, used to tell its ticks apart from those
/// of sessions that were already replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Finished,
}

/// Values a status line (or a test) needs to show the state of an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveStatus {
    pub time_left_secs: u64,
    pub metrics: Metrics,
    pub has_input: bool,
    pub finished: bool,
}

/// Frozen outcome of a finished session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub timestamp: DateTime<Local>,
    pub name: String,
    pub level: Level,
    pub duration_secs: u64,
    pub gross_wpm: u32,
    pub net_wpm: u32,
    pub accuracy: u32,
}

/// One timed attempt at reproducing a reference text
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    level: Level,
    reference_text: String,
    started_at: Instant,
    duration: Duration,
    typed_text: String,
    has_input: bool,
    metrics: Metrics,
    finished: bool,
}

impl Session {
    pub fn start(
        id: SessionId,
        level: Level,
        reference_text: String,
        duration: Duration,
        now: Instant,
    ) -> Self {
        Self {
            id,
            level,
            reference_text,
            started_at: now,
            duration,
            typed_text: String::new(),
            has_input: false,
            metrics: Metrics::default(),
            finished: false,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn reference_text(&self) -> &str {
        &self.reference_text
    }

    pub fn typed_text(&self) -> &str {
        &self.typed_text
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn phase(&self) -> Phase {
        if self.finished {
            Phase::Finished
        } else {
            Phase::Running
        }
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }

    pub fn time_left(&self, now: Instant) -> Duration {
        self.duration.saturating_sub(self.elapsed(now))
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.elapsed(now) >= self.duration
    }

    /// Replace the typed text and rescore. Returns false once finished.
    pub fn input(&mut self, text: &str, now: Instant) -> bool {
        if self.finished {
            return false;
        }
        self.typed_text.clear();
        self.typed_text.push_str(text);
        self.has_input = true;
        self.metrics = Metrics::compute(&self.reference_text, &self.typed_text, self.elapsed(now));
        true
    }

    /// Freeze the scores if the duration has run out. Yields the final
    /// metrics exactly once.
    pub fn finish_if_expired(&mut self, now: Instant) -> Option<Metrics> {
        if self.finished || !self.is_expired(now) {
            return None;
        }
        let elapsed = self.elapsed(now).min(self.duration);
        self.metrics = Metrics::compute(&self.reference_text, &self.typed_text, elapsed);
        self.finished = true;
        Some(self.metrics)
    }

    pub fn status(&self, now: Instant) -> LiveStatus {
        let left = self.time_left(now);
        // partial seconds count as a whole second left
        let time_left_secs = left.as_secs() + u64::from(left.subsec_nanos() > 0);
        LiveStatus {
            time_left_secs: if self.finished { 0 } else { time_left_secs },
            metrics: self.metrics,
            has_input: self.has_input,
            finished: self.finished,
        }
    }

    pub fn to_result(&self, name: String, timestamp: DateTime<Local>) -> SessionResult {
        SessionResult {
            timestamp,
            name,
            level: self.level,
            duration_secs: self.duration.as_secs(),
            gross_wpm: self.metrics.gross_wpm,
            net_wpm: self.metrics.net_wpm,
            accuracy: self.metrics.accuracy,
        }
    }
}
