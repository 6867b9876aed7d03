use chrono::Local;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use crate::level::Level;
use crate::name::{resolve_display_name, NameField};
use crate::paragraphs::ParagraphBank;
use crate::runtime::AppEvent;
use crate::session::{LiveStatus, Phase, Session, SessionId, SessionResult};
use crate::timer::{SessionTimer, TimerHandle, TICK_INTERVAL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestSettings {
    pub level: Level,
    pub duration: Duration,
    pub tick_interval: Duration,
}

impl Default for TestSettings {
    fn default() -> Self {
        Self {
            level: Level::default(),
            duration: crate::session::DEFAULT_DURATION,
            tick_interval: TICK_INTERVAL,
        }
    }
}

/// Owns the configured level, the active session and its timer.
/// All session transitions go through here.
#[derive(Debug)]
pub struct TypingTest {
    bank: ParagraphBank,
    settings: TestSettings,
    tick_tx: Sender<AppEvent>,
    session: Option<Session>,
    timer: Option<SessionTimer>,
    result: Option<SessionResult>,
    name: NameField,
    last_id: u64,
}

impl TypingTest {
    pub fn new(bank: ParagraphBank, settings: TestSettings, tick_tx: Sender<AppEvent>) -> Self {
        Self {
            bank,
            settings,
            tick_tx,
            session: None,
            timer: None,
            result: None,
            name: NameField::default(),
            last_id: 0,
        }
    }

    pub fn settings(&self) -> TestSettings {
        self.settings
    }

    /// Level used by the next start; a running session keeps its own.
    pub fn level(&self) -> Level {
        self.settings.level
    }

    pub fn set_level(&mut self, level: Level) {
        self.settings.level = level;
    }

    pub fn name(&self) -> &NameField {
        &self.name
    }

    pub fn name_mut(&mut self) -> &mut NameField {
        &mut self.name
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.session.as_ref().map_or(Phase::Idle, Session::phase)
    }

    pub fn timer(&self) -> Option<TimerHandle> {
        self.timer.as_ref().map(SessionTimer::handle)
    }

    pub fn status(&self, now: Instant) -> Option<LiveStatus> {
        self.session.as_ref().map(|s| s.status(now))
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }

    /// Begin a new attempt, abandoning any session still running
    pub fn start(&mut self, now: Instant) -> SessionId {
        self.cancel_timer();
        if let Some(old) = self.session.as_ref().filter(|s| !s.is_finished()) {
            log::info!("session {} abandoned", old.id());
        }

        self.last_id += 1;
        let id = SessionId(self.last_id);
        let level = self.settings.level;
        let text = self.bank.pick(level).to_string();

        self.result = None;
        self.session = Some(Session::start(id, level, text, self.settings.duration, now));
        self.timer = Some(SessionTimer::spawn(
            self.tick_tx.clone(),
            id,
            self.settings.tick_interval,
        ));
        log::info!("session {id} started at level {level}");
        id
    }

    /// Drop the current session and go back to setup
    pub fn reset(&mut self) {
        self.cancel_timer();
        self.session = None;
        self.result = None;
    }

    /// Replace the typed text of the running session
    pub fn input(&mut self, text: &str, now: Instant) -> bool {
        match self.session.as_mut() {
            Some(session) => session.input(text, now),
            None => false,
        }
    }

    pub fn type_char(&mut self, c: char, now: Instant) -> bool {
        let Some(session) = self.session.as_ref() else {
            return false;
        };
        let mut text = session.typed_text().to_string();
        text.push(c);
        self.input(&text, now)
    }

    pub fn backspace(&mut self, now: Instant) -> bool {
        let Some(session) = self.session.as_ref() else {
            return false;
        };
        let mut text = session.typed_text().to_string();
        if text.pop().is_none() {
            return false;
        }
        self.input(&text, now)
    }

    /// Handle a timer tick. Returns the result when this tick finished the
    /// session.
    pub fn tick(&mut self, id: SessionId, now: Instant) -> Option<&SessionResult> {
        match self.session.as_mut() {
            Some(session) if session.id() == id => {
                session.finish_if_expired(now)?;
            }
            _ => {
                log::debug!("ignoring tick from stale session {id}");
                return None;
            }
        }

        self.cancel_timer();
        let name = resolve_display_name(&self.name);
        let result = self.session.as_ref()?.to_result(name, Local::now());
        log::info!(
            "session {id} finished: {} wpm, {} net wpm, {}% accuracy",
            result.gross_wpm,
            result.net_wpm,
            result.accuracy
        );
        self.result = Some(result);
        self.result.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::{self, Receiver};

    const EASY: &str = "Typing is fun. Try to type quickly.";

    fn easy_only_bank() -> ParagraphBank {
        ParagraphBank::from_json(&format!(
            r#"{{
                "easy": ["{EASY}"], "medium": ["medium text"], "high": ["high text"],
                "pro": ["pro text"], "master": ["master text"], "grandmaster": ["gm text"]
            }}"#
        ))
        .unwrap()
    }

    fn typing_test() -> (TypingTest, Receiver<AppEvent>) {
        let (tx, rx) = mpsc::channel();
        let settings = TestSettings {
            // long enough that no real tick arrives during a test
            tick_interval: Duration::from_secs(3600),
            ..TestSettings::default()
        };
        (TypingTest::new(easy_only_bank(), settings, tx), rx)
    }

    #[test]
    fn test_idle_before_start() {
        let (mut t, _rx) = typing_test();
        let now = Instant::now();

        assert_eq!(t.phase(), Phase::Idle);
        assert!(t.status(now).is_none());
        assert!(t.timer().is_none());
        assert!(!t.input("x", now));
        assert!(!t.type_char('x', now));
        assert!(t.tick(SessionId(1), now).is_none());
    }

    #[test]
    fn test_start_resets_input_and_picks_text() {
        let (mut t, _rx) = typing_test();
        let t0 = Instant::now();

        let id = t.start(t0);
        assert_eq!(t.phase(), Phase::Running);
        let session = t.session().unwrap();
        assert_eq!(session.id(), id);
        assert_eq!(session.reference_text(), EASY);
        assert_eq!(session.typed_text(), "");
        assert_eq!(session.elapsed(t0), Duration::ZERO);
        assert_eq!(t.timer().unwrap().session(), id);
    }

    #[test]
    fn test_typing_and_backspace() {
        let (mut t, _rx) = typing_test();
        let t0 = Instant::now();
        t.start(t0);

        for c in "Typing is".chars() {
            assert!(t.type_char(c, t0 + Duration::from_secs(6)));
        }
        assert_eq!(t.session().unwrap().typed_text(), "Typing is");
        assert_eq!(t.session().unwrap().metrics().gross_wpm, 20);

        assert!(t.backspace(t0 + Duration::from_secs(7)));
        assert_eq!(t.session().unwrap().typed_text(), "Typing i");
    }

    #[test]
    fn test_backspace_on_empty_input() {
        let (mut t, _rx) = typing_test();
        t.start(Instant::now());
        assert!(!t.backspace(Instant::now()));
    }

    #[test]
    fn test_finishes_on_first_tick_at_duration() {
        let (mut t, _rx) = typing_test();
        let t0 = Instant::now();
        let id = t.start(t0);
        t.input(EASY, t0 + Duration::from_secs(30));

        assert!(t.tick(id, t0 + Duration::from_secs(59)).is_none());
        assert_eq!(t.phase(), Phase::Running);

        let result = t.tick(id, t0 + Duration::from_secs(60)).cloned().unwrap();
        assert_eq!(t.phase(), Phase::Finished);
        assert_eq!(result.level, Level::Easy);
        assert_eq!(result.name, "Guest");
        assert_eq!(result.accuracy, 100);
        assert_eq!(t.result(), Some(&result));
        assert!(t.timer().is_none());

        // no second finalization
        assert!(t.tick(id, t0 + Duration::from_secs(61)).is_none());
        assert_eq!(t.result(), Some(&result));
    }

    #[test]
    fn test_result_keeps_level_of_session_start() {
        let (mut t, _rx) = typing_test();
        let t0 = Instant::now();
        let id = t.start(t0);

        t.set_level(Level::Grandmaster);
        assert_eq!(t.session().unwrap().level(), Level::Easy);

        let result = t.tick(id, t0 + Duration::from_secs(60)).cloned().unwrap();
        assert_eq!(result.level, Level::Easy);
        assert_eq!(t.level(), Level::Grandmaster);
    }

    #[test]
    fn test_result_uses_name_field() {
        let (mut t, _rx) = typing_test();
        let t0 = Instant::now();
        let id = t.start(t0);
        t.name_mut().set("Ada");

        let result = t.tick(id, t0 + Duration::from_secs(60)).unwrap();
        assert_eq!(result.name, "Ada");
    }

    #[test]
    fn test_input_ignored_after_finish() {
        let (mut t, _rx) = typing_test();
        let t0 = Instant::now();
        let id = t.start(t0);
        t.input("Typing", t0 + Duration::from_secs(10));
        t.tick(id, t0 + Duration::from_secs(60));

        assert!(!t.type_char('x', t0 + Duration::from_secs(61)));
        assert!(!t.backspace(t0 + Duration::from_secs(61)));
        assert_eq!(t.session().unwrap().typed_text(), "Typing");
    }

    #[test]
    fn test_restart_cancels_previous_timer() {
        let (mut t, _rx) = typing_test();
        let t0 = Instant::now();

        let first = t.start(t0);
        let first_timer = t.timer().unwrap();
        t.input(EASY, t0 + Duration::from_secs(30));

        let second = t.start(t0 + Duration::from_secs(31));
        let second_timer = t.timer().unwrap();

        assert_ne!(first, second);
        assert!(first_timer.is_cancelled());
        assert!(!second_timer.is_cancelled());
        assert_eq!(second_timer.session(), second);

        // the new session starts clean
        let status = t.status(t0 + Duration::from_secs(31)).unwrap();
        assert!(!status.has_input);
        assert_eq!(status.time_left_secs, 60);
        assert_eq!(t.session().unwrap().typed_text(), "");
    }

    #[test]
    fn test_stale_tick_cannot_finish_new_session() {
        let (mut t, _rx) = typing_test();
        let t0 = Instant::now();

        let first = t.start(t0);
        let second = t.start(t0 + Duration::from_secs(30));

        // well past the first session's deadline, not the second's
        assert!(t.tick(first, t0 + Duration::from_secs(70)).is_none());
        assert_eq!(t.phase(), Phase::Running);
        assert_eq!(t.session().unwrap().id(), second);

        assert!(t.tick(second, t0 + Duration::from_secs(90)).is_some());
    }

    #[test]
    fn test_start_after_finish_clears_result() {
        let (mut t, _rx) = typing_test();
        let t0 = Instant::now();
        let id = t.start(t0);
        t.tick(id, t0 + Duration::from_secs(60));
        assert!(t.result().is_some());

        t.start(t0 + Duration::from_secs(65));
        assert!(t.result().is_none());
        assert_eq!(t.phase(), Phase::Running);
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let (mut t, _rx) = typing_test();
        let t0 = Instant::now();
        let id = t.start(t0);
        let timer = t.timer().unwrap();
        t.tick(id, t0 + Duration::from_secs(60));

        t.reset();
        assert_eq!(t.phase(), Phase::Idle);
        assert!(t.result().is_none());
        assert!(timer.is_cancelled());
        assert!(t.tick(id, t0 + Duration::from_secs(61)).is_none());

        let running = t.start(t0 + Duration::from_secs(62));
        t.reset();
        assert!(t.timer().is_none());
        assert!(t.tick(running, t0 + Duration::from_secs(200)).is_none());
    }
}
