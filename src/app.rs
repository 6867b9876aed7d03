use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::PathBuf;
use std::time::Instant;

use crate::app_dirs::AppDirs;
use crate::certificate::Certificate;
use crate::controller::TypingTest;
use crate::history::ResultLog;
use crate::profile::FileProfileStore;
use crate::session::{Phase, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Continue,
    Quit,
}

#[derive(Debug)]
pub struct App {
    pub test: TypingTest,
    pub notice: Option<String>,
    pub last_certificate: Option<PathBuf>,
    dirs: AppDirs,
    profiles: FileProfileStore,
    results: ResultLog,
}

impl App {
    pub fn new(test: TypingTest, dirs: AppDirs) -> Self {
        Self {
            test,
            notice: None,
            last_certificate: None,
            profiles: FileProfileStore::new(&dirs),
            results: ResultLog::new(&dirs),
            dirs,
        }
    }

    pub fn dirs(&self) -> &AppDirs {
        &self.dirs
    }

    /// Pre-fill the name field from the profile stored under `id`
    pub fn apply_profile_id(&mut self, id: &str) {
        match self.test.name_mut().fill_from_profile(&self.profiles, id) {
            Ok(()) => {
                self.notice = Some(format!("Welcome, {}", self.test.name().value()));
            }
            Err(e) => {
                log::warn!("profile lookup for {id:?} failed: {e}");
                self.notice = Some(e.to_string());
            }
        }
    }

    fn apply_name_as_id(&mut self) {
        let id = self.test.name().value().to_string();
        self.apply_profile_id(&id);
    }

    pub fn start(&mut self, now: Instant) {
        self.notice = None;
        self.last_certificate = None;
        self.test.start(now);
    }

    pub fn on_tick(&mut self, id: SessionId, now: Instant) {
        let Some(result) = self.test.tick(id, now).cloned() else {
            return;
        };
        if let Err(e) = self.results.append(&result) {
            log::error!("failed to record result: {e}");
            self.notice = Some(format!("Could not save result history: {e}"));
        }
    }

    fn save_certificate(&mut self) -> Option<PathBuf> {
        let result = self.test.result()?;
        let cert = Certificate::new(result, &result.name);
        match cert.save_html(&self.dirs.certificates_dir()) {
            Ok(path) => {
                log::info!("certificate saved to {}", path.display());
                self.notice = Some(format!("Certificate saved to {}", path.display()));
                self.last_certificate = Some(path.clone());
                Some(path)
            }
            Err(e) => {
                log::error!("failed to save certificate: {e}");
                self.notice = Some(format!("Could not save certificate: {e}"));
                None
            }
        }
    }

    fn open_certificate(&mut self) {
        let path = match self.last_certificate.clone() {
            Some(path) => path,
            None => match self.save_certificate() {
                Some(path) => path,
                None => return,
            },
        };
        if let Err(e) = webbrowser::open(&path.to_string_lossy()) {
            log::warn!("failed to open {}: {e}", path.display());
            self.notice = Some(format!("Could not open browser: {e}"));
        }
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Instant) -> AppAction {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return AppAction::Quit;
        }

        match key.code {
            KeyCode::Tab => {
                self.test.set_level(self.test.level().next());
                return AppAction::Continue;
            }
            KeyCode::BackTab => {
                self.test.set_level(self.test.level().prev());
                return AppAction::Continue;
            }
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.start(now);
                return AppAction::Continue;
            }
            _ => {}
        }

        match self.test.phase() {
            Phase::Idle => match key.code {
                KeyCode::Enter => self.start(now),
                KeyCode::F(2) => self.apply_name_as_id(),
                KeyCode::Backspace => self.test.name_mut().pop(),
                KeyCode::Char(c) => self.test.name_mut().push(c),
                _ => {}
            },
            Phase::Running => match key.code {
                KeyCode::Backspace => {
                    self.test.backspace(now);
                }
                KeyCode::Char(c) => {
                    self.test.type_char(c, now);
                }
                KeyCode::Enter => {
                    self.test.type_char(' ', now);
                }
                _ => {}
            },
            Phase::Finished => match key.code {
                KeyCode::Enter | KeyCode::Char('r') => self.start(now),
                KeyCode::Char('s') => {
                    self.save_certificate();
                }
                KeyCode::Char('o') => self.open_certificate(),
                KeyCode::Char('n') => {
                    self.test.reset();
                    self.notice = None;
                    self.last_certificate = None;
                }
                KeyCode::F(2) => self.apply_name_as_id(),
                _ => {}
            },
        }
        AppAction::Continue
    }
}
