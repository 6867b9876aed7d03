use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::runtime::AppEvent;
use crate::session::SessionId;

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Shared view of a timer's cancellation flag
#[derive(Debug, Clone)]
pub struct TimerHandle {
    session: SessionId,
    cancelled: Arc<AtomicBool>,
}

impl TimerHandle {
    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Periodic tick source for one running session. Cancelled on drop.
#[derive(Debug)]
pub struct SessionTimer {
    handle: TimerHandle,
}

impl SessionTimer {
    pub fn spawn(tx: Sender<AppEvent>, session: SessionId, interval: Duration) -> Self {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        thread::spawn(move || loop {
            thread::sleep(interval);
            if flag.load(Ordering::SeqCst) {
                break;
            }
            if tx.send(AppEvent::Tick(session)).is_err() {
                break;
            }
        });

        log::debug!("timer for session {session} started ({interval:?})");
        Self {
            handle: TimerHandle { session, cancelled },
        }
    }

    pub fn handle(&self) -> TimerHandle {
        self.handle.clone()
    }

    pub fn session(&self) -> SessionId {
        self.handle.session
    }

    pub fn cancel(&self) {
        if !self.handle.cancelled.swap(true, Ordering::SeqCst) {
            log::debug!("timer for session {} cancelled", self.handle.session);
        }
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
