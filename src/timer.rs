//! Cancellable periodic ticks for a running session.
//!
//! Each tick is tagged with the generation of the session that started the
//! timer, so a tick that was already queued when the session reset or
//! completed can be recognised and dropped by the receiver.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::runtime::AppEvent;

/// Owned handle to a running periodic tick
pub trait TimerHandle {
    /// Stop the timer. No tick is produced after this returns.
    fn cancel(&mut self);
    fn is_active(&self) -> bool;
}

/// Starts periodic ticks for a session generation
pub trait TickScheduler {
    type Handle: TimerHandle;

    fn start(&self, generation: u64, interval: Duration) -> Self::Handle;
}

/// Ticks from a background thread into the app's event channel
#[derive(Clone)]
pub struct ThreadTickScheduler {
    tx: Sender<AppEvent>,
}

impl ThreadTickScheduler {
    pub fn new(tx: Sender<AppEvent>) -> Self {
        Self { tx }
    }
}

pub struct ThreadTimerHandle {
    cancelled: Arc<AtomicBool>,
}

impl TimerHandle for ThreadTimerHandle {
    fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn is_active(&self) -> bool {
        !self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for ThreadTimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl TickScheduler for ThreadTickScheduler {
    type Handle = ThreadTimerHandle;

    fn start(&self, generation: u64, interval: Duration) -> ThreadTimerHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let tx = self.tx.clone();

        thread::spawn(move || loop {
            thread::sleep(interval);
            if flag.load(Ordering::SeqCst) {
                debug!(generation, "session timer stopped");
                break;
            }
            if tx.send(AppEvent::SessionTick { generation }).is_err() {
                break;
            }
        });

        ThreadTimerHandle { cancelled }
    }
}

/// Counts of timers started and cancelled through a `ManualTickScheduler`
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TimerLog {
    pub started: Vec<u64>,
    pub cancelled: usize,
}

impl TimerLog {
    pub fn active(&self) -> usize {
        self.started.len() - self.cancelled
    }
}

/// Scheduler that never ticks on its own; tests deliver ticks by hand
#[derive(Clone, Default)]
pub struct ManualTickScheduler {
    log: Arc<Mutex<TimerLog>>,
}

impl ManualTickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> TimerLog {
        self.log.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

pub struct ManualTimerHandle {
    log: Arc<Mutex<TimerLog>>,
    active: bool,
}

impl TimerHandle for ManualTimerHandle {
    fn cancel(&mut self) {
        if self.active {
            self.active = false;
            if let Ok(mut log) = self.log.lock() {
                log.cancelled += 1;
            }
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl TickScheduler for ManualTickScheduler {
    type Handle = ManualTimerHandle;

    fn start(&self, generation: u64, _interval: Duration) -> ManualTimerHandle {
        if let Ok(mut log) = self.log.lock() {
            log.started.push(generation);
        }
        ManualTimerHandle {
            log: Arc::clone(&self.log),
            active: true,
        }
    }
}
