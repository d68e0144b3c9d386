use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Source of "now" for the typing engine
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock used by the binary
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same offset,
/// so a test can keep one handle and give another to the engine.
#[derive(Clone, Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut offset) = self.offset.lock() {
            *offset += by;
        }
    }

    pub fn advance_millis(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    pub fn elapsed(&self) -> Duration {
        self.offset.lock().map(|o| *o).unwrap_or_default()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }
}
