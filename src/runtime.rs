use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

use crate::history::StatisticsReport;
use crate::report::Submission;
use crate::text::LoadedText;

/// Default coalescing window for bursts of input edits
pub const INPUT_DEBOUNCE: Duration = Duration::from_millis(50);

/// Unified event type consumed by the app runner.
///
/// Every producer (terminal reader, session timer, background workers) sends
/// into one channel, so the app handles exactly one event at a time.
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    /// Runner timeout; drives debounced input and toast expiry
    Tick,
    /// Periodic tick of a running session
    SessionTick { generation: u64 },
    /// A requested reference text arrived; `request` identifies the reset that asked for it
    TextLoaded { request: u64, text: LoadedText },
    ReportFinished(Result<Submission, String>),
    StatisticsLoaded(Result<StatisticsReport, String>),
}

/// Source of app events
pub trait AppEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Production event source: terminal events plus anything sent through `sender()`
pub struct CrosstermEventSource {
    tx: Sender<AppEvent>,
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let reader_tx = tx.clone();

        std::thread::spawn(move || loop {
            let event = match event::read() {
                // ignore key release/repeat reports on platforms that send them
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => AppEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => AppEvent::Resize,
                Ok(_) => continue,
                Err(_) => break,
            };
            if reader_tx.send(event).is_err() {
                break;
            }
        });

        Self { tx, rx }
    }

    /// Handle for background producers (timers, workers)
    pub fn sender(&self) -> Sender<AppEvent> {
        self.tx.clone()
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AppEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl AppEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: AppEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: AppEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> AppEvent {
        self.step_within(self.ticker.interval())
    }

    /// Like `step`, but never waits past `deadline` (e.g. a pending debounce)
    pub fn step_until(&self, deadline: Option<Instant>) -> AppEvent {
        let wait = deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
            .map_or(self.ticker.interval(), |d| d.min(self.ticker.interval()));
        self.step_within(wait)
    }

    fn step_within(&self, wait: Duration) -> AppEvent {
        match self.event_source.recv_timeout(wait) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => AppEvent::Tick,
        }
    }
}

/// Trailing-edge debouncer: bursts collapse to their latest value, which is
/// released once no newer value has arrived for the whole window.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Replace any pending value and restart the window
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    /// The pending value, if its window has passed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, at)) if now.saturating_duration_since(*at) >= self.window => {
                self.pending.take().map(|(value, _)| value)
            }
            _ => None,
        }
    }

    /// Release the pending value immediately
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }

    /// When the pending value becomes due
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at + self.window)
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(INPUT_DEBOUNCE)
    }
}
