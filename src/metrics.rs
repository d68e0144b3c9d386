use std::time::{Duration, Instant};

/// Period of the running-session timer
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Minimum gap between two accuracy refreshes while typing
pub const ACCURACY_REFRESH_INTERVAL: Duration = Duration::from_millis(300);

/// Live measurements of a typing session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Metrics {
    pub elapsed_secs: u64,
    pub correct_count: usize,
    pub total_typed: usize,
    /// characters per minute
    pub speed: u32,
    /// percent, 0..=100
    pub accuracy: u8,
}

impl Default for Metrics {
    // accuracy starts at 100: nothing typed means no errors yet
    fn default() -> Self {
        Self {
            elapsed_secs: 0,
            correct_count: 0,
            total_typed: 0,
            speed: 0,
            accuracy: 100,
        }
    }
}

pub fn accuracy_percent(correct: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((correct as f64 / total as f64) * 100.0).round() as u8
}

/// Typed characters normalized to a 60 second rate.
/// `None` until at least one whole second has elapsed.
pub fn chars_per_minute(total_typed: usize, elapsed_secs: u64) -> Option<u32> {
    if elapsed_secs == 0 {
        return None;
    }
    Some(((total_typed as f64 / elapsed_secs as f64) * 60.0).round() as u32)
}

/// Whole seconds between `start` and `now`
pub fn whole_seconds_between(start: Instant, now: Instant) -> u64 {
    now.saturating_duration_since(start).as_secs()
}

/// `m:ss`, as shown on the session timer
pub fn format_clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Bounds how often accuracy is recomputed on a fast input stream
#[derive(Clone, Copy, Debug)]
pub struct AccuracyThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl AccuracyThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn should_refresh(&self, now: Instant) -> bool {
        match self.last {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    pub fn mark(&mut self, now: Instant) {
        self.last = Some(now);
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}

impl Default for AccuracyThrottle {
    fn default() -> Self {
        Self::new(ACCURACY_REFRESH_INTERVAL)
    }
}
