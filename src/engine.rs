//! The typing session engine.
//!
//! One `TypingSession` measures one attempt at one reference text. It is fed
//! the full current input on every (debounced) edit and a tick every second
//! while running, and it hands back a `SessionResult` exactly once, when the
//! input reaches the length of the reference.

use std::time::Instant;

use chrono::Local;
use tracing::{debug, info, warn};

use crate::classify::{classify, CharClass, Classification};
use crate::clock::{Clock, SystemClock};
use crate::metrics::{
    accuracy_percent, chars_per_minute, whole_seconds_between, AccuracyThrottle, Metrics,
    TICK_INTERVAL,
};
use crate::session::{SessionConfig, SessionResult, SessionState};
use crate::time_series::{push_sample, SpeedSample};
use crate::timer::{ThreadTickScheduler, TickScheduler, TimerHandle};

/// Receives the per-character view of a session, in reference order
pub trait RenderSink {
    fn char(&mut self, idx: usize, expected: char, typed: Option<char>, class: CharClass);

    fn metrics(&mut self, _metrics: &Metrics, _state: SessionState) {}
}

/// The session type the binary runs
pub type LiveSession = TypingSession<SystemClock, ThreadTickScheduler>;

pub struct TypingSession<C: Clock, S: TickScheduler> {
    reference: Vec<char>,
    input: Vec<char>,
    classification: Classification,
    state: SessionState,
    config: SessionConfig,
    metrics: Metrics,
    started_at: Option<Instant>,
    accuracy_throttle: AccuracyThrottle,
    timer: Option<S::Handle>,
    generation: u64,
    result: Option<SessionResult>,
    speed_samples: Vec<SpeedSample>,
    clock: C,
    scheduler: S,
}

impl<C: Clock, S: TickScheduler> TypingSession<C, S> {
    pub fn new(text: &str, config: SessionConfig, clock: C, scheduler: S) -> Self {
        let reference: Vec<char> = text.chars().collect();
        Self {
            classification: Classification::initial(reference.len()),
            reference,
            input: Vec::new(),
            state: SessionState::Idle,
            config,
            metrics: Metrics::default(),
            started_at: None,
            accuracy_throttle: AccuracyThrottle::default(),
            timer: None,
            generation: 0,
            result: None,
            speed_samples: Vec::new(),
            clock,
            scheduler,
        }
    }

    /// Feed the complete current input. Returns the session result on the
    /// event that completes the session, and `None` on every other call.
    pub fn on_input(&mut self, value: &str) -> Option<SessionResult> {
        if self.state == SessionState::Completed {
            debug!("input after completion ignored");
            return None;
        }

        let now = self.clock.now();
        self.input = value.chars().take(self.reference.len()).collect();
        let total = self.input.len();

        self.classification = classify(&self.reference, &self.input);
        self.metrics.total_typed = total;
        self.metrics.correct_count = self.classification.correct_count;

        if self.accuracy_throttle.should_refresh(now) {
            self.refresh_accuracy(now);
        }

        if self.state == SessionState::Idle {
            if total == 0 {
                return None;
            }
            self.begin(now);
        }

        self.refresh_timing(now);

        if total == self.reference.len() {
            return Some(self.complete(now));
        }
        None
    }

    /// Periodic timer callback. Ticks from an older generation, or arriving
    /// when the session isn't running, are dropped.
    pub fn on_tick(&mut self, generation: u64) {
        if generation != self.generation || self.state != SessionState::Running {
            debug!(
                generation,
                current = self.generation,
                state = ?self.state,
                "stale session tick ignored"
            );
            return;
        }

        let now = self.clock.now();
        self.refresh_timing(now);
        if self.metrics.elapsed_secs > 0 {
            push_sample(
                &mut self.speed_samples,
                SpeedSample::new(self.metrics.elapsed_secs as f64, self.metrics.speed as f64),
            );
        }
    }

    /// Start over with a new text. Cancels any running timer and begins a new
    /// session lifetime.
    pub fn reset(&mut self, text: &str, config: SessionConfig) {
        self.stop_timer();
        self.generation = self.generation.wrapping_add(1);
        self.reference = text.chars().collect();
        self.input.clear();
        self.classification = Classification::initial(self.reference.len());
        self.state = SessionState::Idle;
        self.config = config;
        self.metrics = Metrics::default();
        self.started_at = None;
        self.accuracy_throttle.clear();
        self.result = None;
        self.speed_samples.clear();
        debug!(generation = self.generation, len = self.reference.len(), "session reset");
    }

    pub fn render_to<R: RenderSink>(&self, sink: &mut R) {
        for (idx, (expected, class)) in self
            .reference
            .iter()
            .zip(self.classification.classes.iter())
            .enumerate()
        {
            sink.char(idx, *expected, self.input.get(idx).copied(), *class);
        }
        sink.metrics(&self.metrics, self.state);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    pub fn reference(&self) -> &[char] {
        &self.reference
    }

    pub fn reference_text(&self) -> String {
        self.reference.iter().collect()
    }

    pub fn input(&self) -> &[char] {
        &self.input
    }

    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn speed_samples(&self) -> &[SpeedSample] {
        &self.speed_samples
    }

    pub fn timer_active(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| t.is_active())
    }

    /// Share of the reference typed so far, 0.0..=1.0
    pub fn progress(&self) -> f64 {
        if self.reference.is_empty() {
            return 0.0;
        }
        self.metrics.total_typed as f64 / self.reference.len() as f64
    }

    fn begin(&mut self, now: Instant) {
        info!(
            generation = self.generation,
            language = %self.config.language,
            difficulty = %self.config.difficulty,
            "session started"
        );
        self.state = SessionState::Running;
        self.started_at = Some(now);
        self.start_timer();
    }

    fn start_timer(&mut self) {
        if self.timer_active() {
            warn!(generation = self.generation, "timer already running, not starting another");
            return;
        }
        self.timer = Some(self.scheduler.start(self.generation, TICK_INTERVAL));
    }

    fn stop_timer(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            timer.cancel();
        }
    }

    fn refresh_accuracy(&mut self, now: Instant) {
        self.metrics.accuracy =
            accuracy_percent(self.metrics.correct_count, self.metrics.total_typed);
        self.accuracy_throttle.mark(now);
    }

    fn refresh_timing(&mut self, now: Instant) {
        let Some(started_at) = self.started_at else {
            return;
        };
        self.metrics.elapsed_secs = whole_seconds_between(started_at, now);
        if let Some(speed) = chars_per_minute(self.metrics.total_typed, self.metrics.elapsed_secs)
        {
            self.metrics.speed = speed;
        }
    }

    fn complete(&mut self, now: Instant) -> SessionResult {
        self.stop_timer();
        self.refresh_timing(now);
        // the final snapshot is never throttled
        self.refresh_accuracy(now);
        self.state = SessionState::Completed;

        let result = SessionResult {
            speed: self.metrics.speed,
            accuracy: self.metrics.accuracy,
            elapsed_secs: self.metrics.elapsed_secs,
            language: self.config.language,
            difficulty: self.config.difficulty,
            completed_at: Local::now(),
        };
        info!(
            generation = self.generation,
            speed = result.speed,
            accuracy = result.accuracy,
            elapsed = result.elapsed_secs,
            "session completed"
        );
        self.result = Some(result.clone());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::text::{Difficulty, Language};
    use crate::timer::ManualTickScheduler;
    use CharClass::*;

    type TestSession = TypingSession<ManualClock, ManualTickScheduler>;

    fn session(text: &str) -> (TestSession, ManualClock, ManualTickScheduler) {
        let clock = ManualClock::new();
        let scheduler = ManualTickScheduler::new();
        let session = TypingSession::new(
            text,
            SessionConfig::new(Language::En, Difficulty::Easy),
            clock.clone(),
            scheduler.clone(),
        );
        (session, clock, scheduler)
    }

    fn assert_counts_consistent(s: &TestSession) {
        let m = s.metrics();
        assert!(m.correct_count <= m.total_typed);
        assert!(m.total_typed <= s.reference().len());
    }

    #[test]
    fn test_new_session_is_idle() {
        let (s, _, scheduler) = session("abc");
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.classification().classes, vec![Current, Untouched, Untouched]);
        assert_eq!(s.metrics(), &Metrics::default());
        assert!(s.result().is_none());
        assert!(scheduler.log().started.is_empty());
    }

    #[test]
    fn test_empty_input_keeps_session_idle() {
        let (mut s, _, scheduler) = session("abc");
        assert!(s.on_input("").is_none());
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(scheduler.log().active(), 0);
    }

    #[test]
    fn test_first_input_starts_running_and_timer() {
        let (mut s, _, scheduler) = session("abc");
        s.on_input("a");

        assert_eq!(s.state(), SessionState::Running);
        assert!(s.timer_active());
        assert_eq!(scheduler.log().started, vec![0]);
    }

    #[test]
    fn test_abc_scenario() {
        let (mut s, clock, scheduler) = session("abc");

        assert!(s.on_input("a").is_none());
        assert_eq!(s.classification().classes, vec![Correct, Current, Untouched]);
        // nothing reported within the first second
        assert_eq!(s.metrics().speed, 0);
        assert_eq!(s.metrics().elapsed_secs, 0);

        clock.advance_millis(400);
        assert!(s.on_input("ax").is_none());
        assert_eq!(s.classification().classes, vec![Correct, Incorrect, Current]);

        clock.advance_millis(400);
        let result = s.on_input("axc").expect("completing input yields a result");
        assert_eq!(s.state(), SessionState::Completed);
        assert_eq!(result.accuracy, 67);
        assert_eq!(s.result(), Some(&result));
        assert_eq!(scheduler.log().active(), 0);
        assert_counts_consistent(&s);
    }

    #[test]
    fn test_completion_with_errors_still_completes() {
        let (mut s, _, _) = session("ab");
        s.on_input("x");
        let result = s.on_input("xy").unwrap();
        assert_eq!(result.accuracy, 0);
        assert_eq!(s.state(), SessionState::Completed);
    }

    #[test]
    fn test_completion_fires_exactly_once() {
        let (mut s, _, scheduler) = session("hi");
        s.on_input("h");

        let results: Vec<_> = (0..5).filter_map(|_| s.on_input("hi")).collect();
        assert_eq!(results.len(), 1);
        assert_eq!(scheduler.log().cancelled, 1);
    }

    #[test]
    fn test_completed_session_is_inert() {
        let (mut s, clock, _) = session("hi");
        s.on_input("h");
        clock.advance_millis(1500);
        s.on_input("hi");
        let frozen = *s.metrics();

        clock.advance_millis(5000);
        s.on_tick(s.generation());
        assert!(s.on_input("h").is_none());
        assert_eq!(s.metrics(), &frozen);
        assert_eq!(s.input(), &['h', 'i']);
    }

    #[test]
    fn test_speed_after_first_second() {
        let (mut s, clock, _) = session("hello world");
        s.on_input("h");
        clock.advance_millis(999);
        s.on_input("hel");
        assert_eq!(s.metrics().speed, 0);

        clock.advance_millis(1001);
        s.on_input("hello");
        // 5 chars in 2 seconds
        assert_eq!(s.metrics().elapsed_secs, 2);
        assert_eq!(s.metrics().speed, 150);
    }

    #[test]
    fn test_tick_updates_elapsed_and_speed() {
        let (mut s, clock, _) = session("hello world");
        s.on_input("hel");

        clock.advance_millis(1000);
        s.on_tick(s.generation());
        assert_eq!(s.metrics().elapsed_secs, 1);
        assert_eq!(s.metrics().speed, 180);

        clock.advance_millis(2000);
        s.on_tick(s.generation());
        assert_eq!(s.metrics().elapsed_secs, 3);
        assert_eq!(s.metrics().speed, 60);
        assert_eq!(
            s.speed_samples(),
            &[SpeedSample::new(1.0, 180.0), SpeedSample::new(3.0, 60.0)]
        );
    }

    #[test]
    fn test_tick_while_idle_is_ignored() {
        let (mut s, clock, _) = session("abc");
        clock.advance_millis(3000);
        s.on_tick(s.generation());
        assert_eq!(s.metrics().elapsed_secs, 0);
        assert!(s.speed_samples().is_empty());
    }

    #[test]
    fn test_stale_generation_tick_is_ignored() {
        let (mut s, clock, _) = session("abc");
        s.on_input("a");
        let old_generation = s.generation();

        s.reset("xyz", SessionConfig::default());
        s.on_input("x");
        clock.advance_millis(2000);
        s.on_tick(old_generation);
        assert_eq!(s.metrics().elapsed_secs, 0);

        s.on_tick(s.generation());
        assert_eq!(s.metrics().elapsed_secs, 2);
    }

    #[test]
    fn test_accuracy_refresh_is_throttled() {
        let (mut s, clock, _) = session("abcdef");
        s.on_input("a");
        assert_eq!(s.metrics().accuracy, 100);

        clock.advance_millis(100);
        s.on_input("ax");
        // counts and classification are immediate, accuracy waits
        assert_eq!(s.metrics().correct_count, 1);
        assert_eq!(s.metrics().total_typed, 2);
        assert_eq!(s.classification().classes[1], Incorrect);
        assert_eq!(s.metrics().accuracy, 100);

        clock.advance_millis(200);
        s.on_input("ax");
        assert_eq!(s.metrics().accuracy, 50);
    }

    #[test]
    fn test_throttle_never_delays_completion() {
        let (mut s, clock, _) = session("ab");
        s.on_input("a");
        clock.advance_millis(10);
        let result = s.on_input("ax").unwrap();
        assert_eq!(result.accuracy, 50);
        assert_eq!(s.metrics().accuracy, 50);
    }

    #[test]
    fn test_corrections_improve_accuracy() {
        // accuracy is recomputed from the current input, not from a mistake history
        let (mut s, clock, _) = session("abcd");
        s.on_input("ax");
        clock.advance_millis(300);
        s.on_input("ax");
        assert_eq!(s.metrics().accuracy, 50);

        clock.advance_millis(300);
        s.on_input("a");
        clock.advance_millis(300);
        s.on_input("ab");
        assert_eq!(s.metrics().accuracy, 100);
    }

    #[test]
    fn test_deleting_everything_keeps_running() {
        let (mut s, _, scheduler) = session("abc");
        s.on_input("a");
        s.on_input("");
        assert_eq!(s.state(), SessionState::Running);
        assert_eq!(s.classification().classes, vec![Current, Untouched, Untouched]);
        assert_eq!(scheduler.log().active(), 1);

        // typing again does not start a second timer
        s.on_input("a");
        assert_eq!(scheduler.log().started.len(), 1);
    }

    #[test]
    fn test_excess_input_is_truncated() {
        let (mut s, _, _) = session("ab");
        s.on_input("a");
        let result = s.on_input("abzz");
        assert!(result.is_some());
        assert_eq!(s.input(), &['a', 'b']);
        assert_eq!(s.metrics().total_typed, 2);
        assert_counts_consistent(&s);
    }

    #[test]
    fn test_reset_mid_session() {
        let (mut s, clock, scheduler) = session("abc");
        s.on_input("a");
        clock.advance_millis(1200);
        s.on_tick(s.generation());
        assert_eq!(s.state(), SessionState::Running);

        s.reset("new text", SessionConfig::new(Language::Ru, Difficulty::Hard));

        assert_eq!(s.state(), SessionState::Idle);
        assert!(s.input().is_empty());
        assert_eq!(s.metrics(), &Metrics::default());
        assert!(!s.timer_active());
        assert!(s.speed_samples().is_empty());
        assert_eq!(s.reference_text(), "new text");
        assert_eq!(s.config().language, Language::Ru);
        assert_eq!(scheduler.log().cancelled, 1);
        assert_eq!(scheduler.log().active(), 0);
    }

    #[test]
    fn test_reset_starts_new_lifetime() {
        let (mut s, _, scheduler) = session("a");
        assert!(s.on_input("a").is_some());

        s.reset("b", SessionConfig::default());
        assert!(s.result().is_none());
        assert!(s.on_input("b").is_some());
        assert_eq!(scheduler.log().started, vec![0, 1]);
        assert_eq!(scheduler.log().active(), 0);
    }

    #[test]
    fn test_empty_reference_never_completes() {
        let (mut s, _, scheduler) = session("");
        assert!(s.on_input("").is_none());
        assert!(s.on_input("abc").is_none());
        assert_eq!(s.state(), SessionState::Idle);
        assert!(scheduler.log().started.is_empty());
        assert_eq!(s.progress(), 0.0);
    }

    #[test]
    fn test_invariants_hold_over_edit_sequence() {
        let (mut s, clock, _) = session("the quick fox");
        let edits = ["t", "th", "tx", "txe", "t", "", "the", "the q", "the quick fo"];
        for edit in edits {
            clock.advance_millis(120);
            s.on_input(edit);
            assert_counts_consistent(&s);
        }
        assert_eq!(s.metrics().correct_count, 12);
    }

    #[test]
    fn test_progress() {
        let (mut s, _, _) = session("abcd");
        s.on_input("ab");
        assert_eq!(s.progress(), 0.5);
    }

    #[derive(Default)]
    struct Collect {
        rows: Vec<(usize, char, Option<char>, CharClass)>,
        state: Option<SessionState>,
    }

    impl RenderSink for Collect {
        fn char(&mut self, idx: usize, expected: char, typed: Option<char>, class: CharClass) {
            self.rows.push((idx, expected, typed, class));
        }

        fn metrics(&mut self, _metrics: &Metrics, state: SessionState) {
            self.state = Some(state);
        }
    }

    #[test]
    fn test_render_sink_receives_every_character() {
        let (mut s, _, _) = session("abc");
        s.on_input("ax");

        let mut sink = Collect::default();
        s.render_to(&mut sink);
        assert_eq!(
            sink.rows,
            vec![
                (0, 'a', Some('a'), Correct),
                (1, 'b', Some('x'), Incorrect),
                (2, 'c', None, Current),
            ]
        );
        assert_eq!(sink.state, Some(SessionState::Running));
    }
}
