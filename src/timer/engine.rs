//! Timer engine for the breathing timer.
//!
//! This module provides the phase-scheduling state machine:
//! - State transitions (Idle → Preparing → Cycling → Idle)
//! - Deadline-anchored countdowns for the phase and the session
//! - Live edits to the draft configuration
//! - Event firing for phase cues
//!
//! The engine never reads the clock itself. Every time-dependent method
//! takes `now`, which keeps it deterministic under test; the driver in
//! [`super::driver`] feeds it a monotonic [`Instant`].

use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::error::TimerError;
use super::sequencer::first_non_zero_phase;
use crate::format::{format_minutes_seconds, remaining_seconds_display};
use crate::types::{
    checked_seconds, DurationSet, Phase, TimerSettings, DEFAULT_DURATIONS,
    DEFAULT_REPEAT_MINUTES,
};

// ============================================================================
// TimerEvent
// ============================================================================

/// Timer events for cue playback and presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// Pre-start countdown began
    PreparationStarted {
        /// Countdown length in seconds
        seconds: u64,
    },
    /// A phase began while cycling
    PhaseStarted {
        /// The phase that just began
        phase: Phase,
        /// Its configured length in milliseconds
        duration_ms: u64,
    },
    /// Timer paused
    Paused,
    /// Timer reset to the draft configuration
    Reset,
    /// Session deadline reached
    SessionCompleted,
    /// Cycling stopped because every phase became zero
    Stopped,
}

// ============================================================================
// TimerStatus
// ============================================================================

/// Coarse engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    /// Not running; values are frozen or freshly reset
    Idle,
    /// Pre-start countdown
    Preparing,
    /// Advancing through phases
    Cycling,
}

impl TimerStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerStatus::Idle => "idle",
            TimerStatus::Preparing => "preparing",
            TimerStatus::Cycling => "cycling",
        }
    }
}

// ============================================================================
// TimerSnapshot
// ============================================================================

/// Read-only view of the engine for presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub draft: DurationSet,
    pub active: DurationSet,
    pub repeat_minutes: u32,
    pub phase: Phase,
    pub remaining_ms: u64,
    pub session_remaining_ms: Option<u64>,
    pub is_running: bool,
    pub is_preparing: bool,
    pub pre_start_remaining_sec: Option<u64>,
    /// Fraction of the current phase already elapsed, in `[0, 1]`
    pub progress: f64,
    pub remaining_seconds_display: u64,
    pub total_active_seconds: u64,
}

impl TimerSnapshot {
    /// Session countdown as `MM:SS`, or `None` for unlimited sessions.
    pub fn session_display(&self) -> Option<String> {
        self.session_remaining_ms
            .map(|ms| format_minutes_seconds(i64::try_from(ms).unwrap_or(i64::MAX)))
    }

    /// Returns the coarse status this snapshot was taken in.
    pub fn status(&self) -> TimerStatus {
        match (self.is_running, self.is_preparing) {
            (true, true) => TimerStatus::Preparing,
            (true, false) => TimerStatus::Cycling,
            _ => TimerStatus::Idle,
        }
    }
}

/// Progress through a phase of `phase_ms`, with `remaining_ms` left.
///
/// A zero-length phase counts as complete.
pub fn phase_progress(phase_ms: u64, remaining_ms: u64) -> f64 {
    if phase_ms == 0 {
        return 1.0;
    }
    let elapsed = phase_ms as f64 - remaining_ms as f64;
    (elapsed / phase_ms as f64).clamp(0.0, 1.0)
}

fn session_ms(repeat_minutes: u32) -> Option<u64> {
    (repeat_minutes > 0).then(|| u64::from(repeat_minutes) * 60_000)
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// TimerEngine
// ============================================================================

/// Breathing timer state machine.
pub struct TimerEngine {
    /// Countdown and cadence settings
    settings: TimerSettings,
    /// Pending configuration edited by the user
    draft: DurationSet,
    /// Configuration governing the current cycle
    active: DurationSet,
    /// Session length in minutes, 0 for unlimited
    repeat_minutes: u32,
    phase: Phase,
    status: TimerStatus,
    remaining_ms: u64,
    session_remaining_ms: Option<u64>,
    pre_start_remaining_sec: Option<u64>,
    prepare_deadline: Option<Instant>,
    phase_deadline: Option<Instant>,
    session_deadline: Option<Instant>,
    /// Event sender channel
    event_tx: mpsc::UnboundedSender<TimerEvent>,
}

impl TimerEngine {
    /// Creates an idle engine with the default draft configuration.
    pub fn new(settings: TimerSettings, event_tx: mpsc::UnboundedSender<TimerEvent>) -> Self {
        Self {
            settings,
            draft: DEFAULT_DURATIONS,
            active: DEFAULT_DURATIONS,
            repeat_minutes: DEFAULT_REPEAT_MINUTES,
            phase: Phase::Inhale,
            status: TimerStatus::Idle,
            remaining_ms: DEFAULT_DURATIONS.phase_ms(Phase::Inhale),
            session_remaining_ms: session_ms(DEFAULT_REPEAT_MINUTES),
            pre_start_remaining_sec: None,
            prepare_deadline: None,
            phase_deadline: None,
            session_deadline: None,
            event_tx,
        }
    }

    // ------------------------------------------------------------------------
    // Run control
    // ------------------------------------------------------------------------

    /// Starts the pre-start countdown.
    ///
    /// Snapshots the draft into the active configuration and rewinds to
    /// `Inhale`. Starting after a pause always goes through the countdown
    /// again rather than resuming mid-phase.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving state untouched, if the engine is already
    /// running or every draft phase is zero.
    pub fn start(&mut self, now: Instant) -> Result<(), TimerError> {
        if self.is_running() {
            return Err(TimerError::AlreadyRunning);
        }
        if self.draft.is_empty() {
            debug!("Start refused: draft {} has no runnable phase", self.draft.pattern());
            return Err(TimerError::NothingToRun);
        }

        self.active = self.draft;
        self.phase = Phase::Inhale;
        self.remaining_ms = self.active.phase_ms(Phase::Inhale);
        self.session_remaining_ms = session_ms(self.repeat_minutes);
        self.phase_deadline = None;
        self.session_deadline = None;

        let window = self.settings.prepare_window();
        self.prepare_deadline = Some(now + window);
        self.pre_start_remaining_sec = Some(self.settings.prepare_seconds);
        self.status = TimerStatus::Preparing;

        info!(
            "Breathing session starting in {}s: {} for {} min",
            self.settings.prepare_seconds,
            self.active.pattern(),
            self.repeat_minutes
        );
        self.emit(TimerEvent::PreparationStarted {
            seconds: self.settings.prepare_seconds,
        });

        if window.is_zero() {
            self.begin_cycling(now);
            if self.status == TimerStatus::Cycling {
                self.announce_phase();
            }
        }
        Ok(())
    }

    /// Stops the clock, freezing phase and remaining times.
    ///
    /// Returns false if the engine was not running.
    pub fn pause(&mut self, now: Instant) -> bool {
        if !self.is_running() {
            return false;
        }
        // Bring the frozen values up to date first; this may end the session.
        self.tick(now);
        if !self.is_running() {
            return false;
        }

        self.status = TimerStatus::Idle;
        self.clear_deadlines();
        info!("Breathing session paused in {}", self.phase.as_str());
        self.emit(TimerEvent::Paused);
        true
    }

    /// Pauses a running engine or starts an idle one.
    ///
    /// # Errors
    ///
    /// Propagates the refusal from [`TimerEngine::start`].
    pub fn toggle_run(&mut self, now: Instant) -> Result<(), TimerError> {
        if self.is_running() {
            self.pause(now);
            Ok(())
        } else {
            self.start(now)
        }
    }

    /// Returns to idle at `Inhale` with the current draft as active config.
    pub fn reset(&mut self) {
        self.status = TimerStatus::Idle;
        self.clear_deadlines();
        self.active = self.draft;
        self.phase = Phase::Inhale;
        self.remaining_ms = self.active.phase_ms(Phase::Inhale);
        self.session_remaining_ms = session_ms(self.repeat_minutes);
        debug!("Timer reset to {}", self.active.pattern());
        self.emit(TimerEvent::Reset);
    }

    // ------------------------------------------------------------------------
    // Draft edits
    // ------------------------------------------------------------------------

    /// Sets one draft phase from untrusted input.
    ///
    /// Non-finite input is rejected and returns false. While idle, editing
    /// the displayed phase refreshes its remaining time immediately.
    pub fn set_draft_field(&mut self, phase: Phase, seconds: f64) -> bool {
        let Some(seconds) = checked_seconds(seconds) else {
            warn!("Ignoring non-finite duration for {}", phase.as_str());
            return false;
        };
        self.draft.set(phase, seconds);
        if self.status == TimerStatus::Idle && phase == self.phase {
            self.remaining_ms = self.draft.phase_ms(phase);
        }
        true
    }

    /// Replaces the whole draft.
    pub fn set_draft(&mut self, durations: DurationSet) {
        self.draft = durations;
        if self.status == TimerStatus::Idle {
            self.remaining_ms = self.draft.phase_ms(self.phase);
        }
    }

    /// Sets the session length from untrusted input.
    ///
    /// Non-finite input is rejected and returns false. While idle, the
    /// displayed session countdown is recomputed immediately.
    pub fn set_repeat_minutes(&mut self, minutes: f64) -> bool {
        let Some(minutes) = checked_seconds(minutes) else {
            warn!("Ignoring non-finite repeat minutes");
            return false;
        };
        self.apply_repeat_minutes(minutes);
        true
    }

    fn apply_repeat_minutes(&mut self, minutes: u32) {
        self.repeat_minutes = minutes;
        if self.status == TimerStatus::Idle {
            self.session_remaining_ms = session_ms(minutes);
        }
    }

    /// Overwrites draft and session length, as applying a preset does.
    pub fn apply_configuration(&mut self, durations: DurationSet, repeat_minutes: u32) {
        self.set_draft(durations);
        self.apply_repeat_minutes(repeat_minutes);
    }

    // ------------------------------------------------------------------------
    // Clock
    // ------------------------------------------------------------------------

    /// Advances the state machine to `now`.
    ///
    /// Remaining times are always recomputed from absolute deadlines, so a
    /// late or irregular tick never accumulates drift.
    pub fn tick(&mut self, now: Instant) {
        match self.status {
            TimerStatus::Idle => return,
            TimerStatus::Preparing => {
                let Some(deadline) = self.prepare_deadline else {
                    return;
                };
                if now < deadline {
                    let left = millis(deadline.saturating_duration_since(now));
                    self.pre_start_remaining_sec = Some(left.div_ceil(1000));
                    return;
                }
                // Anchor on the countdown deadline so any overrun is consumed below.
                self.begin_cycling(deadline);
                if self.status != TimerStatus::Cycling {
                    return;
                }
                // A late tick announces only the phase it lands on.
                if !self.advance(now) {
                    self.announce_phase();
                }
            }
            TimerStatus::Cycling => {
                self.advance(now);
            }
        }
    }

    /// How long the driver should sleep before the next tick.
    ///
    /// Wakes at the sooner of the next boundary and the refresh interval,
    /// never sooner than the minimum delay. `None` when idle.
    pub fn next_tick_delay(&self, now: Instant) -> Option<Duration> {
        let boundary = match self.status {
            TimerStatus::Idle => return None,
            TimerStatus::Preparing => self.prepare_deadline,
            TimerStatus::Cycling => match (self.phase_deadline, self.session_deadline) {
                (Some(phase), Some(session)) => Some(phase.min(session)),
                (phase, session) => phase.or(session),
            },
        };
        let max_refresh = self.settings.max_refresh();
        let until = boundary
            .map(|b| b.saturating_duration_since(now))
            .unwrap_or(max_refresh);
        Some(until.min(max_refresh).max(self.settings.min_delay()))
    }

    fn begin_cycling(&mut self, anchor: Instant) {
        self.prepare_deadline = None;
        self.pre_start_remaining_sec = None;
        // Edits made during the countdown take effect here.
        self.active = self.draft;

        let Some(first) = first_non_zero_phase(&self.active, None) else {
            self.stop_nothing_to_run();
            return;
        };

        self.status = TimerStatus::Cycling;
        self.phase = first;
        self.phase_deadline = Some(anchor + self.active.phase_duration(first));
        self.remaining_ms = self.active.phase_ms(first);
        self.session_remaining_ms = session_ms(self.repeat_minutes);
        self.session_deadline = self
            .session_remaining_ms
            .map(|ms| anchor + Duration::from_millis(ms));

        info!("Cycling started at {}", first.as_str());
    }

    fn announce_phase(&self) {
        self.emit(TimerEvent::PhaseStarted {
            phase: self.phase,
            duration_ms: self.active.phase_ms(self.phase),
        });
    }

    /// Walks phase and session deadlines up to `now`. Returns true if an
    /// event was emitted.
    fn advance(&mut self, now: Instant) -> bool {
        if let Some(session_deadline) = self.session_deadline {
            if now >= session_deadline {
                self.complete_session();
                return true;
            }
        }

        let Some(mut boundary) = self.phase_deadline else {
            return false;
        };
        let mut announced = false;

        if now >= boundary {
            let mut phase = self.phase;
            while now >= boundary {
                // The finished phase kept its own length; what follows uses the latest draft.
                self.active = self.draft;
                let Some(next) = first_non_zero_phase(&self.active, Some(phase)) else {
                    self.stop_nothing_to_run();
                    return true;
                };

                let cycle = self.active.cycle_duration();
                let overrun = now.saturating_duration_since(boundary);
                if overrun >= cycle {
                    let kept = overrun.as_nanos() % cycle.as_nanos();
                    let kept = Duration::from_nanos(u64::try_from(kept).unwrap_or(u64::MAX));
                    debug!(
                        "Skipping {} whole cycles of overrun",
                        overrun.as_nanos() / cycle.as_nanos()
                    );
                    boundary = now - kept;
                }

                phase = next;
                boundary += self.active.phase_duration(next);
            }

            self.phase = phase;
            self.phase_deadline = Some(boundary);
            let duration_ms = self.active.phase_ms(phase);
            debug!("Phase {} for {}ms", phase.as_str(), duration_ms);
            self.emit(TimerEvent::PhaseStarted { phase, duration_ms });
            announced = true;
        }

        self.remaining_ms = millis(boundary.saturating_duration_since(now));
        self.session_remaining_ms = self
            .session_deadline
            .map(|deadline| millis(deadline.saturating_duration_since(now)));
        announced
    }

    fn complete_session(&mut self) {
        self.status = TimerStatus::Idle;
        self.clear_deadlines();
        self.remaining_ms = 0;
        self.session_remaining_ms = Some(0);
        info!("Breathing session completed");
        self.emit(TimerEvent::SessionCompleted);
    }

    fn stop_nothing_to_run(&mut self) {
        self.status = TimerStatus::Idle;
        self.clear_deadlines();
        warn!("Every phase duration is zero; stopping");
        self.emit(TimerEvent::Stopped);
    }

    fn clear_deadlines(&mut self) {
        self.prepare_deadline = None;
        self.phase_deadline = None;
        self.session_deadline = None;
        self.pre_start_remaining_sec = None;
    }

    fn emit(&self, event: TimerEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("Timer event receiver dropped");
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Current coarse status.
    pub fn status(&self) -> TimerStatus {
        self.status
    }

    /// True while preparing or cycling.
    pub fn is_running(&self) -> bool {
        self.status != TimerStatus::Idle
    }

    /// True during the pre-start countdown.
    pub fn is_preparing(&self) -> bool {
        self.status == TimerStatus::Preparing
    }

    pub fn draft(&self) -> DurationSet {
        self.draft
    }

    pub fn active(&self) -> DurationSet {
        self.active
    }

    pub fn repeat_minutes(&self) -> u32 {
        self.repeat_minutes
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn session_remaining_ms(&self) -> Option<u64> {
        self.session_remaining_ms
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    /// True if a start request would be accepted.
    pub fn can_start(&self) -> bool {
        !self.is_running() && !self.draft.is_empty()
    }

    /// Fraction of the current phase elapsed; 0 while preparing.
    pub fn progress(&self) -> f64 {
        if self.is_preparing() {
            return 0.0;
        }
        phase_progress(self.active.phase_ms(self.phase), self.remaining_ms)
    }

    /// Builds the read-only view of the current state.
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            draft: self.draft,
            active: self.active,
            repeat_minutes: self.repeat_minutes,
            phase: self.phase,
            remaining_ms: self.remaining_ms,
            session_remaining_ms: self.session_remaining_ms,
            is_running: self.is_running(),
            is_preparing: self.is_preparing(),
            pre_start_remaining_sec: self.pre_start_remaining_sec,
            progress: self.progress(),
            remaining_seconds_display: remaining_seconds_display(self.remaining_ms),
            total_active_seconds: self.active.total_seconds(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_engine() -> (TimerEngine, mpsc::UnboundedReceiver<TimerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (TimerEngine::new(TimerSettings::default(), tx), rx)
    }

    fn create_engine_with(
        durations: DurationSet,
        repeat_minutes: u32,
    ) -> (TimerEngine, mpsc::UnboundedReceiver<TimerEvent>) {
        let (mut engine, rx) = create_engine();
        engine.apply_configuration(durations, repeat_minutes);
        (engine, rx)
    }

    fn at(t0: Instant, ms: u64) -> Instant {
        t0 + Duration::from_millis(ms)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<TimerEvent>) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Starts the engine at `t0` and returns the instant cycling begins.
    fn start_and_prepare(engine: &mut TimerEngine, t0: Instant) -> Instant {
        engine.start(t0).unwrap();
        let cycling_at = at(t0, 3000);
        engine.tick(cycling_at);
        assert_eq!(engine.status(), TimerStatus::Cycling);
        cycling_at
    }

    // ------------------------------------------------------------------------
    // Construction and Idle Edits
    // ------------------------------------------------------------------------

    mod idle_tests {
        use super::*;

        #[test]
        fn test_new_engine() {
            let (engine, _rx) = create_engine();
            let snap = engine.snapshot();

            assert_eq!(snap.status(), TimerStatus::Idle);
            assert_eq!(snap.draft, DEFAULT_DURATIONS);
            assert_eq!(snap.active, DEFAULT_DURATIONS);
            assert_eq!(snap.phase, Phase::Inhale);
            assert_eq!(snap.remaining_ms, 4000);
            assert_eq!(snap.session_remaining_ms, Some(5 * 60_000));
            assert_eq!(snap.pre_start_remaining_sec, None);
        }

        #[test]
        fn test_edit_current_phase_updates_remaining() {
            let (mut engine, _rx) = create_engine();

            assert!(engine.set_draft_field(Phase::Inhale, 10.0));

            assert_eq!(engine.remaining_ms(), 10_000);
        }

        #[test]
        fn test_edit_other_phase_keeps_remaining() {
            let (mut engine, _rx) = create_engine();

            assert!(engine.set_draft_field(Phase::Exhale, 12.0));

            assert_eq!(engine.remaining_ms(), 4000);
            assert_eq!(engine.draft().exhale, 12);
        }

        #[test]
        fn test_edit_clamps_input() {
            let (mut engine, _rx) = create_engine();

            engine.set_draft_field(Phase::Hold1, -3.0);
            engine.set_draft_field(Phase::Hold2, 2.6);

            assert_eq!(engine.draft().hold1, 0);
            assert_eq!(engine.draft().hold2, 3);
        }

        #[test]
        fn test_edit_rejects_non_finite() {
            let (mut engine, _rx) = create_engine();

            assert!(!engine.set_draft_field(Phase::Inhale, f64::NAN));
            assert!(!engine.set_draft_field(Phase::Inhale, f64::INFINITY));

            assert_eq!(engine.draft().inhale, 4);
            assert_eq!(engine.remaining_ms(), 4000);
        }

        #[test]
        fn test_repeat_minutes_edit_updates_session_display() {
            let (mut engine, _rx) = create_engine();

            engine.set_repeat_minutes(2.0);
            assert_eq!(engine.session_remaining_ms(), Some(120_000));

            engine.set_repeat_minutes(0.0);
            assert_eq!(engine.session_remaining_ms(), None);

            assert!(!engine.set_repeat_minutes(f64::NAN));
            assert_eq!(engine.repeat_minutes(), 0);
        }

        #[test]
        fn test_apply_configuration() {
            let (mut engine, _rx) = create_engine();

            engine.apply_configuration(DurationSet::new(4, 7, 8, 0), 3);

            assert_eq!(engine.draft(), DurationSet::new(4, 7, 8, 0));
            assert_eq!(engine.repeat_minutes(), 3);
            assert_eq!(engine.session_remaining_ms(), Some(180_000));
            assert_eq!(engine.remaining_ms(), 4000);
            // active only follows the draft on start/reset
            assert_eq!(engine.active(), DEFAULT_DURATIONS);
        }

        #[test]
        fn test_tick_idle_is_noop() {
            let (mut engine, mut rx) = create_engine();
            let t0 = Instant::now();

            engine.tick(at(t0, 60_000));

            assert_eq!(engine.remaining_ms(), 4000);
            assert!(drain(&mut rx).is_empty());
            assert_eq!(engine.next_tick_delay(t0), None);
        }
    }

    // ------------------------------------------------------------------------
    // Start / Preparing
    // ------------------------------------------------------------------------

    mod start_tests {
        use super::*;

        #[test]
        fn test_start_enters_preparing() {
            let (mut engine, mut rx) = create_engine();
            let t0 = Instant::now();

            engine.start(t0).unwrap();

            let snap = engine.snapshot();
            assert!(snap.is_running);
            assert!(snap.is_preparing);
            assert_eq!(snap.pre_start_remaining_sec, Some(3));
            assert_eq!(snap.progress, 0.0);
            assert_eq!(
                drain(&mut rx),
                vec![TimerEvent::PreparationStarted { seconds: 3 }]
            );
        }

        #[test]
        fn test_start_all_zero_rejected() {
            let (mut engine, mut rx) = create_engine_with(DurationSet::default(), 1);
            let t0 = Instant::now();

            assert!(!engine.can_start());
            let result = engine.start(t0);

            assert_eq!(result, Err(TimerError::NothingToRun));
            assert_eq!(engine.status(), TimerStatus::Idle);
            assert!(!engine.is_preparing());
            assert!(drain(&mut rx).is_empty());
        }

        #[test]
        fn test_start_already_running() {
            let (mut engine, _rx) = create_engine();
            let t0 = Instant::now();

            engine.start(t0).unwrap();

            assert_eq!(engine.start(t0), Err(TimerError::AlreadyRunning));
        }

        #[test]
        fn test_countdown_seconds_ceil() {
            let (mut engine, _rx) = create_engine();
            let t0 = Instant::now();
            engine.start(t0).unwrap();

            engine.tick(at(t0, 100));
            assert_eq!(engine.snapshot().pre_start_remaining_sec, Some(3));
            engine.tick(at(t0, 1000));
            assert_eq!(engine.snapshot().pre_start_remaining_sec, Some(2));
            engine.tick(at(t0, 2999));
            assert_eq!(engine.snapshot().pre_start_remaining_sec, Some(1));
            assert!(engine.is_preparing());
        }

        #[test]
        fn test_countdown_expiry_begins_cycling() {
            let (mut engine, mut rx) =
                create_engine_with(DurationSet::new(4, 0, 6, 0), 0);
            let t0 = Instant::now();
            engine.start(t0).unwrap();
            drain(&mut rx);

            engine.tick(at(t0, 3000));

            let snap = engine.snapshot();
            assert_eq!(snap.status(), TimerStatus::Cycling);
            assert_eq!(snap.phase, Phase::Inhale);
            assert_eq!(snap.remaining_ms, 4000);
            assert_eq!(snap.session_remaining_ms, None);
            assert_eq!(snap.pre_start_remaining_sec, None);
            assert_eq!(
                drain(&mut rx),
                vec![TimerEvent::PhaseStarted {
                    phase: Phase::Inhale,
                    duration_ms: 4000
                }]
            );
        }

        #[test]
        fn test_edits_during_countdown_take_effect() {
            let (mut engine, _rx) = create_engine_with(DurationSet::new(4, 0, 6, 0), 1);
            let t0 = Instant::now();
            engine.start(t0).unwrap();

            engine.set_draft_field(Phase::Inhale, 5.0);
            engine.set_repeat_minutes(2.0);
            // not idle, so the display does not jump yet
            assert_eq!(engine.remaining_ms(), 4000);
            assert_eq!(engine.session_remaining_ms(), Some(60_000));

            engine.tick(at(t0, 3000));

            assert_eq!(engine.active().inhale, 5);
            assert_eq!(engine.remaining_ms(), 5000);
            assert_eq!(engine.session_remaining_ms(), Some(120_000));
        }

        #[test]
        fn test_zero_inhale_starts_at_first_runnable_phase() {
            let (mut engine, mut rx) = create_engine_with(DurationSet::new(0, 0, 6, 0), 0);
            let t0 = Instant::now();

            start_and_prepare(&mut engine, t0);

            assert_eq!(engine.phase(), Phase::Exhale);
            assert_eq!(engine.remaining_ms(), 6000);
            assert_eq!(
                drain(&mut rx),
                vec![
                    TimerEvent::PreparationStarted { seconds: 3 },
                    TimerEvent::PhaseStarted {
                        phase: Phase::Exhale,
                        duration_ms: 6000
                    },
                ]
            );
        }

        #[test]
        fn test_draft_zeroed_during_countdown_stops() {
            let (mut engine, mut rx) = create_engine_with(DurationSet::new(4, 0, 0, 0), 0);
            let t0 = Instant::now();
            engine.start(t0).unwrap();
            drain(&mut rx);

            engine.set_draft_field(Phase::Inhale, 0.0);
            engine.tick(at(t0, 3000));

            assert_eq!(engine.status(), TimerStatus::Idle);
            assert_eq!(drain(&mut rx), vec![TimerEvent::Stopped]);
        }

        #[test]
        fn test_zero_prepare_window_cycles_immediately() {
            let (tx, _rx) = mpsc::unbounded_channel();
            let settings = TimerSettings {
                prepare_seconds: 0,
                ..TimerSettings::default()
            };
            let mut engine = TimerEngine::new(settings, tx);

            engine.start(Instant::now()).unwrap();

            assert_eq!(engine.status(), TimerStatus::Cycling);
        }
    }

    // ------------------------------------------------------------------------
    // Cycling
    // ------------------------------------------------------------------------

    mod cycling_tests {
        use super::*;

        #[test]
        fn test_zero_hold_is_skipped() {
            let (mut engine, mut rx) = create_engine_with(DurationSet::new(4, 0, 6, 0), 0);
            let t0 = Instant::now();
            let c0 = start_and_prepare(&mut engine, t0);
            drain(&mut rx);

            for ms in (100..4000).step_by(100) {
                engine.tick(at(c0, ms));
                assert_eq!(engine.phase(), Phase::Inhale);
                assert_eq!(engine.session_remaining_ms(), None);
            }
            engine.tick(at(c0, 4000));

            assert_eq!(engine.phase(), Phase::Exhale);
            assert_eq!(engine.remaining_ms(), 6000);
            assert_eq!(engine.session_remaining_ms(), None);
            assert_eq!(
                drain(&mut rx),
                vec![TimerEvent::PhaseStarted {
                    phase: Phase::Exhale,
                    duration_ms: 6000
                }]
            );
        }

        #[test]
        fn test_remaining_is_deadline_anchored() {
            let (mut engine, _rx) = create_engine_with(DurationSet::new(4, 0, 6, 0), 0);
            let t0 = Instant::now();
            let c0 = start_and_prepare(&mut engine, t0);

            // irregular tick spacing does not matter
            engine.tick(at(c0, 37));
            engine.tick(at(c0, 1250));
            assert_eq!(engine.remaining_ms(), 2750);
            assert_eq!(engine.snapshot().remaining_seconds_display, 3);
        }

        #[test]
        fn test_progress() {
            let (mut engine, _rx) = create_engine_with(DurationSet::new(4, 0, 6, 0), 0);
            let t0 = Instant::now();
            let c0 = start_and_prepare(&mut engine, t0);

            assert_eq!(engine.progress(), 0.0);
            engine.tick(at(c0, 1000));
            assert!((engine.progress() - 0.25).abs() < 1e-9);
            engine.tick(at(c0, 3999));
            assert!(engine.progress() < 1.0);
        }

        #[test]
        fn test_phase_progress_helper() {
            assert_eq!(phase_progress(0, 0), 1.0);
            assert_eq!(phase_progress(4000, 4000), 0.0);
            assert_eq!(phase_progress(4000, 10_000), 0.0);
            assert_eq!(phase_progress(4000, 0), 1.0);
            assert!((phase_progress(4000, 1000) - 0.75).abs() < 1e-9);
        }

        #[test]
        fn test_full_cycle_order() {
            let (mut engine, mut rx) = create_engine_with(DurationSet::new(1, 2, 3, 4), 0);
            let t0 = Instant::now();
            let c0 = start_and_prepare(&mut engine, t0);
            drain(&mut rx);

            let mut seen = Vec::new();
            for ms in [1000, 3000, 6000, 10_000] {
                engine.tick(at(c0, ms));
                seen.push(engine.phase());
            }

            assert_eq!(
                seen,
                vec![Phase::Hold1, Phase::Exhale, Phase::Hold2, Phase::Inhale]
            );
            assert_eq!(drain(&mut rx).len(), 4);
        }

        #[test]
        fn test_mid_run_edit_applies_to_next_phase_only() {
            let (mut engine, _rx) = create_engine_with(DurationSet::new(4, 0, 6, 0), 0);
            let t0 = Instant::now();
            let c0 = start_and_prepare(&mut engine, t0);

            engine.tick(at(c0, 1000));
            engine.set_draft_field(Phase::Inhale, 10.0);
            engine.set_draft_field(Phase::Exhale, 2.0);

            // current inhale keeps its original 4s deadline
            engine.tick(at(c0, 2000));
            assert_eq!(engine.remaining_ms(), 2000);
            assert_eq!(engine.active().inhale, 4);

            engine.tick(at(c0, 4000));
            assert_eq!(engine.phase(), Phase::Exhale);
            assert_eq!(engine.remaining_ms(), 2000);
            assert_eq!(engine.active(), DurationSet::new(10, 0, 2, 0));

            engine.tick(at(c0, 6000));
            assert_eq!(engine.phase(), Phase::Inhale);
            assert_eq!(engine.remaining_ms(), 10_000);
        }

        #[test]
        fn test_draft_zeroed_mid_run_stops() {
            let (mut engine, mut rx) = create_engine_with(DurationSet::new(4, 0, 6, 0), 0);
            let t0 = Instant::now();
            let c0 = start_and_prepare(&mut engine, t0);
            drain(&mut rx);

            engine.set_draft_field(Phase::Inhale, 0.0);
            engine.set_draft_field(Phase::Exhale, 0.0);
            engine.tick(at(c0, 4000));

            assert_eq!(engine.status(), TimerStatus::Idle);
            assert_eq!(drain(&mut rx), vec![TimerEvent::Stopped]);
        }
    }

    // ------------------------------------------------------------------------
    // Session Deadline
    // ------------------------------------------------------------------------

    mod session_tests {
        use super::*;

        #[test]
        fn test_session_counts_down_monotonically() {
            let (mut engine, _rx) = create_engine_with(DurationSet::new(4, 4, 4, 4), 1);
            let t0 = Instant::now();
            let c0 = start_and_prepare(&mut engine, t0);

            assert_eq!(engine.session_remaining_ms(), Some(60_000));
            let mut last = 60_000;
            for ms in (100..60_000).step_by(100) {
                engine.tick(at(c0, ms));
                let now = engine.session_remaining_ms().unwrap();
                assert!(now < last);
                last = now;
            }
            assert!(engine.is_running());
        }

        #[test]
        fn test_session_expiry_mid_phase() {
            let (mut engine, mut rx) = create_engine_with(DurationSet::new(4, 4, 4, 4), 1);
            let t0 = Instant::now();
            let c0 = start_and_prepare(&mut engine, t0);

            engine.tick(at(c0, 58_000));
            // 58s = 3 cycles + 10s, i.e. 2s into exhale
            assert_eq!(engine.phase(), Phase::Exhale);
            drain(&mut rx);

            engine.tick(at(c0, 60_000));

            let snap = engine.snapshot();
            assert_eq!(snap.status(), TimerStatus::Idle);
            assert_eq!(snap.remaining_ms, 0);
            assert_eq!(snap.session_remaining_ms, Some(0));
            assert_eq!(snap.session_display().as_deref(), Some("00:00"));
            assert_eq!(drain(&mut rx), vec![TimerEvent::SessionCompleted]);
        }

        #[test]
        fn test_session_expiry_in_hold() {
            let (mut engine, _rx) = create_engine_with(DurationSet::new(4, 30, 4, 4), 1);
            let t0 = Instant::now();
            let c0 = start_and_prepare(&mut engine, t0);

            engine.tick(at(c0, 50_000));
            assert_eq!(engine.phase(), Phase::Hold1);

            engine.tick(at(c0, 61_000));
            assert!(!engine.is_running());
            assert_eq!(engine.phase(), Phase::Hold1);
            assert_eq!(engine.remaining_ms(), 0);
        }

        #[test]
        fn test_unlimited_session_keeps_running() {
            let (mut engine, _rx) = create_engine_with(DurationSet::new(4, 4, 4, 4), 0);
            let t0 = Instant::now();
            let c0 = start_and_prepare(&mut engine, t0);

            engine.tick(at(c0, 10 * 60_000 + 500));

            assert!(engine.is_running());
            assert_eq!(engine.session_remaining_ms(), None);
            assert_eq!(engine.snapshot().session_display(), None);
        }
    }

    // ------------------------------------------------------------------------
    // Spillover
    // ------------------------------------------------------------------------

    mod spillover_tests {
        use super::*;

        #[test]
        fn test_late_tick_walks_multiple_phases() {
            let (mut engine, mut rx) = create_engine_with(DurationSet::new(4, 0, 6, 0), 0);
            let t0 = Instant::now();
            let c0 = start_and_prepare(&mut engine, t0);
            drain(&mut rx);

            // inhale [0,4) exhale [4,10) inhale [10,14)
            engine.tick(at(c0, 12_000));

            assert_eq!(engine.phase(), Phase::Inhale);
            assert_eq!(engine.remaining_ms(), 2000);
            // one cue for the phase actually landed on
            assert_eq!(
                drain(&mut rx),
                vec![TimerEvent::PhaseStarted {
                    phase: Phase::Inhale,
                    duration_ms: 4000
                }]
            );
        }

        #[test]
        fn test_overrun_beyond_full_cycles_is_reduced() {
            let (mut engine, _rx) = create_engine_with(DurationSet::new(4, 0, 6, 0), 0);
            let t0 = Instant::now();
            let c0 = start_and_prepare(&mut engine, t0);

            // exhale runs [24,30) in the third cycle
            engine.tick(at(c0, 29_500));

            assert_eq!(engine.phase(), Phase::Exhale);
            assert_eq!(engine.remaining_ms(), 500);
        }

        #[test]
        fn test_very_long_suspension() {
            let (mut engine, _rx) = create_engine_with(DurationSet::new(4, 7, 8, 0), 0);
            let t0 = Instant::now();
            let c0 = start_and_prepare(&mut engine, t0);

            // 19s cycle; 1_000_003s = 52631 cycles + 14s, i.e. 3s into exhale
            engine.tick(c0 + Duration::from_secs(1_000_003));

            assert_eq!(engine.phase(), Phase::Exhale);
            assert_eq!(engine.remaining_ms(), 5000);
            assert!(engine.is_running());
        }

        #[test]
        fn test_countdown_overrun_is_consumed() {
            let (mut engine, _rx) = create_engine_with(DurationSet::new(4, 0, 6, 0), 0);
            let t0 = Instant::now();
            engine.start(t0).unwrap();

            // countdown ends at 3s, then inhale [3,7) exhale [7,13)
            engine.tick(at(t0, 8_000));

            assert_eq!(engine.phase(), Phase::Exhale);
            assert_eq!(engine.remaining_ms(), 5000);
        }

        #[test]
        fn test_countdown_overrun_announces_landing_phase_only() {
            let (mut engine, mut rx) = create_engine_with(DurationSet::new(4, 0, 6, 0), 0);
            let t0 = Instant::now();
            engine.start(t0).unwrap();

            engine.tick(at(t0, 8_000));

            assert_eq!(
                drain(&mut rx),
                vec![
                    TimerEvent::PreparationStarted { seconds: 3 },
                    TimerEvent::PhaseStarted {
                        phase: Phase::Exhale,
                        duration_ms: 6000
                    },
                ]
            );
        }

        #[test]
        fn test_countdown_overrun_past_session_only_completes() {
            let (mut engine, mut rx) = create_engine_with(DurationSet::new(4, 0, 6, 0), 1);
            let t0 = Instant::now();
            engine.start(t0).unwrap();

            engine.tick(at(t0, 3000 + 61_000));

            assert_eq!(
                drain(&mut rx),
                vec![
                    TimerEvent::PreparationStarted { seconds: 3 },
                    TimerEvent::SessionCompleted,
                ]
            );
        }

        #[test]
        fn test_late_tick_still_honors_session() {
            let (mut engine, _rx) = create_engine_with(DurationSet::new(4, 0, 6, 0), 1);
            let t0 = Instant::now();
            let c0 = start_and_prepare(&mut engine, t0);

            engine.tick(at(c0, 10 * 60_000));

            assert!(!engine.is_running());
            assert_eq!(engine.session_remaining_ms(), Some(0));
        }
    }

    // ------------------------------------------------------------------------
    // Pause / Reset
    // ------------------------------------------------------------------------

    mod pause_reset_tests {
        use super::*;

        #[test]
        fn test_pause_freezes_values() {
            let (mut engine, mut rx) = create_engine_with(DurationSet::new(4, 0, 6, 0), 1);
            let t0 = Instant::now();
            let c0 = start_and_prepare(&mut engine, t0);
            drain(&mut rx);

            assert!(engine.pause(at(c0, 1500)));

            assert!(!engine.is_running());
            assert_eq!(engine.phase(), Phase::Inhale);
            assert_eq!(engine.remaining_ms(), 2500);
            assert_eq!(engine.session_remaining_ms(), Some(58_500));
            assert_eq!(drain(&mut rx), vec![TimerEvent::Paused]);

            engine.tick(at(c0, 30_000));
            assert_eq!(engine.remaining_ms(), 2500);
        }

        #[test]
        fn test_pause_when_idle_is_noop() {
            let (mut engine, mut rx) = create_engine();

            assert!(!engine.pause(Instant::now()));
            assert!(drain(&mut rx).is_empty());
        }

        #[test]
        fn test_pause_during_preparing() {
            let (mut engine, _rx) = create_engine();
            let t0 = Instant::now();
            engine.start(t0).unwrap();

            assert!(engine.pause(at(t0, 1000)));

            let snap = engine.snapshot();
            assert!(!snap.is_running);
            assert!(!snap.is_preparing);
            assert_eq!(snap.pre_start_remaining_sec, None);
        }

        #[test]
        fn test_start_after_pause_reenters_preparing() {
            let (mut engine, _rx) = create_engine_with(DurationSet::new(4, 0, 6, 0), 0);
            let t0 = Instant::now();
            let c0 = start_and_prepare(&mut engine, t0);
            engine.tick(at(c0, 5000));
            assert_eq!(engine.phase(), Phase::Exhale);
            engine.pause(at(c0, 5000));

            engine.start(at(c0, 9000)).unwrap();

            assert!(engine.is_preparing());
            assert_eq!(engine.phase(), Phase::Inhale);
            assert_eq!(engine.remaining_ms(), 4000);
        }

        #[test]
        fn test_toggle_run() {
            let (mut engine, _rx) = create_engine();
            let t0 = Instant::now();

            engine.toggle_run(t0).unwrap();
            assert!(engine.is_running());

            engine.toggle_run(at(t0, 500)).unwrap();
            assert!(!engine.is_running());

            engine.toggle_run(at(t0, 1000)).unwrap();
            assert!(engine.is_preparing());
        }

        #[test]
        fn test_idle_edit_after_pause_refreshes_current_phase() {
            let (mut engine, _rx) = create_engine_with(DurationSet::new(4, 0, 6, 0), 0);
            let t0 = Instant::now();
            let c0 = start_and_prepare(&mut engine, t0);
            engine.pause(at(c0, 5000));
            assert_eq!(engine.phase(), Phase::Exhale);

            engine.set_draft_field(Phase::Exhale, 8.0);

            assert_eq!(engine.remaining_ms(), 8000);
        }

        #[test]
        fn test_reset_uses_current_draft() {
            let (mut engine, mut rx) = create_engine_with(DurationSet::new(4, 0, 6, 0), 1);
            let t0 = Instant::now();
            let c0 = start_and_prepare(&mut engine, t0);
            engine.tick(at(c0, 5000));
            engine.set_draft_field(Phase::Inhale, 7.0);
            engine.set_repeat_minutes(3.0);
            drain(&mut rx);

            engine.reset();

            let snap = engine.snapshot();
            assert_eq!(snap.status(), TimerStatus::Idle);
            assert_eq!(snap.active, DurationSet::new(7, 0, 6, 0));
            assert_eq!(snap.phase, Phase::Inhale);
            assert_eq!(snap.remaining_ms, 7000);
            assert_eq!(snap.session_remaining_ms, Some(180_000));
            assert_eq!(drain(&mut rx), vec![TimerEvent::Reset]);
        }
    }

    // ------------------------------------------------------------------------
    // Tick Cadence
    // ------------------------------------------------------------------------

    mod cadence_tests {
        use super::*;

        #[test]
        fn test_delay_capped_by_refresh() {
            let (mut engine, _rx) = create_engine_with(DurationSet::new(4, 0, 6, 0), 0);
            let t0 = Instant::now();
            let c0 = start_and_prepare(&mut engine, t0);

            assert_eq!(
                engine.next_tick_delay(c0),
                Some(Duration::from_millis(100))
            );
        }

        #[test]
        fn test_delay_lands_on_boundary() {
            let (mut engine, _rx) = create_engine_with(DurationSet::new(4, 0, 6, 0), 0);
            let t0 = Instant::now();
            let c0 = start_and_prepare(&mut engine, t0);

            engine.tick(at(c0, 3960));
            assert_eq!(
                engine.next_tick_delay(at(c0, 3960)),
                Some(Duration::from_millis(40))
            );
        }

        #[test]
        fn test_delay_has_floor() {
            let (mut engine, _rx) = create_engine_with(DurationSet::new(4, 0, 6, 0), 0);
            let t0 = Instant::now();
            let c0 = start_and_prepare(&mut engine, t0);

            engine.tick(at(c0, 3999));
            assert_eq!(
                engine.next_tick_delay(at(c0, 3999)),
                Some(Duration::from_millis(5))
            );
        }

        #[test]
        fn test_delay_considers_session_deadline() {
            let (mut engine, _rx) = create_engine_with(DurationSet::new(0, 0, 0, 300), 1);
            let t0 = Instant::now();
            let c0 = start_and_prepare(&mut engine, t0);

            engine.tick(at(c0, 59_970));
            assert_eq!(
                engine.next_tick_delay(at(c0, 59_970)),
                Some(Duration::from_millis(30))
            );
        }
    }
}
