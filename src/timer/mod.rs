//! Timer engine for the zeropamine core.
//!
//! This module provides the countdown machinery:
//! - Command handling (start / pause / reset / settings updates)
//! - Event firing for sound playback and notifications
//! - Auto-start across session boundaries
//!
//! The countdown is tick-counted, not deadline-scheduled: the driving loop
//! (the binary's foreground loop) calls `tick` once per wall-clock second
//! and skips missed intervals, so a suspended host slows the timer rather
//! than making it jump. Accepted approximation.

use tokio::sync::mpsc;
use tracing::debug;

use crate::types::{PomodoroSettings, PomodoroState, SessionBoundary, SettingsPatch};

// ============================================================================
// TimerEvent
// ============================================================================

/// Timer events consumed by the runtime for side effects.
#[derive(Debug, Clone, PartialEq)]
pub enum TimerEvent {
    /// Countdown started or resumed
    Started,
    /// Countdown paused
    Paused,
    /// Timer reset to Idle/Focus
    Reset,
    /// A focus or break session ran out
    SessionCompleted(SessionBoundary),
    /// Settings changed (already merged and clamped)
    SettingsChanged(PomodoroSettings),
    /// One second elapsed while running
    Tick {
        /// Remaining seconds after the tick
        remaining_seconds: u32,
    },
}

// ============================================================================
// TimerEngine
// ============================================================================

/// Owns the timer state and serializes every mutation.
///
/// Commands never fail: operations that do not apply in the current status
/// are no-ops, matching the behavior of the buttons they back.
pub struct TimerEngine {
    /// Current timer state
    state: PomodoroState,
    /// Event sender channel
    event_tx: mpsc::UnboundedSender<TimerEvent>,
}

impl TimerEngine {
    /// Creates a new engine with the given settings and event channel.
    pub fn new(settings: PomodoroSettings, event_tx: mpsc::UnboundedSender<TimerEvent>) -> Self {
        Self {
            state: PomodoroState::new(settings),
            event_tx,
        }
    }

    /// Advances the countdown by one second and emits the resulting events.
    pub fn tick(&mut self) {
        let boundary = self.state.tick();

        self.send(TimerEvent::Tick {
            remaining_seconds: self.state.remaining_seconds,
        });

        if let Some(boundary) = boundary {
            debug!(
                "Session boundary: {} -> {}",
                boundary.finished_mode.as_str(),
                boundary.next_mode.as_str()
            );
            self.send(TimerEvent::SessionCompleted(boundary));
        }
    }

    /// Starts or resumes the countdown. No-op while already running.
    pub fn start(&mut self) {
        if self.state.status.is_running() {
            return;
        }
        self.state.start();
        self.send(TimerEvent::Started);
    }

    /// Pauses the countdown. No-op unless running.
    pub fn pause(&mut self) {
        if !self.state.status.is_running() {
            return;
        }
        self.state.pause();
        self.send(TimerEvent::Paused);
    }

    /// Resets to Idle in Focus mode.
    pub fn reset(&mut self) {
        self.state.reset();
        self.send(TimerEvent::Reset);
    }

    /// Merges a settings patch and emits the committed settings.
    pub fn update_settings(&mut self, patch: &SettingsPatch) {
        if patch.is_empty() {
            return;
        }
        self.state.update_settings(patch);
        self.send(TimerEvent::SettingsChanged(self.state.settings.clone()));
    }

    /// Returns a reference to the current timer state.
    pub fn state(&self) -> &PomodoroState {
        &self.state
    }

    /// Overrides the remaining time of the current session.
    ///
    /// Backs the hidden `--focus-seconds` flag so a session boundary can be
    /// exercised in seconds instead of minutes. Clamped to at least 1.
    pub fn override_remaining(&mut self, seconds: u32) {
        self.state.remaining_seconds = seconds.max(1);
    }

    /// Returns a mutable reference to the timer state (for testing).
    #[cfg(test)]
    pub fn state_mut(&mut self) -> &mut PomodoroState {
        &mut self.state
    }

    /// Sends an event; a dropped receiver only means nobody is listening.
    fn send(&self, event: TimerEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("Timer event receiver dropped");
        }
    }
}

impl std::fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TimerMode, TimerStatus};

    fn create_engine() -> (TimerEngine, mpsc::UnboundedReceiver<TimerEvent>) {
        create_engine_with_settings(PomodoroSettings::default())
    }

    fn create_engine_with_settings(
        settings: PomodoroSettings,
    ) -> (TimerEngine, mpsc::UnboundedReceiver<TimerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = TimerEngine::new(settings, tx);
        (engine, rx)
    }

    // ------------------------------------------------------------------------
    // Command Tests
    // ------------------------------------------------------------------------

    mod command_tests {
        use super::*;

        #[test]
        fn test_new_engine() {
            let (engine, _rx) = create_engine();
            let state = engine.state();

            assert_eq!(state.mode, TimerMode::Focus);
            assert_eq!(state.status, TimerStatus::Idle);
            assert_eq!(state.remaining_seconds, 25 * 60);
        }

        #[test]
        fn test_start_emits_event() {
            let (mut engine, mut rx) = create_engine();

            engine.start();

            assert_eq!(engine.state().status, TimerStatus::Running);
            assert_eq!(rx.try_recv().unwrap(), TimerEvent::Started);
        }

        #[test]
        fn test_start_while_running_emits_nothing() {
            let (mut engine, mut rx) = create_engine();

            engine.start();
            let _ = rx.try_recv();

            engine.start();
            assert!(rx.try_recv().is_err());
        }

        #[test]
        fn test_pause_and_resume() {
            let (mut engine, mut rx) = create_engine();

            engine.start();
            let _ = rx.try_recv();
            engine.state_mut().remaining_seconds = 1000;

            engine.pause();
            assert_eq!(engine.state().status, TimerStatus::Paused);
            assert_eq!(engine.state().remaining_seconds, 1000);
            assert_eq!(rx.try_recv().unwrap(), TimerEvent::Paused);

            engine.start();
            assert_eq!(engine.state().status, TimerStatus::Running);
            assert_eq!(engine.state().remaining_seconds, 1000);
            assert_eq!(rx.try_recv().unwrap(), TimerEvent::Started);
        }

        #[test]
        fn test_pause_while_idle_emits_nothing() {
            let (mut engine, mut rx) = create_engine();

            engine.pause();

            assert_eq!(engine.state().status, TimerStatus::Idle);
            assert!(rx.try_recv().is_err());
        }

        #[test]
        fn test_reset_from_break() {
            let (mut engine, mut rx) = create_engine();

            engine.start();
            engine.state_mut().remaining_seconds = 1;
            engine.tick();
            assert_eq!(engine.state().mode, TimerMode::Break);

            engine.reset();

            assert_eq!(engine.state().mode, TimerMode::Focus);
            assert_eq!(engine.state().status, TimerStatus::Idle);
            assert_eq!(engine.state().remaining_seconds, 25 * 60);

            // Started, Tick, SessionCompleted, Reset
            let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
            assert_eq!(events.last(), Some(&TimerEvent::Reset));
        }

        #[test]
        fn test_update_settings_emits_committed_settings() {
            let (mut engine, mut rx) = create_engine();

            engine.update_settings(&SettingsPatch {
                focus_minutes: Some(500),
                ..Default::default()
            });

            match rx.try_recv().unwrap() {
                TimerEvent::SettingsChanged(settings) => {
                    assert_eq!(settings.focus_minutes, 120);
                }
                other => panic!("Expected SettingsChanged, got {:?}", other),
            }
            assert_eq!(engine.state().remaining_seconds, 120 * 60);
        }

        #[test]
        fn test_update_settings_empty_patch_emits_nothing() {
            let (mut engine, mut rx) = create_engine();

            engine.update_settings(&SettingsPatch::default());

            assert!(rx.try_recv().is_err());
        }
    }

    // ------------------------------------------------------------------------
    // Tick Tests
    // ------------------------------------------------------------------------

    mod tick_tests {
        use super::*;

        #[test]
        fn test_tick_emits_remaining() {
            let (mut engine, mut rx) = create_engine();

            engine.start();
            let _ = rx.try_recv();

            engine.tick();

            assert_eq!(
                rx.try_recv().unwrap(),
                TimerEvent::Tick {
                    remaining_seconds: 25 * 60 - 1
                }
            );
        }

        #[test]
        fn test_boundary_emits_tick_then_completion() {
            let (mut engine, mut rx) = create_engine();

            engine.start();
            let _ = rx.try_recv();
            engine.state_mut().remaining_seconds = 1;

            engine.tick();

            assert_eq!(
                rx.try_recv().unwrap(),
                TimerEvent::Tick {
                    remaining_seconds: 5 * 60
                }
            );
            match rx.try_recv().unwrap() {
                TimerEvent::SessionCompleted(boundary) => {
                    assert_eq!(boundary.finished_mode, TimerMode::Focus);
                    assert_eq!(boundary.next_mode, TimerMode::Break);
                    assert!(!boundary.auto_started);
                }
                other => panic!("Expected SessionCompleted, got {:?}", other),
            }
        }

        #[test]
        fn test_boundary_with_auto_start() {
            let settings = PomodoroSettings {
                auto_start: true,
                ..Default::default()
            };
            let (mut engine, mut rx) = create_engine_with_settings(settings);

            engine.start();
            let _ = rx.try_recv();
            engine.state_mut().remaining_seconds = 1;

            engine.tick();

            let _ = rx.try_recv(); // Tick
            match rx.try_recv().unwrap() {
                TimerEvent::SessionCompleted(boundary) => assert!(boundary.auto_started),
                other => panic!("Expected SessionCompleted, got {:?}", other),
            }
            assert_eq!(engine.state().status, TimerStatus::Running);
        }

        #[test]
        fn test_dropped_receiver_does_not_panic() {
            let (mut engine, rx) = create_engine();
            drop(rx);

            engine.start();
            engine.tick();
            engine.reset();
        }
    }

    // ------------------------------------------------------------------------
    // External Drive Tests
    // ------------------------------------------------------------------------

    // The engine has no loop of its own; the foreground loop calls tick()
    // once per second. These tests drive it the same way.

    mod drive_tests {
        use super::*;

        #[test]
        fn test_tick_while_idle_or_paused_emits_nothing() {
            let (mut engine, mut rx) = create_engine();

            engine.tick();
            assert!(rx.try_recv().is_err(), "idle ticks are silent");

            engine.start();
            let _ = rx.try_recv();
            engine.pause();
            let _ = rx.try_recv();

            engine.tick();
            assert!(rx.try_recv().is_err(), "paused ticks are silent");
        }

        #[test]
        fn test_driving_a_whole_session_emits_one_completion() {
            let (mut engine, mut rx) = create_engine();

            engine.start();
            engine.state_mut().remaining_seconds = 5;
            for _ in 0..5 {
                engine.tick();
            }

            let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
            let completions = events
                .iter()
                .filter(|e| matches!(e, TimerEvent::SessionCompleted(_)))
                .count();
            assert_eq!(completions, 1);
            assert_eq!(engine.state().mode, TimerMode::Break);
        }
    }
}
