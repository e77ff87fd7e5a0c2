//! Runtime wiring for the zeropamine core.
//!
//! The runtime owns the timer engine, the sound engine, the notification
//! sink, and the settings store, and turns timer events into their side
//! effects:
//!
//! - `SessionCompleted` → one-shot completion cue + notification
//! - `SettingsChanged` → fire-and-forget persistence
//!
//! Everything runs single-threaded and cooperatively: each command or tick
//! mutates state and processes the resulting events before returning, so
//! no two operations ever interleave.

use tokio::sync::mpsc;
use tracing::debug;

use crate::notify::{boundary_body, NotificationSink, NOTIFICATION_TITLE};
use crate::settings::{load_settings, persist_settings, SettingsStore};
use crate::sound::{try_create_backend, SoundEngine};
use crate::timer::{TimerEngine, TimerEvent};
use crate::types::{PomodoroState, SettingsPatch, SoundKind};

// ============================================================================
// PomodoroRuntime
// ============================================================================

/// Coordinates the timer core with its collaborators.
pub struct PomodoroRuntime {
    engine: TimerEngine,
    events: mpsc::UnboundedReceiver<TimerEvent>,
    sound: SoundEngine,
    notifier: Box<dyn NotificationSink>,
    store: Box<dyn SettingsStore>,
    /// Whether the first audio command should try to open an audio device.
    lazy_audio: bool,
}

impl PomodoroRuntime {
    /// Creates a runtime that opens the audio device lazily on the first
    /// audio-relevant command (start, preview, completion sound).
    ///
    /// Settings are loaded from the store immediately, merging whatever is
    /// valid over defaults.
    pub fn new(store: Box<dyn SettingsStore>, notifier: Box<dyn NotificationSink>) -> Self {
        Self::build(store, notifier, SoundEngine::without_audio(), true)
    }

    /// Creates a runtime with an explicit sound engine.
    ///
    /// Used by tests (mock backend) and by callers that decide up front
    /// whether audio exists, such as a `--mute` flag.
    pub fn with_sound_engine(
        store: Box<dyn SettingsStore>,
        notifier: Box<dyn NotificationSink>,
        sound: SoundEngine,
    ) -> Self {
        Self::build(store, notifier, sound, false)
    }

    fn build(
        store: Box<dyn SettingsStore>,
        notifier: Box<dyn NotificationSink>,
        sound: SoundEngine,
        lazy_audio: bool,
    ) -> Self {
        let settings = load_settings(store.as_ref());
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            engine: TimerEngine::new(settings, tx),
            events: rx,
            sound,
            notifier,
            store,
            lazy_audio,
        }
    }

    /// Returns the current observable timer state.
    pub fn state(&self) -> &PomodoroState {
        self.engine.state()
    }

    /// Starts or resumes the countdown.
    pub fn start(&mut self) {
        self.ensure_audio_backend();
        self.engine.start();
        self.process_events();
    }

    /// Attaches the audio backend on the first audio-relevant command.
    ///
    /// Audio output is only meaningful after a user action, so the device
    /// probe waits for one: a start, a preview, or a completion-sound
    /// command all count. The probe runs once; a host without a device is
    /// remembered and every later call takes the silent path.
    fn ensure_audio_backend(&mut self) {
        if !self.lazy_audio {
            return;
        }
        self.lazy_audio = false;
        if self.sound.has_backend() {
            return;
        }
        if let Some(backend) = try_create_backend() {
            self.sound.attach_backend(backend);
        }
    }

    /// Pauses the countdown.
    pub fn pause(&mut self) {
        self.engine.pause();
        self.process_events();
    }

    /// Resets to Idle in Focus mode.
    pub fn reset(&mut self) {
        self.engine.reset();
        self.process_events();
    }

    /// Merges a settings patch and persists the committed settings.
    pub fn update_settings(&mut self, patch: &SettingsPatch) {
        self.engine.update_settings(patch);
        self.process_events();
    }

    /// Advances the countdown by one second and applies side effects.
    pub fn tick(&mut self) {
        self.engine.tick();
        self.process_events();
    }

    /// Overrides the remaining time of the current session.
    ///
    /// Backs the hidden `--focus-seconds` flag.
    pub fn override_remaining(&mut self, seconds: u32) {
        self.engine.override_remaining(seconds);
    }

    /// Plays the configured completion cue immediately.
    ///
    /// Backed by the settings dialog's "test" button; uses the current
    /// settings, not preview overrides.
    pub fn play_completion_sound(&mut self) {
        self.ensure_audio_backend();
        let settings = self.engine.state().settings.clone();
        self.sound.play_completion(settings.sound, settings.volume);
    }

    /// Starts a sound preview, replacing any active one.
    ///
    /// Works before the timer has ever started: previewing is itself the
    /// user action that initializes audio.
    pub fn preview_sound(&mut self, kind: SoundKind, volume: f32) {
        self.ensure_audio_backend();
        self.sound.start_preview(kind, volume);
    }

    /// Stops the active sound preview, if any.
    pub fn stop_preview_sound(&mut self) {
        self.sound.stop_preview();
    }

    /// Number of playback handles the active preview owns (for tests).
    #[must_use]
    pub fn preview_handle_count(&self) -> usize {
        self.sound.preview_handle_count()
    }

    /// Applies the side effects of every pending timer event.
    fn process_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::SessionCompleted(boundary) => {
                debug!(
                    "Completing {} session (auto_start={})",
                    boundary.finished_mode.as_str(),
                    boundary.auto_started
                );
                let settings = self.engine.state().settings.clone();
                self.sound.play_completion(settings.sound, settings.volume);
                self.notifier
                    .notify(NOTIFICATION_TITLE, boundary_body(&boundary));
            }
            TimerEvent::SettingsChanged(settings) => {
                persist_settings(self.store.as_ref(), &settings);
            }
            TimerEvent::Started
            | TimerEvent::Paused
            | TimerEvent::Reset
            | TimerEvent::Tick { .. } => {}
        }
    }
}

impl std::fmt::Debug for PomodoroRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PomodoroRuntime")
            .field("state", self.engine.state())
            .field("sound", &self.sound)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
