//! Core data types for the zeropamine timer.
//!
//! This module defines the data structures used for:
//! - Timer state management (mode, status, remaining time)
//! - User settings with range validation
//! - Field-by-field merging of persisted settings

use serde::{Deserialize, Serialize};

// ============================================================================
// TimerMode
// ============================================================================

/// Represents which session type the timer is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    /// Focused work session
    Focus,
    /// Rest session
    Break,
}

impl TimerMode {
    /// Returns the string representation of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMode::Focus => "focus",
            TimerMode::Break => "break",
        }
    }

    /// Returns the mode that follows this one at a session boundary.
    pub fn opposite(&self) -> Self {
        match self {
            TimerMode::Focus => TimerMode::Break,
            TimerMode::Break => TimerMode::Focus,
        }
    }
}

impl Default for TimerMode {
    fn default() -> Self {
        TimerMode::Focus
    }
}

// ============================================================================
// TimerStatus
// ============================================================================

/// Represents whether the timer is counting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    /// Timer stopped, remaining time reset to the full duration
    Idle,
    /// Countdown advancing once per tick
    Running,
    /// Countdown frozen at the current value
    Paused,
}

impl TimerStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerStatus::Idle => "idle",
            TimerStatus::Running => "running",
            TimerStatus::Paused => "paused",
        }
    }

    /// Returns true if the timer is actively counting down.
    pub fn is_running(&self) -> bool {
        matches!(self, TimerStatus::Running)
    }
}

impl Default for TimerStatus {
    fn default() -> Self {
        TimerStatus::Idle
    }
}

// ============================================================================
// Theme
// ============================================================================

/// Visual theme for the timer display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Sand-flow hourglass visualization
    Hourglass,
    /// Draining coffee mug visualization
    Coffee,
}

impl Theme {
    /// Returns the string representation of the theme.
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Hourglass => "hourglass",
            Theme::Coffee => "coffee",
        }
    }

    /// Parses a persisted theme string, returning None for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "hourglass" => Some(Theme::Hourglass),
            "coffee" => Some(Theme::Coffee),
            _ => None,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::Hourglass
    }
}

// ============================================================================
// SoundKind
// ============================================================================

/// Which synthesized completion cue to play at a session boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundKind {
    /// Piercing two-tone alarm pulses
    Alarm,
    /// Struck bell with decaying partials
    Bell,
}

impl SoundKind {
    /// Returns the string representation of the sound kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundKind::Alarm => "alarm",
            SoundKind::Bell => "bell",
        }
    }

    /// Parses a persisted sound string, returning None for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "alarm" => Some(SoundKind::Alarm),
            "bell" => Some(SoundKind::Bell),
            _ => None,
        }
    }
}

impl Default for SoundKind {
    fn default() -> Self {
        SoundKind::Alarm
    }
}

// ============================================================================
// PomodoroSettings
// ============================================================================

/// Minimum focus session length in minutes.
pub const MIN_FOCUS_MINUTES: u32 = 1;
/// Maximum focus session length in minutes.
pub const MAX_FOCUS_MINUTES: u32 = 120;
/// Minimum break length in minutes.
pub const MIN_BREAK_MINUTES: u32 = 1;
/// Maximum break length in minutes.
pub const MAX_BREAK_MINUTES: u32 = 60;

/// Default playback volume when nothing is persisted.
const DEFAULT_VOLUME: f32 = 0.5;

/// User-adjustable timer settings.
///
/// Serialized field names match the JSON document the web client stores
/// under its localStorage key, so a settings file written by either side
/// round-trips through the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PomodoroSettings {
    /// Focus session length in minutes (1-120)
    #[serde(rename = "focusDuration")]
    pub focus_minutes: u32,
    /// Break length in minutes (1-60)
    #[serde(rename = "breakDuration")]
    pub break_minutes: u32,
    /// Whether the next session starts counting down immediately
    #[serde(rename = "autoStart")]
    pub auto_start: bool,
    /// Visual theme
    pub theme: Theme,
    /// Completion cue
    #[serde(rename = "soundType")]
    pub sound: SoundKind,
    /// Playback volume (0.0-1.0)
    pub volume: f32,
}

impl Default for PomodoroSettings {
    fn default() -> Self {
        Self {
            focus_minutes: 25,
            break_minutes: 5,
            auto_start: false,
            theme: Theme::Hourglass,
            sound: SoundKind::Alarm,
            volume: DEFAULT_VOLUME,
        }
    }
}

impl PomodoroSettings {
    /// Clamps every field into its legal range.
    ///
    /// Called before settings are stored or applied, so out-of-range values
    /// never survive a merge.
    pub fn clamp(&mut self) {
        self.focus_minutes = self
            .focus_minutes
            .clamp(MIN_FOCUS_MINUTES, MAX_FOCUS_MINUTES);
        self.break_minutes = self
            .break_minutes
            .clamp(MIN_BREAK_MINUTES, MAX_BREAK_MINUTES);
        if self.volume.is_finite() {
            self.volume = self.volume.clamp(0.0, 1.0);
        } else {
            self.volume = DEFAULT_VOLUME;
        }
    }

    /// Returns the configured length of the given mode, in minutes.
    pub fn duration_minutes(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Focus => self.focus_minutes,
            TimerMode::Break => self.break_minutes,
        }
    }

    /// Returns the configured length of the given mode, in seconds.
    pub fn duration_seconds(&self, mode: TimerMode) -> u32 {
        self.duration_minutes(mode) * 60
    }

    /// Merges a partial update into these settings and clamps the result.
    ///
    /// Absent patch fields keep their prior committed value, so corrupt
    /// persisted data never replaces a field it cannot express.
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(minutes) = patch.focus_minutes {
            self.focus_minutes = minutes;
        }
        if let Some(minutes) = patch.break_minutes {
            self.break_minutes = minutes;
        }
        if let Some(auto_start) = patch.auto_start {
            self.auto_start = auto_start;
        }
        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
        if let Some(sound) = patch.sound {
            self.sound = sound;
        }
        if let Some(volume) = patch.volume {
            self.volume = volume;
        }
        self.clamp();
    }
}

// ============================================================================
// SettingsPatch
// ============================================================================

/// A partial settings update.
///
/// Built programmatically by callers of `update_settings`, or decoded
/// field-by-field from a persisted JSON document via
/// [`SettingsPatch::from_json`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsPatch {
    pub focus_minutes: Option<u32>,
    pub break_minutes: Option<u32>,
    pub auto_start: Option<bool>,
    pub theme: Option<Theme>,
    pub sound: Option<SoundKind>,
    pub volume: Option<f32>,
}

impl SettingsPatch {
    /// Returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Decodes a persisted settings document into a patch, field by field.
    ///
    /// Malformed JSON yields an empty patch. Fields of the wrong type and
    /// unrecognized theme/sound strings are dropped individually, so a
    /// partially corrupt document still contributes its valid fields.
    pub fn from_json(raw: &str) -> Self {
        let value: serde_json::Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("設定ファイルを解析できません: {}", e);
                return Self::default();
            }
        };

        Self {
            focus_minutes: value
                .get("focusDuration")
                .and_then(serde_json::Value::as_u64)
                .map(|minutes| minutes.min(u64::from(u32::MAX)) as u32),
            break_minutes: value
                .get("breakDuration")
                .and_then(serde_json::Value::as_u64)
                .map(|minutes| minutes.min(u64::from(u32::MAX)) as u32),
            auto_start: value.get("autoStart").and_then(serde_json::Value::as_bool),
            theme: value
                .get("theme")
                .and_then(serde_json::Value::as_str)
                .and_then(Theme::parse),
            sound: value
                .get("soundType")
                .and_then(serde_json::Value::as_str)
                .and_then(SoundKind::parse),
            volume: value
                .get("volume")
                .and_then(serde_json::Value::as_f64)
                .map(|volume| volume as f32),
        }
    }
}

// ============================================================================
// PomodoroState
// ============================================================================

/// Emitted by [`PomodoroState::tick`] when remaining time runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionBoundary {
    /// The mode the finished session ran in
    pub finished_mode: TimerMode,
    /// The mode the timer flipped into
    pub next_mode: TimerMode,
    /// Whether the next session began running immediately
    pub auto_started: bool,
}

/// The complete observable timer state.
///
/// All transitions are pure methods on this owned value; the engine holds
/// the only mutable reference and reacts to the returned boundary events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PomodoroState {
    /// Current session type
    pub mode: TimerMode,
    /// Whether the countdown is advancing
    pub status: TimerStatus,
    /// Seconds left in the current session
    #[serde(rename = "timeLeft")]
    pub remaining_seconds: u32,
    /// Active settings
    pub settings: PomodoroSettings,
}

impl PomodoroState {
    /// Creates the initial state: Idle, Focus, full focus duration remaining.
    pub fn new(mut settings: PomodoroSettings) -> Self {
        settings.clamp();
        let remaining_seconds = settings.duration_seconds(TimerMode::Focus);
        Self {
            mode: TimerMode::Focus,
            status: TimerStatus::Idle,
            remaining_seconds,
            settings,
        }
    }

    /// Starts or resumes the countdown. No-op while already Running.
    pub fn start(&mut self) {
        if self.status != TimerStatus::Running {
            self.status = TimerStatus::Running;
        }
    }

    /// Freezes the countdown. No-op unless Running.
    pub fn pause(&mut self) {
        if self.status == TimerStatus::Running {
            self.status = TimerStatus::Paused;
        }
    }

    /// Resets to Idle in Focus mode with the full focus duration remaining.
    ///
    /// The mode always returns to Focus, even when a break was in progress.
    /// Intentional product behavior, not "reset the current mode".
    pub fn reset(&mut self) {
        self.mode = TimerMode::Focus;
        self.status = TimerStatus::Idle;
        self.remaining_seconds = self.settings.duration_seconds(TimerMode::Focus);
    }

    /// Advances the countdown by one second of wall-clock time.
    ///
    /// Returns a [`SessionBoundary`] when the session ends. The boundary
    /// transition is atomic: mode, remaining time, and status are all
    /// updated before this method returns.
    pub fn tick(&mut self) -> Option<SessionBoundary> {
        if self.status != TimerStatus::Running {
            return None;
        }

        if self.remaining_seconds > 1 {
            self.remaining_seconds -= 1;
            return None;
        }

        let finished_mode = self.mode;
        let next_mode = self.mode.opposite();
        let auto_started = self.settings.auto_start;

        self.mode = next_mode;
        self.remaining_seconds = self.settings.duration_seconds(next_mode);
        self.status = if auto_started {
            TimerStatus::Running
        } else {
            TimerStatus::Idle
        };

        Some(SessionBoundary {
            finished_mode,
            next_mode,
            auto_started,
        })
    }

    /// Merges a settings patch, clamping durations and volume.
    ///
    /// While Idle the remaining time is recomputed from the current mode's
    /// (possibly changed) duration. While Running or Paused the in-progress
    /// session keeps its remaining time untouched.
    pub fn update_settings(&mut self, patch: &SettingsPatch) {
        self.settings.apply(patch);
        if self.status == TimerStatus::Idle {
            self.remaining_seconds = self.settings.duration_seconds(self.mode);
        }
    }

    /// Fraction of the current session still remaining, in [0.0, 1.0].
    ///
    /// This is the value the visualizer consumes (sand level, coffee level).
    pub fn progress(&self) -> f32 {
        let total = self.settings.duration_seconds(self.mode);
        if total == 0 {
            return 0.0;
        }
        (self.remaining_seconds as f32 / total as f32).clamp(0.0, 1.0)
    }
}

impl Default for PomodoroState {
    fn default() -> Self {
        Self::new(PomodoroSettings::default())
    }
}

// ============================================================================
// Tests
// ============================================================================
