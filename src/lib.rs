//! zeropamine - a Pomodoro timer core with synthesized completion cues.
//!
//! The crate is split into a reusable core and a thin CLI on top:
//! - `types`: timer state machine and settings as pure data
//! - `timer`: countdown engine emitting events over a channel
//! - `settings`: best-effort JSON persistence, web-client compatible
//! - `notify`: session boundary notifications
//! - `sound`: procedural alarm/bell synthesis and playback
//! - `runtime`: wires the above together
//! - `cli`: argument parsing and terminal output

pub mod cli;
pub mod notify;
pub mod runtime;
pub mod settings;
pub mod sound;
pub mod timer;
pub mod types;

pub use runtime::PomodoroRuntime;
pub use types::{
    PomodoroSettings, PomodoroState, SettingsPatch, SoundKind, Theme, TimerMode, TimerStatus,
};
