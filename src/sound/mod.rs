//! Procedural sound system for the zeropamine timer.
//!
//! No static audio assets: both completion cues are synthesized from
//! oscillators, filters, and envelopes at playback time.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │   SoundEngine    │ ← one-shot + preview lifecycle
//! └────────┬─────────┘
//!          │ PcmClip
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │   synth (DSP)    │     │   AudioBackend   │
//! │ alarm / bell     │────▶│ rodio | mock     │
//! └──────────────────┘     └──────────────────┘
//! ```
//!
//! The synth renders a cue offline into a [`PcmClip`]; the backend plays
//! it either detached (completion, not cancelable) or tracked (preview,
//! stoppable through a [`PlaybackHandle`]). When no audio device exists
//! the engine runs without a backend and every call is a silent no-op.

mod backend;
mod engine;
mod error;
mod synth;

pub use backend::{
    try_create_backend, AudioBackend, MockAudioBackend, MockHandleRecord, PlaybackHandle,
    RodioBackend,
};
pub use engine::SoundEngine;
pub use error::SoundError;
pub use synth::{render_cue, PcmClip, SAMPLE_RATE};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SoundKind;

    #[test]
    fn test_module_exports() {
        let _: fn(SoundKind, f32) -> PcmClip = render_cue;
        let _: fn() -> Option<std::sync::Arc<dyn AudioBackend>> = try_create_backend;
    }

    #[test]
    fn test_cues_are_audibly_distinct() {
        // Different duration and envelope shape; a cheap proxy that the two
        // designs did not collapse into one.
        let alarm = render_cue(SoundKind::Alarm, 1.0);
        let bell = render_cue(SoundKind::Bell, 1.0);
        assert!((alarm.duration_secs() - bell.duration_secs()).abs() > 0.05);
    }
}
