//! Sound engine: one-shot completion cues and cancelable previews.
//!
//! Two playback paths share the backend but never share resources:
//!
//! - `play_completion` renders a cue, queues it fire-and-forget, and keeps
//!   no reference to it. A completed session's cue always plays out.
//! - `start_preview` / `stop_preview` manage a single active preview whose
//!   playback handles are held in an explicit ownership list, disposed in
//!   full on every cancellation path (new preview, explicit stop, drop).
//!
//! Without a backend every operation is a silent no-op; the timer never
//! notices that audio is missing.

use std::sync::Arc;

use tracing::{debug, warn};

use super::backend::{AudioBackend, PlaybackHandle};
use super::synth::render_cue;
use crate::types::SoundKind;

// ============================================================================
// SoundEngine
// ============================================================================

/// Owns the audio backend and the currently active preview, if any.
pub struct SoundEngine {
    backend: Option<Arc<dyn AudioBackend>>,
    preview: Vec<Box<dyn PlaybackHandle>>,
}

impl SoundEngine {
    /// Creates an engine over the given backend (None = silent).
    pub fn new(backend: Option<Arc<dyn AudioBackend>>) -> Self {
        Self {
            backend,
            preview: Vec::new(),
        }
    }

    /// Creates a silent engine; a backend can be attached later.
    #[must_use]
    pub fn without_audio() -> Self {
        Self::new(None)
    }

    /// Returns true if a backend is attached.
    #[must_use]
    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// Attaches a backend if none is present yet.
    ///
    /// Audio output needs a user action to be meaningful, so the runtime
    /// attaches the backend lazily on the first start command.
    pub fn attach_backend(&mut self, backend: Arc<dyn AudioBackend>) {
        if self.backend.is_none() {
            self.backend = Some(backend);
        }
    }

    /// Plays the completion cue for `kind`, fire-and-forget.
    ///
    /// Never fails: playback errors are logged and discarded.
    pub fn play_completion(&self, kind: SoundKind, volume: f32) {
        let Some(backend) = &self.backend else {
            debug!("No audio backend, skipping completion cue");
            return;
        };
        let clip = render_cue(kind, volume);
        if let Err(e) = backend.play_detached(clip) {
            warn!("完了音を再生できません: {}", e);
        }
    }

    /// Starts a preview of `kind`, replacing any active preview.
    ///
    /// The previous preview's handles are stopped before the new clip is
    /// queued, so two previews never overlap.
    pub fn start_preview(&mut self, kind: SoundKind, volume: f32) {
        self.stop_preview();

        let Some(backend) = &self.backend else {
            debug!("No audio backend, skipping preview");
            return;
        };
        let clip = render_cue(kind, volume);
        match backend.play_tracked(clip) {
            Ok(handle) => self.preview.push(handle),
            Err(e) => warn!("プレビュー音を再生できません: {}", e),
        }
    }

    /// Stops the active preview, if any. Safe to call repeatedly.
    ///
    /// Every tracked handle is stopped; a handle that fails to stop is
    /// logged and skipped so the remaining cleanup still runs.
    pub fn stop_preview(&mut self) {
        for mut handle in self.preview.drain(..) {
            if let Err(e) = handle.stop() {
                debug!("Preview handle failed to stop: {}", e);
            }
        }
    }

    /// Number of playback handles the active preview owns.
    #[must_use]
    pub fn preview_handle_count(&self) -> usize {
        self.preview.len()
    }
}

impl Drop for SoundEngine {
    fn drop(&mut self) {
        // Preview nodes would otherwise play to completion unsupervised.
        self.stop_preview();
    }
}

impl std::fmt::Debug for SoundEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundEngine")
            .field("has_backend", &self.backend.is_some())
            .field("preview_handles", &self.preview.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::backend::MockAudioBackend;

    fn engine_with_mock() -> (SoundEngine, Arc<MockAudioBackend>) {
        let backend = Arc::new(MockAudioBackend::new());
        let engine = SoundEngine::new(Some(backend.clone()));
        (engine, backend)
    }

    #[test]
    fn test_play_completion_is_detached() {
        let (engine, backend) = engine_with_mock();

        engine.play_completion(SoundKind::Alarm, 0.5);

        assert_eq!(backend.detached_count(), 1);
        assert!(backend.tracked_records().is_empty());
    }

    #[test]
    fn test_play_completion_error_is_swallowed() {
        let (engine, backend) = engine_with_mock();
        backend.set_fail_play(true);

        engine.play_completion(SoundKind::Bell, 0.5);

        assert_eq!(backend.detached_count(), 0);
    }

    #[test]
    fn test_preview_then_stop_disposes_every_handle_once() {
        let (mut engine, backend) = engine_with_mock();

        engine.start_preview(SoundKind::Bell, 0.5);
        assert_eq!(engine.preview_handle_count(), 1);

        engine.stop_preview();

        assert_eq!(engine.preview_handle_count(), 0);
        let records = backend.tracked_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].stop_count(), 1);
    }

    #[test]
    fn test_stop_preview_is_idempotent() {
        let (mut engine, _backend) = engine_with_mock();

        // No preview active at all.
        engine.stop_preview();
        engine.stop_preview();

        engine.start_preview(SoundKind::Alarm, 1.0);
        engine.stop_preview();
        engine.stop_preview();
        assert_eq!(engine.preview_handle_count(), 0);
    }

    #[test]
    fn test_second_preview_stops_the_first() {
        let (mut engine, backend) = engine_with_mock();

        engine.start_preview(SoundKind::Alarm, 0.5);
        engine.start_preview(SoundKind::Bell, 0.5);

        let records = backend.tracked_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].stop_count(), 1, "first preview must be stopped");
        assert_eq!(records[1].stop_count(), 0, "second preview still playing");
        assert_eq!(engine.preview_handle_count(), 1);
    }

    #[test]
    fn test_failing_stop_does_not_abort_cleanup() {
        let (mut engine, backend) = engine_with_mock();
        backend.set_fail_stop(true);

        engine.start_preview(SoundKind::Bell, 0.5);
        engine.stop_preview();

        // The failing handle was still disposed and the list cleared.
        assert_eq!(engine.preview_handle_count(), 0);
        assert_eq!(backend.tracked_records()[0].stop_count(), 1);
    }

    #[test]
    fn test_drop_stops_active_preview() {
        let backend = Arc::new(MockAudioBackend::new());
        {
            let mut engine = SoundEngine::new(Some(backend.clone()));
            engine.start_preview(SoundKind::Alarm, 0.5);
        }
        assert_eq!(backend.tracked_records()[0].stop_count(), 1);
    }

    #[test]
    fn test_without_audio_is_silent_noop() {
        let mut engine = SoundEngine::without_audio();
        assert!(!engine.has_backend());

        engine.play_completion(SoundKind::Alarm, 1.0);
        engine.start_preview(SoundKind::Bell, 1.0);
        engine.stop_preview();
        assert_eq!(engine.preview_handle_count(), 0);
    }

    #[test]
    fn test_attach_backend_once() {
        let mut engine = SoundEngine::without_audio();
        let first = Arc::new(MockAudioBackend::new());
        let second = Arc::new(MockAudioBackend::new());

        engine.attach_backend(first.clone());
        engine.attach_backend(second.clone());

        engine.play_completion(SoundKind::Alarm, 0.5);
        assert_eq!(first.detached_count(), 1);
        assert_eq!(second.detached_count(), 0);
    }

    #[test]
    fn test_preview_failure_leaves_no_handles() {
        let (mut engine, backend) = engine_with_mock();
        backend.set_fail_play(true);

        engine.start_preview(SoundKind::Alarm, 0.5);

        assert_eq!(engine.preview_handle_count(), 0);
    }
}
