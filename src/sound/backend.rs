//! Audio output backends.
//!
//! The engine talks to audio hardware through the [`AudioBackend`] trait:
//! fire-and-forget playback for completion cues, and tracked playback that
//! returns a stoppable handle for previews. The production backend wraps
//! rodio; the mock records every call so tests can assert on playback and
//! disposal without a device.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};
use tracing::{debug, warn};

use super::error::SoundError;
use super::synth::PcmClip;

// ============================================================================
// Traits
// ============================================================================

/// A stoppable in-flight playback.
///
/// `stop` is idempotent: the second and later calls do nothing and report
/// success, matching the "double-stop must not raise" cleanup contract.
pub trait PlaybackHandle: Send {
    /// Stops playback and releases the underlying resources.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to stop the resource. Callers
    /// cleaning up a preview swallow this and continue.
    fn stop(&mut self) -> Result<(), SoundError>;
}

/// Plays rendered PCM clips.
pub trait AudioBackend: Send + Sync {
    /// Plays a clip to completion in the background. Not cancelable.
    ///
    /// # Errors
    ///
    /// Returns an error if the clip cannot be queued for playback.
    fn play_detached(&self, clip: PcmClip) -> Result<(), SoundError>;

    /// Starts playback and returns a handle that can stop it early.
    ///
    /// # Errors
    ///
    /// Returns an error if the clip cannot be queued for playback.
    fn play_tracked(&self, clip: PcmClip) -> Result<Box<dyn PlaybackHandle>, SoundError>;
}

// ============================================================================
// RodioBackend
// ============================================================================

/// Audio backend built on rodio.
///
/// The output stream is created once and kept alive for the lifetime of
/// the backend; each playback gets its own sink, so concurrent cues never
/// share a resource.
pub struct RodioBackend {
    /// Must stay alive for any sink to produce output.
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
}

// SAFETY: rodio's `OutputStream` is `!Send + !Sync` only because cpal marks
// its stream type conservatively across all platforms. This crate runs the
// backend on a single (current-thread tokio) runtime and never moves or
// shares the stream across threads; the `Send + Sync` bound exists solely to
// satisfy the `AudioBackend` trait object requirements.
unsafe impl Send for RodioBackend {}
unsafe impl Sync for RodioBackend {}

impl RodioBackend {
    /// Opens the default audio output.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::DeviceNotAvailable` if no output device exists.
    pub fn new() -> Result<Self, SoundError> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| SoundError::DeviceNotAvailable(e.to_string()))?;

        debug!("Audio output stream initialized");

        Ok(Self {
            _stream: stream,
            stream_handle,
        })
    }

    fn new_sink(&self) -> Result<Sink, SoundError> {
        Sink::try_new(&self.stream_handle).map_err(|e| SoundError::StreamError(e.to_string()))
    }
}

impl AudioBackend for RodioBackend {
    fn play_detached(&self, clip: PcmClip) -> Result<(), SoundError> {
        let sink = self.new_sink()?;
        sink.append(SamplesBuffer::new(1, clip.sample_rate, clip.samples));
        sink.detach();
        debug!("One-shot playback started (detached)");
        Ok(())
    }

    fn play_tracked(&self, clip: PcmClip) -> Result<Box<dyn PlaybackHandle>, SoundError> {
        let sink = self.new_sink()?;
        sink.append(SamplesBuffer::new(1, clip.sample_rate, clip.samples));
        debug!("Tracked playback started");
        Ok(Box::new(RodioPlayback { sink: Some(sink) }))
    }
}

impl std::fmt::Debug for RodioBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioBackend").finish_non_exhaustive()
    }
}

/// Handle over a retained rodio sink. Dropping the sink stops playback,
/// so the handle holds it until `stop` takes it.
struct RodioPlayback {
    sink: Option<Sink>,
}

impl PlaybackHandle for RodioPlayback {
    fn stop(&mut self) -> Result<(), SoundError> {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        Ok(())
    }
}

/// Creates the rodio backend, returning None if audio is unavailable.
///
/// Audio absence is an expected condition (CI containers, headless
/// machines); the caller degrades to silent no-ops.
#[must_use]
pub fn try_create_backend() -> Option<Arc<dyn AudioBackend>> {
    match RodioBackend::new() {
        Ok(backend) => Some(Arc::new(backend)),
        Err(e) => {
            warn!("オーディオを初期化できません。サウンドなしで続行します: {}", e);
            None
        }
    }
}

// ============================================================================
// MockAudioBackend
// ============================================================================

/// Records one tracked playback for later assertions.
#[derive(Debug, Default)]
pub struct MockHandleRecord {
    stop_count: AtomicUsize,
    fail_stop: AtomicBool,
}

impl MockHandleRecord {
    /// How many times `stop` ran on this handle.
    pub fn stop_count(&self) -> usize {
        self.stop_count.load(Ordering::SeqCst)
    }
}

/// Mock backend for tests: records clips and hands out inspectable handles.
#[derive(Debug, Default)]
pub struct MockAudioBackend {
    detached: Mutex<Vec<PcmClip>>,
    tracked: Mutex<Vec<Arc<MockHandleRecord>>>,
    fail_play: AtomicBool,
    fail_next_stop: AtomicBool,
}

impl MockAudioBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent play calls fail.
    pub fn set_fail_play(&self, fail: bool) {
        self.fail_play.store(fail, Ordering::SeqCst);
    }

    /// Makes handles created after this call fail their first stop.
    pub fn set_fail_stop(&self, fail: bool) {
        self.fail_next_stop.store(fail, Ordering::SeqCst);
    }

    /// Clips played fire-and-forget.
    #[must_use]
    pub fn detached_clips(&self) -> Vec<PcmClip> {
        self.detached.lock().unwrap().clone()
    }

    /// Number of fire-and-forget playbacks.
    #[must_use]
    pub fn detached_count(&self) -> usize {
        self.detached.lock().unwrap().len()
    }

    /// Records of every tracked playback ever started.
    #[must_use]
    pub fn tracked_records(&self) -> Vec<Arc<MockHandleRecord>> {
        self.tracked.lock().unwrap().clone()
    }
}

impl AudioBackend for MockAudioBackend {
    fn play_detached(&self, clip: PcmClip) -> Result<(), SoundError> {
        if self.fail_play.load(Ordering::SeqCst) {
            return Err(SoundError::PlaybackError("mock failure".to_string()));
        }
        self.detached.lock().unwrap().push(clip);
        Ok(())
    }

    fn play_tracked(&self, _clip: PcmClip) -> Result<Box<dyn PlaybackHandle>, SoundError> {
        if self.fail_play.load(Ordering::SeqCst) {
            return Err(SoundError::PlaybackError("mock failure".to_string()));
        }
        let record = Arc::new(MockHandleRecord {
            stop_count: AtomicUsize::new(0),
            fail_stop: AtomicBool::new(self.fail_next_stop.load(Ordering::SeqCst)),
        });
        self.tracked.lock().unwrap().push(record.clone());
        Ok(Box::new(MockPlayback {
            record,
            stopped: false,
        }))
    }
}

struct MockPlayback {
    record: Arc<MockHandleRecord>,
    stopped: bool,
}

impl PlaybackHandle for MockPlayback {
    fn stop(&mut self) -> Result<(), SoundError> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;
        self.record.stop_count.fetch_add(1, Ordering::SeqCst);
        if self.record.fail_stop.swap(false, Ordering::SeqCst) {
            return Err(SoundError::PlaybackError("mock stop failure".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
