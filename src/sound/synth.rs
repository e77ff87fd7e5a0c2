//! Offline synthesis of the two completion cues.
//!
//! Both cues are rendered sample-by-sample into a PCM buffer before
//! playback, so the acoustic design is independent of the audio backend
//! and fully testable without a device:
//!
//! - *Alarm*: five repetitions of a 1700 Hz / 2000 Hz two-tone pulse.
//!   Each tone is two slightly detuned voices of an odd-harmonic-heavy
//!   waveform, band-passed around 1850 Hz and pushed through a tanh soft
//!   clip for bite.
//! - *Bell*: three strikes. Each strike layers four decaying sine
//!   partials, individually band-passed, over a short high-passed noise
//!   burst that supplies the "strike" transient.
//!
//! A master gain of `0.3 * volume` keeps headroom so the shaper and the
//! resonant filters cannot push the mix into clipping.

use std::f32::consts::PI;

use rand::Rng;

use crate::types::SoundKind;

/// Render sample rate for all cues.
pub const SAMPLE_RATE: u32 = 44_100;

/// Headroom factor applied under the user volume.
const MASTER_GAIN: f32 = 0.3;

// ============================================================================
// PcmClip
// ============================================================================

/// A rendered mono audio clip.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmClip {
    /// Interleaved mono samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Samples per second
    pub sample_rate: u32,
}

impl PcmClip {
    /// Creates a silent clip of the given duration.
    pub fn silence(duration_secs: f32, sample_rate: u32) -> Self {
        let len = (duration_secs * sample_rate as f32).ceil() as usize;
        Self {
            samples: vec![0.0; len],
            sample_rate,
        }
    }

    /// Clip length in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |max, s| max.max(s.abs()))
    }

    /// Mixes `clip` into this one starting at `offset_secs`, extending the
    /// buffer if the tail runs past the current end.
    pub fn mix_at(&mut self, offset_secs: f32, clip: &[f32]) {
        let offset = (offset_secs * self.sample_rate as f32).round() as usize;
        let needed = offset + clip.len();
        if needed > self.samples.len() {
            self.samples.resize(needed, 0.0);
        }
        for (i, sample) in clip.iter().enumerate() {
            self.samples[offset + i] += sample;
        }
    }
}

// ============================================================================
// Biquad filter
// ============================================================================

/// Direct-form-I biquad with RBJ cookbook coefficients.
#[derive(Debug, Clone)]
struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Band-pass with 0 dB peak gain at `freq`.
    fn bandpass(sample_rate: u32, freq: f32, q: f32) -> Self {
        let w0 = 2.0 * PI * freq / sample_rate as f32;
        let alpha = w0.sin() / (2.0 * q);
        let cos_w0 = w0.cos();
        let a0 = 1.0 + alpha;
        Self {
            b0: alpha / a0,
            b1: 0.0,
            b2: -alpha / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// High-pass at `freq`.
    fn highpass(sample_rate: u32, freq: f32, q: f32) -> Self {
        let w0 = 2.0 * PI * freq / sample_rate as f32;
        let alpha = w0.sin() / (2.0 * q);
        let cos_w0 = w0.cos();
        let a0 = 1.0 + alpha;
        Self {
            b0: (1.0 + cos_w0) / 2.0 / a0,
            b1: -(1.0 + cos_w0) / a0,
            b2: (1.0 + cos_w0) / 2.0 / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    fn process(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }
}

// ============================================================================
// Cue rendering
// ============================================================================

/// Renders the completion cue for `kind` at the given volume.
///
/// Volume is clamped to [0.0, 1.0]; volume 0.0 yields a silent clip of the
/// cue's normal length.
pub fn render_cue(kind: SoundKind, volume: f32) -> PcmClip {
    let volume = if volume.is_finite() {
        volume.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let master = MASTER_GAIN * volume;
    match kind {
        SoundKind::Alarm => render_alarm(master),
        SoundKind::Bell => render_bell(master),
    }
}

// ----------------------------------------------------------------------------
// Alarm
// ----------------------------------------------------------------------------

/// Length of each alarm tone in seconds.
const ALARM_TONE_SECS: f32 = 0.11;
/// Gap between the two tones of a pair.
const ALARM_INNER_GAP_SECS: f32 = 0.03;
/// Gap between pairs.
const ALARM_PAIR_GAP_SECS: f32 = 0.18;
/// Number of two-tone repetitions.
const ALARM_REPEATS: usize = 5;
/// Detune between the two voices, in cents.
const ALARM_DETUNE_CENTS: f32 = 8.0;
/// Band-pass center and resonance.
const ALARM_BANDPASS_HZ: f32 = 1850.0;
const ALARM_BANDPASS_Q: f32 = 6.0;
/// Soft-clip drive.
const ALARM_DRIVE: f32 = 2.2;

fn render_alarm(master: f32) -> PcmClip {
    let pair_secs = ALARM_TONE_SECS + ALARM_INNER_GAP_SECS + ALARM_TONE_SECS + ALARM_PAIR_GAP_SECS;
    let mut clip = PcmClip::silence(pair_secs * ALARM_REPEATS as f32, SAMPLE_RATE);

    for repeat in 0..ALARM_REPEATS {
        let pair_start = repeat as f32 * pair_secs;
        let first = render_alarm_tone(1700.0, master);
        clip.mix_at(pair_start, &first);
        let second = render_alarm_tone(2000.0, master);
        clip.mix_at(pair_start + ALARM_TONE_SECS + ALARM_INNER_GAP_SECS, &second);
    }

    clip
}

/// Renders one 0.11 s alarm tone at the given center frequency.
fn render_alarm_tone(freq: f32, master: f32) -> Vec<f32> {
    let len = (ALARM_TONE_SECS * SAMPLE_RATE as f32) as usize;
    let detune = cents_ratio(ALARM_DETUNE_CENTS);
    let voices = [freq / detune, freq * detune];

    let mut filter = Biquad::bandpass(SAMPLE_RATE, ALARM_BANDPASS_HZ, ALARM_BANDPASS_Q);
    let shaper_norm = ALARM_DRIVE.tanh();

    let mut samples = Vec::with_capacity(len);
    for i in 0..len {
        let t = i as f32 / SAMPLE_RATE as f32;
        let raw: f32 = voices.iter().map(|&f| harmonic_wave(f, t)).sum::<f32>() / 2.0;
        let enveloped = raw * alarm_envelope(t);
        let filtered = filter.process(enveloped);
        let shaped = (filtered * ALARM_DRIVE).tanh() / shaper_norm;
        samples.push(shaped * master);
    }
    samples
}

/// One period of the alarm's custom waveform: odd harmonic n at
/// `1/(n*0.85)`, even at `0.12/n`, normalized to unit amplitude.
fn harmonic_wave(freq: f32, t: f32) -> f32 {
    let nyquist = SAMPLE_RATE as f32 / 2.0;
    let mut sum = 0.0;
    let mut norm = 0.0;
    for n in 1..=12u32 {
        let harmonic_freq = freq * n as f32;
        if harmonic_freq >= nyquist {
            break;
        }
        let amp = if n % 2 == 1 {
            1.0 / (n as f32 * 0.85)
        } else {
            0.12 / n as f32
        };
        sum += amp * (2.0 * PI * harmonic_freq * t).sin();
        norm += amp;
    }
    if norm > 0.0 {
        sum / norm
    } else {
        0.0
    }
}

/// Exponential attack to 0.42 in 15 ms, decay to a 0.22 plateau, release
/// to near-zero by the end of the tone.
fn alarm_envelope(t: f32) -> f32 {
    const ATTACK_SECS: f32 = 0.015;
    const ATTACK_PEAK: f32 = 0.42;
    const SUSTAIN: f32 = 0.22;
    const RELEASE_SECS: f32 = 0.03;

    let body = if t < ATTACK_SECS {
        ATTACK_PEAK * (1.0 - (-5.0 * t / ATTACK_SECS).exp())
    } else {
        SUSTAIN + (ATTACK_PEAK - SUSTAIN) * (-(t - ATTACK_SECS) / 0.02).exp()
    };

    let release_start = ALARM_TONE_SECS - RELEASE_SECS;
    if t > release_start {
        body * (-(t - release_start) / 0.008).exp()
    } else {
        body
    }
}

// ----------------------------------------------------------------------------
// Bell
// ----------------------------------------------------------------------------

/// Bell fundamental. The design fixes the partial ratios and decays; the
/// fundamental itself sits high enough to read as a small desk bell.
const BELL_FUNDAMENTAL_HZ: f32 = 880.0;
/// Spacing between strikes.
const BELL_STRIKE_SPACING_SECS: f32 = 0.4;
/// Number of strikes.
const BELL_STRIKES: usize = 3;
/// Longest partial decay, which bounds the strike length.
const BELL_STRIKE_SECS: f32 = 1.2;
/// Partial frequency multipliers, gains, and decay times.
const BELL_PARTIALS: [(f32, f32, f32); 4] = [
    (1.0, 0.9, 1.2),
    (2.0, 0.4, 0.9),
    (2.5, 0.25, 0.7),
    (3.0, 0.18, 0.6),
];
const BELL_PARTIAL_Q: f32 = 12.0;
/// Noise burst parameters for the strike transient.
const BELL_NOISE_SECS: f32 = 0.2;
const BELL_NOISE_HIGHPASS_HZ: f32 = 600.0;
const BELL_NOISE_GAIN: f32 = 0.5;

fn render_bell(master: f32) -> PcmClip {
    let total = BELL_STRIKE_SPACING_SECS * (BELL_STRIKES - 1) as f32 + BELL_STRIKE_SECS;
    let mut clip = PcmClip::silence(total, SAMPLE_RATE);

    for strike in 0..BELL_STRIKES {
        let strike_audio = render_bell_strike(master);
        clip.mix_at(strike as f32 * BELL_STRIKE_SPACING_SECS, &strike_audio);
    }

    clip
}

/// Renders one bell strike: four band-passed decaying partials plus a
/// high-passed noise burst.
fn render_bell_strike(master: f32) -> Vec<f32> {
    let len = (BELL_STRIKE_SECS * SAMPLE_RATE as f32) as usize;
    let mut samples = vec![0.0f32; len];

    for &(mult, gain, decay) in &BELL_PARTIALS {
        let freq = BELL_FUNDAMENTAL_HZ * mult;
        let mut filter = Biquad::bandpass(SAMPLE_RATE, freq, BELL_PARTIAL_Q);
        for (i, out) in samples.iter_mut().enumerate() {
            let t = i as f32 / SAMPLE_RATE as f32;
            // Short attack avoids a click at the strike onset.
            let attack = 1.0 - (-t / 0.002).exp();
            let envelope = attack * (-3.0 * t / decay).exp();
            let partial = (2.0 * PI * freq * t).sin() * gain * envelope;
            *out += filter.process(partial) * master;
        }
    }

    let noise_len = (BELL_NOISE_SECS * SAMPLE_RATE as f32) as usize;
    let mut highpass = Biquad::highpass(SAMPLE_RATE, BELL_NOISE_HIGHPASS_HZ, 0.707);
    let mut rng = rand::rng();
    for (i, out) in samples.iter_mut().take(noise_len).enumerate() {
        let t = i as f32 / SAMPLE_RATE as f32;
        let envelope = (1.0 - t / BELL_NOISE_SECS).powi(3);
        let noise: f32 = rng.random::<f32>() * 2.0 - 1.0;
        *out += highpass.process(noise) * BELL_NOISE_GAIN * envelope * master;
    }

    samples
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

/// Frequency ratio for a detune of `cents`.
fn cents_ratio(cents: f32) -> f32 {
    2.0f32.powf(cents / 1200.0)
}

// ============================================================================
// Tests
// ============================================================================
