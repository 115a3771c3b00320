//! Oscillator state and stereo PCM synthesis
//!
//! An [`Oscillator`] is a clonable handle. The mixer, the control surface and
//! the audio binding each hold a clone; all parameters are atomic cells, so
//! the audio thread never blocks on the control thread and never sees a torn
//! value. The audio binding is the usual caller of [`Oscillator::generate`];
//! other callers share the same position counter.

use std::f64::consts::PI;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use rand::Rng;

use super::params::{
    AtomicF64, Param, AMPLITUDE_RANGE, DEFAULT_FREQUENCY, DUTY_RANGE, FREQUENCY_RANGE, PAN_RANGE,
    SKEW_RANGE,
};
use super::Shape;

/// Bytes per stereo frame (two 16-bit channels)
pub const FRAME_BYTES: usize = 4;

/// Full-scale value for a unit signal
const FULL_SCALE: f64 = 32767.0;

#[derive(Debug)]
struct Shared {
    shape: AtomicU8,
    frequency: Param,
    amplitude: Param,
    duty: Param,
    skew: Param,
    pan: Param,
    /// Phase in degrees; unbounded, read back modulo 360
    phase: AtomicF64,
    /// Samples generated so far
    position: AtomicF64,
    /// Xorshift state for noise
    rng_state: AtomicU64,
    sample_rate: f64,
}

/// Parameters read once at the start of a block
#[derive(Debug, Clone, Copy)]
struct Snapshot {
    shape: Shape,
    frequency: f64,
    duty: f64,
    skew: f64,
    phase: f64,
    sample_rate: f64,
    left_gain: f64,
    right_gain: f64,
}

/// A waveform generator streaming 16-bit stereo PCM
#[derive(Debug, Clone)]
pub struct Oscillator {
    shared: Arc<Shared>,
}

impl Oscillator {
    /// Create an oscillator with default parameters: silent 800 Hz sine, centered.
    pub fn new(sample_rate: f64) -> Self {
        let seed = rand::thread_rng().gen::<u64>().max(1);

        Self {
            shared: Arc::new(Shared {
                shape: AtomicU8::new(Shape::Sine.as_code()),
                frequency: Param::new(DEFAULT_FREQUENCY, FREQUENCY_RANGE),
                amplitude: Param::new(0.0, AMPLITUDE_RANGE),
                duty: Param::new(0.0, DUTY_RANGE),
                skew: Param::new(0.0, SKEW_RANGE),
                pan: Param::new(0.0, PAN_RANGE),
                phase: AtomicF64::new(0.0),
                position: AtomicF64::new(0.0),
                rng_state: AtomicU64::new(seed),
                sample_rate,
            }),
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.shared.sample_rate
    }

    pub fn shape(&self) -> Shape {
        Shape::from_code(self.shared.shape.load(Ordering::Relaxed))
    }

    /// The shape identifier (`Sine`, `Triangle`, `Rectangle` or `Noise`)
    pub fn shape_name(&self) -> &'static str {
        self.shape().name()
    }

    /// Select the shape by identifier. Unknown identifiers are ignored.
    pub fn set_shape(&self, name: &str) {
        if let Ok(shape) = name.parse::<Shape>() {
            self.set_waveform(shape);
        }
    }

    pub fn set_waveform(&self, shape: Shape) {
        self.shared.shape.store(shape.as_code(), Ordering::Relaxed);
    }

    pub fn frequency(&self) -> f64 {
        self.shared.frequency.get()
    }

    /// Set the frequency of periodic shapes, in Hz. Accepts [10, 20000].
    pub fn set_frequency(&self, frequency: f64) {
        self.shared.frequency.set(frequency);
    }

    pub fn amplitude(&self) -> f64 {
        self.shared.amplitude.get()
    }

    /// Accepts [0, 1].
    pub fn set_amplitude(&self, amplitude: f64) {
        self.shared.amplitude.set(amplitude);
    }

    pub fn duty(&self) -> f64 {
        self.shared.duty.get()
    }

    /// Set the duty cycle of the rectangle wave. Accepts [0, 1].
    pub fn set_duty(&self, duty: f64) {
        self.shared.duty.set(duty);
    }

    pub fn skew(&self) -> f64 {
        self.shared.skew.get()
    }

    /// Set the skew of the triangle wave. Accepts [0, 1].
    pub fn set_skew(&self, skew: f64) {
        self.shared.skew.set(skew);
    }

    pub fn pan(&self) -> f64 {
        self.shared.pan.get()
    }

    /// Set the stereo balance. Accepts [-1, 1]; -1 is full left, 1 full right.
    pub fn set_pan(&self, pan: f64) {
        self.shared.pan.set(pan);
    }

    /// Phase as a fraction of a cycle, always in [0, 1)
    pub fn phase(&self) -> f64 {
        let fraction = self.shared.phase.load().rem_euclid(360.0) / 360.0;
        if fraction < 1.0 {
            fraction
        } else {
            0.0
        }
    }

    /// Set the phase as a fraction of a cycle. Any finite value is accepted.
    pub fn set_phase(&self, phase: f64) {
        let degrees = phase * 360.0;
        if degrees.is_finite() {
            self.shared.phase.store(degrees);
        }
    }

    /// Number of frames generated so far
    pub fn position(&self) -> f64 {
        self.shared.position.load()
    }

    /// Fill `buf` with interleaved 16-bit little-endian stereo frames.
    ///
    /// Writes `buf.len() / 4` frames and returns that count; a trailing
    /// partial frame is left untouched. Parameters are read once per call,
    /// and the call neither blocks nor allocates.
    ///
    /// The frame range is reserved up front, so concurrent callers on cloned
    /// handles each advance the position by their own frame count.
    pub fn generate(&self, buf: &mut [u8]) -> usize {
        let snap = self.snapshot();
        let frames = buf.len() / FRAME_BYTES;
        let position = self.shared.position.fetch_add(frames as f64);

        match snap.shape {
            Shape::Sine => fill(buf, position, &snap, |t| {
                sine(snap.frequency, t, snap.phase, snap.sample_rate)
            }),
            Shape::Triangle => fill(buf, position, &snap, |t| {
                let u = cycle_fraction(snap.frequency, t, snap.phase, snap.sample_rate);
                triangle(u, snap.skew)
            }),
            Shape::Rectangle => fill(buf, position, &snap, |t| {
                let u = cycle_fraction(snap.frequency, t, snap.phase, snap.sample_rate);
                rectangle(u, snap.duty)
            }),
            Shape::Noise => {
                let mut state = self.shared.rng_state.load(Ordering::Relaxed);
                fill(buf, position, &snap, |_| white_noise(&mut state));
                self.shared.rng_state.store(state, Ordering::Relaxed);
            }
        }

        frames
    }

    /// Generate `frames` frames and decode them to (left, right) pairs.
    ///
    /// Allocates; meant for offline rendering and inspection, not the audio callback.
    pub fn render(&self, frames: usize) -> Vec<(i16, i16)> {
        let mut buf = vec![0u8; frames * FRAME_BYTES];
        self.generate(&mut buf);
        decode_frames(&buf)
    }

    fn snapshot(&self) -> Snapshot {
        let amplitude = self.amplitude();
        let pan = self.pan();

        Snapshot {
            shape: self.shape(),
            frequency: self.frequency(),
            duty: self.duty(),
            skew: self.skew(),
            phase: self.shared.phase.load(),
            sample_rate: self.shared.sample_rate,
            left_gain: amplitude * 0.5 * (1.0 - pan) * FULL_SCALE,
            right_gain: amplitude * 0.5 * (1.0 + pan) * FULL_SCALE,
        }
    }
}

/// Decode interleaved little-endian stereo frames, ignoring a partial tail
pub fn decode_frames(buf: &[u8]) -> Vec<(i16, i16)> {
    buf.chunks_exact(FRAME_BYTES)
        .map(|frame| {
            (
                i16::from_le_bytes([frame[0], frame[1]]),
                i16::from_le_bytes([frame[2], frame[3]]),
            )
        })
        .collect()
}

/// Non-finite waveform values (a phase large enough to overflow) are written as silence.
fn fill(buf: &mut [u8], position: f64, snap: &Snapshot, mut wave: impl FnMut(f64) -> f64) {
    for (i, frame) in buf.chunks_exact_mut(FRAME_BYTES).enumerate() {
        let raw = wave(position + i as f64);
        let raw = if raw.is_finite() { raw } else { 0.0 };
        frame[..2].copy_from_slice(&to_i16(raw * snap.left_gain).to_le_bytes());
        frame[2..].copy_from_slice(&to_i16(raw * snap.right_gain).to_le_bytes());
    }
}

/// Truncates toward zero and saturates at the i16 bounds
fn to_i16(value: f64) -> i16 {
    value as i16
}

/// The phase term is in degrees scaled by 2π, unlike the other shapes.
fn sine(frequency: f64, t: f64, phase: f64, sample_rate: f64) -> f64 {
    (frequency * (t + 2.0 * PI * phase) / sample_rate * 2.0 * PI).sin()
}

/// Position within the current cycle, in [0, 1]
fn cycle_fraction(frequency: f64, t: f64, phase: f64, sample_rate: f64) -> f64 {
    (frequency * (t + phase) / sample_rate).rem_euclid(1.0)
}

/// With zero skew the first segment is empty and only the second applies.
fn triangle(u: f64, skew: f64) -> f64 {
    if skew > 0.0 && u <= skew {
        2.0 / skew * (u - skew / 2.0)
    } else {
        2.0 / (1.0 - skew) * (u - (skew + 1.0) / 2.0)
    }
}

fn rectangle(u: f64, duty: f64) -> f64 {
    if u < duty {
        1.0
    } else {
        -1.0
    }
}

/// Xorshift64, mapped to [-1, 1]
fn white_noise(state: &mut u64) -> f64 {
    let mut x = *state;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    *state = x;
    (x as f64 / u64::MAX as f64) * 2.0 - 1.0
}
