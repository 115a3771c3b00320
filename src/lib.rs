//! tonebank - A bank of independently streamed waveform oscillators
//!
//! Each oscillator synthesizes 16-bit stereo PCM on demand and is pulled by
//! its own output stream. Parameters can be changed from a control thread
//! while the audio thread is generating.

pub mod config;
pub mod engine;
pub mod synth;

pub use config::SynthConfig;
pub use engine::{Mixer, OscillatorId};
pub use synth::{Oscillator, Shape};
