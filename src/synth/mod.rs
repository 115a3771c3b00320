//! Synthesis: waveform shapes, parameter cells and the oscillator

mod oscillator;
pub mod params;
mod shape;

pub use oscillator::{decode_frames, Oscillator, FRAME_BYTES};
pub use shape::{ParseShapeError, Shape};
