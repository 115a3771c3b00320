//! Audio engine for tonebank
//!
//! Binds oscillators to an audio output context and manages their lifecycle.
//! Each oscillator is its own stream; summing them is left to the device layer.

mod mixer;
mod offline;
mod player;
mod recorder;

pub use mixer::{Mixer, OscillatorId};
pub use offline::{OfflineContext, OfflinePlayer};
pub use player::{default_device_name, list_output_devices, CpalContext, CpalPlayer};
pub use recorder::Recorder;

use crate::synth::Oscillator;
use thiserror::Error;

/// Channel count of every stream
pub const CHANNELS: u16 = 2;

/// Failures acquiring or binding to the audio output
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no output device available")]
    NoDevice,

    #[error("output device '{0}' not found")]
    DeviceNotFound(String),

    #[error("failed to enumerate output devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("failed to query device configurations: {0}")]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),

    #[error("device has no stereo output configuration at {0} Hz")]
    NoSupportedConfig(u32),

    #[error("unsupported sample format {0:?}")]
    UnsupportedFormat(cpal::SampleFormat),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

/// A pull handle binding one oscillator to the output.
///
/// Dropping the player releases the binding.
pub trait Player {
    /// Resume pulling audio
    fn play(&self);

    /// Stop pulling; the stream outputs silence and the oscillator does not advance
    fn pause(&self);

    fn is_playing(&self) -> bool;
}

/// The audio output a mixer streams into
pub trait AudioContext {
    type Player: Player;

    /// Sample rate shared by every stream of this context
    fn sample_rate(&self) -> u32;

    /// Create an independent stream that pulls from `oscillator`.
    ///
    /// The returned player starts paused.
    fn bind(&self, oscillator: &Oscillator) -> Result<Self::Player, EngineError>;
}
