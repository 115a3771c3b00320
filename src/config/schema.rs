//! Configuration schema definitions

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::synth::params::{
    AMPLITUDE_RANGE, DEFAULT_FREQUENCY, DUTY_RANGE, FREQUENCY_RANGE, PAN_RANGE, SKEW_RANGE,
};
use crate::synth::{Oscillator, Shape};

/// Main configuration for tonebank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthConfig {
    /// Audio output settings
    #[serde(default)]
    pub audio: AudioConfig,

    /// Oscillators created at startup, in order
    #[serde(default = "default_oscillators")]
    pub oscillators: Vec<OscillatorConfig>,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            audio: AudioConfig::default(),
            oscillators: default_oscillators(),
        }
    }
}

fn default_oscillators() -> Vec<OscillatorConfig> {
    vec![OscillatorConfig::default(), OscillatorConfig::default()]
}

impl SynthConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate < 8000 || self.audio.sample_rate > 192000 {
            bail!("Sample rate must be between 8000 and 192000");
        }
        if self.audio.block_frames < 16 || self.audio.block_frames > 8192 {
            bail!("Block size must be between 16 and 8192 frames");
        }

        for (i, osc) in self.oscillators.iter().enumerate() {
            osc.validate()
                .map_err(|e| anyhow::anyhow!("Oscillator {}: {}", i, e))?;
        }

        Ok(())
    }
}

/// Audio output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate in Hz (default: 48000)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Frames pulled per block when rendering offline (default: 512)
    #[serde(default = "default_block_frames")]
    pub block_frames: usize,

    /// Output device name (None = default device)
    pub device: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            block_frames: default_block_frames(),
            device: None,
        }
    }
}

fn default_sample_rate() -> u32 { 48000 }
fn default_block_frames() -> usize { 512 }

/// Initial parameters of one oscillator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OscillatorConfig {
    pub shape: Shape,

    /// Hz, 10-20000 (default: 800)
    pub frequency: f64,

    /// 0.0-1.0 (default: 0.0)
    pub amplitude: f64,

    /// Rectangle duty cycle, 0.0-1.0
    pub duty: f64,

    /// Triangle skew, 0.0-1.0
    pub skew: f64,

    /// -1.0 (left) to 1.0 (right)
    pub pan: f64,

    /// Fraction of a cycle
    pub phase: f64,
}

impl Default for OscillatorConfig {
    fn default() -> Self {
        Self {
            shape: Shape::Sine,
            frequency: DEFAULT_FREQUENCY,
            amplitude: 0.0,
            duty: 0.0,
            skew: 0.0,
            pan: 0.0,
            phase: 0.0,
        }
    }
}

impl OscillatorConfig {
    /// Check every parameter against the range its setter accepts
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("frequency", self.frequency, FREQUENCY_RANGE),
            ("amplitude", self.amplitude, AMPLITUDE_RANGE),
            ("duty", self.duty, DUTY_RANGE),
            ("skew", self.skew, SKEW_RANGE),
            ("pan", self.pan, PAN_RANGE),
        ];

        for (name, value, range) in checks {
            if !range.contains(&value) {
                bail!(
                    "{} must be between {} and {} (got {})",
                    name,
                    range.start(),
                    range.end(),
                    value
                );
            }
        }
        if !self.phase.is_finite() {
            bail!("phase must be a finite number");
        }

        Ok(())
    }

    /// Push these parameters into a live oscillator
    pub fn apply(&self, osc: &Oscillator) {
        osc.set_waveform(self.shape);
        osc.set_frequency(self.frequency);
        osc.set_amplitude(self.amplitude);
        osc.set_duty(self.duty);
        osc.set_skew(self.skew);
        osc.set_pan(self.pan);
        osc.set_phase(self.phase);
    }
}
