//! Real-time audio playback using cpal

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, SampleRate, Stream, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{AudioContext, EngineError, Player, CHANNELS};
use crate::synth::{Oscillator, FRAME_BYTES};

/// Frames converted per pass of the callback
const SCRATCH_FRAMES: usize = 4096;

/// An output device opened for 16-bit stereo at a fixed sample rate
pub struct CpalContext {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
}

impl CpalContext {
    /// Open the named output device, or the default one.
    ///
    /// Fails when the device is missing or cannot do stereo at `sample_rate`.
    pub fn new(sample_rate: u32, device_name: Option<&str>) -> Result<Self, EngineError> {
        let host = cpal::default_host();
        let device = match device_name {
            Some(name) => host
                .output_devices()?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .ok_or_else(|| EngineError::DeviceNotFound(name.to_string()))?,
            None => host.default_output_device().ok_or(EngineError::NoDevice)?,
        };

        let rate = SampleRate(sample_rate);
        let supported = device
            .supported_output_configs()?
            .filter(|c| {
                c.channels() == CHANNELS
                    && c.min_sample_rate() <= rate
                    && rate <= c.max_sample_rate()
                    && format_rank(c.sample_format()).is_some()
            })
            .min_by_key(|c| format_rank(c.sample_format()))
            .ok_or(EngineError::NoSupportedConfig(sample_rate))?;

        let sample_format = supported.sample_format();
        let config = supported.with_sample_rate(rate).config();

        log::debug!(
            "opened output device {:?} at {} Hz ({:?})",
            device.name().unwrap_or_default(),
            sample_rate,
            sample_format
        );

        Ok(Self {
            device,
            config,
            sample_format,
        })
    }

    pub fn sample_format(&self) -> SampleFormat {
        self.sample_format
    }

    fn build_stream<T: cpal::Sample + cpal::SizedSample + cpal::FromSample<i16>>(
        &self,
        oscillator: Oscillator,
        playing: Arc<AtomicBool>,
    ) -> Result<Stream, EngineError> {
        let mut scratch = vec![0u8; SCRATCH_FRAMES * FRAME_BYTES];

        let stream = self.device.build_output_stream(
            &self.config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                if !playing.load(Ordering::Relaxed) {
                    for sample in data.iter_mut() {
                        *sample = T::from_sample(0i16);
                    }
                    return;
                }

                for chunk in data.chunks_mut(SCRATCH_FRAMES * CHANNELS as usize) {
                    // Two bytes per interleaved sample
                    let bytes = chunk.len() * 2;
                    oscillator.generate(&mut scratch[..bytes]);
                    for (sample, pcm) in chunk.iter_mut().zip(scratch.chunks_exact(2)) {
                        *sample = T::from_sample(i16::from_le_bytes([pcm[0], pcm[1]]));
                    }
                }
            },
            |err| {
                log::error!("audio stream error: {}", err);
            },
            None,
        )?;

        Ok(stream)
    }
}

impl AudioContext for CpalContext {
    type Player = CpalPlayer;

    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn bind(&self, oscillator: &Oscillator) -> Result<CpalPlayer, EngineError> {
        let playing = Arc::new(AtomicBool::new(false));
        let oscillator = oscillator.clone();

        let stream = match self.sample_format {
            SampleFormat::I16 => self.build_stream::<i16>(oscillator, playing.clone())?,
            SampleFormat::F32 => self.build_stream::<f32>(oscillator, playing.clone())?,
            SampleFormat::U16 => self.build_stream::<u16>(oscillator, playing.clone())?,
            other => return Err(EngineError::UnsupportedFormat(other)),
        };

        stream.play()?;

        Ok(CpalPlayer {
            stream,
            playing,
        })
    }
}

/// One oscillator's output stream. The stream closes when the player is dropped.
pub struct CpalPlayer {
    stream: Stream,
    playing: Arc<AtomicBool>,
}

impl Player for CpalPlayer {
    fn play(&self) {
        self.playing.store(true, Ordering::Relaxed);
    }

    fn pause(&self) {
        self.playing.store(false, Ordering::Relaxed);
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }
}

impl Drop for CpalPlayer {
    fn drop(&mut self) {
        self.playing.store(false, Ordering::Relaxed);
        if let Err(err) = self.stream.pause() {
            log::debug!("failed to pause stream on release: {}", err);
        }
    }
}

/// Preference order for device sample formats; `None` if unsupported
fn format_rank(format: SampleFormat) -> Option<u8> {
    match format {
        SampleFormat::I16 => Some(0),
        SampleFormat::F32 => Some(1),
        SampleFormat::U16 => Some(2),
        _ => None,
    }
}

/// Get the default output device name
pub fn default_device_name() -> Option<String> {
    let host = cpal::default_host();
    host.default_output_device()
        .and_then(|d| d.name().ok())
}

/// List all available output devices
pub fn list_output_devices() -> Vec<(String, StreamConfig)> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    if let Ok(output_devices) = host.output_devices() {
        for device in output_devices {
            if let (Ok(name), Ok(config)) = (device.name(), device.default_output_config()) {
                devices.push((name, config.into()));
            }
        }
    }

    devices
}
