//! WAV file recorder
//!
//! Records an oscillator's 16-bit stereo PCM stream to a WAV file.

use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use super::CHANNELS;
use crate::synth::{decode_frames, FRAME_BYTES};

/// WAV file recorder
pub struct Recorder {
    writer: WavWriter<BufWriter<File>>,
    sample_rate: u32,
    frames_written: u64,
}

impl Recorder {
    /// Create a new recorder
    ///
    /// # Arguments
    /// * `path` - Output file path
    /// * `sample_rate` - Sample rate in Hz
    pub fn new(path: &Path, sample_rate: u32) -> Result<Self> {
        let spec = WavSpec {
            channels: CHANNELS,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let writer = WavWriter::create(path, spec)
            .with_context(|| format!("failed to create WAV file: {:?}", path))?;

        Ok(Self {
            writer,
            sample_rate,
            frames_written: 0,
        })
    }

    /// Get the sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the number of stereo frames written
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Get the duration recorded in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frames_written as f64 / self.sample_rate as f64
    }

    /// Write interleaved little-endian stereo frames. A partial trailing frame is ignored.
    pub fn write_pcm(&mut self, pcm: &[u8]) -> Result<()> {
        let frames = decode_frames(pcm);
        for &(left, right) in &frames {
            self.writer
                .write_sample(left)
                .context("failed to write sample")?;
            self.writer
                .write_sample(right)
                .context("failed to write sample")?;
        }
        self.frames_written += frames.len() as u64;
        Ok(())
    }

    /// Pull `frames` frames from `pull` in blocks of `block_frames` and write them
    pub fn record<F>(&mut self, frames: u64, block_frames: usize, mut pull: F) -> Result<()>
    where
        F: FnMut(&mut [u8]) -> usize,
    {
        let block_frames = block_frames.max(1);
        let mut buf = vec![0u8; block_frames * FRAME_BYTES];
        let mut remaining = frames;

        while remaining > 0 {
            let len = remaining.min(block_frames as u64) as usize;
            let block = &mut buf[..len * FRAME_BYTES];
            let pulled = pull(block);
            self.write_pcm(&block[..pulled * FRAME_BYTES])?;
            remaining -= len as u64;
        }

        Ok(())
    }

    /// Finalize the WAV file
    ///
    /// This must be called to properly close the file and write the header.
    pub fn finalize(self) -> Result<()> {
        self.writer.finalize().context("failed to finalize WAV file")
    }
}
