//! Deviceless audio context
//!
//! Streams are pulled explicitly through [`OfflinePlayer::pull`] instead of by
//! a device callback. Used for rendering to files.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use super::{AudioContext, EngineError, Player};
use crate::synth::{Oscillator, FRAME_BYTES};

/// An audio context with no device behind it
#[derive(Debug, Clone)]
pub struct OfflineContext {
    sample_rate: u32,
    live: Arc<AtomicUsize>,
}

impl OfflineContext {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of players bound and not yet dropped
    pub fn live_bindings(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl AudioContext for OfflineContext {
    type Player = OfflinePlayer;

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn bind(&self, oscillator: &Oscillator) -> Result<OfflinePlayer, EngineError> {
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(OfflinePlayer {
            oscillator: oscillator.clone(),
            playing: AtomicBool::new(false),
            live: self.live.clone(),
        })
    }
}

/// Pull handle of an [`OfflineContext`]
#[derive(Debug)]
pub struct OfflinePlayer {
    oscillator: Oscillator,
    playing: AtomicBool,
    live: Arc<AtomicUsize>,
}

impl OfflinePlayer {
    /// Fill `buf` the way a device callback would. Paused players write silence.
    pub fn pull(&self, buf: &mut [u8]) -> usize {
        if self.is_playing() {
            self.oscillator.generate(buf)
        } else {
            let frames = buf.len() / FRAME_BYTES;
            buf[..frames * FRAME_BYTES].fill(0);
            frames
        }
    }
}

impl Player for OfflinePlayer {
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

impl Drop for OfflinePlayer {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_and_release() {
        let context = OfflineContext::new(48000);
        let osc = Oscillator::new(48000.0);

        let a = context.bind(&osc).unwrap();
        let b = context.bind(&osc).unwrap();
        assert_eq!(context.live_bindings(), 2);
        assert!(!a.is_playing());

        drop(a);
        assert_eq!(context.live_bindings(), 1);
        drop(b);
        assert_eq!(context.live_bindings(), 0);
    }

    #[test]
    fn test_paused_player_is_silent() {
        let context = OfflineContext::new(48000);
        let osc = Oscillator::new(48000.0);
        osc.set_amplitude(1.0);
        let player = context.bind(&osc).unwrap();

        let mut buf = vec![0xFFu8; 402];
        assert_eq!(player.pull(&mut buf), 100);
        assert!(buf[..400].iter().all(|&b| b == 0));
        assert_eq!(&buf[400..], &[0xFF, 0xFF]);
        assert_eq!(osc.position(), 0.0);

        player.play();
        assert_eq!(player.pull(&mut buf), 100);
        assert_eq!(osc.position(), 100.0);
    }
}
