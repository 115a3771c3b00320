//! Mixer owning the oscillator bank
//!
//! The Mixer is the lifecycle owner of tonebank's oscillators. It:
//! - Creates oscillators at the context's sample rate
//! - Binds each one to its own output stream and starts it
//! - Keeps them in creation order, addressable by position or by stable id
//! - Releases the stream of every removed oscillator
//!
//! Removal only drops the mixer's clone. A stream callback still holding the
//! oscillator keeps it alive until the stream itself is gone.

use slotmap::{new_key_type, SlotMap};

use super::{AudioContext, CpalContext, EngineError, Player};
use crate::config::OscillatorConfig;
use crate::synth::Oscillator;

new_key_type! {
    /// Stable handle to an oscillator; survives removal of other oscillators
    pub struct OscillatorId;
}

struct Slot<P> {
    oscillator: Oscillator,
    /// `None` when binding to the output failed
    player: Option<P>,
}

/// An ordered bank of independently streamed oscillators
pub struct Mixer<C: AudioContext> {
    slots: SlotMap<OscillatorId, Slot<C::Player>>,
    /// Ids in insertion order
    order: Vec<OscillatorId>,
    context: C,
}

impl Mixer<CpalContext> {
    /// Open an output device and create an empty mixer streaming to it.
    pub fn open(sample_rate: u32, device_name: Option<&str>) -> Result<Self, EngineError> {
        let context = CpalContext::new(sample_rate, device_name)?;
        Ok(Self::new(context))
    }
}

impl<C: AudioContext> Mixer<C> {
    /// Create an empty mixer on an already acquired context
    pub fn new(context: C) -> Self {
        Self {
            slots: SlotMap::with_key(),
            order: Vec::new(),
            context,
        }
    }

    /// Get the sample rate
    pub fn sample_rate(&self) -> u32 {
        self.context.sample_rate()
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    /// Create a default oscillator, start streaming it and append it.
    pub fn new_oscillator(&mut self) -> Oscillator {
        let (_, oscillator) = self.new_oscillator_with_id();
        oscillator
    }

    /// Like [`Mixer::new_oscillator`], also returning the stable id.
    ///
    /// Never fails: if the output refuses the binding the error is logged and
    /// the oscillator is kept, silent.
    pub fn new_oscillator_with_id(&mut self) -> (OscillatorId, Oscillator) {
        let oscillator = Oscillator::new(self.context.sample_rate() as f64);

        let player = match self.context.bind(&oscillator) {
            Ok(player) => {
                player.play();
                Some(player)
            }
            Err(err) => {
                log::error!("failed to bind oscillator to audio output: {}", err);
                None
            }
        };

        let id = self.slots.insert(Slot {
            oscillator: oscillator.clone(),
            player,
        });
        self.order.push(id);

        log::debug!("created oscillator {} ({:?})", self.order.len() - 1, id);
        (id, oscillator)
    }

    /// Create an oscillator, start it and set its parameters from `config`.
    pub fn apply(&mut self, config: &OscillatorConfig) -> Oscillator {
        let oscillator = self.new_oscillator();
        config.apply(&oscillator);
        oscillator
    }

    /// Remove the oscillator at `index`. Out-of-range indices are ignored.
    ///
    /// Later oscillators shift down by one.
    pub fn delete_oscillator(&mut self, index: usize) {
        if index >= self.order.len() {
            return;
        }

        let id = self.order.remove(index);
        self.slots.remove(id);
        log::debug!("deleted oscillator {} ({:?})", index, id);
    }

    /// Remove the oscillator with the given id. Returns false if it was already gone.
    pub fn remove(&mut self, id: OscillatorId) -> bool {
        match self.index_of(id) {
            Some(index) => {
                self.delete_oscillator(index);
                true
            }
            None => false,
        }
    }

    /// Current oscillators in insertion order
    pub fn oscillators(&self) -> Vec<Oscillator> {
        self.order
            .iter()
            .filter_map(|id| self.slots.get(*id))
            .map(|slot| slot.oscillator.clone())
            .collect()
    }

    pub fn ids(&self) -> &[OscillatorId] {
        &self.order
    }

    pub fn get(&self, id: OscillatorId) -> Option<&Oscillator> {
        self.slots.get(id).map(|slot| &slot.oscillator)
    }

    pub fn get_index(&self, index: usize) -> Option<&Oscillator> {
        self.order.get(index).and_then(|id| self.get(*id))
    }

    /// Current position of `id` in the ordered bank
    pub fn index_of(&self, id: OscillatorId) -> Option<usize> {
        self.order.iter().position(|&other| other == id)
    }

    /// The pull handle of the oscillator at `index`, if it is bound
    pub fn player(&self, index: usize) -> Option<&C::Player> {
        self.order
            .get(index)
            .and_then(|id| self.slots.get(*id))
            .and_then(|slot| slot.player.as_ref())
    }

    pub fn is_playing(&self, index: usize) -> bool {
        self.player(index).is_some_and(|p| p.is_playing())
    }

    /// Pause the stream at `index`; no-op if out of range
    pub fn pause(&self, index: usize) {
        if let Some(player) = self.player(index) {
            player.pause();
        }
    }

    /// Resume the stream at `index`; no-op if out of range
    pub fn resume(&self, index: usize) {
        if let Some(player) = self.player(index) {
            player.play();
        }
    }

    /// Get the number of oscillators
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<C: AudioContext> Drop for Mixer<C> {
    fn drop(&mut self) {
        if !self.order.is_empty() {
            log::debug!("releasing {} oscillator bindings", self.order.len());
        }
        self.order.clear();
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::OfflineContext;
    use crate::synth::Shape;

    fn test_mixer() -> Mixer<OfflineContext> {
        Mixer::new(OfflineContext::new(48000))
    }

    /// A context whose bindings always fail
    struct BrokenContext;

    impl AudioContext for BrokenContext {
        type Player = crate::engine::OfflinePlayer;

        fn sample_rate(&self) -> u32 {
            44100
        }

        fn bind(&self, _: &Oscillator) -> Result<Self::Player, EngineError> {
            Err(EngineError::NoDevice)
        }
    }

    #[test]
    fn test_mixer_creation() {
        let mixer = test_mixer();
        assert_eq!(mixer.sample_rate(), 48000);
        assert_eq!(mixer.len(), 0);
        assert!(mixer.is_empty());
        assert!(mixer.oscillators().is_empty());
    }

    #[test]
    fn test_new_oscillator_defaults_and_playing() {
        let mut mixer = test_mixer();
        let osc = mixer.new_oscillator();

        assert_eq!(mixer.len(), 1);
        assert_eq!(osc.sample_rate(), 48000.0);
        assert_eq!(osc.shape(), Shape::Sine);
        assert_eq!(osc.frequency(), 800.0);
        assert_eq!(osc.amplitude(), 0.0);
        assert!(mixer.is_playing(0));
        assert_eq!(mixer.context().live_bindings(), 1);
    }

    #[test]
    fn test_default_oscillator_streams_silence() {
        let mut mixer = test_mixer();
        mixer.new_oscillator();

        for shape in Shape::ALL {
            mixer.get_index(0).unwrap().set_waveform(shape);
            let mut buf = vec![0xEEu8; 400];
            let player = mixer.player(0).unwrap();
            assert_eq!(player.pull(&mut buf), 100);
            assert!(buf.iter().all(|&b| b == 0));
        }
        assert_eq!(mixer.get_index(0).unwrap().position(), 400.0);
    }

    #[test]
    fn test_apply_config() {
        let mut mixer = test_mixer();
        mixer.new_oscillator();
        let config = OscillatorConfig {
            shape: Shape::Rectangle,
            frequency: 100.0,
            amplitude: 1.0,
            duty: 0.5,
            pan: -1.0,
            ..OscillatorConfig::default()
        };

        let osc = mixer.apply(&config);
        assert_eq!(mixer.len(), 2);
        assert!(mixer.is_playing(1));
        assert_eq!(mixer.get_index(1).unwrap().shape(), Shape::Rectangle);
        assert_eq!(osc.frequency(), 100.0);

        let mut buf = vec![0u8; 8];
        mixer.player(1).unwrap().pull(&mut buf);
        assert_eq!(&buf, &[0xFF, 0x7F, 0, 0, 0xFF, 0x7F, 0, 0]);

        // Out-of-range values are dropped like any other setter call
        let loud = OscillatorConfig {
            amplitude: 3.0,
            ..OscillatorConfig::default()
        };
        assert_eq!(mixer.apply(&loud).amplitude(), 0.0);
    }

    #[test]
    fn test_oscillators_in_insertion_order() {
        let mut mixer = test_mixer();
        for freq in [100.0, 200.0, 300.0] {
            mixer.new_oscillator().set_frequency(freq);
        }

        let freqs: Vec<f64> = mixer.oscillators().iter().map(|o| o.frequency()).collect();
        assert_eq!(freqs, vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn test_delete_shifts_indices() {
        let mut mixer = test_mixer();
        for freq in [100.0, 200.0, 300.0] {
            mixer.new_oscillator().set_frequency(freq);
        }

        mixer.delete_oscillator(1);
        assert_eq!(mixer.len(), 2);
        assert_eq!(mixer.get_index(0).unwrap().frequency(), 100.0);
        assert_eq!(mixer.get_index(1).unwrap().frequency(), 300.0);
        assert_eq!(mixer.context().live_bindings(), 2);
    }

    #[test]
    fn test_delete_out_of_range_is_noop() {
        let mut mixer = test_mixer();
        mixer.new_oscillator().set_frequency(100.0);
        mixer.new_oscillator().set_frequency(200.0);
        let before = mixer.ids().to_vec();

        mixer.delete_oscillator(2);
        mixer.delete_oscillator(usize::MAX);

        assert_eq!(mixer.len(), 2);
        assert_eq!(mixer.ids(), before.as_slice());
        assert_eq!(mixer.context().live_bindings(), 2);

        let mut empty = test_mixer();
        empty.delete_oscillator(0);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_stable_ids_survive_deletion() {
        let mut mixer = test_mixer();
        let (first, _) = mixer.new_oscillator_with_id();
        let (second, osc) = mixer.new_oscillator_with_id();
        osc.set_frequency(440.0);

        assert_eq!(mixer.index_of(second), Some(1));
        assert!(mixer.remove(first));
        assert_eq!(mixer.index_of(second), Some(0));
        assert_eq!(mixer.get(second).unwrap().frequency(), 440.0);

        // Stale id does not resolve, even after the slot is reused
        assert!(!mixer.remove(first));
        assert!(mixer.get(first).is_none());
        let (third, _) = mixer.new_oscillator_with_id();
        assert_ne!(third, first);
        assert!(mixer.get(first).is_none());
    }

    #[test]
    fn test_removed_oscillator_outlives_mixer_reference() {
        let mut mixer = test_mixer();
        let osc = mixer.new_oscillator();
        osc.set_amplitude(1.0);
        let held = osc.clone();

        mixer.delete_oscillator(0);
        assert_eq!(mixer.context().live_bindings(), 0);

        // A handle held elsewhere can still be pulled safely
        let mut buf = vec![0u8; 64];
        assert_eq!(held.generate(&mut buf), 16);
        assert_eq!(held.position(), 16.0);
    }

    #[test]
    fn test_pause_and_resume() {
        let mut mixer = test_mixer();
        mixer.new_oscillator();

        mixer.pause(0);
        assert!(!mixer.is_playing(0));
        mixer.resume(0);
        assert!(mixer.is_playing(0));

        // Out of range
        mixer.pause(5);
        assert!(!mixer.is_playing(5));
    }

    #[test]
    fn test_drop_releases_bindings() {
        let context = OfflineContext::new(48000);
        {
            let mut mixer = Mixer::new(context.clone());
            mixer.new_oscillator();
            mixer.new_oscillator();
            assert_eq!(context.live_bindings(), 2);
        }
        assert_eq!(context.live_bindings(), 0);
    }

    #[test]
    fn test_failed_binding_still_creates_oscillator() {
        let mut mixer = Mixer::new(BrokenContext);
        let osc = mixer.new_oscillator();

        assert_eq!(mixer.len(), 1);
        assert_eq!(osc.sample_rate(), 44100.0);
        assert!(!mixer.is_playing(0));
        assert!(mixer.player(0).is_none());
    }
}
