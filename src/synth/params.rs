//! Lock-free parameter cells shared between the control and audio threads

use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicU64, Ordering};

pub const FREQUENCY_RANGE: RangeInclusive<f64> = 10.0..=20000.0;
pub const AMPLITUDE_RANGE: RangeInclusive<f64> = 0.0..=1.0;
pub const DUTY_RANGE: RangeInclusive<f64> = 0.0..=1.0;
pub const SKEW_RANGE: RangeInclusive<f64> = 0.0..=1.0;
pub const PAN_RANGE: RangeInclusive<f64> = -1.0..=1.0;

pub const DEFAULT_FREQUENCY: f64 = 800.0;

/// An `f64` stored as its bit pattern, so every read sees a whole value
#[derive(Debug, Default)]
pub struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    pub fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Atomically add `delta`, returning the previous value
    pub fn fetch_add(&self, delta: f64) -> f64 {
        let previous = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                Some((f64::from_bits(bits) + delta).to_bits())
            })
            .unwrap_or_else(|bits| bits);
        f64::from_bits(previous)
    }
}

/// A bounded parameter: writes outside the domain are dropped
#[derive(Debug)]
pub struct Param {
    value: AtomicF64,
    range: RangeInclusive<f64>,
}

impl Param {
    pub fn new(value: f64, range: RangeInclusive<f64>) -> Self {
        Self {
            value: AtomicF64::new(value),
            range,
        }
    }

    pub fn get(&self) -> f64 {
        self.value.load()
    }

    /// Store `value` if it lies in the domain. Returns whether it was accepted.
    pub fn set(&self, value: f64) -> bool {
        // NaN fails `contains`
        if self.range.contains(&value) {
            self.value.store(value);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomic_f64_roundtrips_bits() {
        let cell = AtomicF64::new(-0.25);
        assert_eq!(cell.load(), -0.25);
        cell.store(f64::MAX);
        assert_eq!(cell.load(), f64::MAX);
    }

    #[test]
    fn test_atomic_f64_fetch_add_from_threads() {
        let cell = std::sync::Arc::new(AtomicF64::new(0.0));
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let cell = cell.clone();
                std::thread::spawn(move || {
                    for _ in 0..10_000 {
                        cell.fetch_add(3.0);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(cell.load(), 120_000.0);
        assert_eq!(cell.fetch_add(1.0), 120_000.0);
    }

    #[test]
    fn test_param_accepts_closed_interval() {
        let pan = Param::new(0.0, PAN_RANGE);
        assert!(pan.set(-1.0));
        assert_eq!(pan.get(), -1.0);
        assert!(pan.set(1.0));
        assert_eq!(pan.get(), 1.0);
    }

    #[test]
    fn test_param_drops_out_of_range() {
        let freq = Param::new(DEFAULT_FREQUENCY, FREQUENCY_RANGE);
        assert!(!freq.set(9.999));
        assert!(!freq.set(20000.001));
        assert!(!freq.set(f64::NAN));
        assert!(!freq.set(f64::INFINITY));
        assert_eq!(freq.get(), DEFAULT_FREQUENCY);
    }
}
