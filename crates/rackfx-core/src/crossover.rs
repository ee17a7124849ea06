//! Linkwitz-Riley 4th-order crossover.
//!
//! Each side is two cascaded Butterworth biquads (Q = 1/√2). The low and high
//! outputs are in phase at every frequency and sum to a second-order all-pass,
//! so recombining the bands gives a flat magnitude response.
//!
//! Splitting into more than two bands cascades crossovers; the bands that skip
//! a later split need an [`allpass_compensator`] at that split's frequency to
//! stay phase-aligned.

use core::f32::consts::FRAC_1_SQRT_2;

use crate::biquad::{BiquadFilter, BiquadKind};

/// Two-way LR4 crossover with per-channel state.
///
/// ```rust
/// use rackfx_core::LinkwitzRileyCrossover;
///
/// let mut xo = LinkwitzRileyCrossover::new(500.0, 48000.0);
/// let (low, high) = xo.split(1.0, 0);
/// assert!(low.is_finite() && high.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct LinkwitzRileyCrossover {
    frequency: f32,
    low: [BiquadFilter; 2],
    high: [BiquadFilter; 2],
}

impl LinkwitzRileyCrossover {
    /// Creates a crossover at `frequency` Hz.
    pub fn new(frequency: f32, sample_rate: f32) -> Self {
        let stage = |kind| {
            let mut f = BiquadFilter::new(kind, sample_rate);
            f.set_parameters(frequency, FRAC_1_SQRT_2, 0.0);
            f
        };
        Self {
            frequency,
            low: [stage(BiquadKind::LowPass), stage(BiquadKind::LowPass)],
            high: [stage(BiquadKind::HighPass), stage(BiquadKind::HighPass)],
        }
    }

    /// Sets the sample rate and clears state.
    pub fn prepare(&mut self, sample_rate: f32) {
        for f in self.low.iter_mut().chain(self.high.iter_mut()) {
            f.prepare(sample_rate);
        }
    }

    /// Moves the crossover point.
    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
        for f in self.low.iter_mut().chain(self.high.iter_mut()) {
            f.set_frequency(frequency);
        }
    }

    /// Current crossover frequency.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Clears state on all channels.
    pub fn reset(&mut self) {
        for f in self.low.iter_mut().chain(self.high.iter_mut()) {
            f.reset();
        }
    }

    /// Splits one sample into `(low, high)`.
    #[inline]
    pub fn split(&mut self, input: f32, channel: usize) -> (f32, f32) {
        let low = self.low[0].process_sample(input, channel);
        let low = self.low[1].process_sample(low, channel);
        let high = self.high[0].process_sample(input, channel);
        let high = self.high[1].process_sample(high, channel);
        (low, high)
    }
}

/// All-pass matching the phase of an LR4 split at `frequency`.
pub fn allpass_compensator(frequency: f32, sample_rate: f32) -> BiquadFilter {
    let mut f = BiquadFilter::new(BiquadKind::AllPass, sample_rate);
    f.set_parameters(frequency, FRAC_1_SQRT_2, 0.0);
    f
}
