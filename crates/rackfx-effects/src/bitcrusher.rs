//! Bit-depth and sample-rate reduction.
//!
//! The input is sampled and held: a phase accumulator counts output samples
//! and latches a new input value each time it passes the hold period
//! (`downsample` samples, stretched at random by `jitter`). Each latched
//! value is rounded to a grid of `2^bits` levels across `[-1, 1]`, so the
//! quantization step is `2 / 2^bits`.
//!
//! Holding folds everything above `fs / (2 * downsample)` back down as
//! aliasing, which is the point. Nothing is filtered.

use libm::{exp2f, roundf};
use rackfx_core::{Effect, ParamDescriptor, ParamId, ParamUnit, ParameterSmoother};

/// Seed used by [`Bitcrusher::new`].
const DEFAULT_SEED: u32 = 0x1234_5678;

/// Linear congruential generator for hold-period jitter. Owned per crusher
/// so two instances with one seed render identically.
#[derive(Debug, Clone)]
struct Jitter {
    seed: u32,
    state: u32,
}

impl Jitter {
    fn new(seed: u32) -> Self {
        Self { seed, state: seed }
    }

    /// Next value in `[0, 1)`, from the upper half of the state.
    fn next_unit(&mut self) -> f32 {
        self.state = self
            .state
            .wrapping_mul(1_664_525)
            .wrapping_add(1_013_904_223);
        f32::from((self.state >> 16) as u16) / 65_536.0
    }

    fn rewind(&mut self) {
        self.state = self.seed;
    }
}

/// Rounds `x` to the nearest of `2^bits` levels spanning `[-1, 1]`.
#[inline]
fn quantize(x: f32, bits: f32) -> f32 {
    let half_levels = exp2f(bits - 1.0);
    roundf(x * half_levels) / half_levels
}

/// Sample-and-hold bit crusher.
///
/// | Index | Name | Range | Default |
/// |-------|------|-------|---------|
/// | 0 | Bit Depth | 2–16 | 8 |
/// | 1 | Downsample | 1–64 | 1 |
/// | 2 | Jitter | 0–100% | 0% |
///
/// ```rust
/// use rackfx_core::Effect;
/// use rackfx_effects::Bitcrusher;
///
/// let mut crusher = Bitcrusher::new(48000.0);
/// crusher.set_bit_depth(2.0);
/// crusher.reset();
/// assert_eq!(crusher.process(0.3), 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct Bitcrusher {
    bits: ParameterSmoother,
    downsample: ParameterSmoother,
    jitter_amount: f32,
    jitter: Jitter,
    /// Output samples since the last latch, with the fractional remainder
    /// of the previous period carried over.
    phase: f32,
    held: [f32; 2],
}

impl Bitcrusher {
    /// Crusher with the default jitter seed.
    pub fn new(sample_rate: f32) -> Self {
        Self::with_seed(sample_rate, DEFAULT_SEED)
    }

    /// Crusher whose jitter sequence starts from `seed`.
    pub fn with_seed(sample_rate: f32, seed: u32) -> Self {
        Self {
            bits: ParameterSmoother::standard(8.0, sample_rate),
            downsample: ParameterSmoother::standard(1.0, sample_rate),
            jitter_amount: 0.0,
            jitter: Jitter::new(seed),
            phase: 0.0,
            held: [0.0; 2],
        }
    }

    /// Sets the bit depth, clamped to 2–16.
    pub fn set_bit_depth(&mut self, bits: f32) {
        self.bits.set_target(bits.clamp(2.0, 16.0));
    }

    /// Target bit depth.
    pub fn bit_depth(&self) -> f32 {
        self.bits.target()
    }

    /// Sets the hold length in samples, clamped to 1–64. 1 disables rate
    /// reduction.
    pub fn set_downsample(&mut self, factor: f32) {
        self.downsample.set_target(factor.clamp(1.0, 64.0));
    }

    /// Target hold length.
    pub fn downsample(&self) -> f32 {
        self.downsample.target()
    }

    /// Sets how far, as a fraction of the hold length, each period may be
    /// stretched at random.
    pub fn set_jitter(&mut self, amount: f32) {
        self.jitter_amount = amount.clamp(0.0, 1.0);
    }

    /// Jitter fraction.
    pub fn jitter(&self) -> f32 {
        self.jitter_amount
    }

    /// Advances one output sample. Returns the bit depth to latch with, or
    /// `None` while holding.
    #[inline]
    fn advance(&mut self) -> Option<f32> {
        let bits = self.bits.next_value();
        let mut period = self.downsample.next_value();
        if self.jitter_amount > 0.0 {
            period += period * self.jitter_amount * self.jitter.next_unit();
        }
        self.phase += 1.0;
        if self.phase < period {
            return None;
        }
        self.phase = (self.phase - period).min(1.0);
        Some(bits)
    }
}

impl Effect for Bitcrusher {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        if let Some(bits) = self.advance() {
            self.held[0] = quantize(input, bits);
        }
        self.held[0]
    }

    /// Both channels latch on the same sample.
    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        if let Some(bits) = self.advance() {
            self.held = [quantize(left, bits), quantize(right, bits)];
        }
        (self.held[0], self.held[1])
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.bits.set_sample_rate(sample_rate);
        self.downsample.set_sample_rate(sample_rate);
    }

    /// Drops the held values, rewinds the jitter sequence and snaps both
    /// ramps to their targets.
    fn reset(&mut self) {
        self.held = [0.0; 2];
        self.phase = 0.0;
        self.jitter.rewind();
        self.bits.snap_to_target();
        self.downsample.snap_to_target();
    }
}

rackfx_core::impl_params! {
    Bitcrusher, this {
        [0] ParamDescriptor::custom("Bit Depth", "Bits", 2.0, 16.0, 8.0)
                .stepped()
                .with_id(ParamId(1700), "crush_bits"),
            get: this.bit_depth(),
            set: |v| this.set_bit_depth(v);

        [1] ParamDescriptor::custom("Downsample", "Down", 1.0, 64.0, 1.0)
                .stepped()
                .with_id(ParamId(1701), "crush_down"),
            get: this.downsample(),
            set: |v| this.set_downsample(v);

        [2] ParamDescriptor::custom("Jitter", "Jitter", 0.0, 100.0, 0.0)
                .with_unit(ParamUnit::Percent)
                .with_id(ParamId(1702), "crush_jitter"),
            get: this.jitter() * 100.0,
            set: |v| this.set_jitter(v / 100.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rackfx_core::ParameterInfo;

    fn crusher(bits: f32, downsample: f32) -> Bitcrusher {
        let mut c = Bitcrusher::new(48000.0);
        c.set_bit_depth(bits);
        c.set_downsample(downsample);
        c.reset();
        c
    }

    #[test]
    fn test_quantize_grid() {
        // 2 bits over [-1, 1]: step 0.5.
        assert_eq!(quantize(0.3, 2.0), 0.5);
        assert_eq!(quantize(0.2, 2.0), 0.0);
        assert_eq!(quantize(-0.8, 2.0), -1.0);
        let x = 0.123_456_78;
        assert!((quantize(x, 16.0) - x).abs() < 2e-5);
    }

    #[test]
    fn test_full_rate_tracks_input() {
        let mut c = crusher(16.0, 1.0);
        for x in [0.5, -0.25, 0.75] {
            assert!((c.process(x) - x).abs() < 1e-4);
        }
    }

    #[test]
    fn test_hold_repeats_latched_value() {
        let mut c = crusher(16.0, 4.0);
        let out: Vec<f32> = (0..12).map(|i| c.process(0.05 * i as f32)).collect();
        // Latches on samples 3, 7 and 11.
        assert_eq!(out[..3], [0.0; 3]);
        assert_eq!(out[3], out[6]);
        assert_ne!(out[6], out[7]);
        assert_eq!(out[7], out[10]);
        assert!((out[11] - 0.55).abs() < 1e-4);
    }

    #[test]
    fn test_stereo_latches_together() {
        let mut c = crusher(16.0, 2.0);
        let a = c.process_stereo(0.1, -0.1);
        let b = c.process_stereo(0.2, -0.2);
        let d = c.process_stereo(0.3, -0.3);
        assert_eq!(a, (0.0, 0.0));
        assert!((b.0 - 0.2).abs() < 1e-4 && (b.1 + 0.2).abs() < 1e-4);
        assert_eq!(b, d);
    }

    #[test]
    fn test_reset_drops_held_state() {
        let mut c = crusher(8.0, 8.0);
        for _ in 0..20 {
            c.process(0.7);
        }
        c.reset();
        assert_eq!(c.held, [0.0; 2]);
        assert_eq!(c.phase, 0.0);
        assert_eq!(c.process(0.7), 0.0);
    }

    #[test]
    fn test_jitter_is_reproducible_per_seed() {
        let run = |seed| {
            let mut c = Bitcrusher::with_seed(48000.0, seed);
            c.set_downsample(6.0);
            c.set_jitter(1.0);
            c.reset();
            (0..256)
                .map(|i| c.process(libm::sinf(i as f32 * 0.1)))
                .collect::<Vec<f32>>()
        };
        assert_eq!(run(7), run(7));
        assert_ne!(run(7), run(8));
    }

    #[test]
    fn test_output_stays_in_range() {
        let mut c = crusher(2.0, 8.0);
        c.set_jitter(0.5);
        for i in 0..4096 {
            let x = libm::sinf(i as f32 * 0.01);
            let (l, r) = c.process_stereo(x, -x);
            assert!(l.is_finite() && l.abs() <= 1.0, "L out of range: {l}");
            assert!(r.is_finite() && r.abs() <= 1.0, "R out of range: {r}");
        }
    }

    #[test]
    fn test_param_table() {
        let mut c = Bitcrusher::new(48000.0);
        assert_eq!(c.param_count(), 3);
        assert_eq!(c.param_info(0).unwrap().default, 8.0);
        c.set_param(0, 4.3);
        assert_eq!(c.get_param(0), 4.0);
        c.set_param(1, 100.0);
        assert_eq!(c.get_param(1), 64.0);
        c.set_param(2, 50.0);
        assert!((c.get_param(2) - 50.0).abs() < 1e-5);
    }
}
