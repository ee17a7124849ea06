//! Three-band splitter with per-band gain.
//!
//! Two LR4 crossovers carve the signal into low, mid and high bands. The low
//! band never passes through the second crossover, so it runs through an
//! all-pass at that frequency to keep the three bands phase-aligned. With all
//! gains at 0 dB the sum is an all-pass: flat magnitude, shifted phase.

use rackfx_core::{
    BiquadFilter, Effect, LinkwitzRileyCrossover, ParamDescriptor, ParamId, ParameterSmoother,
    allpass_compensator, db_to_linear, linear_to_db,
};

/// Smallest ratio between the high and low crossover points.
const MIN_SPLIT_RATIO: f32 = 2.0;

/// Three-band splitter.
///
/// ## Parameter Indices (`ParameterInfo`)
///
/// | Index | Name | Range | Default |
/// |-------|------|-------|---------|
/// | 0 | Low Split | 20.0–2000.0 Hz | 200.0 |
/// | 1 | High Split | 500.0–16000.0 Hz | 2000.0 |
/// | 2 | Low Gain | −24.0–12.0 dB | 0.0 |
/// | 3 | Mid Gain | −24.0–12.0 dB | 0.0 |
/// | 4 | High Gain | −24.0–12.0 dB | 0.0 |
///
/// The high split is held at least an octave above the low split.
///
/// # Example
///
/// ```rust
/// use rackfx_effects::BandSplit;
/// use rackfx_core::Effect;
///
/// let mut split = BandSplit::new(48000.0);
/// split.set_mid_gain_db(-12.0);
/// let (l, r) = split.process_stereo(0.2, 0.2);
/// assert!(l.is_finite() && r.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct BandSplit {
    low_split: LinkwitzRileyCrossover,
    high_split: LinkwitzRileyCrossover,
    low_compensator: BiquadFilter,
    low_hz: f32,
    high_hz: f32,
    low_gain: ParameterSmoother,
    mid_gain: ParameterSmoother,
    high_gain: ParameterSmoother,
}

impl BandSplit {
    /// Splits at 200 Hz and 2 kHz with unity gain on every band.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            low_split: LinkwitzRileyCrossover::new(200.0, sample_rate),
            high_split: LinkwitzRileyCrossover::new(2000.0, sample_rate),
            low_compensator: allpass_compensator(2000.0, sample_rate),
            low_hz: 200.0,
            high_hz: 2000.0,
            low_gain: ParameterSmoother::fast(1.0, sample_rate),
            mid_gain: ParameterSmoother::fast(1.0, sample_rate),
            high_gain: ParameterSmoother::fast(1.0, sample_rate),
        }
    }

    /// Set the low/mid split in Hz.
    pub fn set_low_split_hz(&mut self, hz: f32) {
        self.low_hz = hz.clamp(20.0, 2000.0);
        self.low_split.set_frequency(self.low_hz);
        self.apply_high_split();
    }

    /// Set the mid/high split in Hz.
    pub fn set_high_split_hz(&mut self, hz: f32) {
        self.high_hz = hz.clamp(500.0, 16000.0);
        self.apply_high_split();
    }

    /// Requested mid/high split. The effective point may be higher; see
    /// [`effective_high_split_hz`](Self::effective_high_split_hz).
    pub fn high_split_hz(&self) -> f32 {
        self.high_hz
    }

    /// Low/mid split in Hz.
    pub fn low_split_hz(&self) -> f32 {
        self.low_hz
    }

    /// Mid/high split actually in use.
    pub fn effective_high_split_hz(&self) -> f32 {
        self.high_hz.max(self.low_hz * MIN_SPLIT_RATIO)
    }

    /// Low band gain in dB (−24 to +12).
    pub fn set_low_gain_db(&mut self, db: f32) {
        self.low_gain.set_target(db_to_linear(db.clamp(-24.0, 12.0)));
    }

    /// Mid band gain in dB.
    pub fn set_mid_gain_db(&mut self, db: f32) {
        self.mid_gain.set_target(db_to_linear(db.clamp(-24.0, 12.0)));
    }

    /// High band gain in dB.
    pub fn set_high_gain_db(&mut self, db: f32) {
        self.high_gain.set_target(db_to_linear(db.clamp(-24.0, 12.0)));
    }

    fn apply_high_split(&mut self) {
        let hz = self.effective_high_split_hz();
        self.high_split.set_frequency(hz);
        self.low_compensator.set_frequency(hz);
    }

    #[inline]
    fn split_channel(&mut self, input: f32, channel: usize, gains: (f32, f32, f32)) -> f32 {
        let (low, rest) = self.low_split.split(input, channel);
        let low = self.low_compensator.process_sample(low, channel);
        let (mid, high) = self.high_split.split(rest, channel);
        low * gains.0 + mid * gains.1 + high * gains.2
    }

    #[inline]
    fn next_gains(&mut self) -> (f32, f32, f32) {
        (
            self.low_gain.next_value(),
            self.mid_gain.next_value(),
            self.high_gain.next_value(),
        )
    }
}

impl Effect for BandSplit {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let gains = self.next_gains();
        self.split_channel(input, 0, gains)
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let gains = self.next_gains();
        (
            self.split_channel(left, 0, gains),
            self.split_channel(right, 1, gains),
        )
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.low_split.prepare(sample_rate);
        self.high_split.prepare(sample_rate);
        self.low_compensator.prepare(sample_rate);
        self.low_gain.set_sample_rate(sample_rate);
        self.mid_gain.set_sample_rate(sample_rate);
        self.high_gain.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.low_split.reset();
        self.high_split.reset();
        self.low_compensator.reset();
        self.low_gain.snap_to_target();
        self.mid_gain.snap_to_target();
        self.high_gain.snap_to_target();
    }
}

rackfx_core::impl_params! {
    BandSplit, this {
        [0] ParamDescriptor::frequency_hz("Low Split", "LoX", 20.0, 2000.0, 200.0)
                .with_id(ParamId(600), "split_low_hz"),
            get: this.low_hz,
            set: |v| this.set_low_split_hz(v);

        [1] ParamDescriptor::frequency_hz("High Split", "HiX", 500.0, 16000.0, 2000.0)
                .with_id(ParamId(601), "split_high_hz"),
            get: this.high_hz,
            set: |v| this.set_high_split_hz(v);

        [2] ParamDescriptor::gain_db("Low Gain", "LoG", -24.0, 12.0, 0.0)
                .with_id(ParamId(602), "split_low_gain"),
            get: linear_to_db(this.low_gain.target()),
            set: |v| this.set_low_gain_db(v);

        [3] ParamDescriptor::gain_db("Mid Gain", "MidG", -24.0, 12.0, 0.0)
                .with_id(ParamId(603), "split_mid_gain"),
            get: linear_to_db(this.mid_gain.target()),
            set: |v| this.set_mid_gain_db(v);

        [4] ParamDescriptor::gain_db("High Gain", "HiG", -24.0, 12.0, 0.0)
                .with_id(ParamId(604), "split_high_gain"),
            get: linear_to_db(this.high_gain.target()),
            set: |v| this.set_high_gain_db(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::PI;
    use rackfx_core::ParameterInfo;

    fn steady_peak(split: &mut BandSplit, freq: f32, sr: f32) -> f32 {
        let mut peak = 0.0_f32;
        for i in 0..(sr as usize) {
            let x = libm::sinf(2.0 * PI * freq * i as f32 / sr);
            let y = split.process(x);
            if i > sr as usize / 2 {
                peak = peak.max(y.abs());
            }
        }
        peak
    }

    #[test]
    fn test_unity_gains_are_flat() {
        let sr = 48000.0;
        for freq in [60.0, 700.0, 5000.0] {
            let mut split = BandSplit::new(sr);
            let peak = steady_peak(&mut split, freq, sr);
            assert!((peak - 1.0).abs() < 0.02, "peak at {freq} Hz: {peak}");
        }
    }

    #[test]
    fn test_mid_cut_only_affects_mid_band() {
        let sr = 48000.0;
        let mut split = BandSplit::new(sr);
        split.set_mid_gain_db(-24.0);
        split.reset();
        let mid = steady_peak(&mut split, 632.0, sr);
        assert!(mid < 0.2, "mid band should be cut: {mid}");

        let mut split = BandSplit::new(sr);
        split.set_mid_gain_db(-24.0);
        split.reset();
        let high = steady_peak(&mut split, 12000.0, sr);
        assert!(high > 0.9, "high band should pass: {high}");
    }

    #[test]
    fn test_high_split_kept_above_low_split() {
        let mut split = BandSplit::new(48000.0);
        split.set_param(1, 600.0);
        split.set_param(0, 1000.0);
        assert_eq!(split.get_param(1), 600.0);
        assert_eq!(split.effective_high_split_hz(), 2000.0);
    }

    #[test]
    fn test_gain_params_roundtrip() {
        let mut split = BandSplit::new(48000.0);
        split.set_param(2, -6.0);
        split.set_param(4, 30.0);
        assert!((split.get_param(2) + 6.0).abs() < 1e-3);
        assert!((split.get_param(4) - 12.0).abs() < 1e-3);
        assert_eq!(split.param_count(), 5);
    }
}
