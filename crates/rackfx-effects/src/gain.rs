//! Gain and ceiling clipper.
//!
//! The two simplest units in the rack. Chains of them make ordering visible:
//! doubling then clipping at 1.0 differs from clipping then doubling.

use rackfx_core::{
    Effect, ParamDescriptor, ParamId, ParameterSmoother, db_to_linear, hard_clip, linear_to_db,
};

/// Smoothed gain stage.
///
/// ## Parameter Indices (`ParameterInfo`)
///
/// | Index | Name | Range | Default |
/// |-------|------|-------|---------|
/// | 0 | Gain | −60.0–24.0 dB | 0.0 |
///
/// # Example
///
/// ```rust
/// use rackfx_effects::Gain;
/// use rackfx_core::Effect;
///
/// let mut gain = Gain::new(48000.0);
/// gain.set_gain_db(6.0);
/// gain.reset();
/// assert!((gain.process(0.5) - 0.9976).abs() < 1e-3);
/// ```
#[derive(Debug, Clone)]
pub struct Gain {
    gain: ParameterSmoother,
}

impl Gain {
    /// Unity gain with a 5 ms linear ramp.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            gain: ParameterSmoother::fast(1.0, sample_rate),
        }
    }

    /// Set gain in dB (−60 to +24).
    pub fn set_gain_db(&mut self, db: f32) {
        self.gain.set_target(db_to_linear(db.clamp(-60.0, 24.0)));
    }

    /// Target gain in dB.
    pub fn gain_db(&self) -> f32 {
        linear_to_db(self.gain.target())
    }
}

impl Effect for Gain {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        input * self.gain.next_value()
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let g = self.gain.next_value();
        (left * g, right * g)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.gain.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.gain.snap_to_target();
    }
}

rackfx_core::impl_params! {
    Gain, this {
        [0] ParamDescriptor::gain_db("Gain", "Gain", -60.0, 24.0, 0.0)
                .with_id(ParamId(100), "gain_db"),
            get: this.gain_db(),
            set: |v| this.set_gain_db(v);
    }
}

/// Hard clipper with an adjustable ceiling.
///
/// ## Parameter Indices (`ParameterInfo`)
///
/// | Index | Name | Range | Default |
/// |-------|------|-------|---------|
/// | 0 | Ceiling | −24.0–0.0 dB | 0.0 (clip at ±1.0) |
#[derive(Debug, Clone)]
pub struct HardClipper {
    ceiling_db: f32,
    threshold: f32,
}

impl HardClipper {
    /// Clipper at 0 dBFS.
    pub fn new(_sample_rate: f32) -> Self {
        Self {
            ceiling_db: 0.0,
            threshold: 1.0,
        }
    }

    /// Set the ceiling in dB (−24 to 0).
    pub fn set_ceiling_db(&mut self, db: f32) {
        self.ceiling_db = db.clamp(-24.0, 0.0);
        self.threshold = db_to_linear(self.ceiling_db);
    }

    /// Ceiling in dB.
    pub fn ceiling_db(&self) -> f32 {
        self.ceiling_db
    }

    /// Linear clip threshold.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

impl Effect for HardClipper {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        hard_clip(input, self.threshold)
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        (hard_clip(left, self.threshold), hard_clip(right, self.threshold))
    }

    fn set_sample_rate(&mut self, _sample_rate: f32) {}

    fn reset(&mut self) {}
}

rackfx_core::impl_params! {
    HardClipper, this {
        [0] ParamDescriptor::gain_db("Ceiling", "Ceil", -24.0, 0.0, 0.0)
                .with_id(ParamId(200), "clip_ceiling"),
            get: this.ceiling_db,
            set: |v| this.set_ceiling_db(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rackfx_core::ParameterInfo;

    #[test]
    fn test_gain_ramps_then_settles() {
        let mut g = Gain::new(48000.0);
        g.set_param(0, 20.0 * libm::log10f(2.0));
        let first = g.process(1.0);
        assert!(first > 1.0 && first < 1.1, "ramp starts near unity, got {first}");
        let mut last = first;
        for _ in 0..480 {
            last = g.process(1.0);
        }
        assert!((last - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_gain_reset_snaps() {
        let mut g = Gain::new(48000.0);
        g.set_gain_db(-6.0);
        g.reset();
        let (l, r) = g.process_stereo(1.0, -1.0);
        assert!((l - 0.501).abs() < 1e-3);
        assert_eq!(l, -r);
    }

    #[test]
    fn test_gain_param_range() {
        let mut g = Gain::new(48000.0);
        g.set_param(0, 100.0);
        assert!((g.get_param(0) - 24.0).abs() < 1e-3);
        g.set_param(0, -100.0);
        assert!((g.get_param(0) + 60.0).abs() < 1e-2);
    }

    #[test]
    fn test_clipper_default_ceiling_is_unity() {
        let mut c = HardClipper::new(48000.0);
        assert_eq!(c.threshold(), 1.0);
        assert_eq!(c.process(1.2), 1.0);
        assert_eq!(c.process(-3.0), -1.0);
        assert_eq!(c.process(0.6), 0.6);
    }

    #[test]
    fn test_clipper_ceiling_param() {
        let mut c = HardClipper::new(48000.0);
        c.set_param(0, -6.0);
        assert!((c.threshold() - 0.501).abs() < 1e-3);
        let (l, r) = c.process_stereo(0.9, -0.9);
        assert_eq!(l, c.threshold());
        assert_eq!(r, -c.threshold());
        c.set_param(0, 5.0);
        assert_eq!(c.get_param(0), 0.0);
    }
}
