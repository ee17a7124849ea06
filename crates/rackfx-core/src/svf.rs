//! State Variable Filter (SVF) with simultaneous outputs.
//!
//! Topology-preserving transform (TPT) SVF after Cytomic (Andrew Simper).
//! One evaluation yields low-pass, band-pass, high-pass, notch and all-pass
//! outputs, all from the same two integrator states per channel.
//!
//! ```text
//! g  = tan(pi * fc / fs)
//! k  = 1 / Q
//! v3 = x - ic2
//! v1 = (g * v3 + ic1) / (1 + g * (g + k))
//! v2 = ic2 + g * v1
//! ic1 = 2 v1 - ic1
//! ic2 = 2 v2 - ic2
//! ```

use core::f32::consts::PI;

use crate::MAX_CHANNELS;

/// All responses produced by one SVF step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SvfOutputs {
    /// 12 dB/oct low-pass.
    pub low: f32,
    /// Band-pass (peak gain `Q`).
    pub band: f32,
    /// 12 dB/oct high-pass.
    pub high: f32,
    /// Band-reject.
    pub notch: f32,
    /// Unity-magnitude all-pass.
    pub all_pass: f32,
}

/// TPT state-variable filter with per-channel state.
#[derive(Debug, Clone)]
pub struct StateVariableFilter {
    sample_rate: f32,
    cutoff: f32,
    q: f32,
    g: f32,
    k: f32,
    /// `1 / (1 + g (g + k))`
    a1: f32,
    ic1: [f32; MAX_CHANNELS],
    ic2: [f32; MAX_CHANNELS],
}

impl StateVariableFilter {
    /// Creates a filter at 1 kHz with Butterworth Q.
    pub fn new(sample_rate: f32) -> Self {
        let mut f = Self {
            sample_rate,
            cutoff: 1000.0,
            q: core::f32::consts::FRAC_1_SQRT_2,
            g: 0.0,
            k: 0.0,
            a1: 0.0,
            ic1: [0.0; MAX_CHANNELS],
            ic2: [0.0; MAX_CHANNELS],
        };
        f.update_coefficients();
        f
    }

    /// Sets the sample rate, recomputes coefficients and clears state.
    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.update_coefficients();
        self.reset();
    }

    /// Sets cutoff in Hz, clamped to `1 Hz ..= 0.49 fs`.
    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.cutoff = cutoff;
        self.update_coefficients();
    }

    /// Sets Q, minimum 0.1.
    pub fn set_q(&mut self, q: f32) {
        self.q = q.max(0.1);
        self.update_coefficients();
    }

    /// Current cutoff.
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Current Q.
    pub fn q(&self) -> f32 {
        self.q
    }

    /// Clears integrator state.
    pub fn reset(&mut self) {
        self.ic1 = [0.0; MAX_CHANNELS];
        self.ic2 = [0.0; MAX_CHANNELS];
    }

    /// Runs one step on `channel` and returns every output. Channels at or
    /// beyond [`MAX_CHANNELS`] return the input on every output.
    #[inline]
    pub fn process_all(&mut self, input: f32, channel: usize) -> SvfOutputs {
        if channel >= MAX_CHANNELS {
            return SvfOutputs {
                low: input,
                band: input,
                high: input,
                notch: input,
                all_pass: input,
            };
        }
        let ic1 = self.ic1[channel];
        let ic2 = self.ic2[channel];

        let v3 = input - ic2;
        let v1 = (self.g * v3 + ic1) * self.a1;
        let v2 = ic2 + self.g * v1;

        self.ic1[channel] = crate::flush_denormal(2.0 * v1 - ic1);
        self.ic2[channel] = crate::flush_denormal(2.0 * v2 - ic2);

        let low = v2;
        let band = v1;
        let high = input - self.k * v1 - v2;
        SvfOutputs {
            low,
            band,
            high,
            notch: low + high,
            all_pass: input - 2.0 * self.k * band,
        }
    }

    /// Low-pass output only.
    #[inline]
    pub fn process_sample(&mut self, input: f32, channel: usize) -> f32 {
        self.process_all(input, channel).low
    }

    fn update_coefficients(&mut self) {
        let fc = self.cutoff.clamp(1.0, self.sample_rate * 0.49);
        self.g = libm::tanf(PI * fc / self.sample_rate);
        self.k = 1.0 / self.q;
        self.a1 = 1.0 / (1.0 + self.g * (self.g + self.k));
    }
}

impl Default for StateVariableFilter {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rms_at(f: &mut StateVariableFilter, freq: f32, pick: fn(SvfOutputs) -> f32) -> f32 {
        let sr = 48000.0;
        f.reset();
        let mut sum = 0.0;
        let mut count = 0;
        for i in 0..24_000 {
            let x = libm::sinf(2.0 * PI * freq * i as f32 / sr);
            let y = pick(f.process_all(x, 0));
            if i >= 12_000 {
                sum += y * y;
                count += 1;
            }
        }
        libm::sqrtf(sum / count as f32) * core::f32::consts::SQRT_2
    }

    #[test]
    fn test_lowpass_and_highpass_at_cutoff() {
        let mut f = StateVariableFilter::new(48000.0);
        f.set_cutoff(1000.0);
        let lp = rms_at(&mut f, 1000.0, |o| o.low);
        let hp = rms_at(&mut f, 1000.0, |o| o.high);
        assert!((lp - 0.707).abs() < 0.02, "lp {lp}");
        assert!((hp - 0.707).abs() < 0.02, "hp {hp}");
    }

    #[test]
    fn test_notch_rejects_cutoff() {
        let mut f = StateVariableFilter::new(48000.0);
        f.set_q(2.0);
        let notch = rms_at(&mut f, 1000.0, |o| o.notch);
        assert!(notch < 0.02, "notch {notch}");
    }

    #[test]
    fn test_allpass_unity_magnitude() {
        let mut f = StateVariableFilter::new(48000.0);
        for freq in [100.0, 1000.0, 8000.0] {
            let ap = rms_at(&mut f, freq, |o| o.all_pass);
            assert!((ap - 1.0).abs() < 0.02, "allpass at {freq}: {ap}");
        }
    }

    #[test]
    fn test_channels_independent() {
        let mut f = StateVariableFilter::new(48000.0);
        for _ in 0..100 {
            f.process_sample(1.0, 1);
        }
        assert_eq!(f.process_sample(0.0, 0), 0.0);
        assert_eq!(f.process_sample(0.3, 9), 0.3);
    }
}
