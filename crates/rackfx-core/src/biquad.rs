//! Biquad (bi-quadratic) filters.
//!
//! [`BiquadCoefficients::design`] computes normalized coefficients for eight
//! response shapes using the RBJ Audio EQ Cookbook formulas, and
//! [`BiquadFilter`] runs them in Direct Form I with independent state per
//! channel. Coefficient updates are O(1) and never allocate.
//!
//! The cookbook designs are themselves bilinear transforms with the analog
//! prototype pre-warped to the target frequency, so the centre or corner
//! frequency is exact at any sample rate.

use core::f32::consts::PI;
use libm::{cosf, powf, sinf, sqrtf};

use crate::MAX_CHANNELS;

/// Response shape of a [`BiquadFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BiquadKind {
    /// 12 dB/oct low-pass.
    #[default]
    LowPass,
    /// 12 dB/oct high-pass.
    HighPass,
    /// Constant 0 dB peak band-pass.
    BandPass,
    /// Band-reject.
    Notch,
    /// Flat magnitude, phase rotation around the frequency.
    AllPass,
    /// Peaking EQ bell.
    Peak,
    /// Low shelf.
    LowShelf,
    /// High shelf.
    HighShelf,
}

impl BiquadKind {
    /// All kinds in parameter-index order.
    pub const ALL: [BiquadKind; 8] = [
        BiquadKind::LowPass,
        BiquadKind::HighPass,
        BiquadKind::BandPass,
        BiquadKind::Notch,
        BiquadKind::AllPass,
        BiquadKind::Peak,
        BiquadKind::LowShelf,
        BiquadKind::HighShelf,
    ];

    /// Maps a stepped parameter value to a kind, clamping out-of-range input.
    pub fn from_index(index: f32) -> Self {
        let i = libm::roundf(index).clamp(0.0, 7.0) as usize;
        Self::ALL[i]
    }

    /// Parameter-index of this kind.
    pub fn index(self) -> f32 {
        Self::ALL.iter().position(|k| *k == self).unwrap_or(0) as f32
    }

    /// Whether the gain parameter affects this kind.
    pub fn uses_gain(self) -> bool {
        matches!(self, Self::Peak | Self::LowShelf | Self::HighShelf)
    }
}

/// Normalized Direct Form coefficients (`a0 == 1`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    /// Feedforward.
    pub b0: f32,
    /// Feedforward.
    pub b1: f32,
    /// Feedforward.
    pub b2: f32,
    /// Feedback.
    pub a1: f32,
    /// Feedback.
    pub a2: f32,
}

impl BiquadCoefficients {
    /// Passthrough: `y[n] = x[n]`.
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Designs coefficients for `kind`.
    ///
    /// `frequency` is clamped to `1 Hz ..= 0.49 fs` and `q` to at least
    /// 0.05. `gain_db` only affects peak and shelf kinds.
    pub fn design(
        kind: BiquadKind,
        frequency: f32,
        q: f32,
        gain_db: f32,
        sample_rate: f32,
    ) -> Self {
        let frequency = frequency.clamp(1.0, sample_rate * 0.49);
        let q = q.max(0.05);
        let omega = 2.0 * PI * frequency / sample_rate;
        let cos_w = cosf(omega);
        let sin_w = sinf(omega);
        let alpha = sin_w / (2.0 * q);
        let a = powf(10.0, gain_db / 40.0);

        let (b0, b1, b2, a0, a1, a2) = match kind {
            BiquadKind::LowPass => {
                let b = (1.0 - cos_w) / 2.0;
                (b, 1.0 - cos_w, b, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha)
            }
            BiquadKind::HighPass => {
                let b = (1.0 + cos_w) / 2.0;
                (b, -(1.0 + cos_w), b, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha)
            }
            BiquadKind::BandPass => (alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha),
            BiquadKind::Notch => (
                1.0,
                -2.0 * cos_w,
                1.0,
                1.0 + alpha,
                -2.0 * cos_w,
                1.0 - alpha,
            ),
            BiquadKind::AllPass => (
                1.0 - alpha,
                -2.0 * cos_w,
                1.0 + alpha,
                1.0 + alpha,
                -2.0 * cos_w,
                1.0 - alpha,
            ),
            BiquadKind::Peak => (
                1.0 + alpha * a,
                -2.0 * cos_w,
                1.0 - alpha * a,
                1.0 + alpha / a,
                -2.0 * cos_w,
                1.0 - alpha / a,
            ),
            BiquadKind::LowShelf => {
                let two_sqrt_a_alpha = 2.0 * sqrtf(a) * alpha;
                (
                    a * ((a + 1.0) - (a - 1.0) * cos_w + two_sqrt_a_alpha),
                    2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w),
                    a * ((a + 1.0) - (a - 1.0) * cos_w - two_sqrt_a_alpha),
                    (a + 1.0) + (a - 1.0) * cos_w + two_sqrt_a_alpha,
                    -2.0 * ((a - 1.0) + (a + 1.0) * cos_w),
                    (a + 1.0) + (a - 1.0) * cos_w - two_sqrt_a_alpha,
                )
            }
            BiquadKind::HighShelf => {
                let two_sqrt_a_alpha = 2.0 * sqrtf(a) * alpha;
                (
                    a * ((a + 1.0) + (a - 1.0) * cos_w + two_sqrt_a_alpha),
                    -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w),
                    a * ((a + 1.0) + (a - 1.0) * cos_w - two_sqrt_a_alpha),
                    (a + 1.0) - (a - 1.0) * cos_w + two_sqrt_a_alpha,
                    2.0 * ((a - 1.0) - (a + 1.0) * cos_w),
                    (a + 1.0) - (a - 1.0) * cos_w - two_sqrt_a_alpha,
                )
            }
        };

        let inv = 1.0 / a0;
        Self {
            b0: b0 * inv,
            b1: b1 * inv,
            b2: b2 * inv,
            a1: a1 * inv,
            a2: a2 * inv,
        }
    }

    /// Magnitude response at `frequency`, evaluated on the unit circle.
    pub fn magnitude(&self, frequency: f32, sample_rate: f32) -> f32 {
        let w = 2.0 * PI * frequency / sample_rate;
        let (c1, s1) = (cosf(w), sinf(w));
        let (c2, s2) = (cosf(2.0 * w), sinf(2.0 * w));
        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = 1.0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);
        sqrtf((num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im))
    }
}

impl Default for BiquadCoefficients {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Direct Form I history for one channel.
#[derive(Debug, Clone, Copy, Default)]
struct History {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

/// Second-order IIR filter with per-channel state.
///
/// Implements the Direct Form I structure:
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
///                - a1*y[n-1] - a2*y[n-2]
/// ```
///
/// ```rust
/// use rackfx_core::{BiquadFilter, BiquadKind};
///
/// let mut lp = BiquadFilter::new(BiquadKind::LowPass, 48000.0);
/// lp.set_frequency(2000.0);
/// let y = lp.process_sample(1.0, 0);
/// assert!(y > 0.0 && y < 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    kind: BiquadKind,
    frequency: f32,
    q: f32,
    gain_db: f32,
    sample_rate: f32,
    coeffs: BiquadCoefficients,
    history: [History; MAX_CHANNELS],
}

impl BiquadFilter {
    /// Creates a filter at 1 kHz, Q 0.707, 0 dB gain.
    pub fn new(kind: BiquadKind, sample_rate: f32) -> Self {
        let mut f = Self {
            kind,
            frequency: 1000.0,
            q: core::f32::consts::FRAC_1_SQRT_2,
            gain_db: 0.0,
            sample_rate,
            coeffs: BiquadCoefficients::IDENTITY,
            history: [History::default(); MAX_CHANNELS],
        };
        f.update();
        f
    }

    /// Sets the sample rate, recomputes coefficients and clears state.
    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.update();
        self.reset();
    }

    /// Changes the response shape. State is kept.
    pub fn set_kind(&mut self, kind: BiquadKind) {
        if kind != self.kind {
            self.kind = kind;
            self.update();
        }
    }

    /// Sets the corner or centre frequency in Hz.
    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
        self.update();
    }

    /// Sets the quality factor.
    pub fn set_q(&mut self, q: f32) {
        self.q = q;
        self.update();
    }

    /// Sets the gain in dB (peak and shelf kinds).
    pub fn set_gain_db(&mut self, gain_db: f32) {
        self.gain_db = gain_db;
        if self.kind.uses_gain() {
            self.update();
        }
    }

    /// Sets frequency, Q and gain with a single coefficient recompute.
    pub fn set_parameters(&mut self, frequency: f32, q: f32, gain_db: f32) {
        self.frequency = frequency;
        self.q = q;
        self.gain_db = gain_db;
        self.update();
    }

    /// Current kind.
    pub fn kind(&self) -> BiquadKind {
        self.kind
    }

    /// Current frequency.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Current coefficients.
    pub fn coefficients(&self) -> BiquadCoefficients {
        self.coeffs
    }

    /// Clears history on all channels.
    pub fn reset(&mut self) {
        self.history = [History::default(); MAX_CHANNELS];
    }

    /// Processes one sample on `channel`. Channels at or beyond
    /// [`MAX_CHANNELS`] pass through untouched.
    #[inline]
    pub fn process_sample(&mut self, input: f32, channel: usize) -> f32 {
        let Some(h) = self.history.get_mut(channel) else {
            return input;
        };
        let c = &self.coeffs;
        let output = c.b0 * input + c.b1 * h.x1 + c.b2 * h.x2 - c.a1 * h.y1 - c.a2 * h.y2;
        h.x2 = h.x1;
        h.x1 = input;
        h.y2 = h.y1;
        h.y1 = crate::flush_denormal(output);
        output
    }

    fn update(&mut self) {
        self.coeffs = BiquadCoefficients::design(
            self.kind,
            self.frequency,
            self.q,
            self.gain_db,
            self.sample_rate,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48000.0;

    fn design(kind: BiquadKind, gain_db: f32) -> BiquadCoefficients {
        BiquadCoefficients::design(kind, 1000.0, core::f32::consts::FRAC_1_SQRT_2, gain_db, SR)
    }

    #[test]
    fn test_lowpass_highpass_shapes() {
        let lp = design(BiquadKind::LowPass, 0.0);
        assert!((lp.magnitude(10.0, SR) - 1.0).abs() < 1e-3);
        assert!((lp.magnitude(1000.0, SR) - core::f32::consts::FRAC_1_SQRT_2).abs() < 1e-3);
        assert!(lp.magnitude(20000.0, SR) < 0.01);

        let hp = design(BiquadKind::HighPass, 0.0);
        assert!(hp.magnitude(10.0, SR) < 1e-3);
        assert!((hp.magnitude(20000.0, SR) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_bandpass_notch_allpass() {
        assert!((design(BiquadKind::BandPass, 0.0).magnitude(1000.0, SR) - 1.0).abs() < 1e-3);
        assert!(design(BiquadKind::Notch, 0.0).magnitude(1000.0, SR) < 1e-3);
        let ap = design(BiquadKind::AllPass, 0.0);
        for f in [50.0, 1000.0, 9000.0] {
            assert!((ap.magnitude(f, SR) - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_peak_and_shelves() {
        let boost = libm::powf(10.0, 6.0 / 20.0);
        assert!((design(BiquadKind::Peak, 6.0).magnitude(1000.0, SR) - boost).abs() < 0.01);
        assert!((design(BiquadKind::LowShelf, 6.0).magnitude(20.0, SR) - boost).abs() < 0.02);
        assert!((design(BiquadKind::HighShelf, 6.0).magnitude(20000.0, SR) - boost).abs() < 0.05);
        // Gain is ignored by non-gain kinds.
        assert_eq!(design(BiquadKind::LowPass, 12.0), design(BiquadKind::LowPass, 0.0));
    }

    #[test]
    fn test_frequency_clamped_below_nyquist() {
        let c = BiquadCoefficients::design(BiquadKind::LowPass, 1e6, 0.707, 0.0, SR);
        assert!(c.b0.is_finite() && c.a1.is_finite());
    }

    #[test]
    fn test_channels_independent() {
        let mut f = BiquadFilter::new(BiquadKind::LowPass, SR);
        for _ in 0..100 {
            f.process_sample(1.0, 0);
        }
        assert_eq!(f.process_sample(0.0, 1), 0.0);
        assert_eq!(f.process_sample(0.5, 7), 0.5);
    }

    #[test]
    fn test_lowpass_dc_settles_to_unity() {
        let mut f = BiquadFilter::new(BiquadKind::LowPass, SR);
        let mut y = 0.0;
        for _ in 0..10_000 {
            y = f.process_sample(1.0, 0);
        }
        assert!((y - 1.0).abs() < 1e-4);
        f.reset();
        assert!(f.process_sample(0.0, 0).abs() < 1e-9);
    }

    #[test]
    fn test_kind_index_round_trip() {
        for (i, kind) in BiquadKind::ALL.iter().enumerate() {
            assert_eq!(BiquadKind::from_index(i as f32), *kind);
            assert_eq!(kind.index(), i as f32);
        }
        assert_eq!(BiquadKind::from_index(42.0), BiquadKind::HighShelf);
    }
}
