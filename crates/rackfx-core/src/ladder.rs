//! Four-pole ladder filter with input saturation.
//!
//! Zero-delay-feedback model of the classic transistor ladder: the input is
//! driven through `tanh`, then through four cascaded trapezoidal one-pole
//! stages with global feedback `K` from the last stage. The feedback loop is
//! solved analytically each sample, so resonance stays tuned at any cutoff.
//!
//! The cutoff is pre-warped with the bilinear transform (`g = tan(pi fc / fs)`)
//! so the −3 dB point lands on the requested frequency right up to Nyquist.
//!
//! # Mode switching
//!
//! Low-pass and high-pass share the same stage state but produce very
//! different outputs from it. [`LadderFilter::set_mode`] therefore schedules a
//! state clear that happens on the next [`process_sample`](LadderFilter::process_sample),
//! avoiding a transient built from the old topology.
//!
//! # Reference
//!
//! Vadim Zavalishin, "The Art of VA Filter Design", ch. 5 (ladder filter).

use core::f32::consts::PI;

use crate::MAX_CHANNELS;

/// Feedback gain at full resonance. Self-oscillation begins at 4.0.
pub const MAX_FEEDBACK: f32 = 3.96;

/// Ladder output topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LadderMode {
    /// 24 dB/oct low-pass.
    #[default]
    LowPass,
    /// 24 dB/oct high-pass, mixed from the stage taps.
    HighPass,
}

impl LadderMode {
    /// Maps a stepped parameter value (0 or 1) to a mode.
    pub fn from_index(index: f32) -> Self {
        if index >= 0.5 {
            Self::HighPass
        } else {
            Self::LowPass
        }
    }

    /// Inverse of [`from_index`](Self::from_index).
    pub fn index(self) -> f32 {
        match self {
            Self::LowPass => 0.0,
            Self::HighPass => 1.0,
        }
    }
}

/// Nonlinear four-pole ladder with per-channel state.
///
/// ```rust
/// use rackfx_core::{LadderFilter, LadderMode};
///
/// let mut f = LadderFilter::new(48000.0);
/// f.set_cutoff(800.0);
/// f.set_resonance(0.3);
/// f.set_mode(LadderMode::HighPass);
/// let y = f.process_sample(0.25, 0);
/// assert!(y.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct LadderFilter {
    sample_rate: f32,
    cutoff: f32,
    resonance: f32,
    drive: f32,
    mode: LadderMode,
    /// Stage gain `g / (1 + g)`.
    big_g: f32,
    /// `1 / (1 + g)`, scales stage state into its output contribution.
    state_scale: f32,
    k: f32,
    state: [[f32; 4]; MAX_CHANNELS],
    pending_reset: bool,
}

impl LadderFilter {
    /// Creates a low-pass ladder at 1 kHz, no resonance, unity drive.
    pub fn new(sample_rate: f32) -> Self {
        let mut f = Self {
            sample_rate,
            cutoff: 1000.0,
            resonance: 0.0,
            drive: 1.0,
            mode: LadderMode::LowPass,
            big_g: 0.0,
            state_scale: 1.0,
            k: 0.0,
            state: [[0.0; 4]; MAX_CHANNELS],
            pending_reset: false,
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

    /// Sets the cutoff in Hz. Clamped to `10 Hz ..= 0.49 fs`.
    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        self.cutoff = cutoff_hz;
        self.update_coefficients();
    }

    /// Sets resonance in `0.0..=1.0`.
    pub fn set_resonance(&mut self, resonance: f32) {
        self.resonance = resonance.clamp(0.0, 1.0);
        self.k = self.resonance * MAX_FEEDBACK;
    }

    /// Sets the input drive (linear gain into `tanh`), minimum 0.1.
    pub fn set_drive(&mut self, drive: f32) {
        self.drive = drive.max(0.1);
    }

    /// Switches topology. History is cleared on the next processed sample
    /// if the mode actually changed.
    pub fn set_mode(&mut self, mode: LadderMode) {
        if mode != self.mode {
            self.mode = mode;
            self.pending_reset = true;
        }
    }

    /// Current cutoff as requested (before clamping).
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Current resonance.
    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    /// Current drive.
    pub fn drive(&self) -> f32 {
        self.drive
    }

    /// Current mode.
    pub fn mode(&self) -> LadderMode {
        self.mode
    }

    /// Feedback gain `K` derived from resonance.
    pub fn feedback_gain(&self) -> f32 {
        self.k
    }

    /// Clears all channel state.
    pub fn reset(&mut self) {
        self.state = [[0.0; 4]; MAX_CHANNELS];
        self.pending_reset = false;
    }

    /// Processes one sample on `channel`. Channels at or beyond
    /// [`MAX_CHANNELS`] pass through untouched.
    #[inline]
    pub fn process_sample(&mut self, input: f32, channel: usize) -> f32 {
        if self.pending_reset {
            self.reset();
        }
        let Some(s) = self.state.get_mut(channel) else {
            return input;
        };

        let big_g = self.big_g;
        let scale = self.state_scale;

        // Instantaneous response of the cascade: y4 = G^4 u + sigma.
        let sigma = big_g * big_g * big_g * s[0] * scale
            + big_g * big_g * s[1] * scale
            + big_g * s[2] * scale
            + s[3] * scale;
        let g4 = big_g * big_g * big_g * big_g;

        let driven = libm::tanhf(self.drive * input);
        let u = (driven - self.k * sigma) / (1.0 + self.k * g4);

        let mut stage_in = u;
        let mut taps = [0.0_f32; 4];
        for (tap, st) in taps.iter_mut().zip(s.iter_mut()) {
            let v = (stage_in - *st) * big_g;
            let y = v + *st;
            *st = crate::flush_denormal(y + v);
            *tap = y;
            stage_in = y;
        }

        match self.mode {
            LadderMode::LowPass => taps[3],
            LadderMode::HighPass => u - 4.0 * taps[0] + 6.0 * taps[1] - 4.0 * taps[2] + taps[3],
        }
    }

    fn update_coefficients(&mut self) {
        let fc = self.cutoff.clamp(10.0, self.sample_rate * 0.49);
        let g = libm::tanf(PI * fc / self.sample_rate);
        self.big_g = g / (1.0 + g);
        self.state_scale = 1.0 / (1.0 + g);
    }
}

impl Default for LadderFilter {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(f: &mut LadderFilter, x: f32, n: usize) -> f32 {
        let mut y = 0.0;
        for _ in 0..n {
            y = f.process_sample(x, 0);
        }
        y
    }

    #[test]
    fn test_lowpass_dc_follows_saturated_input() {
        let mut f = LadderFilter::new(48000.0);
        let y = settle(&mut f, 0.5, 20_000);
        assert!((y - libm::tanhf(0.5)).abs() < 1e-3, "got {y}");
    }

    #[test]
    fn test_resonance_lowers_dc_gain() {
        let mut f = LadderFilter::new(48000.0);
        f.set_resonance(1.0);
        let y = settle(&mut f, 0.1, 40_000);
        let expected = libm::tanhf(0.1) / (1.0 + MAX_FEEDBACK);
        assert!((y - expected).abs() < 1e-3, "got {y}, expected {expected}");
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let mut f = LadderFilter::new(48000.0);
        f.set_mode(LadderMode::HighPass);
        let y = settle(&mut f, 0.5, 20_000);
        assert!(y.abs() < 1e-3, "got {y}");
    }

    #[test]
    fn test_mode_change_clears_history() {
        let mut used = LadderFilter::new(48000.0);
        settle(&mut used, 0.8, 1000);
        used.set_mode(LadderMode::HighPass);

        let mut fresh = LadderFilter::new(48000.0);
        fresh.set_mode(LadderMode::HighPass);

        let a = used.process_sample(0.3, 0);
        let b = fresh.process_sample(0.3, 0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_same_mode_keeps_history() {
        let mut f = LadderFilter::new(48000.0);
        settle(&mut f, 0.8, 1000);
        f.set_mode(LadderMode::LowPass);
        let y = f.process_sample(0.0, 0);
        assert!(y > 0.1, "history should survive a no-op mode set, got {y}");
    }

    #[test]
    fn test_channels_independent() {
        let mut f = LadderFilter::new(48000.0);
        for _ in 0..500 {
            f.process_sample(1.0, 0);
        }
        assert_eq!(f.process_sample(0.0, 1), 0.0);
    }

    #[test]
    fn test_out_of_range_channel_passes_through() {
        let mut f = LadderFilter::new(48000.0);
        assert_eq!(f.process_sample(0.42, MAX_CHANNELS), 0.42);
    }

    #[test]
    fn test_prewarp_accurate_near_nyquist() {
        // A sine at the cutoff should come out of a 4-pole cascade at about
        // (1/sqrt(2))^4 = 0.25 for no resonance, even close to Nyquist.
        let sr = 48000.0;
        let fc = 15000.0;
        let mut f = LadderFilter::new(sr);
        f.set_cutoff(fc);
        f.set_drive(0.1);
        let amp = 0.1;
        let mut peak = 0.0_f32;
        for i in 0..48_000 {
            let x = amp * libm::sinf(2.0 * PI * fc * i as f32 / sr);
            let y = f.process_sample(x, 0);
            if i > 40_000 {
                peak = peak.max(y.abs());
            }
        }
        // tanh(0.1 * 0.1) is effectively linear.
        let gain = peak / (amp * 0.1);
        assert!((gain - 0.25).abs() < 0.03, "gain at cutoff {gain}");
    }

    #[test]
    fn test_full_resonance_stays_bounded() {
        let mut f = LadderFilter::new(44100.0);
        f.set_resonance(1.0);
        f.set_cutoff(20_000.0);
        for i in 0..44_100 {
            let x = if i == 0 { 1.0 } else { 0.0 };
            let y = f.process_sample(x, 1);
            assert!(y.is_finite() && y.abs() < 10.0);
        }
    }

    #[test]
    fn test_mode_index_mapping() {
        assert_eq!(LadderMode::from_index(0.0), LadderMode::LowPass);
        assert_eq!(LadderMode::from_index(1.0), LadderMode::HighPass);
        assert_eq!(LadderMode::HighPass.index(), 1.0);
    }
}
