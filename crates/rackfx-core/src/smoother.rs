//! Parameter smoothing for zipper-free control changes.
//!
//! Audio parameters (gain, cutoff, mix, etc.) need smooth transitions to avoid
//! audible "zipper noise" when values change. [`ParameterSmoother`] ramps from
//! its current value towards a target one sample at a time.
//!
//! ## Threading
//!
//! The target lives in a [`SmootherTarget`]: an `Arc`'d atomic `f32` that any
//! thread may write. The ramp state (current value, step, remaining samples)
//! is owned by the smoother and only advanced by the thread that processes
//! audio. A new target is picked up on the next [`next_value`] or [`skip`]
//! call.
//!
//! ## Smoothing Styles
//!
//! - **Linear**: Constant rate of change, arrives exactly after the ramp time
//! - **Exponential (one-pole lowpass)**: Natural decay, snaps once within 1e-6
//!
//! Both styles converge monotonically and never overshoot the target.
//!
//! ## Usage
//!
//! ```rust
//! use rackfx_core::ParameterSmoother;
//!
//! let mut gain = ParameterSmoother::new(1.0);
//! gain.reset(48000.0, 0.010); // 10 ms ramp
//!
//! // Any thread holding the handle may move the target.
//! let handle = gain.target_handle();
//! handle.set(0.5);
//!
//! // Audio thread: one value per sample.
//! for _ in 0..480 {
//!     let _g = gain.next_value();
//! }
//! assert_eq!(gain.current(), 0.5);
//! ```
//!
//! [`next_value`]: ParameterSmoother::next_value
//! [`skip`]: ParameterSmoother::skip

use core::sync::atomic::{AtomicU32, Ordering};

#[cfg(not(feature = "std"))]
use alloc::sync::Arc;
#[cfg(feature = "std")]
use std::sync::Arc;

use libm::{expf, powf};

/// Distance below which an exponential ramp snaps to its target.
const SETTLE_EPSILON: f32 = 1e-6;

/// An `f32` stored as raw bits in an [`AtomicU32`].
#[derive(Debug, Default)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    /// Create a new atomic float.
    pub const fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    /// Load the value.
    #[inline]
    pub fn load(&self, order: Ordering) -> f32 {
        f32::from_bits(self.0.load(order))
    }

    /// Store a value.
    #[inline]
    pub fn store(&self, value: f32, order: Ordering) {
        self.0.store(value.to_bits(), order);
    }
}

/// Cloneable handle to a smoother's target value.
///
/// Writes use `Release` and reads use `Acquire`, so a target set before a
/// `process()` call is visible to that call.
#[derive(Debug, Clone)]
pub struct SmootherTarget(Arc<AtomicF32>);

impl SmootherTarget {
    /// Create a standalone target with an initial value.
    pub fn new(value: f32) -> Self {
        Self(Arc::new(AtomicF32::new(value)))
    }

    /// Set a new target. Non-finite values are ignored.
    #[inline]
    pub fn set(&self, value: f32) {
        if value.is_finite() {
            self.0.store(value, Ordering::Release);
        }
    }

    /// Read the current target.
    #[inline]
    pub fn get(&self) -> f32 {
        self.0.load(Ordering::Acquire)
    }
}

/// How a [`ParameterSmoother`] approaches its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmoothingStyle {
    /// Fixed-length linear ramp. Arrives exactly after the ramp time.
    #[default]
    Linear,
    /// One-pole lowpass with the ramp time as its time constant.
    Exponential,
}

/// Sample-accurate ramp from the current value to an atomically set target.
///
/// Cloning a smoother produces an independent target; use
/// [`target_handle`](Self::target_handle) to share one.
#[derive(Debug)]
pub struct ParameterSmoother {
    target: SmootherTarget,
    style: SmoothingStyle,
    current: f32,
    /// Target the active ramp was started towards.
    ramp_target: f32,
    /// Linear increment per sample.
    step: f32,
    /// Direction of the active ramp. Fixed when the ramp starts so rounding
    /// in the summed steps cannot flip the clamp.
    rising: bool,
    steps_remaining: u32,
    /// Ramp length in samples (linear style).
    ramp_samples: u32,
    /// One-pole coefficient (exponential style). 1.0 means instant.
    coeff: f32,
    sample_rate: f32,
    ramp_seconds: f32,
}

impl ParameterSmoother {
    /// Create a linear smoother resting at `initial`.
    ///
    /// Smoothing is disabled (instant changes) until [`reset`](Self::reset)
    /// configures a ramp time.
    pub fn new(initial: f32) -> Self {
        Self::with_style(initial, SmoothingStyle::Linear)
    }

    /// Create a smoother with the given style, resting at `initial`.
    pub fn with_style(initial: f32, style: SmoothingStyle) -> Self {
        Self {
            target: SmootherTarget::new(initial),
            style,
            current: initial,
            ramp_target: initial,
            step: 0.0,
            rising: true,
            steps_remaining: 0,
            ramp_samples: 0,
            coeff: 1.0,
            sample_rate: 48000.0,
            ramp_seconds: 0.0,
        }
    }

    /// Create a smoother driven by an existing target handle.
    ///
    /// The smoother starts resting on the handle's current value.
    pub fn with_shared_target(target: SmootherTarget, style: SmoothingStyle) -> Self {
        let initial = target.get();
        Self {
            target,
            ..Self::with_style(initial, style)
        }
    }

    /// Create a linear smoother with full configuration.
    pub fn with_config(initial: f32, sample_rate: f32, ramp_seconds: f32) -> Self {
        let mut smoother = Self::new(initial);
        smoother.reset(sample_rate, ramp_seconds);
        smoother
    }

    /// 5 ms linear ramp, for gains and mix levels.
    pub fn fast(initial: f32, sample_rate: f32) -> Self {
        Self::with_config(initial, sample_rate, 0.005)
    }

    /// 10 ms linear ramp, the default for most controls.
    pub fn standard(initial: f32, sample_rate: f32) -> Self {
        Self::with_config(initial, sample_rate, 0.010)
    }

    /// 20 ms exponential ramp, for filter cutoff and resonance.
    pub fn slow(initial: f32, sample_rate: f32) -> Self {
        let mut smoother = Self::with_style(initial, SmoothingStyle::Exponential);
        smoother.reset(sample_rate, 0.020);
        smoother
    }

    /// Configure the ramp and jump to the current target.
    ///
    /// A `ramp_seconds` of zero (or a non-positive sample rate) makes every
    /// change instant.
    pub fn reset(&mut self, sample_rate: f32, ramp_seconds: f32) {
        self.sample_rate = sample_rate;
        self.ramp_seconds = ramp_seconds.max(0.0);
        self.recalculate();
        self.snap_to_target();
    }

    /// Change the sample rate, keeping the ramp time and any ramp in flight.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate();
    }

    /// Set the target value. Callable from any thread through a handle; this
    /// method exists for the owning thread's convenience.
    #[inline]
    pub fn set_target(&self, value: f32) {
        self.target.set(value);
    }

    /// Set target and current value together (no ramp).
    pub fn set_immediate(&mut self, value: f32) {
        self.target.set(value);
        self.snap_to_target();
    }

    /// A handle that writes this smoother's target from another thread.
    pub fn target_handle(&self) -> SmootherTarget {
        self.target.clone()
    }

    /// Advance one sample and return the smoothed value.
    #[inline]
    pub fn next_value(&mut self) -> f32 {
        self.follow_target();
        match self.style {
            SmoothingStyle::Linear => {
                if self.steps_remaining > 0 {
                    self.steps_remaining -= 1;
                    self.current = if self.steps_remaining == 0 {
                        self.ramp_target
                    } else {
                        self.clamp_to_ramp(self.current + self.step)
                    };
                }
            }
            SmoothingStyle::Exponential => {
                if self.current != self.ramp_target {
                    let next = self.current + self.coeff * (self.ramp_target - self.current);
                    self.current = self.clamp_to_ramp(next);
                    if (self.ramp_target - self.current).abs() < SETTLE_EPSILON {
                        self.current = self.ramp_target;
                    }
                }
            }
        }
        self.current
    }

    /// Advance `samples` samples at once and return the resulting value.
    ///
    /// Equivalent to calling [`next_value`](Self::next_value) `samples` times
    /// without a target change in between.
    pub fn skip(&mut self, samples: u32) -> f32 {
        if samples == 0 {
            return self.current;
        }
        self.follow_target();
        match self.style {
            SmoothingStyle::Linear => {
                if samples >= self.steps_remaining {
                    self.current = self.ramp_target;
                    self.steps_remaining = 0;
                } else {
                    self.current = self.clamp_to_ramp(self.current + self.step * samples as f32);
                    self.steps_remaining -= samples;
                }
            }
            SmoothingStyle::Exponential => {
                let decay = powf(1.0 - self.coeff, samples as f32);
                self.current = self.ramp_target + (self.current - self.ramp_target) * decay;
                if (self.ramp_target - self.current).abs() < SETTLE_EPSILON {
                    self.current = self.ramp_target;
                }
            }
        }
        self.current
    }

    /// Current smoothed value without advancing.
    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Most recently set target.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target.get()
    }

    /// Whether the smoother rests on its target.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.current == self.target.get()
    }

    /// Jump to the target immediately.
    pub fn snap_to_target(&mut self) {
        let target = self.target.get();
        self.current = target;
        self.ramp_target = target;
        self.step = 0.0;
        self.steps_remaining = 0;
    }

    /// Ramp time in seconds.
    pub fn ramp_seconds(&self) -> f32 {
        self.ramp_seconds
    }

    /// Smoothing style.
    pub fn style(&self) -> SmoothingStyle {
        self.style
    }

    #[inline]
    fn follow_target(&mut self) {
        let target = self.target.get();
        if target != self.ramp_target {
            self.begin_ramp(target);
        }
    }

    fn begin_ramp(&mut self, target: f32) {
        self.ramp_target = target;
        self.rising = target >= self.current;
        match self.style {
            SmoothingStyle::Linear if self.ramp_samples > 0 => {
                self.step = (target - self.current) / self.ramp_samples as f32;
                self.steps_remaining = self.ramp_samples;
            }
            SmoothingStyle::Exponential if self.coeff < 1.0 => {}
            _ => {
                self.current = target;
                self.step = 0.0;
                self.steps_remaining = 0;
            }
        }
    }

    /// Keep a value on the near side of the ramp target.
    #[inline]
    fn clamp_to_ramp(&self, value: f32) -> f32 {
        if self.rising {
            value.min(self.ramp_target)
        } else {
            value.max(self.ramp_target)
        }
    }

    /// Recompute ramp length and one-pole coefficient.
    ///
    /// The exponential coefficient uses `coeff = 1 - exp(-1 / (tau * sr))`,
    /// reaching 63.2% of a step after one ramp time.
    fn recalculate(&mut self) {
        let samples = self.ramp_seconds * self.sample_rate;
        if samples < 1.0 || self.sample_rate <= 0.0 {
            self.ramp_samples = 0;
            self.coeff = 1.0;
        } else {
            self.ramp_samples = samples as u32;
            self.coeff = 1.0 - expf(-1.0 / samples);
        }
    }
}

impl Clone for ParameterSmoother {
    fn clone(&self) -> Self {
        Self {
            target: SmootherTarget::new(self.target.get()),
            ..*self
        }
    }
}

impl Default for ParameterSmoother {
    fn default() -> Self {
        Self::new(0.0)
    }
}
