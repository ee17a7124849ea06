//! RackFx Effects - Processing units for the effect chain
//!
//! Every unit implements [`Effect`](rackfx_core::Effect) and
//! [`ParameterInfo`](rackfx_core::ParameterInfo) and produces a fully wet
//! signal; dry/wet blending is left to the chain's processor wrapper.
//!
//! - [`Gain`] - Smoothed gain stage
//! - [`HardClipper`] - Clip at an adjustable ceiling
//! - [`LadderFilterUnit`] - Four-pole ladder, low-pass or high-pass
//! - [`BiquadFilterUnit`] - RBJ biquad in eight shapes
//! - [`Delay`] - Feedback echo with damping and ping-pong
//! - [`Bitcrusher`] - Bit depth and sample rate reduction
//! - [`BandSplit`] - Three-band LR4 split with per-band gain
//! - [`SampleDelay`] - Whole-sample delay that reports latency
//!
//! ## Example
//!
//! ```rust
//! use rackfx_core::Effect;
//! use rackfx_effects::{Gain, HardClipper};
//!
//! let mut gain = Gain::new(48000.0);
//! gain.set_gain_db(6.0206);
//! gain.reset();
//! let mut clip = HardClipper::new(48000.0);
//!
//! let y = clip.process(gain.process(0.6));
//! assert!((y - 1.0).abs() < 1e-6);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod bandsplit;
pub mod bitcrusher;
pub mod delay;
pub mod filter;
pub mod gain;

pub use bandsplit::BandSplit;
pub use bitcrusher::Bitcrusher;
pub use delay::{Delay, MAX_SAMPLE_DELAY, SampleDelay};
pub use filter::{BiquadFilterUnit, LadderFilterUnit};
pub use gain::{Gain, HardClipper};
