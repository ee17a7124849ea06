//! RackFx Core - DSP primitives for the effect chain
//!
//! This crate provides the building blocks shared by every unit in the
//! effect chain, designed for real-time audio processing with zero
//! allocation in the audio path.
//!
//! # Core Abstractions
//!
//! ## Unit System
//!
//! - [`Effect`] - Object-safe trait for all processing units
//! - [`ParameterInfo`] / [`impl_params!`] - Indexed, introspectable parameters
//! - [`EffectWithParams`] - Both of the above behind one vtable
//! - [`AudioBuffer`] - Planar buffer with a fixed allocation
//! - [`EventList`] - Sample-accurate control events
//!
//! ## Parameter Smoothing
//!
//! - [`ParameterSmoother`] - Linear or exponential ramps with a target that
//!   any thread may set through a [`SmootherTarget`]
//!
//! ## Filters
//!
//! - [`LadderFilter`] - Four-pole ladder with `tanh` input drive
//! - [`BiquadFilter`] - RBJ cookbook biquad in eight shapes
//! - [`StateVariableFilter`] - TPT SVF with simultaneous outputs
//! - [`LinkwitzRileyCrossover`] - LR4 band split
//!
//! ## Delay Lines
//!
//! - [`FractionalDelay`] - Per-channel delay with interpolated reads
//!
//! Every filter and delay keeps independent state for up to
//! [`MAX_CHANNELS`] channels and exposes `process_sample(x, channel)`.
//!
//! # no_std Support
//!
//! Disable the default `std` feature for embedded targets:
//!
//! ```toml
//! [dependencies]
//! rackfx-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

/// Channels with dedicated state in every filter and delay.
pub const MAX_CHANNELS: usize = 2;

pub mod biquad;
pub mod buffer;
pub mod crossover;
pub mod delay;
pub mod effect;
pub mod effect_with_params;
pub mod event;
pub mod ladder;
pub mod math;
pub mod param_info;
pub mod smoother;
pub mod svf;

pub use biquad::{BiquadCoefficients, BiquadFilter, BiquadKind};
pub use buffer::AudioBuffer;
pub use crossover::{LinkwitzRileyCrossover, allpass_compensator};
pub use delay::{FractionalDelay, Interpolation};
pub use effect::Effect;
pub use effect_with_params::EffectWithParams;
pub use event::{ControlEvent, EventKind, EventList};
pub use ladder::{LadderFilter, LadderMode, MAX_FEEDBACK};
pub use math::{
    db_to_linear, flush_denormal, hard_clip, linear_to_db, ms_to_samples, samples_to_ms,
    wet_dry_mix,
};
pub use param_info::{ParamDescriptor, ParamId, ParamUnit, ParameterInfo};
pub use smoother::{AtomicF32, ParameterSmoother, SmootherTarget, SmoothingStyle};
pub use svf::{StateVariableFilter, SvfOutputs};
