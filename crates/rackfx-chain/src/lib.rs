//! Real-time effect processor chain.
//!
//! An [`EffectProcessorChain`] runs audio through an ordered list of
//! [`EffectProcessor`]s. Each processor wraps one unit from an
//! [`EffectFactory`](rackfx_registry::EffectFactory) and adds bypass, a
//! smoothed dry/wet mix, a display name, and an opaque state blob.
//!
//! ## Threading
//!
//! One audio thread calls [`EffectProcessorChain::process`]; any number of
//! control threads edit the chain at the same time. The audio path never
//! allocates and never waits on a control-thread lock for longer than a
//! pointer swap. Edits that need the factory (append, insert, replace,
//! reload) do that work before taking any lock.
//!
//! ## Missing units
//!
//! A processor whose unit cannot be built, or whose state blob fails to
//! restore, is marked missing. It keeps its place, name, and state, is
//! skipped during processing, and can be revived later with
//! [`EffectProcessorChain::reload_from_state_if_valid`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use rackfx_chain::EffectProcessorChain;
//! use rackfx_core::{AudioBuffer, EventList};
//! use rackfx_registry::EffectRegistry;
//!
//! let chain = EffectProcessorChain::new(Arc::new(EffectRegistry::new()));
//! chain.prepare(48000.0, 64);
//!
//! let gain = chain.append_new_effect("gain").unwrap();
//! gain.set_parameter(0, 20.0 * 2.0_f32.log10());
//! chain.append_new_effect("clipper").unwrap();
//! // Re-preparing snaps parameter ramps to their targets.
//! chain.prepare(48000.0, 64);
//!
//! let mut buffer = AudioBuffer::from_channels(&[&[0.6; 64], &[0.6; 64]]);
//! chain.process(&mut buffer, &EventList::new());
//! assert!((buffer.channel(0)[63] - 1.0).abs() < 1e-4);
//! ```

pub mod chain;
pub mod error;
pub mod processor;
pub mod state;

pub use chain::{ChainConfig, ChainState, EffectProcessorChain, FactoryKey, MovePreset, MoveTarget};
pub use error::StateError;
pub use processor::{
    DEFAULT_MIX_RAMP_SECONDS, EffectProcessor, ProcessOutcome, ProcessorHandle,
    ProcessorObserver, UiPosition,
};
pub use state::{STATE_VERSION, UnitState};
