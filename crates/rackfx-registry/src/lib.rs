//! Where the chain gets its units from.
//!
//! The chain never names a concrete unit type. On append, insert, replace
//! and reload it asks an [`EffectFactory`] for a boxed unit, either by its
//! position in the factory's listing or by identifier, and gets the unit
//! back together with an [`EffectDescriptor`]. A `None` answer means the
//! key did not resolve; the chain turns that into a null handle or a
//! missing slot.
//!
//! [`EffectRegistry`] is the built-in factory. Hosts may register more
//! units on top of it, or start from [`EffectRegistry::empty`].
//!
//! ```rust
//! use rackfx_core::Effect;
//! use rackfx_registry::{EffectFactory, EffectRegistry};
//!
//! let registry = EffectRegistry::new();
//! let (mut ladder, desc) = registry.create_by_identifier(" Ladder", 48000.0).unwrap();
//! assert_eq!(desc.id, "ladder");
//! assert!(ladder.process(0.5).is_finite());
//! assert!(registry.create_by_identifier("reverb", 48000.0).is_none());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, string::String, vec::Vec};

pub use rackfx_core::EffectWithParams;
use rackfx_effects::{
    BandSplit, BiquadFilterUnit, Bitcrusher, Delay, Gain, HardClipper, LadderFilterUnit,
    SampleDelay,
};

/// A unit ready to be wrapped by a processor.
pub type BoxedEffect = Box<dyn EffectWithParams + Send>;

/// Broad family a unit belongs to, for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectCategory {
    /// Clipping and bit reduction.
    Distortion,
    /// Echoes.
    TimeBased,
    /// Ladder, biquad and band-split filters.
    Filter,
    /// Gain stages and alignment delays.
    Utility,
}

impl EffectCategory {
    /// Label shown in listings.
    pub const fn name(&self) -> &'static str {
        match self {
            EffectCategory::Distortion => "Distortion",
            EffectCategory::TimeBased => "Time-Based",
            EffectCategory::Filter => "Filter",
            EffectCategory::Utility => "Utility",
        }
    }
}

/// Describes a unit the factory can build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectDescriptor {
    /// Unique identifier (lowercase, no spaces).
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Brief description.
    pub description: &'static str,
    /// Category for organization.
    pub category: EffectCategory,
    /// Number of parameters.
    pub param_count: usize,
}

/// Builds a unit at the given sample rate.
pub type FactoryFn = fn(f32) -> BoxedEffect;

/// Source of units for the chain.
///
/// Only called from control threads: append, insert, replace and reload.
/// Never from the audio callback.
pub trait EffectFactory: Send + Sync {
    /// Builds the unit at `index` in the factory's listing.
    fn create_by_index(&self, index: usize, sample_rate: f32)
    -> Option<(BoxedEffect, EffectDescriptor)>;

    /// Builds the unit named `identifier`.
    ///
    /// Implementations should match identifiers case-insensitively after
    /// trimming whitespace.
    fn create_by_identifier(
        &self,
        identifier: &str,
        sample_rate: f32,
    ) -> Option<(BoxedEffect, EffectDescriptor)>;
}

/// Canonical form of a unit identifier: trimmed and lower-case.
pub fn canonical_identifier(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

const fn builtin(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    category: EffectCategory,
    param_count: usize,
) -> EffectDescriptor {
    EffectDescriptor {
        id,
        name,
        description,
        category,
        param_count,
    }
}

/// Built-in units in listing order. `create_by_index` addresses this order,
/// so append new units at the end.
fn builtins() -> [(EffectDescriptor, FactoryFn); 8] {
    use EffectCategory::{Distortion, Filter, TimeBased, Utility};
    [
        (
            builtin("gain", "Gain", "Smoothed gain stage", Utility, 1),
            |sr| Box::new(Gain::new(sr)),
        ),
        (
            builtin("clipper", "Hard Clipper", "Clips at an adjustable ceiling", Distortion, 1),
            |sr| Box::new(HardClipper::new(sr)),
        ),
        (
            builtin("ladder", "Ladder Filter", "Four-pole ladder with input drive", Filter, 4),
            |sr| Box::new(LadderFilterUnit::new(sr)),
        ),
        (
            builtin("filter", "Biquad Filter", "RBJ biquad in eight shapes", Filter, 4),
            |sr| Box::new(BiquadFilterUnit::new(sr)),
        ),
        (
            builtin("delay", "Delay", "Feedback echo with damping and ping-pong", TimeBased, 4),
            |sr| Box::new(Delay::new(sr)),
        ),
        (
            builtin("bitcrusher", "Bitcrusher", "Bit depth and sample rate reduction", Distortion, 3),
            |sr| Box::new(Bitcrusher::new(sr)),
        ),
        (
            builtin("bandsplit", "Band Split", "Three-band crossover with per-band gain", Filter, 5),
            |sr| Box::new(BandSplit::new(sr)),
        ),
        (
            builtin("sampledelay", "Sample Delay", "Whole-sample delay reported as latency", Utility, 1),
            |sr| Box::new(SampleDelay::new(sr)),
        ),
    ]
}

struct RegistryEntry {
    descriptor: EffectDescriptor,
    factory: FactoryFn,
}

impl RegistryEntry {
    fn build(&self, sample_rate: f32) -> (BoxedEffect, EffectDescriptor) {
        ((self.factory)(sample_rate), self.descriptor.clone())
    }
}

/// Table of units the chain can build.
pub struct EffectRegistry {
    entries: Vec<RegistryEntry>,
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectRegistry {
    /// Registry holding every built-in unit.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for (descriptor, factory) in builtins() {
            registry.register(descriptor, factory);
        }
        registry
    }

    /// Registry with nothing in it.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds a unit. Lookups by id return the first matching registration.
    pub fn register(&mut self, descriptor: EffectDescriptor, factory: FactoryFn) {
        self.entries.push(RegistryEntry {
            descriptor,
            factory,
        });
    }

    /// Descriptors for all registered units, in index order.
    pub fn all_effects(&self) -> Vec<&EffectDescriptor> {
        self.entries.iter().map(|e| &e.descriptor).collect()
    }

    fn entry(&self, id: &str) -> Option<&RegistryEntry> {
        let id = canonical_identifier(id);
        self.entries.iter().find(|e| e.descriptor.id == id)
    }

    /// Descriptor by unit id.
    pub fn get(&self, id: &str) -> Option<&EffectDescriptor> {
        self.entry(id).map(|e| &e.descriptor)
    }

    /// Creates a unit by id. `None` if the id is unknown.
    pub fn create(&self, id: &str, sample_rate: f32) -> Option<BoxedEffect> {
        self.entry(id).map(|e| (e.factory)(sample_rate))
    }

    /// Number of registered units.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl EffectFactory for EffectRegistry {
    fn create_by_index(
        &self,
        index: usize,
        sample_rate: f32,
    ) -> Option<(BoxedEffect, EffectDescriptor)> {
        self.entries.get(index).map(|e| e.build(sample_rate))
    }

    fn create_by_identifier(
        &self,
        identifier: &str,
        sample_rate: f32,
    ) -> Option<(BoxedEffect, EffectDescriptor)> {
        self.entry(identifier).map(|e| e.build(sample_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = EffectRegistry::new();
        assert_eq!(registry.len(), 8);
        assert!(EffectRegistry::empty().is_empty());
    }

    #[test]
    fn test_builtin_order() {
        let registry = EffectRegistry::new();
        let ids: Vec<_> = registry.all_effects().iter().map(|d| d.id).collect();
        assert_eq!(
            ids,
            [
                "gain",
                "clipper",
                "ladder",
                "filter",
                "delay",
                "bitcrusher",
                "bandsplit",
                "sampledelay"
            ]
        );
    }

    #[test]
    fn test_lookup_is_canonical() {
        let registry = EffectRegistry::new();
        assert_eq!(registry.get("delay").unwrap().name, "Delay");
        assert_eq!(registry.get("  BitCrusher ").unwrap().id, "bitcrusher");
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(canonical_identifier(" Sample Delay "), "sample delay");
    }

    #[test]
    fn test_factory_by_index_and_identifier() {
        let registry = EffectRegistry::new();

        let (mut unit, desc) = registry.create_by_index(1, 48000.0).unwrap();
        assert_eq!(desc.id, "clipper");
        assert_eq!(unit.process(3.0), 1.0);

        let (_, desc) = registry.create_by_identifier("SampleDelay", 48000.0).unwrap();
        assert_eq!(desc.param_count, 1);

        assert!(registry.create_by_index(8, 48000.0).is_none());
        assert!(registry.create_by_identifier("reverb", 48000.0).is_none());
    }

    #[test]
    fn test_every_builtin_has_a_category_label() {
        let registry = EffectRegistry::new();
        let filters = registry
            .all_effects()
            .into_iter()
            .filter(|d| d.category == EffectCategory::Filter)
            .count();
        assert_eq!(filters, 3);
        assert_eq!(EffectCategory::TimeBased.name(), "Time-Based");
    }

    #[test]
    fn test_descriptor_param_counts_match_units() {
        let registry = EffectRegistry::new();
        for descriptor in registry.all_effects() {
            let mut effect = registry.create(descriptor.id, 48000.0).unwrap();
            assert_eq!(
                effect.effect_param_count(),
                descriptor.param_count,
                "param count for {}",
                descriptor.id
            );
            let output = effect.process(0.5);
            assert!(output.is_finite(), "{} produced non-finite output", descriptor.id);
        }
    }

    #[test]
    fn test_custom_registration() {
        let mut registry = EffectRegistry::empty();
        registry.register(
            EffectDescriptor {
                id: "boost",
                name: "Boost",
                description: "Fixed +6 dB",
                category: EffectCategory::Utility,
                param_count: 1,
            },
            |sr| {
                let mut g = Gain::new(sr);
                g.set_gain_db(6.0);
                Box::new(g)
            },
        );
        assert_eq!(registry.len(), 1);
        assert!(registry.create_by_identifier("BOOST", 44100.0).is_some());
    }
}
