//! [`Effect`] and [`ParameterInfo`] behind one vtable.
//!
//! The chain holds units as `Box<dyn EffectWithParams + Send>`. Every method
//! here is prefixed with `effect_` so the blanket impl never shadows the
//! underlying trait methods at call sites that see both.

#[cfg(not(feature = "std"))]
use alloc::string::String;

use crate::effect::Effect;
use crate::event::EventKind;
use crate::param_info::{ParamDescriptor, ParamId, ParameterInfo};

/// Parameter access on a boxed unit.
pub trait EffectWithParams: Effect {
    /// Number of parameters.
    fn effect_param_count(&self) -> usize;

    /// Descriptor at `index`.
    fn effect_param_info(&self, index: usize) -> Option<ParamDescriptor>;

    /// Current value at `index`.
    fn effect_get_param(&self, index: usize) -> f32;

    /// Sets the value at `index`. Out-of-range indices are ignored.
    fn effect_set_param(&mut self, index: usize, value: f32);

    /// Sets the parameter with stable id `id`. Returns `false` when the unit
    /// has no such parameter.
    fn effect_set_param_by_id(&mut self, id: ParamId, value: f32) -> bool;

    /// Applies one control event: parameter changes are routed by id, the
    /// rest go to [`Effect::handle_event`].
    fn effect_apply_event(&mut self, event: &EventKind);

    /// Current value at `index` rendered with its unit.
    fn effect_display_value(&self, index: usize) -> Option<String>;
}

impl<T: Effect + ParameterInfo> EffectWithParams for T {
    fn effect_param_count(&self) -> usize {
        self.param_count()
    }

    fn effect_param_info(&self, index: usize) -> Option<ParamDescriptor> {
        self.param_info(index)
    }

    fn effect_get_param(&self, index: usize) -> f32 {
        self.get_param(index)
    }

    fn effect_set_param(&mut self, index: usize, value: f32) {
        self.set_param(index, value);
    }

    fn effect_set_param_by_id(&mut self, id: ParamId, value: f32) -> bool {
        match self.param_index_by_id(id) {
            Some(index) => {
                self.set_param(index, value);
                true
            }
            None => false,
        }
    }

    fn effect_apply_event(&mut self, event: &EventKind) {
        match *event {
            EventKind::ParamChange { param, value } => {
                self.effect_set_param_by_id(param, value);
            }
            ref other => self.handle_event(other),
        }
    }

    fn effect_display_value(&self, index: usize) -> Option<String> {
        self.param_info(index)
            .map(|desc| desc.format_value(self.get_param(index)))
    }
}
