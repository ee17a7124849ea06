//! Property-based tests for every rackfx unit.
//!
//! Uses proptest to verify that each unit satisfies the invariants the chain
//! relies on: finite output, bounded output, and a reset that matches a fresh
//! instance.

use proptest::prelude::*;
use rackfx_core::EffectWithParams;
use rackfx_effects::{
    BandSplit, BiquadFilterUnit, Bitcrusher, Delay, Gain, HardClipper, LadderFilterUnit,
    SampleDelay,
};

type Boxed = Box<dyn EffectWithParams + Send>;

const UNIT_COUNT: usize = 8;

fn create(index: usize, sample_rate: f32) -> (&'static str, Boxed) {
    match index {
        0 => ("gain", Box::new(Gain::new(sample_rate))),
        1 => ("clipper", Box::new(HardClipper::new(sample_rate))),
        2 => ("ladder", Box::new(LadderFilterUnit::new(sample_rate))),
        3 => ("filter", Box::new(BiquadFilterUnit::new(sample_rate))),
        4 => ("delay", Box::new(Delay::new(sample_rate))),
        5 => ("bitcrusher", Box::new(Bitcrusher::new(sample_rate))),
        6 => ("bandsplit", Box::new(BandSplit::new(sample_rate))),
        _ => ("sampledelay", Box::new(SampleDelay::new(sample_rate))),
    }
}

/// Set every parameter from normalized [0, 1] values.
fn set_random_params(effect: &mut Boxed, values: &[f32; 16]) {
    for i in 0..effect.effect_param_count() {
        if let Some(desc) = effect.effect_param_info(i) {
            effect.effect_set_param(i, desc.denormalize(values[i % 16]));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Any finite input in [-1, 1] with any valid parameters gives finite
    /// output in mono and stereo.
    #[test]
    fn all_units_finite_output(
        input in prop::array::uniform32(-1.0f32..=1.0f32),
        param_values in prop::array::uniform16(0.0f32..=1.0f32),
        unit_idx in 0usize..UNIT_COUNT,
    ) {
        let (id, mut effect) = create(unit_idx, 48000.0);
        set_random_params(&mut effect, &param_values);

        for _ in 0..64 {
            effect.process(0.0);
        }

        for &sample in &input {
            let out = effect.process(sample);
            prop_assert!(out.is_finite(), "'{}' mono output {} for input {}", id, out, sample);

            let (l, r) = effect.process_stereo(sample, -sample);
            prop_assert!(
                l.is_finite() && r.is_finite(),
                "'{}' stereo output ({}, {}) for input {}", id, l, r, sample
            );
        }
    }

    /// For input in [-1, 1] output stays within [-100, 100]. Gain and
    /// resonant stages may exceed unity but nothing may run away.
    #[test]
    fn all_units_bounded_output(
        input in prop::array::uniform32(-1.0f32..=1.0f32),
        param_values in prop::array::uniform16(0.0f32..=1.0f32),
        unit_idx in 0usize..UNIT_COUNT,
    ) {
        let (id, mut effect) = create(unit_idx, 48000.0);
        set_random_params(&mut effect, &param_values);

        for _ in 0..256 {
            effect.process(0.0);
        }

        let bound = 100.0;
        for &sample in &input {
            let out = effect.process(sample);
            prop_assert!(out.abs() <= bound, "'{}' output {} exceeds ±{}", id, out, bound);
        }
    }

    /// After `reset`, processing silence matches a fresh instance with the
    /// same parameters once the fresh instance's smoothers have settled.
    #[test]
    fn all_units_reset_clears_state(
        input in prop::array::uniform32(-1.0f32..=1.0f32),
        param_values in prop::array::uniform16(0.0f32..=1.0f32),
        unit_idx in 0usize..UNIT_COUNT,
    ) {
        let (id, mut effect) = create(unit_idx, 48000.0);
        set_random_params(&mut effect, &param_values);
        for &sample in &input {
            effect.process(sample);
        }
        effect.reset();

        let (_, mut fresh) = create(unit_idx, 48000.0);
        set_random_params(&mut fresh, &param_values);

        let mut reset_out = 0.0f32;
        let mut fresh_out = 0.0f32;
        for _ in 0..4800 {
            reset_out = effect.process(0.0);
            fresh_out = fresh.process(0.0);
        }

        let diff = (reset_out - fresh_out).abs();
        prop_assert!(
            diff < 1e-3,
            "'{}': reset output {} differs from fresh output {}", id, reset_out, fresh_out
        );
    }
}
