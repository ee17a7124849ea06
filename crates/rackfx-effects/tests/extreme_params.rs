//! Extreme parameter tests for every rackfx unit.
//!
//! Verifies that each unit produces finite output with all parameters at
//! their minimum or maximum, and at extreme sample rates (8 kHz and 192 kHz).

use rackfx_core::{Effect, ParameterInfo};
use rackfx_effects::{
    BandSplit, BiquadFilterUnit, Bitcrusher, Delay, Gain, HardClipper, LadderFilterUnit,
    SampleDelay,
};

const DEFAULT_SAMPLE_RATE: f32 = 48000.0;
const LOW_SAMPLE_RATE: f32 = 8000.0;
const HIGH_SAMPLE_RATE: f32 = 192000.0;
const NUM_SAMPLES: usize = 2000;

/// Process `NUM_SAMPLES` in stereo and assert every output is finite.
fn assert_finite_output(effect: &mut dyn Effect, label: &str) {
    for i in 0..NUM_SAMPLES {
        let input = match i % 3 {
            0 => 0.5,
            1 => -0.5,
            _ => 0.0,
        };
        let (l, r) = effect.process_stereo(input, -input);
        assert!(
            l.is_finite() && r.is_finite(),
            "{label}: non-finite output at sample {i}: ({l}, {r})"
        );
    }
}

fn set_all_params(effect: &mut impl ParameterInfo, pick: fn(f32, f32) -> f32) {
    for i in 0..effect.param_count() {
        if let Some(desc) = effect.param_info(i) {
            effect.set_param(i, pick(desc.min, desc.max));
        }
    }
}

fn run_extreme_test<E: Effect + ParameterInfo>(name: &str, create: impl Fn(f32) -> E) {
    let cases: [(f32, Option<fn(f32, f32) -> f32>, &str); 6] = [
        (DEFAULT_SAMPLE_RATE, Some(|min, _| min), "all min"),
        (DEFAULT_SAMPLE_RATE, Some(|_, max| max), "all max"),
        (LOW_SAMPLE_RATE, None, "8 kHz"),
        (HIGH_SAMPLE_RATE, None, "192 kHz"),
        (LOW_SAMPLE_RATE, Some(|_, max| max), "8 kHz, all max"),
        (HIGH_SAMPLE_RATE, Some(|_, max| max), "192 kHz, all max"),
    ];
    for (sample_rate, pick, label) in cases {
        let mut effect = create(sample_rate);
        if let Some(pick) = pick {
            set_all_params(&mut effect, pick);
        }
        assert_finite_output(&mut effect, &format!("{name} ({label})"));
    }
}

#[test]
fn test_extreme_gain() {
    run_extreme_test("Gain", Gain::new);
}

#[test]
fn test_extreme_clipper() {
    run_extreme_test("HardClipper", HardClipper::new);
}

#[test]
fn test_extreme_ladder() {
    run_extreme_test("LadderFilterUnit", LadderFilterUnit::new);
}

#[test]
fn test_extreme_biquad() {
    run_extreme_test("BiquadFilterUnit", BiquadFilterUnit::new);
}

#[test]
fn test_extreme_delay() {
    run_extreme_test("Delay", Delay::new);
}

#[test]
fn test_extreme_bitcrusher() {
    run_extreme_test("Bitcrusher", Bitcrusher::new);
}

#[test]
fn test_extreme_bandsplit() {
    run_extreme_test("BandSplit", BandSplit::new);
}

#[test]
fn test_extreme_sample_delay() {
    run_extreme_test("SampleDelay", SampleDelay::new);
}

#[test]
fn test_sample_rate_change_via_prepare() {
    let mut delay = Delay::new(LOW_SAMPLE_RATE);
    delay.set_delay_time_ms(2000.0);
    delay.prepare(HIGH_SAMPLE_RATE, 512);
    assert!((delay.delay_time_ms() - 2000.0).abs() < 0.1);
    assert_finite_output(&mut delay, "Delay (8 kHz -> 192 kHz)");

    let mut ladder = LadderFilterUnit::new(HIGH_SAMPLE_RATE);
    ladder.set_cutoff_hz(20000.0);
    ladder.prepare(LOW_SAMPLE_RATE, 64);
    assert_finite_output(&mut ladder, "Ladder (192 kHz -> 8 kHz)");
}
