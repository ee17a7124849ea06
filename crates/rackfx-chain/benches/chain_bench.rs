//! Criterion benchmarks for the processor chain
//!
//! Run with: cargo bench -p rackfx-chain
#![allow(missing_docs)]

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rackfx_chain::EffectProcessorChain;
use rackfx_core::{AudioBuffer, EventList};
use rackfx_registry::EffectRegistry;

const SAMPLE_RATE: f64 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 256, 1024];

fn generate_test_signal(size: usize) -> AudioBuffer {
    let left: Vec<f32> = (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect();
    AudioBuffer::from_channels(&[&left, &left])
}

fn build_chain(ids: &[&str], block_size: usize) -> EffectProcessorChain {
    let chain = EffectProcessorChain::new(Arc::new(EffectRegistry::new()));
    chain.prepare(SAMPLE_RATE, block_size);
    for id in ids {
        chain.append_new_effect(*id);
    }
    chain
}

fn bench_chain(c: &mut Criterion, name: &str, ids: &[&str], mix: f32) {
    let mut group = c.benchmark_group(name);

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);
        let chain = build_chain(ids, block_size);
        for i in 0..chain.num_effects() {
            chain.set_mix_level(i, mix);
        }
        let events = EventList::new();

        group.bench_with_input(
            BenchmarkId::from_parameter(block_size),
            &block_size,
            |b, _| {
                let mut buffer = input.clone();
                b.iter(|| {
                    buffer.copy_from(&input);
                    chain.process(black_box(&mut buffer), &events);
                    black_box(buffer.channel(0)[0])
                })
            },
        );
    }

    group.finish();
}

fn bench_typical_chain(c: &mut Criterion) {
    let ids = ["gain", "ladder", "delay", "clipper"];
    bench_chain(c, "Chain/wet", &ids, 1.0);
    bench_chain(c, "Chain/blend", &ids, 0.5);
}

fn bench_bypassed_chain(c: &mut Criterion) {
    let ids = ["gain", "ladder", "delay", "clipper"];
    let mut group = c.benchmark_group("Chain/bypassed");
    let input = generate_test_signal(256);
    let chain = build_chain(&ids, 256);
    for i in 0..chain.num_effects() {
        chain.set_bypass(i, true);
    }
    let events = EventList::new();
    group.bench_function("256", |b| {
        let mut buffer = input.clone();
        b.iter(|| {
            chain.process(black_box(&mut buffer), &events);
            black_box(buffer.channel(0)[0])
        })
    });
    group.finish();
}

criterion_group!(benches, bench_typical_chain, bench_bypassed_chain);
criterion_main!(benches);
