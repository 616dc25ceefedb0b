//! Criterion benchmarks for looprig-effects
//!
//! Run with: cargo bench -p looprig-effects
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use looprig_core::{EffectModule, FootswitchEvent};
use looprig_effects::distortion::{OVERSAMPLE, TYPE};
use looprig_effects::filter::CUTOFF;
use looprig_effects::{Distortion, FilterSweep, Looper, LooperConfig};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[16, 48, 128, 512];

fn generate_test_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            (2.0 * std::f32::consts::PI * 110.0 * t).sin() * 0.5
        })
        .collect()
}

/// Looper with `layers` committed two-second layers, then overdubbing.
fn busy_looper(layers: usize) -> Looper {
    let mut looper = Looper::new(
        SAMPLE_RATE,
        LooperConfig {
            max_seconds: 4.0,
            ..LooperConfig::default()
        },
    );
    let take = generate_test_signal(2 * SAMPLE_RATE as usize);
    let mut out_l = vec![0.0; take.len()];
    let mut out_r = vec![0.0; take.len()];
    for _ in 0..layers {
        looper.on_footswitch(FootswitchEvent::BypassPressed);
        looper.process_stereo_block(&take, &take, &mut out_l, &mut out_r);
        looper.on_footswitch(FootswitchEvent::BypassPressed);
    }
    looper.on_footswitch(FootswitchEvent::BypassPressed);
    looper
}

fn bench_looper(c: &mut Criterion) {
    let mut group = c.benchmark_group("Looper");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);
        group.bench_with_input(
            BenchmarkId::new("overdub_layer_4", block_size),
            &block_size,
            |b, &size| {
                let mut looper = busy_looper(3);
                let mut out_l = vec![0.0; size];
                let mut out_r = vec![0.0; size];
                b.iter(|| {
                    looper.process_stereo_block(
                        black_box(&input),
                        black_box(&input),
                        &mut out_l,
                        &mut out_r,
                    );
                    black_box(out_l[0])
                });
            },
        );
    }

    group.finish();
}

fn bench_distortion(c: &mut Criterion) {
    let mut group = c.benchmark_group("Distortion");
    let input = generate_test_signal(512);

    for (name, oversample) in [("oversampled", 1.0), ("direct", 0.0)] {
        for bin in 0..6 {
            let id = format!("{name}/type_{bin}");
            group.bench_function(id.as_str(), |b| {
                let mut dist = Distortion::new(SAMPLE_RATE);
                dist.set_magnitude(OVERSAMPLE, oversample);
                dist.set_magnitude(TYPE, (bin as f32 + 0.5) / 6.0);
                let mut out_l = vec![0.0; input.len()];
                let mut out_r = vec![0.0; input.len()];
                b.iter(|| {
                    dist.process_stereo_block(black_box(&input), &input, &mut out_l, &mut out_r);
                    black_box(out_l[0])
                });
            });
        }
    }

    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let input = generate_test_signal(512);
    c.bench_function("FilterSweep/lowpass_512", |b| {
        let mut filter = FilterSweep::new(SAMPLE_RATE);
        filter.set_magnitude(CUTOFF, 0.2);
        let mut out_l = vec![0.0; input.len()];
        let mut out_r = vec![0.0; input.len()];
        b.iter(|| {
            filter.process_stereo_block(black_box(&input), &input, &mut out_l, &mut out_r);
            black_box(out_l[0])
        });
    });
}

criterion_group!(benches, bench_looper, bench_distortion, bench_filter);
criterion_main!(benches);
