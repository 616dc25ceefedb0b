//! Criterion benchmarks for the looprig-core block path
//!
//! Run with: cargo bench -p looprig-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use looprig_core::{
    AudioPipeline, Biquad, ChainOrder, EffectModule, EnablePolicy, PipelineConfig, PositionHead,
    Rack, Svf, SvfMode,
};

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

/// Low-pass stage standing in for a real effect.
struct Tone {
    left: Biquad,
    right: Biquad,
}

impl EffectModule for Tone {
    fn name(&self) -> &'static str {
        "tone"
    }
    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.left.set_lowpass(2000.0, looprig_core::BUTTERWORTH_Q, sample_rate);
        self.right.set_lowpass(2000.0, looprig_core::BUTTERWORTH_Q, sample_rate);
    }
    fn reset(&mut self) {
        self.left.clear();
        self.right.clear();
    }
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        (self.left.process(left), self.right.process(right))
    }
    fn is_enabled(&self) -> bool {
        true
    }
    fn set_enabled(&mut self, _enabled: bool) {}
}

fn tone() -> Box<Tone> {
    Box::new(Tone {
        left: Biquad::new(),
        right: Biquad::new(),
    })
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("AudioPipeline");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);

        group.bench_with_input(
            BenchmarkId::new("three_stage_chain", block_size),
            &block_size,
            |b, &size| {
                let mut rack = Rack::new(SAMPLE_RATE);
                let chain = vec![rack.insert(tone()), rack.insert(tone())];
                let looper = rack.insert(tone());
                let config = PipelineConfig {
                    block_size: size,
                    order: ChainOrder::LooperFirst,
                    policy: EnablePolicy::AlwaysOn,
                    ..PipelineConfig::default()
                };
                let mut pipeline = AudioPipeline::new(config, chain, Some(looper));
                let mut out_l = vec![0.0; size];
                let mut out_r = vec![0.0; size];
                b.iter(|| {
                    black_box(pipeline.process_block(
                        &mut rack,
                        black_box(&input),
                        black_box(&input),
                        &mut out_l,
                        &mut out_r,
                    ));
                });
            },
        );
    }

    group.finish();
}

fn bench_position_head(c: &mut Criterion) {
    let mut group = c.benchmark_group("PositionHead");

    for &(name, slice, speed) in &[
        ("unity", 1.0f32, 1.0f32),
        ("half_speed_slice", 0.25, 0.5),
        ("reverse", 1.0, -1.5),
    ] {
        group.bench_function(name, |b| {
            let mut head = PositionHead::new();
            head.set_speed(speed);
            b.iter(|| {
                for _ in 0..512 {
                    head.update_position(false, black_box(96_000), slice, 12_000.0);
                }
                black_box(head.position())
            });
        });
    }

    group.finish();
}

fn bench_svf(c: &mut Criterion) {
    let input = generate_test_signal(512);
    c.bench_function("Svf/highpass_512", |b| {
        let mut svf = Svf::new(SAMPLE_RATE);
        svf.set_mode(SvfMode::Highpass);
        svf.set_cutoff(800.0);
        b.iter(|| {
            for &sample in &input {
                black_box(svf.process(black_box(sample)));
            }
        });
    });
}

criterion_group!(benches, bench_pipeline, bench_position_head, bench_svf);
criterion_main!(benches);
