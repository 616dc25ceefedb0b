//! End-to-end looper scenarios.
//!
//! The first half drives a looper through [`AudioPipeline`] and a [`Rack`]
//! exactly as the pedal does. The second half checks layer bookkeeping over
//! arbitrary sequences of takes, knob moves and resets.

use looprig_core::{
    AudioPipeline, BoxedModule, ChainOrder, EffectModule, FootswitchEvent, ModuleId, PipelineConfig,
    Rack,
};
use looprig_effects::looper::LAYER;
use looprig_effects::{Distortion, EffectRouter, FilterSweep, Looper, LooperConfig};
use proptest::prelude::*;

const SR: f32 = 1000.0;

fn small_looper(layers: usize) -> Looper {
    Looper::new(
        SR,
        LooperConfig {
            layers,
            max_seconds: 0.5,
            ..LooperConfig::default()
        },
    )
}

/// Pipeline with instant transitions and no relay.
fn instant_config(order: ChainOrder) -> PipelineConfig {
    PipelineConfig {
        block_size: 16,
        crossfade_samples: 0,
        true_bypass: false,
        order,
        ..PipelineConfig::default()
    }
}

struct Rig {
    rack: Rack,
    pipeline: AudioPipeline,
    looper: ModuleId,
}

impl Rig {
    fn new(layers: usize, chain: Vec<BoxedModule>, order: ChainOrder) -> Self {
        let mut rack = Rack::new(SR);
        let chain_ids = chain.into_iter().map(|m| rack.insert(m)).collect();
        let looper = rack.insert(Box::new(small_looper(layers)));
        let pipeline = AudioPipeline::new(instant_config(order), chain_ids, Some(looper));
        Self {
            rack,
            pipeline,
            looper,
        }
    }

    fn press(&mut self) {
        let looper = self.rack.get_mut(self.looper).expect("looper in rack");
        assert!(looper.on_footswitch(FootswitchEvent::BypassPressed));
    }

    fn run(&mut self, input: &[f32]) -> Vec<f32> {
        let mut out_l = vec![0.0; input.len()];
        let mut out_r = vec![0.0; input.len()];
        self.pipeline
            .process_block(&mut self.rack, input, input, &mut out_l, &mut out_r);
        assert_eq!(out_l, out_r);
        out_l
    }

    fn record(&mut self, take: &[f32]) {
        self.press();
        self.run(take);
        self.press();
    }
}

fn ramp(len: usize) -> Vec<f32> {
    (0..len).map(|i| (i as f32 + 1.0) / len as f32 * 0.5).collect()
}

#[test]
fn loop_plays_back_bit_exact_through_pipeline() {
    let mut rig = Rig::new(7, Vec::new(), ChainOrder::LooperFirst);
    let take = ramp(100);
    rig.record(&take);

    let out = rig.run(&[0.0; 300]);
    for (i, &y) in out.iter().enumerate() {
        assert_eq!(y, take[i % take.len()], "sample {i}");
    }
}

#[test]
fn disabled_chain_module_is_skipped() {
    let mut dist = Distortion::new(SR);
    dist.set_enabled(false);
    let mut rig = Rig::new(3, vec![Box::new(dist) as BoxedModule], ChainOrder::ChainFirst);

    let take = ramp(40);
    rig.record(&take);
    let out = rig.run(&[0.0; 80]);
    assert_eq!(&out[..40], take.as_slice());
    assert_eq!(&out[40..], take.as_slice());
}

#[test]
fn centred_filter_keeps_loop_transparent_in_either_order() {
    for order in [ChainOrder::ChainFirst, ChainOrder::LooperFirst] {
        let mut rig = Rig::new(3, vec![Box::new(FilterSweep::new(SR)) as BoxedModule], order);
        let take = ramp(32);
        rig.record(&take);
        let out = rig.run(&[0.0; 32]);
        assert_eq!(out, take, "{order:?}");
    }
}

#[test]
fn overdubs_squash_when_bank_is_full() {
    let mut rig = Rig::new(3, Vec::new(), ChainOrder::LooperFirst);
    rig.record(&[1.0; 8]);
    rig.record(&[2.0; 8]);

    // Third take lands in the top layer and squashes on commit.
    rig.press();
    assert_eq!(rig.run(&[4.0; 8]), vec![7.0; 8]);
    rig.press();
    assert_eq!(rig.run(&[0.0; 8]), vec![7.0; 8]);

    // The top layer is free again for another overdub.
    rig.press();
    assert_eq!(rig.run(&[1.0; 8]), vec![8.0; 8]);
    rig.press();
    assert_eq!(rig.run(&[0.0; 16]), vec![8.0; 16]);
}

#[test]
fn router_gates_distortion_after_looper() {
    let mut router = EffectRouter::new(SR);
    router.set_inner(Box::new(Distortion::new(SR)));
    let mut rig = Rig::new(3, vec![Box::new(router) as BoxedModule], ChainOrder::LooperFirst);
    let router = rig.pipeline.chain()[0];

    let take = ramp(32);
    rig.record(&take);
    assert_eq!(rig.run(&[0.0; 32]), take);

    let module = rig.rack.get_mut(router).expect("router in rack");
    assert!(module.on_footswitch(FootswitchEvent::AlternatePressed));
    let driven = rig.run(&[0.0; 32]);
    assert_ne!(driven, take);
    assert!(driven.iter().all(|y| y.is_finite() && y.abs() <= 4.0));

    let module = rig.rack.get_mut(router).expect("router in rack");
    assert!(module.on_footswitch(FootswitchEvent::AlternateReleased));
    assert_eq!(rig.run(&[0.0; 32]), take);
}

#[test]
fn hold_clears_through_rack() {
    let mut rig = Rig::new(3, Vec::new(), ChainOrder::LooperFirst);
    rig.record(&[0.25; 10]);
    assert_eq!(rig.run(&[0.0; 10]), vec![0.25; 10]);

    let looper = rig.rack.get_mut(rig.looper).expect("looper in rack");
    assert!(looper.on_footswitch(FootswitchEvent::AlternateHeld));
    assert_eq!(rig.run(&[0.0; 10]), vec![0.0; 10]);
    assert!(rig.rack.poll_all());
}

#[derive(Debug, Clone)]
enum Op {
    Take { len: usize, level: f32 },
    Knob(f32),
    Modifier,
    Reset,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (1usize..60, -1.0f32..1.0).prop_map(|(len, level)| Op::Take { len, level }),
        3 => (0.0f32..=1.0).prop_map(Op::Knob),
        1 => Just(Op::Modifier),
        1 => Just(Op::Reset),
    ]
}

fn run_looper(looper: &mut Looper, input: &[f32]) -> Vec<f32> {
    let mut out_l = vec![0.0; input.len()];
    let mut out_r = vec![0.0; input.len()];
    looper.process_stereo_block(input, input, &mut out_l, &mut out_r);
    out_l
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// After every committed take the bank holds silence above the recorded
    /// layers, the selection stays inside them, and the first take's length
    /// never changes until a reset.
    #[test]
    fn layer_discipline_holds(
        layers in 2usize..6,
        ops in prop::collection::vec(op(), 1..30),
    ) {
        let mut looper = small_looper(layers);
        let mut locked: Option<usize> = None;

        for op in ops {
            match op {
                Op::Take { len, level } => {
                    looper.on_footswitch(FootswitchEvent::BypassPressed);
                    let out = run_looper(&mut looper, &vec![level; len]);
                    prop_assert!(out.iter().all(|y| y.is_finite()));
                    looper.on_footswitch(FootswitchEvent::BypassPressed);
                    run_looper(&mut looper, &[]);
                    if locked.is_none() {
                        locked = Some(len.min(looper.capacity()));
                    }
                }
                Op::Knob(m) => {
                    looper.set_magnitude(LAYER, m);
                    run_looper(&mut looper, &[0.0; 4]);
                }
                Op::Modifier => {
                    looper.on_footswitch(FootswitchEvent::AlternatePressed);
                    run_looper(&mut looper, &[0.0; 4]);
                }
                Op::Reset => {
                    looper.on_footswitch(FootswitchEvent::AlternateHeld);
                    run_looper(&mut looper, &[]);
                    locked = None;
                }
            }

            prop_assert!(!looper.is_recording());
            let n = looper.n_recorded_layers();
            prop_assert!(n < layers, "n_recorded {} with {} layers", n, layers);
            prop_assert!(looper.selected_layer() < n.max(1));
            prop_assert_eq!(looper.loop_length(), locked.unwrap_or(0));
            for index in n..layers {
                let layer = looper.layer(index).expect("layer in bank");
                prop_assert!(
                    layer.iter().all(|&s| s == 0.0),
                    "layer {} not silent with {} recorded", index, n
                );
            }
        }
    }
}
