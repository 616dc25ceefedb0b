//! Fixed-block audio pipeline scheduler.
//!
//! [`AudioPipeline`] runs once per audio block. It routes the block through
//! the looper and the ordered effect chain held in a [`Rack`], and makes
//! whole-pedal enable/disable transitions pop-free with a [`Crossfade`] and,
//! on hardware with a true-bypass relay, a [`BypassSequencer`].
//!
//! # Block Steps
//!
//! 1. Snapshot whether the effect path is on (forced on under
//!    [`EnablePolicy::AlwaysOn`]).
//! 2. On a transition, start the crossfade and the mute/relay sequence.
//! 3. Copy the dry block to scratch and run it through the chain and the
//!    looper in the selected [`ChainOrder`]. Disabled chain modules are
//!    skipped. The chain is not run at all while the path is off and idle.
//! 4. Per sample, advance the crossfade and the sequencer and blend dry with
//!    processed.
//!
//! No allocation happens after [`AudioPipeline::new`]. Host buffers longer
//! than the configured block size are processed in block-sized chunks.

#[cfg(not(feature = "std"))]
use alloc::vec;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::rack::{ModuleId, Rack};
use crate::transition::{BypassSequencer, Crossfade};

/// Order of the effect chain relative to the looper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainOrder {
    /// Effects first, looper records the processed signal.
    ChainFirst,
    /// Looper first, effects colour the loop and the live signal together.
    #[default]
    LooperFirst,
}

/// How the overall effect path decides whether it is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnablePolicy {
    /// Always on. Looper rigs use this so the loop never drops out.
    #[default]
    AlwaysOn,
    /// Follows [`AudioPipeline::request_enabled`].
    Requested,
}

/// Pipeline sizing and transition timing, all in samples.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Samples per audio block.
    pub block_size: usize,
    /// Dry/wet crossfade length.
    pub crossfade_samples: u32,
    /// How long the output stays muted after a transition.
    pub mute_samples: u32,
    /// When, within the mute, the relay flips. Kept below `mute_samples`.
    pub relay_samples: u32,
    /// Hardware has a true-bypass relay and mute line.
    pub true_bypass: bool,
    /// Enable policy.
    pub policy: EnablePolicy,
    /// Initial chain order.
    pub order: ChainOrder,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_timings(48000.0, 48, 0.1, 0.02, 0.01)
    }
}

impl PipelineConfig {
    /// Builds a configuration from durations in seconds.
    pub fn from_timings(
        sample_rate: f32,
        block_size: usize,
        crossfade_secs: f32,
        mute_secs: f32,
        relay_secs: f32,
    ) -> Self {
        let samples = |secs: f32| (secs.max(0.0) * sample_rate) as u32;
        Self {
            block_size: block_size.max(1),
            crossfade_samples: samples(crossfade_secs),
            mute_samples: samples(mute_secs),
            relay_samples: samples(relay_secs),
            true_bypass: true,
            policy: EnablePolicy::AlwaysOn,
            order: ChainOrder::LooperFirst,
        }
    }
}

/// Hardware outputs the host applies before the next block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareState {
    /// Output mute line.
    pub muted: bool,
    /// True-bypass relay routes input straight to output.
    pub relay_engaged: bool,
}

/// Per-block scheduler for the looper and the effect chain.
#[derive(Debug)]
pub struct AudioPipeline {
    config: PipelineConfig,
    chain: Vec<ModuleId>,
    looper: Option<ModuleId>,
    order: ChainOrder,
    requested_on: bool,
    effect_on: bool,
    crossfade: Crossfade,
    sequencer: BypassSequencer,
    a_l: Vec<f32>,
    a_r: Vec<f32>,
    b_l: Vec<f32>,
    b_r: Vec<f32>,
}

impl AudioPipeline {
    /// Creates a pipeline over `chain` (in processing order) and an optional
    /// looper slot. The effect path starts off, so the first block fades in.
    pub fn new(config: PipelineConfig, chain: Vec<ModuleId>, looper: Option<ModuleId>) -> Self {
        let block = config.block_size.max(1);
        Self {
            order: config.order,
            crossfade: Crossfade::new(config.crossfade_samples),
            sequencer: BypassSequencer::new(config.mute_samples, config.relay_samples),
            chain,
            looper,
            requested_on: true,
            effect_on: false,
            a_l: vec![0.0; block],
            a_r: vec![0.0; block],
            b_l: vec![0.0; block],
            b_r: vec![0.0; block],
            config,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Chain module ids in processing order.
    pub fn chain(&self) -> &[ModuleId] {
        &self.chain
    }

    /// Looper slot.
    pub fn looper(&self) -> Option<ModuleId> {
        self.looper
    }

    /// Current chain order.
    pub fn order(&self) -> ChainOrder {
        self.order
    }

    /// Selects the chain order; takes effect on the next block.
    pub fn set_order(&mut self, order: ChainOrder) {
        #[cfg(feature = "tracing")]
        if order != self.order {
            tracing::debug!("pipeline_order: {order:?}");
        }
        self.order = order;
    }

    /// Requests the effect path on or off. Ignored under
    /// [`EnablePolicy::AlwaysOn`].
    pub fn request_enabled(&mut self, on: bool) {
        self.requested_on = on;
    }

    /// Flips the requested state.
    pub fn toggle_requested(&mut self) {
        self.requested_on = !self.requested_on;
    }

    /// Effect-path state as of the last block.
    pub fn is_effect_on(&self) -> bool {
        self.effect_on
    }

    /// True while a dry/wet fade is running.
    pub fn is_crossfading(&self) -> bool {
        self.crossfade.is_active()
    }

    /// Mute and relay outputs as of the last processed sample.
    pub fn hardware_state(&self) -> HardwareState {
        if self.config.true_bypass {
            HardwareState {
                muted: self.sequencer.muted(),
                relay_engaged: self.sequencer.relay_engaged(),
            }
        } else {
            HardwareState {
                muted: false,
                relay_engaged: false,
            }
        }
    }

    /// Processes a host buffer of any length.
    ///
    /// Returns the hardware outputs to apply before the next call.
    pub fn process_block(
        &mut self,
        rack: &mut Rack,
        in_l: &[f32],
        in_r: &[f32],
        out_l: &mut [f32],
        out_r: &mut [f32],
    ) -> HardwareState {
        debug_assert_eq!(in_l.len(), in_r.len());
        debug_assert_eq!(in_l.len(), out_l.len());
        debug_assert_eq!(in_l.len(), out_r.len());
        let total = in_l.len().min(in_r.len()).min(out_l.len()).min(out_r.len());
        let block = self.a_l.len();

        let mut start = 0;
        while start < total {
            let end = (start + block).min(total);
            self.process_chunk(
                rack,
                &in_l[start..end],
                &in_r[start..end],
                &mut out_l[start..end],
                &mut out_r[start..end],
            );
            start = end;
        }
        self.hardware_state()
    }

    fn process_chunk(
        &mut self,
        rack: &mut Rack,
        in_l: &[f32],
        in_r: &[f32],
        out_l: &mut [f32],
        out_r: &mut [f32],
    ) {
        let n = in_l.len();

        let was_on = self.effect_on;
        self.effect_on = match self.config.policy {
            EnablePolicy::AlwaysOn => true,
            EnablePolicy::Requested => self.requested_on,
        };
        if was_on != self.effect_on {
            self.crossfade.start(self.effect_on);
            if self.config.true_bypass {
                self.sequencer.begin(self.effect_on);
            }
        }

        self.a_l[..n].copy_from_slice(in_l);
        self.a_r[..n].copy_from_slice(in_r);
        let mut in_a = true;

        let run_chain = self.effect_on || self.crossfade.is_active();
        let looper = self.looper;
        match self.order {
            ChainOrder::ChainFirst => {
                if run_chain {
                    for i in 0..self.chain.len() {
                        let id = self.chain[i];
                        self.run_module(rack, id, n, &mut in_a, false);
                    }
                }
                if let Some(id) = looper {
                    self.run_module(rack, id, n, &mut in_a, true);
                }
            }
            ChainOrder::LooperFirst => {
                if let Some(id) = looper {
                    self.run_module(rack, id, n, &mut in_a, true);
                }
                if run_chain {
                    for i in 0..self.chain.len() {
                        let id = self.chain[i];
                        self.run_module(rack, id, n, &mut in_a, false);
                    }
                }
            }
        }

        let (wet_l, wet_r) = if in_a {
            (&self.a_l[..n], &self.a_r[..n])
        } else {
            (&self.b_l[..n], &self.b_r[..n])
        };
        for i in 0..n {
            let position = self.crossfade.next_position();
            if self.config.true_bypass {
                self.sequencer.tick();
            }
            out_l[i] = Crossfade::mix(in_l[i], wet_l[i], position);
            out_r[i] = Crossfade::mix(in_r[i], wet_r[i], position);
        }
    }

    /// Runs one module from the current scratch pair into the other.
    fn run_module(&mut self, rack: &mut Rack, id: ModuleId, n: usize, in_a: &mut bool, force: bool) {
        let Some(module) = rack.get_mut(id) else {
            return;
        };
        if !force && !module.is_enabled() {
            return;
        }
        if *in_a {
            module.process_stereo_block(
                &self.a_l[..n],
                &self.a_r[..n],
                &mut self.b_l[..n],
                &mut self.b_r[..n],
            );
        } else {
            module.process_stereo_block(
                &self.b_l[..n],
                &self.b_r[..n],
                &mut self.a_l[..n],
                &mut self.a_r[..n],
            );
        }
        *in_a = !*in_a;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::EffectModule;

    /// Adds a constant to the left channel and scales the right.
    struct Offset {
        add: f32,
        enabled: bool,
    }

    impl EffectModule for Offset {
        fn name(&self) -> &'static str {
            "offset"
        }
        fn set_sample_rate(&mut self, _sample_rate: f32) {}
        fn reset(&mut self) {}
        fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
            (left + self.add, right * 2.0)
        }
        fn is_enabled(&self) -> bool {
            self.enabled
        }
        fn set_enabled(&mut self, enabled: bool) {
            self.enabled = enabled;
        }
    }

    /// Doubles the left channel; lets tests tell chain order apart.
    struct Doubler;

    impl EffectModule for Doubler {
        fn name(&self) -> &'static str {
            "doubler"
        }
        fn set_sample_rate(&mut self, _sample_rate: f32) {}
        fn reset(&mut self) {}
        fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
            (left * 2.0, right)
        }
        fn is_enabled(&self) -> bool {
            false
        }
        fn set_enabled(&mut self, _enabled: bool) {}
    }

    fn quick_config(policy: EnablePolicy) -> PipelineConfig {
        PipelineConfig {
            block_size: 4,
            crossfade_samples: 0,
            mute_samples: 3,
            relay_samples: 1,
            true_bypass: true,
            policy,
            order: ChainOrder::LooperFirst,
        }
    }

    fn run(pipeline: &mut AudioPipeline, rack: &mut Rack, input: &[f32]) -> Vec<f32> {
        let mut out_l = vec![0.0; input.len()];
        let mut out_r = vec![0.0; input.len()];
        pipeline.process_block(rack, input, input, &mut out_l, &mut out_r);
        out_l
    }

    #[test]
    fn order_changes_result() {
        let mut rack = Rack::new(48000.0);
        let fx = rack.insert(Box::new(Offset { add: 1.0, enabled: true }));
        let looper = rack.insert(Box::new(Doubler));
        let mut pipeline = AudioPipeline::new(
            quick_config(EnablePolicy::AlwaysOn),
            vec![fx],
            Some(looper),
        );

        // Looper (x2) then chain (+1)
        assert_eq!(run(&mut pipeline, &mut rack, &[1.0; 4]), vec![3.0; 4]);

        pipeline.set_order(ChainOrder::ChainFirst);
        // Chain (+1) then looper (x2)
        assert_eq!(run(&mut pipeline, &mut rack, &[1.0; 4]), vec![4.0; 4]);
    }

    #[test]
    fn disabled_chain_module_is_skipped() {
        let mut rack = Rack::new(48000.0);
        let fx = rack.insert(Box::new(Offset { add: 1.0, enabled: false }));
        let mut pipeline = AudioPipeline::new(quick_config(EnablePolicy::AlwaysOn), vec![fx], None);
        assert_eq!(run(&mut pipeline, &mut rack, &[0.5; 4]), vec![0.5; 4]);
    }

    #[test]
    fn looper_runs_even_when_flagged_disabled() {
        let mut rack = Rack::new(48000.0);
        let looper = rack.insert(Box::new(Doubler));
        let mut pipeline =
            AudioPipeline::new(quick_config(EnablePolicy::AlwaysOn), Vec::new(), Some(looper));
        assert_eq!(run(&mut pipeline, &mut rack, &[0.5; 4]), vec![1.0; 4]);
    }

    #[test]
    fn long_host_buffer_is_chunked() {
        let mut rack = Rack::new(48000.0);
        let fx = rack.insert(Box::new(Offset { add: 0.25, enabled: true }));
        let mut pipeline = AudioPipeline::new(quick_config(EnablePolicy::AlwaysOn), vec![fx], None);
        let input: Vec<f32> = (0..11).map(|i| i as f32).collect();
        let out = run(&mut pipeline, &mut rack, &input);
        let expected: Vec<f32> = input.iter().map(|x| x + 0.25).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn first_block_engages_and_sequences_relay() {
        let mut rack = Rack::new(48000.0);
        let mut pipeline = AudioPipeline::new(quick_config(EnablePolicy::AlwaysOn), Vec::new(), None);
        assert!(pipeline.hardware_state().relay_engaged);

        let mut out = [0.0; 4];
        let mut out_r = [0.0; 4];
        let state = pipeline.process_block(&mut rack, &[0.0; 4], &[0.0; 4], &mut out, &mut out_r);
        assert!(pipeline.is_effect_on());
        assert_eq!(
            state,
            HardwareState {
                muted: false,
                relay_engaged: false
            }
        );
    }

    #[test]
    fn requested_policy_fades_out_to_dry() {
        let mut rack = Rack::new(48000.0);
        let fx = rack.insert(Box::new(Offset { add: 1.0, enabled: true }));
        let mut config = quick_config(EnablePolicy::Requested);
        config.crossfade_samples = 4;
        let mut pipeline = AudioPipeline::new(config, vec![fx], None);

        // Fade in: 0, 1/3, 2/3, 1 of the +1 offset
        let out = run(&mut pipeline, &mut rack, &[0.0; 4]);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[3], 1.0);
        assert!(out.windows(2).all(|w| w[0] <= w[1]), "got {out:?}");

        pipeline.request_enabled(false);
        let out = run(&mut pipeline, &mut rack, &[0.0; 4]);
        assert_eq!(out[0], 1.0);
        assert_eq!(out[3], 0.0);
        assert!(!pipeline.is_crossfading());

        // Off and idle: chain is not run, output is dry
        let out = run(&mut pipeline, &mut rack, &[0.5; 4]);
        assert_eq!(out, vec![0.5; 4]);
        assert!(pipeline.hardware_state().relay_engaged);
    }

    #[test]
    fn no_true_bypass_reports_idle_hardware() {
        let mut rack = Rack::new(48000.0);
        let mut config = quick_config(EnablePolicy::AlwaysOn);
        config.true_bypass = false;
        let mut pipeline = AudioPipeline::new(config, Vec::new(), None);
        let state = pipeline.process_block(&mut rack, &[0.0; 4], &[0.0; 4], &mut [0.0; 4], &mut [0.0; 4]);
        assert!(!state.muted);
        assert!(!state.relay_engaged);
    }

    #[test]
    fn from_timings_converts_seconds() {
        let config = PipelineConfig::from_timings(48000.0, 48, 0.1, 0.02, 0.01);
        assert_eq!(config.crossfade_samples, 4800);
        assert_eq!(config.mute_samples, 960);
        assert_eq!(config.relay_samples, 480);
    }
}
