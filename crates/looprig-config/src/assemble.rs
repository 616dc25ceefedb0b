//! Turns a [`RigConfig`] into a running [`Pedal`].

use looprig_core::{AudioPipeline, BoxedModule, EffectModule, ModuleId, PipelineConfig, Rack};
use looprig_effects::{EffectRouter, Looper, LooperConfig, ModuleRegistry};
use looprig_platform::{
    ControlBridge, KnobConfig, KnobRoute, Pedal, RoutesBuilder, SwitchConfig, SwitchRoute,
};

use crate::error::ConfigError;
use crate::rig::{LOOPER, RigConfig, SwitchAction};

impl RigConfig {
    /// Looper sizing as the engine sees it.
    pub fn looper_config(&self) -> LooperConfig {
        LooperConfig {
            layers: self.looper.layers,
            max_seconds: self.looper.max_seconds as f32,
            knob_hysteresis: self.looper.knob_hysteresis as f32,
            blink_interval_ms: self.looper.blink_interval_ms,
        }
    }

    /// Pipeline sizing and timing in samples.
    pub fn pipeline_config(&self) -> PipelineConfig {
        let t = &self.transitions;
        PipelineConfig {
            true_bypass: self.audio.true_bypass,
            policy: self.audio.policy.into(),
            order: self.audio.order.into(),
            ..PipelineConfig::from_timings(
                self.sample_rate as f32,
                self.audio.block_size,
                t.crossfade_secs as f32,
                t.mute_secs as f32,
                t.relay_secs as f32,
            )
        }
    }

    /// Knob monitor constants.
    pub fn knob_config(&self) -> KnobConfig {
        let c = &self.controls;
        KnobConfig {
            dead_zone: c.dead_zone as f32,
            tolerance: c.tolerance as f32,
            idle_secs: c.knob_idle_secs as f32,
            settle_secs: c.settle_secs as f32,
        }
    }

    /// Switch monitor constants.
    pub fn switch_config(&self) -> SwitchConfig {
        SwitchConfig {
            hold_ms: self.controls.hold_ms as f32,
            double_tap_secs: self.controls.double_tap_secs as f32,
        }
    }

    /// Validate the rig and build the pedal with the stock registry.
    pub fn build(&self) -> Result<Pedal, ConfigError> {
        self.build_with(&ModuleRegistry::new())
    }

    /// Validate the rig and build the pedal from `registry`.
    ///
    /// All allocation happens here: the looper's layer bank, every chain
    /// module and the frozen route tables.
    pub fn build_with(&self, registry: &ModuleRegistry) -> Result<Pedal, ConfigError> {
        self.validate_with(registry)?;

        let sample_rate = self.sample_rate as f32;
        let mut rack = Rack::new(sample_rate);

        let mut chain = Vec::with_capacity(self.chain.len());
        let mut ids: Vec<(&str, ModuleId)> = Vec::with_capacity(self.chain.len() + 1);
        for (name, bypassed) in self.chain_entries() {
            let module = if name.eq_ignore_ascii_case("router") {
                self.build_router(registry, sample_rate)?
            } else {
                registry
                    .create(name, sample_rate)
                    .ok_or_else(|| ConfigError::UnknownModule(name.to_string()))?
            };
            let id = rack.insert(module);
            if bypassed && let Some(module) = rack.get_mut(id) {
                module.set_enabled(false);
            }
            chain.push(id);
            ids.push((name, id));
        }

        let looper = rack.insert(Box::new(Looper::new(sample_rate, self.looper_config())));
        ids.push((LOOPER, looper));

        let lookup = |module: &str| -> Result<ModuleId, ConfigError> {
            let name = self.module_id(module)?;
            ids.iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, id)| *id)
                .ok_or_else(|| ConfigError::UnknownModule(module.to_string()))
        };

        let mut routes =
            RoutesBuilder::new().with_controls(self.controls.knobs, self.controls.switches);
        for route in &self.knobs {
            let module = lookup(&route.module)?;
            let param = self.resolve_param(registry, &route.module, &route.param)?;
            let transform = route
                .knob_transform()
                .ok_or_else(|| ConfigError::unknown_parameter(&route.module, &route.param))?;
            routes = routes.knob(
                route.knob,
                KnobRoute::new(module, param).with_transform(transform),
            );
        }
        for route in &self.switches {
            let switch_route = match route.action {
                SwitchAction::ChainOrderSelect => SwitchRoute::ChainOrderSelect,
                SwitchAction::Event => {
                    let module = route.module.as_deref().unwrap_or_default();
                    let event = route
                        .footswitch_event()
                        .ok_or_else(|| ConfigError::UnknownModule(module.to_string()))?;
                    SwitchRoute::module(lookup(module)?, event)
                }
            };
            routes = routes.switch(route.switch, switch_route);
        }

        let pipeline = AudioPipeline::new(self.pipeline_config(), chain, Some(looper));
        let bridge =
            ControlBridge::with_config(routes.build(), self.knob_config(), self.switch_config());

        tracing::info!(
            sample_rate = self.sample_rate,
            block_size = self.audio.block_size,
            modules = rack.len(),
            knob_routes = self.knobs.len(),
            switch_routes = self.switches.len(),
            "rig assembled"
        );

        Ok(Pedal::new(rack, pipeline, bridge)
            .with_led_source(self.controls.led_source.into())
            .with_midi_filter(self.midi.filter()))
    }

    fn build_router(
        &self,
        registry: &ModuleRegistry,
        sample_rate: f32,
    ) -> Result<BoxedModule, ConfigError> {
        let mut router = EffectRouter::new(sample_rate);
        if let Some(inner) = &self.router.inner {
            let module = registry
                .create(inner, sample_rate)
                .ok_or_else(|| ConfigError::UnknownModule(inner.clone()))?;
            router.set_inner(module);
        }
        Ok(Box::new(router))
    }
}
