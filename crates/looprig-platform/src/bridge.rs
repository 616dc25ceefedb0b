//! Control-to-audio parameter bridge.
//!
//! One [`ControlBridge::tick`] per control-loop iteration reads the surface,
//! conditions the knobs, classifies switch transitions and writes the
//! results through the frozen [`Routes`] into the modules of a [`Rack`].
//!
//! Knob writes go through `set_magnitude`, which modules read at the top of
//! their next block. Switch events go through `on_footswitch`, which only
//! latches state for the next block. Nothing here touches audio buffers.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use looprig_core::{AudioPipeline, ChainOrder, Rack, Trigger};

use crate::knob::{KnobConfig, KnobMonitor};
use crate::routes::{Routes, SwitchRoute};
use crate::surface::ControlSurface;
use crate::switch::{SwitchConfig, SwitchEdges, SwitchMonitor};

/// Counts from one bridge tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Parameter writes from active knobs.
    pub knob_writes: usize,
    /// Switch routes that fired.
    pub switch_events: usize,
    /// Some module reported a state change when polled.
    pub modules_changed: bool,
}

/// Knob and switch monitors plus the routing tables.
#[derive(Debug, Clone)]
pub struct ControlBridge {
    knobs: KnobMonitor,
    switches: Vec<SwitchMonitor>,
    routes: Routes,
}

impl ControlBridge {
    /// Bridge sized from the routing tables, with default timing.
    pub fn new(routes: Routes) -> Self {
        Self::with_config(routes, KnobConfig::default(), SwitchConfig::default())
    }

    /// Bridge with explicit knob and switch timing.
    pub fn with_config(routes: Routes, knobs: KnobConfig, switches: SwitchConfig) -> Self {
        Self {
            knobs: KnobMonitor::new(routes.knob_count(), knobs),
            switches: (0..routes.switch_count())
                .map(|_| SwitchMonitor::new(switches))
                .collect(),
            routes,
        }
    }

    /// Routing tables.
    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    /// Knob monitor.
    pub fn knobs(&self) -> &KnobMonitor {
        &self.knobs
    }

    /// Double-tap flag of switch `index`.
    pub fn double_tapped(&self, index: usize) -> bool {
        self.switches.get(index).is_some_and(SwitchMonitor::double_tapped)
    }

    /// Reads `surface` (already polled) and applies every route.
    pub fn tick<S: ControlSurface + ?Sized>(
        &mut self,
        surface: &S,
        elapsed_secs: f32,
        rack: &mut Rack,
        pipeline: &mut AudioPipeline,
    ) -> TickReport {
        let mut report = TickReport::default();

        let knob_count = surface.knob_count();
        self.knobs.update(elapsed_secs, |i| {
            if i < knob_count { surface.knob(i) } else { 0.0 }
        });

        let switch_count = self.switches.len().min(surface.switch_count());
        for index in 0..switch_count {
            let edges = self.switches[index].update(
                surface.rising_edge(index),
                surface.falling_edge(index),
                surface.time_held_ms(index),
                elapsed_secs,
            );
            if !edges.is_empty() {
                report.switch_events += self.dispatch_switch(index, edges, rack, pipeline);
            }
        }

        for (index, value) in self.knobs.active_knobs() {
            for route in self.routes.knob_routes(index) {
                if let Some(module) = rack.get_mut(route.module) {
                    module.set_magnitude(route.param, route.magnitude(value));
                    report.knob_writes += 1;
                }
            }
        }

        report
    }

    fn dispatch_switch(
        &self,
        index: usize,
        edges: SwitchEdges,
        rack: &mut Rack,
        pipeline: &mut AudioPipeline,
    ) -> usize {
        let mut fired = 0;
        for route in self.routes.switch_routes(index) {
            match *route {
                SwitchRoute::Module { module, event } => {
                    let matches = match event.trigger() {
                        Trigger::Press => edges.pressed,
                        Trigger::Release => edges.released,
                        Trigger::Hold => edges.held,
                    };
                    if !matches {
                        continue;
                    }
                    if let Some(target) = rack.get_mut(module) {
                        #[cfg(feature = "tracing")]
                        tracing::debug!("switch {index}: {event:?} -> {}", target.name());
                        target.on_footswitch(event);
                        fired += 1;
                    }
                }
                SwitchRoute::ChainOrderSelect => {
                    if edges.pressed {
                        pipeline.set_order(ChainOrder::ChainFirst);
                        fired += 1;
                    }
                    if edges.released {
                        pipeline.set_order(ChainOrder::LooperFirst);
                        fired += 1;
                    }
                }
            }
        }
        fired
    }
}
