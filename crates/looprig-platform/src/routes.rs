//! Static routing tables from controls to modules.
//!
//! Every knob and switch fans out to any number of targets. Tables are
//! assembled once through [`RoutesBuilder`] and frozen into [`Routes`],
//! which has no mutators.
//!
//! ```rust
//! use looprig_core::{FootswitchEvent, Rack};
//! use looprig_platform::routes::{KnobRoute, KnobTransform, RoutesBuilder, SwitchRoute};
//! # use looprig_core::EffectModule;
//! # struct Nop;
//! # impl EffectModule for Nop {
//! #     fn name(&self) -> &'static str { "nop" }
//! #     fn set_sample_rate(&mut self, _: f32) {}
//! #     fn reset(&mut self) {}
//! #     fn process_stereo(&mut self, l: f32, r: f32) -> (f32, f32) { (l, r) }
//! #     fn is_enabled(&self) -> bool { true }
//! #     fn set_enabled(&mut self, _: bool) {}
//! # }
//!
//! let mut rack = Rack::new(48000.0);
//! let drive = rack.insert(Box::new(Nop));
//!
//! let routes = RoutesBuilder::new()
//!     .knob(0, KnobRoute::new(drive, 1))
//!     .knob(1, KnobRoute::new(drive, 6).with_transform(KnobTransform::Power(0.7)))
//!     .switch(1, SwitchRoute::module(drive, FootswitchEvent::BypassPressed))
//!     .switch(6, SwitchRoute::ChainOrderSelect)
//!     .build();
//!
//! assert_eq!(routes.knob_routes(1).len(), 1);
//! assert_eq!(routes.switch_count(), 7);
//! assert!(routes.switch_routes(3).is_empty());
//! ```

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, vec::Vec};

use libm::powf;
use looprig_core::{FootswitchEvent, ModuleId};

/// Shapes a knob value before it reaches a parameter.
#[derive(Debug, Clone, Copy, Default)]
pub enum KnobTransform {
    /// `x`
    #[default]
    Identity,
    /// `1 - x`
    Invert,
    /// `from + (to - from) × x`; `from` may exceed `to`.
    Range {
        /// Output at the bottom of travel.
        from: f32,
        /// Output at the top of travel.
        to: f32,
    },
    /// `x ^ exp`
    Power(f32),
    /// `0` at the bottom of travel, `1` everywhere else.
    Gate,
    /// Arbitrary mapping.
    Custom(fn(f32) -> f32),
}

impl KnobTransform {
    /// Applies the transform. The result is not clamped.
    pub fn apply(&self, x: f32) -> f32 {
        match *self {
            Self::Identity => x,
            Self::Invert => 1.0 - x,
            Self::Range { from, to } => from + (to - from) * x,
            Self::Power(exp) => powf(x, exp),
            Self::Gate => {
                if x == 0.0 {
                    0.0
                } else {
                    1.0
                }
            }
            Self::Custom(f) => f(x),
        }
    }
}

/// One knob target.
#[derive(Debug, Clone, Copy)]
pub struct KnobRoute {
    /// Target module.
    pub module: ModuleId,
    /// Parameter index on the target.
    pub param: usize,
    /// Shaping applied before the write.
    pub transform: KnobTransform,
}

impl KnobRoute {
    /// Identity route to `param` on `module`.
    pub const fn new(module: ModuleId, param: usize) -> Self {
        Self {
            module,
            param,
            transform: KnobTransform::Identity,
        }
    }

    /// Replaces the transform.
    pub const fn with_transform(mut self, transform: KnobTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Value written to the parameter for knob value `x`.
    pub fn magnitude(&self, x: f32) -> f32 {
        self.transform.apply(x).clamp(0.0, 1.0)
    }
}

/// One switch target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchRoute {
    /// Deliver `event` to `module` when the switch makes the matching
    /// transition.
    Module {
        /// Target module.
        module: ModuleId,
        /// Event to deliver.
        event: FootswitchEvent,
    },
    /// Press selects effects-before-looper, release selects looper-first.
    ChainOrderSelect,
}

impl SwitchRoute {
    /// Route delivering `event` to `module`.
    pub const fn module(module: ModuleId, event: FootswitchEvent) -> Self {
        Self::Module { module, event }
    }
}

/// Collects routes before freezing them.
#[derive(Debug, Clone, Default)]
pub struct RoutesBuilder {
    knobs: Vec<Vec<KnobRoute>>,
    switches: Vec<Vec<SwitchRoute>>,
}

impl RoutesBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves tables for at least `knobs` knobs and `switches` switches.
    pub fn with_controls(mut self, knobs: usize, switches: usize) -> Self {
        if self.knobs.len() < knobs {
            self.knobs.resize_with(knobs, Vec::new);
        }
        if self.switches.len() < switches {
            self.switches.resize_with(switches, Vec::new);
        }
        self
    }

    /// Adds a target for knob `index`.
    pub fn knob(mut self, index: usize, route: KnobRoute) -> Self {
        if self.knobs.len() <= index {
            self.knobs.resize_with(index + 1, Vec::new);
        }
        self.knobs[index].push(route);
        self
    }

    /// Adds a target for switch `index`.
    pub fn switch(mut self, index: usize, route: SwitchRoute) -> Self {
        if self.switches.len() <= index {
            self.switches.resize_with(index + 1, Vec::new);
        }
        self.switches[index].push(route);
        self
    }

    /// Freezes the tables.
    pub fn build(self) -> Routes {
        Routes {
            knobs: self.knobs.into_iter().map(Vec::into_boxed_slice).collect(),
            switches: self
                .switches
                .into_iter()
                .map(Vec::into_boxed_slice)
                .collect(),
        }
    }
}

/// Frozen routing tables.
#[derive(Debug, Clone, Default)]
pub struct Routes {
    knobs: Box<[Box<[KnobRoute]>]>,
    switches: Box<[Box<[SwitchRoute]>]>,
}

impl Routes {
    /// Number of knobs with a table (routed or not).
    pub fn knob_count(&self) -> usize {
        self.knobs.len()
    }

    /// Number of switches with a table (routed or not).
    pub fn switch_count(&self) -> usize {
        self.switches.len()
    }

    /// Targets of knob `index`; empty when unrouted.
    pub fn knob_routes(&self, index: usize) -> &[KnobRoute] {
        self.knobs.get(index).map(|r| &**r).unwrap_or(&[])
    }

    /// Targets of switch `index`; empty when unrouted.
    pub fn switch_routes(&self, index: usize) -> &[SwitchRoute] {
        self.switches.get(index).map(|r| &**r).unwrap_or(&[])
    }
}
