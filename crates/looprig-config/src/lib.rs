//! Rig configuration for looprig pedals.
//!
//! A rig file names the effect chain, the looper sizing, transition timing,
//! the control surface constants and the routes from knobs and switches to
//! module parameters and footswitch events. [`RigConfig::build`] validates
//! the file and assembles a ready-to-run [`Pedal`].
//!
//! # Example
//!
//! ```rust,no_run
//! use looprig_config::RigConfig;
//!
//! let rig = RigConfig::load("stage.toml").unwrap();
//! let mut pedal = rig.build().unwrap();
//!
//! let block = rig.audio.block_size;
//! let input = vec![0.0; block];
//! let (mut out_l, mut out_r) = (vec![0.0; block], vec![0.0; block]);
//! pedal.process_block(&input, &input, &mut out_l, &mut out_r);
//! ```

mod assemble;
mod error;
mod rig;

/// Rig validation.
pub mod validation;

pub use error::ConfigError;
pub use rig::{
    AudioSection, BYPASS_PREFIX, ControlSection, EventKind, KnobRouteConfig, LOOPER,
    LedSourceConfig, LooperSection, MidiSection, OrderConfig, PolicyConfig, RigConfig,
    RouterSection, SwitchAction, SwitchRouteConfig, TransformKind, TransitionSection,
    parse_chain_entry,
};
pub use validation::ValidationError;

/// Re-exported so hosts can list modules without another dependency.
pub use looprig_effects::{ModuleCategory, ModuleDescriptor, ModuleRegistry};
pub use looprig_platform::Pedal;
