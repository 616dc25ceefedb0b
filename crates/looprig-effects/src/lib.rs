//! looprig effects - the processing stages of the pedal
//!
//! Every stage implements [`looprig_core::EffectModule`] and is stored in a
//! [`looprig_core::Rack`]:
//!
//! - [`Looper`] - Seven-layer overdub looper with speed/slice modifier
//! - [`EffectRouter`] - Gates another module on a three-position switch
//! - [`Distortion`] - Six clipper types, 4× oversampling, tilt tone
//! - [`FilterSweep`] - Bipolar low-pass/high-pass sweep on one knob
//!
//! [`ModuleRegistry`] builds them by id for configuration files.
//!
//! ## Example
//!
//! ```rust
//! use looprig_core::{AudioPipeline, PipelineConfig, Rack};
//! use looprig_effects::{Distortion, FilterSweep, Looper, LooperConfig};
//!
//! let mut rack = Rack::new(48000.0);
//! let dist = rack.insert(Box::new(Distortion::new(48000.0)));
//! let filter = rack.insert(Box::new(FilterSweep::new(48000.0)));
//! let config = LooperConfig { max_seconds: 1.0, ..LooperConfig::default() };
//! let looper = rack.insert(Box::new(Looper::new(48000.0, config)));
//!
//! let mut pipeline = AudioPipeline::new(PipelineConfig::default(), vec![dist, filter], Some(looper));
//! let input = [0.0f32; 48];
//! let (mut out_l, mut out_r) = ([0.0f32; 48], [0.0f32; 48]);
//! pipeline.process_block(&mut rack, &input, &input, &mut out_l, &mut out_r);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod blink;
pub mod distortion;
pub mod filter;
pub mod looper;
pub mod registry;
pub mod router;

pub use blink::{LedAnimator, LooperView};
pub use distortion::{Clipper, Distortion};
pub use filter::{FilterSweep, SweepMode};
pub use looper::{Looper, LooperCommand, LooperConfig};
pub use registry::{ModuleCategory, ModuleDescriptor, ModuleRegistry};
pub use router::EffectRouter;
