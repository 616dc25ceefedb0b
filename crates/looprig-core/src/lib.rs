//! looprig core - the real-time heart of a looper pedal
//!
//! This crate holds the pieces of the pedal that run on the audio deadline
//! and the contract every processing stage implements. Concrete effects live
//! in `looprig-effects`; the control loop lives in `looprig-platform`.
//!
//! # Core Abstractions
//!
//! ## Effect Contract
//!
//! - [`EffectModule`] - Object-safe trait for every processing stage
//! - [`FootswitchEvent`] - Discrete switch events delivered by the control loop
//! - [`ParamBank`] / [`ParamDescriptor`] - Normalized `[0, 1]` parameter store
//!
//! ## Looper Primitives
//!
//! - [`PositionHead`] - Fractional loop cursor with speed, slicing and wrap counting
//!
//! ## Scheduling
//!
//! - [`Rack`] - Owns the boxed modules, addressed by [`ModuleId`]
//! - [`AudioPipeline`] - Per-block routing with pop-free enable/disable
//! - [`Crossfade`] / [`BypassSequencer`] - Sample-counted transition state machines
//!
//! ## Filters
//!
//! - [`Biquad`] - RBJ low/high-pass sections
//! - [`Svf`] - Topology-preserving state variable filter
//! - [`SmoothedParam`] - One-pole parameter glide
//!
//! # no_std Support
//!
//! Disable the default `std` feature for embedded targets:
//!
//! ```toml
//! [dependencies]
//! looprig-core = { version = "0.1", default-features = false }
//! ```
//!
//! The `tracing` feature adds debug events on control-side transitions.
//! Nothing is logged from the per-sample path.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod biquad;
pub mod effect;
pub mod param;
pub mod param_info;
pub mod pipeline;
pub mod position_head;
pub mod rack;
pub mod svf;
pub mod transition;

pub use biquad::{BUTTERWORTH_Q, Biquad, flush_denormal};
pub use effect::{EffectModule, FootswitchEvent, Trigger};
pub use param::SmoothedParam;
pub use param_info::{ParamBank, ParamDescriptor, ParamType};
pub use pipeline::{AudioPipeline, ChainOrder, EnablePolicy, HardwareState, PipelineConfig};
pub use position_head::PositionHead;
pub use rack::{BoxedModule, DynModule, ModuleId, Rack};
pub use svf::{Svf, SvfMode};
pub use transition::{BypassSequencer, Crossfade};
