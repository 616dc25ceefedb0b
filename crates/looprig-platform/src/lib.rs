//! looprig platform - the control loop of the pedal
//!
//! This crate connects physical controls to the modules in a
//! [`looprig_core::Rack`] and ties the audio and control entry points
//! together in a [`Pedal`].
//!
//! # Core Abstractions
//!
//! ## Controls
//!
//! - [`ControlSurface`] - Knobs, switches, LEDs and bypass hardware of a board
//! - [`VirtualSurface`] - In-memory surface for hosts and tests
//! - [`KnobMonitor`] - Dead zone, settle window and idle tracking per knob
//! - [`SwitchMonitor`] - Press, release, hold-once and double-tap per switch
//!
//! ## Routing
//!
//! - [`RoutesBuilder`] / [`Routes`] - Frozen knob and switch fan-out tables
//! - [`ControlBridge`] - Applies the tables once per control tick
//!
//! ## MIDI
//!
//! - [`MidiEvent`] - Decoded messages
//! - [`MidiClock`] - 24-PPQN transport with a quarter-note beat flag
//! - [`ChannelFilter`] - Omni or single-channel input
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! looprig-platform = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod bridge;
pub mod knob;
pub mod midi;
pub mod pedal;
pub mod routes;
pub mod surface;
pub mod switch;

pub use bridge::{ControlBridge, TickReport};
pub use knob::{KnobConfig, KnobMonitor, dead_zone};
pub use midi::{ChannelFilter, MidiClock, MidiEvent, MidiInput, TICKS_PER_BEAT};
pub use pedal::{LedSource, Pedal};
pub use routes::{KnobRoute, KnobTransform, Routes, RoutesBuilder, SwitchRoute};
pub use surface::{ControlSurface, ThreeWay, VirtualSurface};
pub use switch::{SwitchConfig, SwitchEdges, SwitchMonitor};
