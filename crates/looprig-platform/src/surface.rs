//! Physical control surface abstraction.
//!
//! [`ControlSurface`] is what the control loop reads knobs and switches from
//! and writes LEDs and the bypass hardware to. Hardware boards implement it
//! over their ADC and GPIO drivers; [`VirtualSurface`] implements it in
//! memory for hosts and tests.
//!
//! # Value Ranges
//!
//! - Knobs: raw readings in `[0, 1]` before dead-zone conditioning
//! - LEDs: brightness in `[0, 1]`
//! - Three-position toggles appear as two switches (left, right); see
//!   [`ThreeWay`]

#[cfg(not(feature = "std"))]
use alloc::vec;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use core::time::Duration;

/// Knobs, switches and LEDs of a pedal.
///
/// # Thread Safety
///
/// This trait does not require thread safety. The control loop owns the
/// surface and calls it from one context.
pub trait ControlSurface {
    /// Number of knobs.
    fn knob_count(&self) -> usize;

    /// Number of switches.
    fn switch_count(&self) -> usize;

    /// Raw reading of knob `index`; `0.0` for unknown knobs.
    fn knob(&self, index: usize) -> f32;

    /// Switch went down since the previous [`poll`](Self::poll).
    fn rising_edge(&self, index: usize) -> bool;

    /// Switch came up since the previous [`poll`](Self::poll).
    fn falling_edge(&self, index: usize) -> bool;

    /// How long the switch has been down, in milliseconds; `0.0` while up.
    fn time_held_ms(&self, index: usize) -> f32;

    /// Number of LEDs.
    fn led_count(&self) -> usize;

    /// Sets LED brightness.
    fn set_led(&mut self, index: usize, brightness: f32);

    /// True when the board has a true-bypass relay and mute line.
    fn supports_true_bypass(&self) -> bool {
        false
    }

    /// Drives the output mute line.
    fn set_mute(&mut self, _muted: bool) {}

    /// Drives the true-bypass relay.
    fn set_bypass(&mut self, _engaged: bool) {}

    /// Samples the controls. Edges reported afterwards refer to this poll.
    fn poll(&mut self);
}

/// Position of a three-position toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreeWay {
    /// Left; position value 0.0.
    Left,
    /// Centre; position value 0.5.
    #[default]
    Middle,
    /// Right; position value 1.0.
    Right,
}

impl ThreeWay {
    /// Nearest position for a value in `[0, 1]`.
    pub fn from_value(value: f32) -> Self {
        if value < 0.25 {
            Self::Left
        } else if value > 0.75 {
            Self::Right
        } else {
            Self::Middle
        }
    }

    /// Position value.
    pub const fn value(self) -> f32 {
        match self {
            Self::Left => 0.0,
            Self::Middle => 0.5,
            Self::Right => 1.0,
        }
    }

    /// States of the (left, right) switch pair.
    pub const fn switches(self) -> (bool, bool) {
        match self {
            Self::Left => (true, false),
            Self::Middle => (false, false),
            Self::Right => (false, true),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct VirtualSwitch {
    down: bool,
    was_down: bool,
    rising: bool,
    falling: bool,
    held: Duration,
}

/// In-memory control surface.
///
/// Tests and hosts set knob and switch states directly, call
/// [`advance`](Self::advance) to let time pass for held switches, and read
/// back LEDs and the bypass hardware.
///
/// # Example
///
/// ```rust
/// use core::time::Duration;
/// use looprig_platform::{ControlSurface, VirtualSurface};
///
/// let mut surface = VirtualSurface::new(6, 2, 2);
/// surface.press(0);
/// surface.poll();
/// assert!(surface.rising_edge(0));
///
/// surface.advance(Duration::from_millis(1200));
/// surface.poll();
/// assert!(!surface.rising_edge(0));
/// assert!(surface.time_held_ms(0) >= 1200.0);
/// ```
#[derive(Debug, Clone)]
pub struct VirtualSurface {
    knobs: Vec<f32>,
    switches: Vec<VirtualSwitch>,
    leds: Vec<f32>,
    true_bypass: bool,
    muted: bool,
    bypass_engaged: bool,
}

impl VirtualSurface {
    /// Surface with the given control counts, knobs at zero, switches up.
    pub fn new(knobs: usize, switches: usize, leds: usize) -> Self {
        Self {
            knobs: vec![0.0; knobs],
            switches: vec![VirtualSwitch::default(); switches],
            leds: vec![0.0; leds],
            true_bypass: false,
            muted: false,
            bypass_engaged: false,
        }
    }

    /// Declares a true-bypass relay and mute line.
    pub fn with_true_bypass(mut self, supported: bool) -> Self {
        self.true_bypass = supported;
        self
    }

    /// Sets the raw reading of knob `index`, clamped to `[0, 1]`.
    pub fn set_knob(&mut self, index: usize, value: f32) {
        if let Some(knob) = self.knobs.get_mut(index) {
            *knob = value.clamp(0.0, 1.0);
        }
    }

    /// Puts switch `index` down or up.
    pub fn set_switch(&mut self, index: usize, down: bool) {
        if let Some(sw) = self.switches.get_mut(index) {
            sw.down = down;
        }
    }

    /// Puts switch `index` down.
    pub fn press(&mut self, index: usize) {
        self.set_switch(index, true);
    }

    /// Lets switch `index` up.
    pub fn release(&mut self, index: usize) {
        self.set_switch(index, false);
    }

    /// Sets the three-position toggle whose left switch is `left`; the right
    /// switch is `left + 1`.
    pub fn set_three_way(&mut self, left: usize, position: ThreeWay) {
        let (l, r) = position.switches();
        self.set_switch(left, l);
        self.set_switch(left + 1, r);
    }

    /// Lets `elapsed` pass for every switch that is down.
    pub fn advance(&mut self, elapsed: Duration) {
        for sw in &mut self.switches {
            if sw.down && sw.was_down {
                sw.held += elapsed;
            }
        }
    }

    /// True when switch `index` is down.
    pub fn is_down(&self, index: usize) -> bool {
        self.switches.get(index).is_some_and(|s| s.down)
    }

    /// Brightness last written to LED `index`.
    pub fn led(&self, index: usize) -> f32 {
        self.leds.get(index).copied().unwrap_or(0.0)
    }

    /// Mute line state.
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Relay state.
    pub fn is_bypass_engaged(&self) -> bool {
        self.bypass_engaged
    }
}

impl ControlSurface for VirtualSurface {
    fn knob_count(&self) -> usize {
        self.knobs.len()
    }

    fn switch_count(&self) -> usize {
        self.switches.len()
    }

    fn knob(&self, index: usize) -> f32 {
        self.knobs.get(index).copied().unwrap_or(0.0)
    }

    fn rising_edge(&self, index: usize) -> bool {
        self.switches.get(index).is_some_and(|s| s.rising)
    }

    fn falling_edge(&self, index: usize) -> bool {
        self.switches.get(index).is_some_and(|s| s.falling)
    }

    fn time_held_ms(&self, index: usize) -> f32 {
        self.switches
            .get(index)
            .filter(|s| s.down)
            .map_or(0.0, |s| s.held.as_secs_f32() * 1000.0)
    }

    fn led_count(&self) -> usize {
        self.leds.len()
    }

    fn set_led(&mut self, index: usize, brightness: f32) {
        if let Some(led) = self.leds.get_mut(index) {
            *led = brightness.clamp(0.0, 1.0);
        }
    }

    fn supports_true_bypass(&self) -> bool {
        self.true_bypass
    }

    fn set_mute(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn set_bypass(&mut self, engaged: bool) {
        self.bypass_engaged = engaged;
    }

    fn poll(&mut self) {
        for sw in &mut self.switches {
            sw.rising = sw.down && !sw.was_down;
            sw.falling = !sw.down && sw.was_down;
            if sw.rising || !sw.down {
                sw.held = Duration::ZERO;
            }
            sw.was_down = sw.down;
        }
    }
}
