//! Footswitch and toggle monitoring.
//!
//! The surface reports raw edges and how long a switch has been down.
//! [`SwitchMonitor`] turns that into the three events routes listen for
//! (press, release, hold) plus a double-tap flag.

use core::time::Duration;

/// Switch timing constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwitchConfig {
    /// Hold time that fires a hold event.
    pub hold_ms: f32,
    /// A second press within this window of the first is a double tap.
    pub double_tap_secs: f32,
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            hold_ms: 1000.0,
            double_tap_secs: 2.0,
        }
    }
}

/// What a switch did during one control tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwitchEdges {
    /// Rising edge.
    pub pressed: bool,
    /// Falling edge.
    pub released: bool,
    /// Hold threshold reached during this press.
    pub held: bool,
}

impl SwitchEdges {
    /// True when nothing happened.
    pub fn is_empty(&self) -> bool {
        !(self.pressed || self.released || self.held)
    }
}

/// Hold guard and double-tap window for one switch.
///
/// # Example
///
/// ```rust
/// use looprig_platform::switch::{SwitchConfig, SwitchMonitor};
///
/// let mut sw = SwitchMonitor::new(SwitchConfig::default());
/// assert!(sw.update(true, false, 0.0, 0.01).pressed);
/// assert!(sw.update(false, false, 1200.0, 0.01).held);
/// // Only once per press.
/// assert!(!sw.update(false, false, 1300.0, 0.01).held);
/// ```
#[derive(Debug, Clone)]
pub struct SwitchMonitor {
    config: SwitchConfig,
    held_fired: bool,
    tap_pending: bool,
    tap_remaining: f32,
    double_tapped: bool,
}

impl SwitchMonitor {
    /// Creates an idle monitor.
    pub fn new(config: SwitchConfig) -> Self {
        Self {
            config,
            held_fired: false,
            tap_pending: false,
            tap_remaining: 0.0,
            double_tapped: false,
        }
    }

    /// Advances by `elapsed_secs` with this tick's raw switch state.
    pub fn update(
        &mut self,
        rising: bool,
        falling: bool,
        held_ms: f32,
        elapsed_secs: f32,
    ) -> SwitchEdges {
        let held = held_ms >= self.config.hold_ms && !self.held_fired && !falling;
        if held {
            self.held_fired = true;
        }
        if falling {
            self.held_fired = false;
        }

        if self.tap_pending {
            self.tap_remaining -= elapsed_secs;
            if self.tap_remaining <= 0.0 {
                self.tap_pending = false;
                self.double_tapped = false;
            }
        }
        if rising {
            if self.tap_pending && self.tap_remaining > 0.0 {
                self.double_tapped = true;
            }
            self.tap_pending = true;
            self.tap_remaining = self.config.double_tap_secs;
        }

        SwitchEdges {
            pressed: rising,
            released: falling,
            held,
        }
    }

    /// Same as [`update`](Self::update) with a [`Duration`].
    pub fn update_for(
        &mut self,
        rising: bool,
        falling: bool,
        held: Duration,
        elapsed: Duration,
    ) -> SwitchEdges {
        self.update(
            rising,
            falling,
            held.as_secs_f32() * 1000.0,
            elapsed.as_secs_f32(),
        )
    }

    /// True after a second press landed inside the double-tap window; cleared
    /// when the window lapses.
    pub fn double_tapped(&self) -> bool {
        self.double_tapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> SwitchMonitor {
        SwitchMonitor::new(SwitchConfig::default())
    }

    #[test]
    fn hold_fires_once_per_cycle() {
        let mut sw = monitor();
        sw.update(true, false, 0.0, 0.01);
        assert!(!sw.update(false, false, 999.0, 0.01).held);
        assert!(sw.update(false, false, 1000.0, 0.01).held);
        assert!(!sw.update(false, false, 1500.0, 0.01).held);
        assert!(!sw.update(false, false, 4000.0, 0.01).held);

        assert!(sw.update(false, true, 0.0, 0.01).released);
        sw.update(true, false, 0.0, 0.01);
        assert!(sw.update(false, false, 1000.0, 0.01).held);
    }

    #[test]
    fn release_tick_does_not_hold() {
        let mut sw = monitor();
        sw.update(true, false, 0.0, 0.01);
        let edges = sw.update(false, true, 1200.0, 0.01);
        assert!(edges.released);
        assert!(!edges.held);
    }

    #[test]
    fn double_tap_window() {
        let mut sw = monitor();
        sw.update(true, false, 0.0, 0.01);
        sw.update(false, true, 0.0, 0.5);
        assert!(!sw.double_tapped());
        sw.update(true, false, 0.0, 0.5);
        assert!(sw.double_tapped());

        // The flag clears once the window lapses.
        sw.update(false, true, 0.0, 1.0);
        assert!(sw.double_tapped());
        sw.update(false, false, 0.0, 1.5);
        assert!(!sw.double_tapped());
    }

    #[test]
    fn slow_second_press_is_single() {
        let mut sw = monitor();
        sw.update(true, false, 0.0, 0.01);
        sw.update(false, true, 0.0, 1.0);
        sw.update(true, false, 0.0, 1.5);
        assert!(!sw.double_tapped());
    }

    #[test]
    fn durations_convert() {
        let mut sw = monitor();
        sw.update_for(true, false, Duration::ZERO, Duration::from_millis(10));
        let edges = sw.update_for(
            false,
            false,
            Duration::from_millis(1000),
            Duration::from_millis(10),
        );
        assert!(edges.held);
        assert!(!edges.is_empty());
    }
}
