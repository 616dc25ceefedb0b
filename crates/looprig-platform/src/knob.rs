//! Knob conditioning and change tracking.
//!
//! Raw pot readings never quite reach the ends of their travel and jitter by
//! a few LSBs. [`dead_zone`] stretches the usable range back to `[0, 1]` and
//! [`KnobMonitor`] decides which knobs are being turned.
//!
//! A knob is *active* while it is moving and for a short idle time after it
//! stops. Only active knobs are written to their routes, so a parameter set
//! some other way (MIDI, a preset) is not immediately overwritten by a knob
//! nobody touched.

#[cfg(not(feature = "std"))]
use alloc::vec;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use libm::fabsf;

/// Fraction of travel ignored at each end of a pot.
pub const DEFAULT_DEAD_ZONE: f32 = 0.05;

/// Smallest reading change treated as movement (one 8-bit step).
pub const CHANGE_TOLERANCE: f32 = 1.0 / 256.0;

/// Maps a raw reading onto `[0, 1]` with a dead zone at both ends.
///
/// ```rust
/// use looprig_platform::knob::dead_zone;
///
/// assert_eq!(dead_zone(0.02, 0.05), 0.0);
/// assert_eq!(dead_zone(0.5, 0.05), 0.5);
/// assert_eq!(dead_zone(0.97, 0.05), 1.0);
/// ```
#[inline]
pub fn dead_zone(raw: f32, dz: f32) -> f32 {
    if raw <= dz {
        0.0
    } else if raw >= 1.0 - dz {
        1.0
    } else {
        (raw - dz) / (1.0 - 2.0 * dz)
    }
}

/// Knob timing constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnobConfig {
    /// Dead zone at each end of travel.
    pub dead_zone: f32,
    /// Movement needed to wake a knob.
    pub tolerance: f32,
    /// Seconds a knob stays active after it stops moving.
    pub idle_secs: f32,
    /// Seconds after start-up during which readings only seed the cache.
    pub settle_secs: f32,
}

impl Default for KnobConfig {
    fn default() -> Self {
        Self {
            dead_zone: DEFAULT_DEAD_ZONE,
            tolerance: CHANGE_TOLERANCE,
            idle_secs: 1.0,
            settle_secs: 1.0,
        }
    }
}

/// Per-knob cache, activity flag and idle timer.
///
/// # Example
///
/// ```rust
/// use looprig_platform::knob::{KnobConfig, KnobMonitor};
///
/// let mut knobs = KnobMonitor::new(1, KnobConfig::default());
/// knobs.update(0.6, |_| 0.3);
/// assert!(!knobs.is_settled());
///
/// // The settle window ends: every knob publishes its position once.
/// knobs.update(0.6, |_| 0.3);
/// assert!(knobs.is_settled());
/// assert!(knobs.is_active(0));
/// ```
#[derive(Debug, Clone)]
pub struct KnobMonitor {
    config: KnobConfig,
    cache: Vec<f32>,
    active: Vec<bool>,
    idle: Vec<f32>,
    settle_remaining: f32,
}

impl KnobMonitor {
    /// Creates a monitor for `count` knobs, still settling.
    pub fn new(count: usize, config: KnobConfig) -> Self {
        Self {
            config,
            cache: vec![0.0; count],
            active: vec![false; count],
            idle: vec![0.0; count],
            settle_remaining: config.settle_secs,
        }
    }

    /// Number of knobs.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// True when monitoring no knobs.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// True once the start-up settle window has passed.
    pub fn is_settled(&self) -> bool {
        self.settle_remaining <= 0.0
    }

    /// Conditioned value of knob `index`.
    pub fn value(&self, index: usize) -> f32 {
        self.cache.get(index).copied().unwrap_or(0.0)
    }

    /// True while knob `index` should drive its routes.
    pub fn is_active(&self, index: usize) -> bool {
        self.is_settled() && self.active.get(index).copied().unwrap_or(false)
    }

    /// Active knobs and their values.
    pub fn active_knobs(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        (0..self.len())
            .filter(|&i| self.is_active(i))
            .map(|i| (i, self.cache[i]))
    }

    /// Reads every knob through `read` and advances the timers by
    /// `elapsed_secs`.
    pub fn update(&mut self, elapsed_secs: f32, mut read: impl FnMut(usize) -> f32) {
        let config = self.config;

        if !self.is_settled() {
            self.settle_remaining -= elapsed_secs;
            let settled = self.is_settled();
            for (i, cached) in self.cache.iter_mut().enumerate() {
                *cached = dead_zone(read(i), config.dead_zone);
            }
            if settled {
                self.active.fill(true);
                self.idle.fill(config.idle_secs);
                #[cfg(feature = "tracing")]
                tracing::debug!("knobs_settled: {} knobs", self.cache.len());
            }
            return;
        }

        for i in 0..self.cache.len() {
            let value = dead_zone(read(i), config.dead_zone);

            if self.idle[i] > 0.0 {
                self.idle[i] -= elapsed_secs;
                if self.idle[i] <= 0.0 {
                    self.idle[i] = 0.0;
                    self.active[i] = false;
                }
            }

            if fabsf(value - self.cache[i]) > config.tolerance {
                self.active[i] = true;
                self.idle[i] = config.idle_secs;
            }

            if self.active[i] {
                self.cache[i] = value;
            }
        }
    }
}
