//! One-pole parameter smoothing.
//!
//! Knob-driven values change once per control-loop iteration, which at
//! audio rate is a staircase. [`SmoothedParam`] glides toward each new
//! target so gain-like parameters do not click.
//!
//! ```rust
//! use looprig_core::SmoothedParam;
//!
//! let mut level = SmoothedParam::with_config(0.0, 48000.0, 5.0);
//! level.set_target(1.0);
//! for _ in 0..4800 {
//!     level.advance();
//! }
//! assert!(level.is_settled());
//! ```

use libm::{expf, fabsf};

/// Exponentially smoothed scalar.
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    current: f32,
    target: f32,
    coeff: f32,
    sample_rate: f32,
    time_ms: f32,
}

impl SmoothedParam {
    /// Unsmoothed parameter at `initial`; every target is reached immediately.
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: 1.0,
            sample_rate: 48000.0,
            time_ms: 0.0,
        }
    }

    /// Smoothed parameter with time constant `time_ms` at `sample_rate`.
    pub fn with_config(initial: f32, sample_rate: f32, time_ms: f32) -> Self {
        let mut param = Self::new(initial);
        param.sample_rate = sample_rate;
        param.time_ms = time_ms;
        param.update_coeff();
        param
    }

    /// Sets the value to glide toward.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Jumps to `value` with no glide.
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.target = value;
        self.current = value;
    }

    /// Recomputes the coefficient for a new sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.update_coeff();
    }

    /// Moves one sample toward the target and returns the new value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        self.current += self.coeff * (self.target - self.current);
        self.current
    }

    /// Current value.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Value being approached.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// True once within `1e-4` of the target.
    #[inline]
    pub fn is_settled(&self) -> bool {
        fabsf(self.current - self.target) < 1e-4
    }

    /// Completes the glide.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }

    // coeff = 1 - exp(-1 / (tau * fs)); tau in seconds
    fn update_coeff(&mut self) {
        self.coeff = if self.time_ms <= 0.0 || self.sample_rate <= 0.0 {
            1.0
        } else {
            1.0 - expf(-1000.0 / (self.time_ms * self.sample_rate))
        };
    }
}

impl Default for SmoothedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}
