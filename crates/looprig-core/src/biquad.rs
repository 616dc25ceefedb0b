//! Second-order IIR section with RBJ cookbook low/high-pass designs.
//!
//! Each effect owns its filters as plain fields; there is no shared filter
//! state between instances.

use core::f32::consts::PI;
use libm::{cosf, fabsf, sinf};

/// Butterworth Q.
pub const BUTTERWORTH_Q: f32 = core::f32::consts::FRAC_1_SQRT_2;

/// Direct Form I biquad.
///
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]
/// ```
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

impl Biquad {
    /// Pass-through section.
    pub const fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Low-pass section at `frequency` Hz.
    pub fn lowpass(frequency: f32, q: f32, sample_rate: f32) -> Self {
        let mut filter = Self::new();
        filter.set_lowpass(frequency, q, sample_rate);
        filter
    }

    /// High-pass section at `frequency` Hz.
    pub fn highpass(frequency: f32, q: f32, sample_rate: f32) -> Self {
        let mut filter = Self::new();
        filter.set_highpass(frequency, q, sample_rate);
        filter
    }

    /// Redesigns as a low-pass, keeping the delay-line state.
    pub fn set_lowpass(&mut self, frequency: f32, q: f32, sample_rate: f32) {
        let (cos_w, alpha) = prewarp(frequency, q, sample_rate);
        let b1 = 1.0 - cos_w;
        self.set_coefficients(b1 * 0.5, b1, b1 * 0.5, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha);
    }

    /// Redesigns as a high-pass, keeping the delay-line state.
    pub fn set_highpass(&mut self, frequency: f32, q: f32, sample_rate: f32) {
        let (cos_w, alpha) = prewarp(frequency, q, sample_rate);
        let b1 = -(1.0 + cos_w);
        self.set_coefficients(-b1 * 0.5, b1, -b1 * 0.5, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha);
    }

    /// Loads raw coefficients, normalizing by `a0`.
    pub fn set_coefficients(&mut self, b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) {
        let inv = 1.0 / a0;
        self.b0 = b0 * inv;
        self.b1 = b1 * inv;
        self.b2 = b2 * inv;
        self.a1 = a1 * inv;
        self.a2 = a2 * inv;
    }

    /// Filters one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = flush_denormal(output);
        output
    }

    /// Clears the delay lines.
    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

fn prewarp(frequency: f32, q: f32, sample_rate: f32) -> (f32, f32) {
    let nyquist_guard = sample_rate * 0.49;
    let omega = 2.0 * PI * frequency.clamp(1.0, nyquist_guard) / sample_rate;
    (cosf(omega), sinf(omega) / (2.0 * q.max(0.01)))
}

/// Flushes values too small to matter to zero.
#[inline]
pub fn flush_denormal(x: f32) -> f32 {
    if fabsf(x) < 1e-20 { 0.0 } else { x }
}
