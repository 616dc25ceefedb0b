//! Topology-preserving state variable filter.
//!
//! Trapezoidal-integrator SVF (Zavalishin, "The Art of VA Filter Design",
//! ch. 3). Cutoff can be swept per block without the instability of direct
//! form sections, which is what the bipolar filter sweep needs.

use core::f32::consts::PI;
use libm::tanf;

use crate::biquad::flush_denormal;

/// Which SVF output to return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SvfMode {
    /// Low-pass output.
    #[default]
    Lowpass,
    /// High-pass output.
    Highpass,
    /// Band-pass output.
    Bandpass,
}

/// Two-pole state variable filter.
#[derive(Debug, Clone)]
pub struct Svf {
    ic1eq: f32,
    ic2eq: f32,
    g: f32,
    k: f32,
    sample_rate: f32,
    cutoff: f32,
    q: f32,
    mode: SvfMode,
}

impl Svf {
    /// Low-pass at 1 kHz, Butterworth Q.
    pub fn new(sample_rate: f32) -> Self {
        let mut svf = Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            g: 0.0,
            k: 0.0,
            sample_rate,
            cutoff: 1000.0,
            q: core::f32::consts::FRAC_1_SQRT_2,
            mode: SvfMode::Lowpass,
        };
        svf.update();
        svf
    }

    /// Sets the cutoff in Hz, clamped to `[20, 0.49 × fs]`.
    pub fn set_cutoff(&mut self, hz: f32) {
        self.cutoff = hz;
        self.update();
    }

    /// Cutoff in Hz.
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Sets the resonance as a Q factor.
    pub fn set_q(&mut self, q: f32) {
        self.q = q.max(0.1);
        self.update();
    }

    /// Selects the output.
    pub fn set_mode(&mut self, mode: SvfMode) {
        self.mode = mode;
    }

    /// Current output selection.
    pub fn mode(&self) -> SvfMode {
        self.mode
    }

    /// Changes the sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.update();
    }

    /// Filters one sample through the selected output.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let v3 = input - self.ic2eq;
        let v1 = (self.g * v3 + self.ic1eq) / (1.0 + self.g * (self.g + self.k));
        let v2 = self.ic2eq + self.g * v1;
        self.ic1eq = flush_denormal(2.0 * v1 - self.ic1eq);
        self.ic2eq = flush_denormal(2.0 * v2 - self.ic2eq);
        match self.mode {
            SvfMode::Lowpass => v2,
            SvfMode::Highpass => input - self.k * v1 - v2,
            SvfMode::Bandpass => v1,
        }
    }

    /// Clears the integrators.
    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    fn update(&mut self) {
        let hz = self.cutoff.clamp(20.0, self.sample_rate * 0.49);
        self.g = tanf(PI * hz / self.sample_rate);
        self.k = 1.0 / self.q;
    }
}
