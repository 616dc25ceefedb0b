//! Bipolar filter sweep on one knob.
//!
//! The Cutoff parameter is centred: turning it left closes a low-pass,
//! turning it right opens a high-pass, and the exact centre is a straight
//! wire.
//!
//! ```text
//! c = (m - 0.5) × 2 × 3000
//! c > 0  high-pass at c Hz
//! c < 0  low-pass at max(20, 1.5 × (3000 + c)) Hz
//! c = 0  pass-through
//! ```

use looprig_core::{EffectModule, ParamBank, ParamDescriptor, Svf, SvfMode};

/// Parameter index of the cutoff knob.
pub const CUTOFF: usize = 0;

/// Sweep range on either side of centre, in Hz.
pub const SWEEP_RANGE: f32 = 3000.0;

// Resonance 0.35 expressed as Q: 1 / (2 × (1 - 0.35^0.25)).
const SWEEP_Q: f32 = 2.16;

pub(crate) static PARAMS: [ParamDescriptor; 1] = [ParamDescriptor::float("Cutoff", "Cut", 0.5).with_knob(0)];

/// What the sweep does at a given knob position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SweepMode {
    /// Knob centred.
    Bypass,
    /// Low-pass at the given cutoff.
    Lowpass(f32),
    /// High-pass at the given cutoff.
    Highpass(f32),
}

impl SweepMode {
    /// Maps a cutoff magnitude onto a filter setting.
    pub fn from_magnitude(magnitude: f32) -> Self {
        let c = (magnitude - 0.5) * 2.0 * SWEEP_RANGE;
        if c > 0.0 {
            Self::Highpass(c)
        } else if c < 0.0 {
            Self::Lowpass((1.5 * (SWEEP_RANGE + c)).max(20.0))
        } else {
            Self::Bypass
        }
    }
}

/// One-knob low-pass/high-pass sweep.
#[derive(Debug, Clone)]
pub struct FilterSweep {
    params: ParamBank<1>,
    enabled: bool,
    svf: Svf,
    mode: SweepMode,
}

impl FilterSweep {
    /// Creates a sweep at the centre (pass-through) position.
    pub fn new(sample_rate: f32) -> Self {
        let mut svf = Svf::new(sample_rate);
        svf.set_q(SWEEP_Q);
        Self {
            params: ParamBank::new(&PARAMS),
            enabled: true,
            svf,
            mode: SweepMode::Bypass,
        }
    }

    /// Current filter setting.
    pub fn mode(&self) -> SweepMode {
        self.mode
    }

    fn update_mode(&mut self) {
        let mode = SweepMode::from_magnitude(self.params.magnitude(CUTOFF));
        if mode == self.mode {
            return;
        }
        match mode {
            SweepMode::Lowpass(hz) => {
                self.svf.set_mode(SvfMode::Lowpass);
                self.svf.set_cutoff(hz);
            }
            SweepMode::Highpass(hz) => {
                self.svf.set_mode(SvfMode::Highpass);
                self.svf.set_cutoff(hz);
            }
            SweepMode::Bypass => {}
        }
        self.mode = mode;
    }

    #[inline]
    fn process_sample(&mut self, input: f32) -> f32 {
        match self.mode {
            SweepMode::Bypass => input,
            SweepMode::Lowpass(_) | SweepMode::Highpass(_) => self.svf.process(input),
        }
    }
}

impl EffectModule for FilterSweep {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.svf.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.svf.reset();
    }

    fn process_stereo(&mut self, left: f32, _right: f32) -> (f32, f32) {
        self.update_mode();
        let out = self.process_sample(left);
        (out, out)
    }

    fn process_stereo_block(
        &mut self,
        in_l: &[f32],
        _in_r: &[f32],
        out_l: &mut [f32],
        out_r: &mut [f32],
    ) {
        self.update_mode();
        for ((&x, l), r) in in_l.iter().zip(out_l.iter_mut()).zip(out_r.iter_mut()) {
            let y = self.process_sample(x);
            *l = y;
            *r = y;
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn param_count(&self) -> usize {
        1
    }

    fn param_descriptor(&self, index: usize) -> Option<&'static ParamDescriptor> {
        self.params.descriptor(index)
    }

    fn magnitude(&self, index: usize) -> f32 {
        self.params.magnitude(index)
    }

    fn set_magnitude(&mut self, index: usize, value: f32) {
        self.params.set_magnitude(index, value);
    }
}
