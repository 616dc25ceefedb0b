//! Multi-mode distortion with optional oversampling.
//!
//! Signal flow per sample:
//!
//! ```text
//! in ─► pre HP (140-300 Hz, envelope) ─► ×0.5 ─► drive + clip ─► post LP 8 kHz
//!    ─► type normalization ─► tilt tone ─► ×level ─► constant-power mix ─► out
//! ```
//!
//! With oversampling on, the drive stage runs four times per input sample on
//! a zero-stuffed signal behind an anti-imaging low-pass and the results are
//! averaged. Every filter is owned by the instance, so any number of
//! distortions can run side by side.

use libm::{expf, fabsf, sinf, sqrtf, tanhf};
use looprig_core::{
    BUTTERWORTH_Q, Biquad, EffectModule, ParamBank, ParamDescriptor, SmoothedParam,
};

/// Parameter index: output level.
pub const LEVEL: usize = 0;
/// Parameter index: drive, 1-8×.
pub const GAIN: usize = 1;
/// Parameter index: tilt tone.
pub const TONE: usize = 2;
/// Parameter index: clipper selection.
pub const TYPE: usize = 3;
/// Parameter index: clipper intensity.
pub const INTENSITY: usize = 4;
/// Parameter index: 4× oversampling switch.
pub const OVERSAMPLE: usize = 5;
/// Parameter index: dry/wet mix.
pub const MIX: usize = 6;

const OVERSAMPLING: usize = 4;
const PRE_CUTOFF_BASE: f32 = 140.0;
const PRE_CUTOFF_MAX: f32 = 300.0;
const POST_CUTOFF: f32 = 8000.0;

static CLIPPER_NAMES: [&str; 6] = ["Hard", "Soft", "Fuzz", "Tube", "Multi Stage", "Diode"];

pub(crate) static PARAMS: [ParamDescriptor; 7] = [
    ParamDescriptor::float("Level", "Lvl", 0.5),
    ParamDescriptor::float("Gain", "Gain", 0.5).with_range(1.0, 8.0),
    ParamDescriptor::float("Tone", "Tone", 0.5),
    ParamDescriptor::binned("Type", "Type", 6, 0.0, &CLIPPER_NAMES),
    ParamDescriptor::float("Intensity", "Int", 0.5),
    ParamDescriptor::boolean("Oversample", "OS", true),
    ParamDescriptor::float("Mix", "Mix", 1.0),
];

/// Clipping algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Clipper {
    /// Hard clip at `1 - intensity`.
    #[default]
    Hard,
    /// Rational tanh.
    Soft,
    /// Two soft stages with a sine ripple, level dependent.
    Fuzz,
    /// Rational arctangent.
    Tube,
    /// Three cascaded stages with envelope bias.
    MultiStage,
    /// Exponential knee past `1 - intensity`.
    Diode,
}

impl Clipper {
    /// Clipper for a bin index of the Type parameter.
    pub fn from_bin(bin: usize) -> Self {
        match bin {
            0 => Self::Hard,
            1 => Self::Soft,
            2 => Self::Fuzz,
            3 => Self::Tube,
            4 => Self::MultiStage,
            _ => Self::Diode,
        }
    }

    /// Output trim that levels the types against each other.
    pub fn makeup(self) -> f32 {
        match self {
            Self::Hard | Self::Diode => 1.8,
            Self::Soft => 0.8,
            Self::Fuzz => 1.0,
            Self::Tube => 0.9,
            Self::MultiStage => 0.5,
        }
    }
}

/// Rational tanh, accurate inside `[-3, 3]`.
#[inline]
pub fn fast_tanh(x: f32) -> f32 {
    let x = x.clamp(-3.0, 3.0);
    let x2 = x * x;
    x * (27.0 + x2) / (27.0 + 9.0 * x2)
}

/// Rational arctangent, accurate inside `[-3, 3]`.
#[inline]
pub fn fast_atan(x: f32) -> f32 {
    let x = x.clamp(-3.0, 3.0);
    let x2 = x * x;
    x * (1.0 + 0.280872 * x2) / (1.0 + 0.580581 * x2)
}

#[inline]
fn diode_clip(x: f32, threshold: f32) -> f32 {
    if x > threshold {
        threshold - expf(-(x - threshold))
    } else if x < -threshold {
        -threshold + expf(x + threshold)
    } else {
        x
    }
}

#[derive(Debug, Clone, Copy)]
struct Snapshot {
    gain: f32,
    clipper: Clipper,
    intensity: f32,
    tone: f32,
    dry: f32,
    wet: f32,
}

/// Guitar distortion module.
///
/// # Example
///
/// ```rust
/// use looprig_core::EffectModule;
/// use looprig_effects::distortion::{Distortion, GAIN};
///
/// let mut dist = Distortion::new(48000.0);
/// dist.set_magnitude(GAIN, 1.0);
/// let (l, r) = dist.process_stereo(0.2, 0.2);
/// assert!(l.is_finite());
/// assert_eq!(l, r);
/// ```
#[derive(Debug, Clone)]
pub struct Distortion {
    params: ParamBank<7>,
    enabled: bool,
    sample_rate: f32,
    level: SmoothedParam,
    pre: Biquad,
    pre_cutoff: f32,
    post: Biquad,
    upsample: Biquad,
    oversampling: bool,
    tone_state: f32,
    tone_coeff: f32,
    tone_amount: f32,
    envelope: f32,
}

impl Distortion {
    /// Creates a distortion at default settings.
    pub fn new(sample_rate: f32) -> Self {
        let params = ParamBank::new(&PARAMS);
        let mut dist = Self {
            level: SmoothedParam::with_config(params.as_float(LEVEL), sample_rate, 5.0),
            oversampling: params.as_bool(OVERSAMPLE),
            tone_amount: params.as_float(TONE),
            params,
            enabled: true,
            sample_rate,
            pre: Biquad::new(),
            pre_cutoff: PRE_CUTOFF_BASE,
            post: Biquad::new(),
            upsample: Biquad::new(),
            tone_state: 0.0,
            tone_coeff: 0.0,
            envelope: 0.0,
        };
        dist.configure_filters();
        dist.recalculate_tone_coeff();
        dist
    }

    /// Selected clipper.
    pub fn clipper(&self) -> Clipper {
        Clipper::from_bin(self.params.as_binned(TYPE))
    }

    fn configure_filters(&mut self) {
        let fs = self.sample_rate;
        self.pre.set_highpass(self.pre_cutoff, BUTTERWORTH_Q, fs);
        let post_fs = if self.oversampling {
            fs * OVERSAMPLING as f32
        } else {
            fs
        };
        self.post.set_lowpass(POST_CUTOFF.min(post_fs * 0.45), BUTTERWORTH_Q, post_fs);
        self.upsample
            .set_lowpass(fs / (2.0 * OVERSAMPLING as f32), BUTTERWORTH_Q, fs);
    }

    fn recalculate_tone_coeff(&mut self) {
        let freq = 500.0 + 1500.0 * self.tone_amount;
        self.tone_coeff = 1.0 - expf(-core::f32::consts::TAU * freq / self.sample_rate);
    }

    /// Reads parameters once and reconfigures filters that depend on them.
    fn snapshot(&mut self) -> Snapshot {
        let oversampling = self.params.as_bool(OVERSAMPLE);
        if oversampling != self.oversampling {
            self.oversampling = oversampling;
            self.configure_filters();
        }
        let tone = self.params.as_float(TONE);
        if tone != self.tone_amount {
            self.tone_amount = tone;
            self.recalculate_tone_coeff();
        }
        self.level.set_target(self.params.as_float(LEVEL));

        let mix = self.params.as_float(MIX);
        Snapshot {
            gain: self.params.as_float(GAIN),
            clipper: self.clipper(),
            intensity: self.params.as_float(INTENSITY),
            tone,
            dry: sqrtf(1.0 - mix),
            wet: sqrtf(mix),
        }
    }

    #[inline]
    fn drive(&self, sample: f32, snap: &Snapshot) -> f32 {
        let x = sample * snap.gain;
        let threshold = (1.0 - snap.intensity).max(0.01);
        match snap.clipper {
            Clipper::Hard => x.clamp(-threshold, threshold),
            Clipper::Soft => fast_tanh(x * snap.gain),
            Clipper::Fuzz => {
                let amount = snap.intensity * 10.0;
                let fuzzed = fast_tanh(x * amount) + 0.05 * sinf(x * 20.0);
                fast_tanh(fuzzed * amount * (1.0 + 0.5 * fabsf(x)))
            }
            Clipper::Tube => fast_atan(x * snap.intensity * 10.0),
            Clipper::MultiStage => {
                let bias = 0.005 * (self.envelope / 0.2).clamp(0.0, 1.0);
                let s1 = fast_tanh((x + bias) * 0.80 * snap.gain);
                let s2 = fast_tanh((s1 - 0.5 * bias) * 0.67 * snap.gain);
                fast_atan(s2 * 0.56 * snap.gain)
            }
            Clipper::Diode => diode_clip(x, threshold),
        }
    }

    #[inline]
    fn process_sample(&mut self, input: f32, snap: &Snapshot) -> f32 {
        self.envelope += 0.01 * (fabsf(input) - self.envelope);
        let cutoff = PRE_CUTOFF_BASE + (PRE_CUTOFF_MAX - PRE_CUTOFF_BASE) * tanhf(self.envelope);
        if fabsf(cutoff - self.pre_cutoff) > 10.0 {
            self.pre_cutoff = cutoff;
            self.pre
                .set_highpass(cutoff, BUTTERWORTH_Q, self.sample_rate);
        }

        let driven = self.pre.process(input) * 0.5;
        let shaped = if self.oversampling {
            let mut acc = 0.0;
            for j in 0..OVERSAMPLING {
                let stuffed = if j == 0 { driven } else { 0.0 };
                let smoothed = self.upsample.process(stuffed);
                let clipped = self.drive(smoothed, snap);
                acc += self.post.process(clipped);
            }
            acc / OVERSAMPLING as f32
        } else {
            let clipped = self.drive(driven, snap);
            self.post.process(clipped)
        };
        let normalized = shaped * snap.clipper.makeup();

        self.tone_state += self.tone_coeff * (normalized - self.tone_state);
        let low = self.tone_state;
        let tilted = low * (1.0 - snap.tone) + (normalized - low) * snap.tone;

        let wet = tilted * self.level.advance();
        snap.dry * input + snap.wet * wet
    }
}

impl EffectModule for Distortion {
    fn name(&self) -> &'static str {
        "distortion"
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.level.set_sample_rate(sample_rate);
        self.configure_filters();
        self.recalculate_tone_coeff();
    }

    fn reset(&mut self) {
        self.pre.clear();
        self.post.clear();
        self.upsample.clear();
        self.tone_state = 0.0;
        self.envelope = 0.0;
        self.level.snap_to_target();
    }

    fn process_stereo(&mut self, left: f32, _right: f32) -> (f32, f32) {
        let snap = self.snapshot();
        let out = self.process_sample(left, &snap);
        (out, out)
    }

    fn process_stereo_block(
        &mut self,
        in_l: &[f32],
        _in_r: &[f32],
        out_l: &mut [f32],
        out_r: &mut [f32],
    ) {
        let snap = self.snapshot();
        for ((&x, l), r) in in_l.iter().zip(out_l.iter_mut()).zip(out_r.iter_mut()) {
            let y = self.process_sample(x, &snap);
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
        self.params.len()
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
