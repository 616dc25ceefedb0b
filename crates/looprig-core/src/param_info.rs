//! Parameter metadata and the normalized parameter store.
//!
//! Every effect parameter is stored as a single *magnitude* in `[0, 1]`.
//! Knobs, MIDI CCs and presets all write magnitudes through the same
//! [`ParamBank::set_magnitude`] path; typed views (float, bool, binned) are
//! derived on read from that one value.
//!
//! # Example
//!
//! ```rust
//! use looprig_core::{ParamBank, ParamDescriptor};
//!
//! static PARAMS: [ParamDescriptor; 2] = [
//!     ParamDescriptor::float("Gain", "Gain", 0.5),
//!     ParamDescriptor::binned("Mode", "Mode", 3, 0.0, &["A", "B", "C"]),
//! ];
//!
//! let mut bank = ParamBank::new(&PARAMS);
//! bank.set_magnitude(0, 1.7);
//! assert_eq!(bank.magnitude(0), 1.0);
//!
//! bank.set_magnitude(1, 0.5);
//! assert_eq!(bank.as_binned(1), 1);
//! assert_eq!(PARAMS[1].bin_name(1), Some("B"));
//! ```

/// How a parameter's magnitude is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Continuous value.
    Float,
    /// On when the magnitude is at least one half.
    Bool,
    /// One of `bins` discrete choices; index = `floor(magnitude × bins)`.
    Binned {
        /// Number of choices, at least one.
        bins: u8,
    },
}

/// Static description of one parameter.
///
/// Descriptors are `const`-constructible so effects can keep their parameter
/// table in a `static` and hand out `&'static` references.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Display name.
    pub name: &'static str,
    /// Abbreviated name for small displays.
    pub short_name: &'static str,
    /// Interpretation of the magnitude.
    pub value_type: ParamType,
    /// Default magnitude in `[0, 1]`.
    pub default: f32,
    /// Lower bound of the float view.
    pub min: f32,
    /// Upper bound of the float view.
    pub max: f32,
    /// Hardware knob this parameter is normally assigned to.
    pub knob_mapping: Option<u8>,
    /// MIDI CC number this parameter responds to.
    pub midi_cc: Option<u8>,
    /// Labels for binned parameters.
    pub bin_names: &'static [&'static str],
}

impl ParamDescriptor {
    /// Continuous parameter with a `[0, 1]` float view.
    pub const fn float(name: &'static str, short_name: &'static str, default: f32) -> Self {
        Self {
            name,
            short_name,
            value_type: ParamType::Float,
            default,
            min: 0.0,
            max: 1.0,
            knob_mapping: None,
            midi_cc: None,
            bin_names: &[],
        }
    }

    /// On/off parameter.
    pub const fn boolean(name: &'static str, short_name: &'static str, default: bool) -> Self {
        Self {
            value_type: ParamType::Bool,
            default: if default { 1.0 } else { 0.0 },
            ..Self::float(name, short_name, 0.0)
        }
    }

    /// Discrete parameter with `bins` choices.
    pub const fn binned(
        name: &'static str,
        short_name: &'static str,
        bins: u8,
        default: f32,
        bin_names: &'static [&'static str],
    ) -> Self {
        Self {
            value_type: ParamType::Binned {
                bins: if bins == 0 { 1 } else { bins },
            },
            bin_names,
            ..Self::float(name, short_name, default)
        }
    }

    /// Sets the float view's range.
    pub const fn with_range(mut self, min: f32, max: f32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Assigns a default hardware knob.
    pub const fn with_knob(mut self, knob: u8) -> Self {
        self.knob_mapping = Some(knob);
        self
    }

    /// Assigns a MIDI CC number.
    pub const fn with_midi_cc(mut self, cc: u8) -> Self {
        self.midi_cc = Some(cc);
        self
    }

    /// Maps a magnitude onto the float view's range.
    #[inline]
    pub fn to_float(&self, magnitude: f32) -> f32 {
        self.min + (self.max - self.min) * magnitude
    }

    /// Bin index for a magnitude; always below the bin count.
    #[inline]
    pub fn to_bin(&self, magnitude: f32) -> usize {
        match self.value_type {
            ParamType::Binned { bins } => {
                let bins = usize::from(bins);
                ((magnitude * bins as f32) as usize).min(bins.saturating_sub(1))
            }
            ParamType::Bool => usize::from(magnitude >= 0.5),
            ParamType::Float => 0,
        }
    }

    /// Magnitude that selects the centre of `bin`.
    pub fn bin_magnitude(&self, bin: usize) -> f32 {
        match self.value_type {
            ParamType::Binned { bins } => {
                let bins = f32::from(bins);
                ((bin as f32 + 0.5) / bins).clamp(0.0, 1.0)
            }
            _ => {
                if bin > 0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Label of `bin`, if the descriptor carries one.
    pub fn bin_name(&self, bin: usize) -> Option<&'static str> {
        self.bin_names.get(bin).copied()
    }
}

/// Fixed set of normalized parameter values backed by a static descriptor table.
#[derive(Debug, Clone)]
pub struct ParamBank<const N: usize> {
    descriptors: &'static [ParamDescriptor; N],
    magnitudes: [f32; N],
}

impl<const N: usize> ParamBank<N> {
    /// Creates a bank with every parameter at its default.
    pub fn new(descriptors: &'static [ParamDescriptor; N]) -> Self {
        let mut magnitudes = [0.0; N];
        for (m, d) in magnitudes.iter_mut().zip(descriptors.iter()) {
            *m = d.default.clamp(0.0, 1.0);
        }
        Self {
            descriptors,
            magnitudes,
        }
    }

    /// Number of parameters.
    pub const fn len(&self) -> usize {
        N
    }

    /// True when the bank holds no parameters.
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Descriptor at `index`.
    pub fn descriptor(&self, index: usize) -> Option<&'static ParamDescriptor> {
        self.descriptors.get(index)
    }

    /// Stored magnitude; zero for an out-of-range index.
    #[inline]
    pub fn magnitude(&self, index: usize) -> f32 {
        self.magnitudes.get(index).copied().unwrap_or(0.0)
    }

    /// Stores a magnitude, clamped to `[0, 1]`. Out-of-range indices and NaN
    /// are ignored.
    #[inline]
    pub fn set_magnitude(&mut self, index: usize, magnitude: f32) {
        if magnitude.is_nan() {
            return;
        }
        if let Some(slot) = self.magnitudes.get_mut(index) {
            *slot = magnitude.clamp(0.0, 1.0);
        }
    }

    /// Float view of `index`.
    #[inline]
    pub fn as_float(&self, index: usize) -> f32 {
        self.descriptors
            .get(index)
            .map(|d| d.to_float(self.magnitude(index)))
            .unwrap_or(0.0)
    }

    /// Bool view of `index`.
    #[inline]
    pub fn as_bool(&self, index: usize) -> bool {
        self.magnitude(index) >= 0.5
    }

    /// Binned view of `index`.
    #[inline]
    pub fn as_binned(&self, index: usize) -> usize {
        self.descriptors
            .get(index)
            .map(|d| d.to_bin(self.magnitude(index)))
            .unwrap_or(0)
    }

    /// Restores every parameter to its default.
    pub fn reset_to_defaults(&mut self) {
        for (m, d) in self.magnitudes.iter_mut().zip(self.descriptors.iter()) {
            *m = d.default.clamp(0.0, 1.0);
        }
    }
}
