//! The effect module contract.
//!
//! Every processing stage on the pedal (looper, distortion, filter, router)
//! implements [`EffectModule`]. The audio pipeline holds them as
//! `Box<dyn EffectModule + Send>` in a [`Rack`](crate::Rack) and never
//! assumes a concrete type.
//!
//! ## Design Decisions
//!
//! - **Stereo first**: The pedal runs stereo blocks; mono-only modules
//!   override [`EffectModule::process_mono`] and get the stereo path for free.
//!
//! - **Magnitude parameters**: Parameters are read and written as normalized
//!   magnitudes in `[0, 1]`. Typed views are derived from the descriptor, so
//!   knobs and MIDI share one update path.
//!
//! - **Callbacks, not polling, for switches**: Footswitch edges arrive as
//!   [`FootswitchEvent`]s from the control loop. Modules that must change
//!   audio-side state in response latch the request and apply it at the top
//!   of their next block.
//!
//! - **Pure LED reads**: [`EffectModule::led_brightness`] takes `&self`.
//!   Blink animation advances in [`EffectModule::tick`].

use crate::param_info::ParamDescriptor;

/// Discrete footswitch event delivered by the control bridge.
///
/// The *bypass* and *alternate* pair are the two primary footswitch roles
/// on the pedal. `Pressed(id)` / `Released(id)` address extra switches
/// (three-position toggles, auxiliary buttons) by a module-defined id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FootswitchEvent {
    /// Bypass footswitch went down.
    BypassPressed,
    /// Bypass footswitch came up.
    BypassReleased,
    /// Bypass footswitch held past the hold threshold.
    BypassHeld,
    /// Alternate footswitch went down.
    AlternatePressed,
    /// Alternate footswitch came up.
    AlternateReleased,
    /// Alternate footswitch held past the hold threshold.
    AlternateHeld,
    /// Auxiliary switch `id` went down.
    Pressed(u8),
    /// Auxiliary switch `id` came up.
    Released(u8),
}

/// Which physical edge or duration triggers a [`FootswitchEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Rising edge.
    Press,
    /// Falling edge.
    Release,
    /// Hold threshold reached.
    Hold,
}

impl FootswitchEvent {
    /// The switch transition that fires this event.
    pub const fn trigger(self) -> Trigger {
        match self {
            Self::BypassPressed | Self::AlternatePressed | Self::Pressed(_) => Trigger::Press,
            Self::BypassReleased | Self::AlternateReleased | Self::Released(_) => {
                Trigger::Release
            }
            Self::BypassHeld | Self::AlternateHeld => Trigger::Hold,
        }
    }
}

/// Uniform interface implemented by every processing stage.
///
/// # Example
///
/// ```rust
/// use looprig_core::{EffectModule, ParamBank, ParamDescriptor};
///
/// static PARAMS: [ParamDescriptor; 1] = [ParamDescriptor::float("Level", "Lvl", 1.0)];
///
/// struct Level {
///     params: ParamBank<1>,
///     enabled: bool,
/// }
///
/// impl EffectModule for Level {
///     fn name(&self) -> &'static str { "level" }
///     fn set_sample_rate(&mut self, _sample_rate: f32) {}
///     fn reset(&mut self) {}
///     fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
///         let g = self.params.magnitude(0);
///         (left * g, right * g)
///     }
///     fn is_enabled(&self) -> bool { self.enabled }
///     fn set_enabled(&mut self, enabled: bool) { self.enabled = enabled }
///     fn param_count(&self) -> usize { 1 }
///     fn param_descriptor(&self, index: usize) -> Option<&'static ParamDescriptor> {
///         self.params.descriptor(index)
///     }
///     fn magnitude(&self, index: usize) -> f32 { self.params.magnitude(index) }
///     fn set_magnitude(&mut self, index: usize, value: f32) {
///         self.params.set_magnitude(index, value)
///     }
/// }
///
/// let mut level = Level { params: ParamBank::new(&PARAMS), enabled: true };
/// level.set_magnitude(0, 0.5);
/// assert_eq!(level.process_stereo(1.0, -1.0), (0.5, -0.5));
/// ```
pub trait EffectModule {
    /// Stable lowercase identifier used by configuration and logs.
    fn name(&self) -> &'static str;

    /// Updates sample-rate dependent coefficients.
    fn set_sample_rate(&mut self, sample_rate: f32);

    /// Clears DSP history without touching parameters.
    fn reset(&mut self);

    /// Processes one stereo frame.
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32);

    /// Processes one mono sample through the left channel.
    fn process_mono(&mut self, input: f32) -> f32 {
        self.process_stereo(input, input).0
    }

    /// Processes a stereo block.
    ///
    /// All four buffers must have the same length. Modules that snapshot
    /// parameters per block override this and do so before the sample loop.
    fn process_stereo_block(
        &mut self,
        in_l: &[f32],
        in_r: &[f32],
        out_l: &mut [f32],
        out_r: &mut [f32],
    ) {
        debug_assert_eq!(in_l.len(), in_r.len());
        debug_assert_eq!(in_l.len(), out_l.len());
        debug_assert_eq!(in_l.len(), out_r.len());
        for i in 0..in_l.len().min(out_l.len()).min(out_r.len()).min(in_r.len()) {
            let (l, r) = self.process_stereo(in_l[i], in_r[i]);
            out_l[i] = l;
            out_r[i] = r;
        }
    }

    /// Processes a mono block through the left channel.
    fn process_mono_block(&mut self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(input.len(), output.len());
        for (out, &x) in output.iter_mut().zip(input.iter()) {
            *out = self.process_mono(x);
        }
    }

    /// Processes a stereo block in place.
    fn process_stereo_block_inplace(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let (ol, or) = self.process_stereo(*l, *r);
            *l = ol;
            *r = or;
        }
    }

    /// Whether the module is switched in. Disabled modules are skipped by the
    /// pipeline and act as a transparent pass-through.
    fn is_enabled(&self) -> bool;

    /// Switches the module in or out.
    fn set_enabled(&mut self, enabled: bool);

    /// Number of parameters.
    fn param_count(&self) -> usize {
        0
    }

    /// Descriptor for parameter `index`.
    fn param_descriptor(&self, _index: usize) -> Option<&'static ParamDescriptor> {
        None
    }

    /// Normalized value of parameter `index`.
    fn magnitude(&self, _index: usize) -> f32 {
        0.0
    }

    /// Writes a normalized value, clamped to `[0, 1]`.
    fn set_magnitude(&mut self, _index: usize, _value: f32) {}

    /// Float view of parameter `index`.
    fn param_as_float(&self, index: usize) -> f32 {
        self.param_descriptor(index)
            .map(|d| d.to_float(self.magnitude(index)))
            .unwrap_or(0.0)
    }

    /// Bool view of parameter `index`.
    fn param_as_bool(&self, index: usize) -> bool {
        self.magnitude(index) >= 0.5
    }

    /// Binned view of parameter `index`.
    fn param_as_binned(&self, index: usize) -> usize {
        self.param_descriptor(index)
            .map(|d| d.to_bin(self.magnitude(index)))
            .unwrap_or(0)
    }

    /// Finds a parameter index by name, ignoring ASCII case.
    fn find_param(&self, name: &str) -> Option<usize> {
        (0..self.param_count()).find(|&i| {
            self.param_descriptor(i).is_some_and(|d| {
                d.name.eq_ignore_ascii_case(name) || d.short_name.eq_ignore_ascii_case(name)
            })
        })
    }

    /// Handles a footswitch event. Returns `true` if the event was accepted.
    ///
    /// The default toggles `enabled` on [`FootswitchEvent::BypassPressed`]
    /// and ignores everything else.
    fn on_footswitch(&mut self, event: FootswitchEvent) -> bool {
        if event == FootswitchEvent::BypassPressed {
            let enabled = self.is_enabled();
            self.set_enabled(!enabled);
            true
        } else {
            false
        }
    }

    /// Number of LEDs this module drives.
    fn led_count(&self) -> usize {
        1
    }

    /// Brightness of `led` in `[0, 1]`. Must not change state.
    fn led_brightness(&self, led: usize) -> f32 {
        if led == 0 && self.is_enabled() {
            1.0
        } else {
            0.0
        }
    }

    /// Advances LED animation to `now_ms`. Called from the control loop.
    fn tick(&mut self, _now_ms: u32) {}

    /// Called once per control-loop iteration. Returns `true` when internal
    /// state changed since the previous poll.
    fn poll(&mut self) -> bool {
        false
    }
}
