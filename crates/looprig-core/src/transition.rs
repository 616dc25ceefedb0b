//! Sample-counted enable/disable transitions.
//!
//! Two small state machines make switching the whole pedal in or out
//! inaudible:
//!
//! - [`Crossfade`] blends dry and processed signal over a fixed number of
//!   samples.
//! - [`BypassSequencer`] drives the hardware mute and true-bypass relay:
//!   mute first, flip the relay while muted, then unmute.
//!
//! Both are advanced exactly once per sample by the pipeline and never
//! depend on wall-clock time.

/// Linear dry/wet crossfade with a persistent position.
///
/// Position `0.0` is fully dry and `1.0` fully processed. A fade of
/// `duration` samples visits both end points exactly once; afterwards the
/// position holds until the next fade starts.
#[derive(Debug, Clone)]
pub struct Crossfade {
    duration: u32,
    remaining: u32,
    forward: bool,
    position: f32,
}

impl Crossfade {
    /// Idle fader resting at fully dry.
    pub const fn new(duration: u32) -> Self {
        Self {
            duration,
            remaining: 0,
            forward: true,
            position: 0.0,
        }
    }

    /// Starts a fade toward processed (`forward`) or toward dry.
    ///
    /// A fade started mid-way restarts from the far end; it does not reverse
    /// in place.
    pub fn start(&mut self, forward: bool) {
        self.forward = forward;
        if self.duration == 0 {
            self.remaining = 0;
            self.position = if forward { 1.0 } else { 0.0 };
        } else {
            self.remaining = self.duration;
        }
    }

    /// Advances one sample and returns the blend position to use for it.
    #[inline]
    pub fn next_position(&mut self) -> f32 {
        if self.remaining > 0 {
            self.remaining -= 1;
            let t = if self.duration > 1 {
                1.0 - self.remaining as f32 / (self.duration - 1) as f32
            } else {
                1.0
            };
            self.position = if self.forward { t } else { 1.0 - t };
        }
        self.position
    }

    /// True while a fade is in progress.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }

    /// Current blend position.
    #[inline]
    pub fn position(&self) -> f32 {
        self.position
    }

    /// Configured fade length in samples.
    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// Blends one sample at `position`. The end points return their input
    /// bit-exactly.
    #[inline]
    pub fn mix(dry: f32, wet: f32, position: f32) -> f32 {
        if position >= 1.0 {
            wet
        } else if position <= 0.0 {
            dry
        } else {
            dry + (wet - dry) * position
        }
    }
}

/// Mute and true-bypass relay sequencing.
///
/// On every enable/disable transition the output is muted at once and two
/// countdowns start. When the relay countdown expires the relay is set to
/// match the new state; when the (longer) mute countdown expires the output
/// is unmuted. The relay is only ever written inside the muted branch, so it
/// cannot change while the output is live.
#[derive(Debug, Clone)]
pub struct BypassSequencer {
    mute_samples: u32,
    relay_samples: u32,
    mute_remaining: i64,
    relay_remaining: i64,
    muted: bool,
    relay_engaged: bool,
    target_on: bool,
}

impl BypassSequencer {
    /// Creates a sequencer with the relay initially engaged (signal bypassed
    /// through hardware) and the output live.
    ///
    /// `relay_samples` is clamped below `mute_samples` so the relay always
    /// settles before unmute.
    pub fn new(mute_samples: u32, relay_samples: u32) -> Self {
        let mute_samples = mute_samples.max(1);
        Self {
            mute_samples,
            relay_samples: relay_samples.min(mute_samples - 1),
            mute_remaining: 0,
            relay_remaining: 0,
            muted: false,
            relay_engaged: true,
            target_on: false,
        }
    }

    /// Begins a transition toward `effect_on`.
    pub fn begin(&mut self, effect_on: bool) {
        self.target_on = effect_on;
        self.muted = true;
        self.mute_remaining = i64::from(self.mute_samples);
        self.relay_remaining = i64::from(self.relay_samples);
    }

    /// Advances one sample.
    #[inline]
    pub fn tick(&mut self) {
        if !self.muted {
            return;
        }
        self.relay_remaining -= 1;
        self.mute_remaining -= 1;
        if self.relay_remaining < 0 {
            self.relay_engaged = !self.target_on;
        }
        if self.mute_remaining < 0 {
            self.muted = false;
        }
    }

    /// Output mute state.
    #[inline]
    pub fn muted(&self) -> bool {
        self.muted
    }

    /// True when the hardware relay routes input straight to output.
    #[inline]
    pub fn relay_engaged(&self) -> bool {
        self.relay_engaged
    }
}
