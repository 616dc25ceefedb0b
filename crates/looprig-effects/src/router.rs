//! Switch-gated wrapper around another module.
//!
//! [`EffectRouter`] sits in the chain permanently and decides per block
//! whether its inner module hears the signal. The inner module processes
//! only while the three-position switch is latched left *and* the inner
//! module is enabled; otherwise the router is a copy.
//!
//! The latch follows the switch position: `AlternatePressed` sets it and
//! `AlternateReleased` clears it. Every other event, parameter access and
//! LED query goes straight through to the inner module.

use looprig_core::{BoxedModule, DynModule, EffectModule, FootswitchEvent, ParamDescriptor};

/// Gate in front of an optional inner module.
///
/// # Example
///
/// ```rust
/// use looprig_core::{EffectModule, FootswitchEvent};
/// use looprig_effects::{Distortion, EffectRouter};
///
/// let mut router = EffectRouter::new(48000.0);
/// router.set_inner(Box::new(Distortion::new(48000.0)));
///
/// // Unlatched: a plain copy.
/// assert_eq!(router.process_stereo(0.3, -0.3), (0.3, -0.3));
///
/// router.on_footswitch(FootswitchEvent::AlternatePressed);
/// assert!(router.is_latched());
/// ```
pub struct EffectRouter {
    inner: Option<BoxedModule>,
    latched: bool,
    sample_rate: f32,
}

impl core::fmt::Debug for EffectRouter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EffectRouter")
            .field("inner", &self.inner.as_ref().map(|m| m.name()))
            .field("latched", &self.latched)
            .finish()
    }
}

impl EffectRouter {
    /// Creates an empty router.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            inner: None,
            latched: false,
            sample_rate,
        }
    }

    /// Creates a router around `inner`.
    pub fn with_inner(sample_rate: f32, inner: BoxedModule) -> Self {
        let mut router = Self::new(sample_rate);
        router.set_inner(inner);
        router
    }

    /// Installs `inner` and returns the module it replaces.
    pub fn set_inner(&mut self, mut inner: BoxedModule) -> Option<BoxedModule> {
        inner.set_sample_rate(self.sample_rate);
        #[cfg(feature = "tracing")]
        tracing::debug!("router_inner: {}", inner.name());
        self.inner.replace(inner)
    }

    /// Removes and returns the inner module.
    pub fn take_inner(&mut self) -> Option<BoxedModule> {
        self.inner.take()
    }

    /// The inner module, if any.
    pub fn inner(&self) -> Option<&DynModule> {
        self.inner.as_deref()
    }

    /// Switch latch state.
    pub fn is_latched(&self) -> bool {
        self.latched
    }

    fn active_inner(&mut self) -> Option<&mut BoxedModule> {
        if !self.latched {
            return None;
        }
        self.inner.as_mut().filter(|m| m.is_enabled())
    }
}

impl EffectModule for EffectRouter {
    fn name(&self) -> &'static str {
        "router"
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        if let Some(inner) = self.inner.as_mut() {
            inner.set_sample_rate(sample_rate);
        }
    }

    fn reset(&mut self) {
        if let Some(inner) = self.inner.as_mut() {
            inner.reset();
        }
    }

    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        match self.active_inner() {
            Some(inner) => inner.process_stereo(left, right),
            None => (left, right),
        }
    }

    fn process_stereo_block(
        &mut self,
        in_l: &[f32],
        in_r: &[f32],
        out_l: &mut [f32],
        out_r: &mut [f32],
    ) {
        match self.active_inner() {
            Some(inner) => inner.process_stereo_block(in_l, in_r, out_l, out_r),
            None => {
                out_l.copy_from_slice(in_l);
                out_r.copy_from_slice(in_r);
            }
        }
    }

    /// Always on; gating is the router's job, not the pipeline's.
    fn is_enabled(&self) -> bool {
        true
    }

    fn set_enabled(&mut self, _enabled: bool) {}

    fn param_count(&self) -> usize {
        self.inner.as_ref().map_or(0, |m| m.param_count())
    }

    fn param_descriptor(&self, index: usize) -> Option<&'static ParamDescriptor> {
        self.inner.as_ref().and_then(|m| m.param_descriptor(index))
    }

    fn magnitude(&self, index: usize) -> f32 {
        self.inner.as_ref().map_or(0.0, |m| m.magnitude(index))
    }

    fn set_magnitude(&mut self, index: usize, value: f32) {
        if let Some(inner) = self.inner.as_mut() {
            inner.set_magnitude(index, value);
        }
    }

    fn on_footswitch(&mut self, event: FootswitchEvent) -> bool {
        match event {
            FootswitchEvent::AlternatePressed => {
                self.latched = true;
                true
            }
            FootswitchEvent::AlternateReleased => {
                self.latched = false;
                true
            }
            _ => self
                .inner
                .as_mut()
                .is_some_and(|m| m.on_footswitch(event)),
        }
    }

    fn led_count(&self) -> usize {
        self.inner.as_ref().map_or(0, |m| m.led_count())
    }

    fn led_brightness(&self, led: usize) -> f32 {
        self.inner.as_ref().map_or(0.0, |m| m.led_brightness(led))
    }

    fn tick(&mut self, now_ms: u32) {
        if let Some(inner) = self.inner.as_mut() {
            inner.tick(now_ms);
        }
    }

    fn poll(&mut self) -> bool {
        self.inner.as_mut().is_some_and(|m| m.poll())
    }
}
