//! Owning store of the pedal's effect modules.
//!
//! Modules are inserted once at startup and addressed by [`ModuleId`]
//! afterwards. The pipeline's chain order, the looper slot and the control
//! routing tables all refer to modules by id, never by reference, so the
//! rack is the single owner and can be threaded by `&mut` into both the
//! audio and control entry points.

#[cfg(not(feature = "std"))]
use alloc::boxed::Box;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::effect::EffectModule;

/// Module trait object as stored in the rack.
pub type DynModule = dyn EffectModule + Send;

/// Boxed module as stored in the rack.
pub type BoxedModule = Box<DynModule>;

/// Index of a module within a [`Rack`].
///
/// Ids are assigned sequentially on insertion and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub(crate) u16);

impl ModuleId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl core::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "M{}", self.0)
    }
}

/// Collection of effect modules.
pub struct Rack {
    modules: Vec<BoxedModule>,
    sample_rate: f32,
}

impl core::fmt::Debug for Rack {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Rack")
            .field("modules", &self.modules.iter().map(|m| m.name()).collect::<Vec<_>>())
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

impl Rack {
    /// Creates an empty rack running at `sample_rate`.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            modules: Vec::new(),
            sample_rate,
        }
    }

    /// Adds a module, configures its sample rate and returns its id.
    pub fn insert(&mut self, mut module: BoxedModule) -> ModuleId {
        module.set_sample_rate(self.sample_rate);
        let id = ModuleId(self.modules.len() as u16);
        #[cfg(feature = "tracing")]
        tracing::debug!("rack_insert: {} as {id}", module.name());
        self.modules.push(module);
        id
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// True when no module has been inserted.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Sample rate modules were configured with.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Reconfigures every module for a new sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        for module in &mut self.modules {
            module.set_sample_rate(sample_rate);
        }
    }

    /// Shared access to a module.
    pub fn get(&self, id: ModuleId) -> Option<&DynModule> {
        self.modules.get(id.index()).map(|m| m.as_ref())
    }

    /// Exclusive access to a module.
    pub fn get_mut(&mut self, id: ModuleId) -> Option<&mut DynModule> {
        self.modules.get_mut(id.index()).map(|m| m.as_mut())
    }

    /// Id of the first module whose name matches, ignoring ASCII case.
    pub fn find_by_name(&self, name: &str) -> Option<ModuleId> {
        self.modules
            .iter()
            .position(|m| m.name().eq_ignore_ascii_case(name))
            .map(|i| ModuleId(i as u16))
    }

    /// Ids of all modules in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = ModuleId> + '_ {
        (0..self.modules.len()).map(|i| ModuleId(i as u16))
    }

    /// Polls every module once. Returns `true` if any reported a change.
    pub fn poll_all(&mut self) -> bool {
        let mut changed = false;
        for module in &mut self.modules {
            changed |= module.poll();
        }
        changed
    }

    /// Advances LED animation on every module.
    pub fn tick_all(&mut self, now_ms: u32) {
        for module in &mut self.modules {
            module.tick(now_ms);
        }
    }

    /// Clears DSP state on every module.
    pub fn reset_all(&mut self) {
        for module in &mut self.modules {
            module.reset();
        }
    }
}
