//! Module registry and factory.
//!
//! Configuration refers to modules by id (`"distortion"`, `"looper"`, ...).
//! The registry maps those ids to descriptors for listing and to factories
//! for construction.
//!
//! ```rust
//! use looprig_effects::ModuleRegistry;
//!
//! let registry = ModuleRegistry::new();
//! let filter = registry.create("filter", 48000.0);
//! assert_eq!(filter.map(|m| m.name()), Some("filter"));
//! assert!(registry.create("reverb", 48000.0).is_none());
//! ```

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, vec::Vec};

use looprig_core::{BoxedModule, ParamDescriptor};

use crate::{
    Distortion, EffectRouter, FilterSweep, Looper, LooperConfig, distortion, filter, looper,
};

/// Role a module plays on the pedal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleCategory {
    /// Loop recording and playback.
    Looper,
    /// Drive and saturation.
    Drive,
    /// Filters.
    Filter,
    /// Signal routing.
    Routing,
}

impl ModuleCategory {
    /// Human-readable name.
    pub const fn name(&self) -> &'static str {
        match self {
            ModuleCategory::Looper => "Looper",
            ModuleCategory::Drive => "Drive",
            ModuleCategory::Filter => "Filter",
            ModuleCategory::Routing => "Routing",
        }
    }
}

/// Describes a registered module.
#[derive(Debug, Clone)]
pub struct ModuleDescriptor {
    /// Identifier used by configuration (lowercase, no spaces).
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Category.
    pub category: ModuleCategory,
    /// Parameters in index order. Empty for the router, whose parameters
    /// are those of its inner module.
    pub params: &'static [ParamDescriptor],
}

impl ModuleDescriptor {
    /// Index of the parameter called `name` (full or short name, ignoring
    /// ASCII case).
    pub fn find_param(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|d| {
            d.name.eq_ignore_ascii_case(name) || d.short_name.eq_ignore_ascii_case(name)
        })
    }
}

type ModuleFactory = fn(f32) -> BoxedModule;

struct RegistryEntry {
    descriptor: ModuleDescriptor,
    factory: ModuleFactory,
}

/// Registry of the built-in modules.
pub struct ModuleRegistry {
    entries: Vec<RegistryEntry>,
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleRegistry {
    /// Creates a registry with every built-in module.
    pub fn new() -> Self {
        let mut registry = Self {
            entries: Vec::with_capacity(4),
        };
        registry.register(
            ModuleDescriptor {
                id: "looper",
                name: "Looper",
                description: "Seven-layer overdub looper with speed and slice modifier",
                category: ModuleCategory::Looper,
                params: &looper::PARAMS,
            },
            |sr| Box::new(Looper::new(sr, LooperConfig::default())),
        );
        registry.register(
            ModuleDescriptor {
                id: "distortion",
                name: "Distortion",
                description: "Six clipper types with oversampling and tilt tone",
                category: ModuleCategory::Drive,
                params: &distortion::PARAMS,
            },
            |sr| Box::new(Distortion::new(sr)),
        );
        registry.register(
            ModuleDescriptor {
                id: "filter",
                name: "Filter Sweep",
                description: "Bipolar low-pass/high-pass sweep on one knob",
                category: ModuleCategory::Filter,
                params: &filter::PARAMS,
            },
            |sr| Box::new(FilterSweep::new(sr)),
        );
        registry.register(
            ModuleDescriptor {
                id: "router",
                name: "Effect Router",
                description: "Switch-gated slot for another module",
                category: ModuleCategory::Routing,
                params: &[],
            },
            |sr| Box::new(EffectRouter::new(sr)),
        );
        registry
    }

    fn register(&mut self, descriptor: ModuleDescriptor, factory: ModuleFactory) {
        self.entries.push(RegistryEntry {
            descriptor,
            factory,
        });
    }

    /// Creates a module by id, ignoring ASCII case.
    pub fn create(&self, id: &str, sample_rate: f32) -> Option<BoxedModule> {
        self.entries
            .iter()
            .find(|e| e.descriptor.id.eq_ignore_ascii_case(id))
            .map(|e| (e.factory)(sample_rate))
    }

    /// Descriptor for `id`.
    pub fn descriptor(&self, id: &str) -> Option<&ModuleDescriptor> {
        self.entries
            .iter()
            .map(|e| &e.descriptor)
            .find(|d| d.id.eq_ignore_ascii_case(id))
    }

    /// All descriptors in registration order.
    pub fn all_modules(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.entries.iter().map(|e| &e.descriptor)
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_match_module_names() {
        let registry = ModuleRegistry::new();
        for id in ["distortion", "filter", "router"] {
            let module = registry.create(id, 48000.0);
            assert_eq!(module.map(|m| m.name()), Some(id));
        }
    }

    #[test]
    fn descriptors_list_parameters() {
        let registry = ModuleRegistry::new();
        let dist = registry.descriptor("distortion").map(|d| d.params.len());
        assert_eq!(dist, Some(7));
        let looper = registry.descriptor("looper");
        assert_eq!(looper.and_then(|d| d.find_param("layer")), Some(0));
        assert_eq!(looper.and_then(|d| d.find_param("Fade")), Some(1));
        assert_eq!(looper.and_then(|d| d.find_param("gain")), None);
    }

    #[test]
    fn lookup_ignores_case() {
        let registry = ModuleRegistry::new();
        assert_eq!(
            registry.descriptor("Distortion").map(|d| d.category),
            Some(ModuleCategory::Drive)
        );
        assert!(registry.descriptor("phaser").is_none());
        assert_eq!(registry.len(), 4);
        assert_eq!(
            registry.all_modules().map(|d| d.id).collect::<Vec<_>>(),
            vec!["looper", "distortion", "filter", "router"]
        );
    }
}
