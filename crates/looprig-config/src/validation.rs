//! Rig validation.
//!
//! Checks that every number is in range, that chain and route module ids
//! exist in the registry, and that every knob route names a parameter the
//! module actually has. Parameters are resolved from registry descriptors,
//! so validation never allocates a looper.
//!
//! ```rust
//! use looprig_config::RigConfig;
//!
//! let mut rig = RigConfig::default();
//! rig.validate().expect("stock rig is valid");
//!
//! rig.chain.push("reverb".into());
//! assert!(rig.validate().is_err());
//! ```

use thiserror::Error;

use looprig_effects::ModuleRegistry;

use crate::error::ConfigError;
use crate::rig::{LOOPER, RigConfig, SwitchAction, TransformKind};

/// Range and consistency failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A value that must be above zero is not.
    #[error("{field} must be greater than zero")]
    NotPositive {
        /// Field name.
        field: &'static str,
    },

    /// A value is outside its allowed range.
    #[error("{field} value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Field name.
        field: &'static str,
        /// The offending value.
        value: f64,
        /// Minimum allowed value.
        min: f64,
        /// Maximum allowed value.
        max: f64,
    },

    /// The relay would flip after the mute ends.
    #[error("relay_secs ({relay}) must be shorter than mute_secs ({mute})")]
    RelayOutsideMute {
        /// Relay point.
        relay: f64,
        /// Mute length.
        mute: f64,
    },

    /// A module id appears twice in the chain.
    #[error("module '{0}' appears more than once in the chain")]
    DuplicateModule(String),

    /// The looper was listed in the chain.
    #[error("the looper is implicit and cannot be listed in the chain")]
    LooperInChain,

    /// A route names a control the surface does not have.
    #[error("{control} {index} out of range, the surface has {count}")]
    ControlOutOfRange {
        /// `"knob"` or `"switch"`.
        control: &'static str,
        /// Index in the route.
        index: usize,
        /// Controls configured.
        count: usize,
    },

    /// A route table lacks a field its kind needs.
    #[error("{route} route on {control} {index} is missing '{field}'")]
    MissingField {
        /// `"knob"` or `"switch"`.
        control: &'static str,
        /// Index in the route.
        index: usize,
        /// Route kind.
        route: &'static str,
        /// Missing field.
        field: &'static str,
    },
}

impl RigConfig {
    /// Validate the whole rig against the stock module registry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_with(&ModuleRegistry::new())
    }

    /// Validate the whole rig against `registry`.
    pub fn validate_with(&self, registry: &ModuleRegistry) -> Result<(), ConfigError> {
        self.validate_numbers()?;
        self.validate_chain(registry)?;
        self.validate_routes(registry)?;
        Ok(())
    }

    fn validate_numbers(&self) -> Result<(), ValidationError> {
        positive("sample_rate", f64::from(self.sample_rate))?;
        positive("audio.block_size", self.audio.block_size as f64)?;
        positive("looper.max_seconds", self.looper.max_seconds)?;
        in_range("looper.layers", self.looper.layers as f64, 2.0, 64.0)?;
        in_range(
            "looper.knob_hysteresis",
            self.looper.knob_hysteresis,
            0.0,
            0.5,
        )?;

        let t = &self.transitions;
        in_range("transitions.crossfade_secs", t.crossfade_secs, 0.0, 10.0)?;
        in_range("transitions.mute_secs", t.mute_secs, 0.0, 10.0)?;
        in_range("transitions.relay_secs", t.relay_secs, 0.0, 10.0)?;
        if t.relay_secs >= t.mute_secs && !(t.relay_secs == 0.0 && t.mute_secs == 0.0) {
            return Err(ValidationError::RelayOutsideMute {
                relay: t.relay_secs,
                mute: t.mute_secs,
            });
        }

        let c = &self.controls;
        // Strictly below one half so the live band is never empty.
        in_range("controls.dead_zone", c.dead_zone, 0.0, 0.499)?;
        in_range("controls.tolerance", c.tolerance, 0.0, 1.0)?;
        in_range("controls.knob_idle_secs", c.knob_idle_secs, 0.0, 3600.0)?;
        in_range("controls.settle_secs", c.settle_secs, 0.0, 3600.0)?;
        positive("controls.hold_ms", c.hold_ms)?;
        in_range("controls.double_tap_secs", c.double_tap_secs, 0.0, 3600.0)?;

        in_range("midi.channel", f64::from(self.midi.channel), 0.0, 16.0)?;
        Ok(())
    }

    fn validate_chain(&self, registry: &ModuleRegistry) -> Result<(), ConfigError> {
        let mut seen: Vec<&str> = Vec::with_capacity(self.chain.len());
        for (id, _) in self.chain_entries() {
            if id.eq_ignore_ascii_case(LOOPER) {
                return Err(ValidationError::LooperInChain.into());
            }
            if registry.descriptor(id).is_none() {
                return Err(ConfigError::UnknownModule(id.to_string()));
            }
            if seen.iter().any(|s| s.eq_ignore_ascii_case(id)) {
                return Err(ValidationError::DuplicateModule(id.to_string()).into());
            }
            seen.push(id);
        }

        if let Some(inner) = &self.router.inner {
            let nestable =
                !inner.eq_ignore_ascii_case(LOOPER) && !inner.eq_ignore_ascii_case("router");
            if !nestable || registry.descriptor(inner).is_none() {
                return Err(ConfigError::UnknownModule(inner.clone()));
            }
        }
        Ok(())
    }

    fn validate_routes(&self, registry: &ModuleRegistry) -> Result<(), ConfigError> {
        let knobs = self.controls.knobs;
        for route in &self.knobs {
            if route.knob >= knobs {
                return Err(ValidationError::ControlOutOfRange {
                    control: "knob",
                    index: route.knob,
                    count: knobs,
                }
                .into());
            }
            if route.transform == TransformKind::Power && route.exponent.is_none() {
                return Err(ValidationError::MissingField {
                    control: "knob",
                    index: route.knob,
                    route: "power",
                    field: "exponent",
                }
                .into());
            }
            self.resolve_param(registry, &route.module, &route.param)?;
        }

        let switches = self.controls.switches;
        for route in &self.switches {
            if route.switch >= switches {
                return Err(ValidationError::ControlOutOfRange {
                    control: "switch",
                    index: route.switch,
                    count: switches,
                }
                .into());
            }
            if route.action == SwitchAction::ChainOrderSelect {
                continue;
            }
            let missing = |field| ValidationError::MissingField {
                control: "switch",
                index: route.switch,
                route: "event",
                field,
            };
            let module = route.module.as_deref().ok_or_else(|| missing("module"))?;
            if route.event.is_none() {
                return Err(missing("event").into());
            }
            if route.footswitch_event().is_none() {
                return Err(missing("id").into());
            }
            self.module_id(module)?;
        }
        Ok(())
    }

    /// Canonical id of a route target: the looper or a chain entry.
    pub(crate) fn module_id<'a>(&'a self, module: &str) -> Result<&'a str, ConfigError> {
        if module.eq_ignore_ascii_case(LOOPER) {
            return Ok(LOOPER);
        }
        self.chain_entries()
            .map(|(id, _)| id)
            .find(|id| id.eq_ignore_ascii_case(module))
            .ok_or_else(|| ConfigError::UnknownModule(module.to_string()))
    }

    /// Parameter index of `module.param`. Router parameters are those of
    /// its inner module.
    pub(crate) fn resolve_param(
        &self,
        registry: &ModuleRegistry,
        module: &str,
        param: &str,
    ) -> Result<usize, ConfigError> {
        let id = self.module_id(module)?;
        let lookup = if id.eq_ignore_ascii_case("router") {
            self.router.inner.as_deref().unwrap_or(id)
        } else {
            id
        };
        registry
            .descriptor(lookup)
            .and_then(|d| d.find_param(param))
            .ok_or_else(|| ConfigError::unknown_parameter(module, param))
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NotPositive { field })
    }
}

fn in_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}
