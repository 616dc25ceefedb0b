//! Rig file format.

use serde::{Deserialize, Serialize};
use std::path::Path;

use looprig_core::{ChainOrder, EnablePolicy, FootswitchEvent};
use looprig_platform::{ChannelFilter, KnobTransform, LedSource};

use crate::error::ConfigError;

/// Module id the looper is always registered under.
pub const LOOPER: &str = "looper";

/// Prefix on a chain entry that starts the module bypassed.
pub const BYPASS_PREFIX: char = '!';

/// A complete pedal description: modules, timings, controls and routes.
///
/// Every section is optional in the file and falls back to its stock
/// values. Route lists are the exception: a file without `[[knob]]` or
/// `[[switch]]` tables has no routes of that kind.
///
/// # TOML Format
///
/// ```toml
/// sample_rate = 48000
/// chain = ["!distortion", "!filter", "router"]
///
/// [audio]
/// block_size = 48
/// policy = "always-on"
/// order = "looper-first"
///
/// [looper]
/// layers = 7
/// max_seconds = 30.0
///
/// [[knob]]
/// knob = 1
/// module = "distortion"
/// param = "mix"
/// transform = "power"
/// exponent = 0.7
///
/// [[switch]]
/// switch = 0
/// module = "looper"
/// event = "bypass-pressed"
///
/// [[switch]]
/// switch = 6
/// action = "chain-order-select"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RigConfig {
    /// Audio sample rate in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Effect chain in processing order. A leading `!` starts the module
    /// bypassed. The looper is implicit and never listed.
    #[serde(default = "default_chain")]
    pub chain: Vec<String>,

    /// Block size, bypass hardware and chain policy.
    #[serde(default)]
    pub audio: AudioSection,

    /// Crossfade, mute and relay timing.
    #[serde(default)]
    pub transitions: TransitionSection,

    /// Control surface dimensions and debouncing constants.
    #[serde(default)]
    pub controls: ControlSection,

    /// Looper sizing.
    #[serde(default)]
    pub looper: LooperSection,

    /// MIDI input.
    #[serde(default)]
    pub midi: MidiSection,

    /// Effect router contents.
    #[serde(default)]
    pub router: RouterSection,

    /// Knob routes.
    #[serde(default, rename = "knob")]
    pub knobs: Vec<KnobRouteConfig>,

    /// Switch routes.
    #[serde(default, rename = "switch")]
    pub switches: Vec<SwitchRouteConfig>,
}

fn default_sample_rate() -> u32 {
    48000
}

fn default_chain() -> Vec<String> {
    vec!["!distortion".into(), "!filter".into(), "router".into()]
}

impl Default for RigConfig {
    /// The stock pedal: six knobs, bypass and alternate footswitches, the
    /// router latch on the first toggle and the order select on the second.
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            chain: default_chain(),
            audio: AudioSection::default(),
            transitions: TransitionSection::default(),
            controls: ControlSection::default(),
            looper: LooperSection::default(),
            midi: MidiSection::default(),
            router: RouterSection::default(),
            knobs: vec![
                KnobRouteConfig::new(0, "distortion", "gain"),
                KnobRouteConfig::new(1, "distortion", "mix").with_power(0.7),
                KnobRouteConfig::new(2, "distortion", "intensity"),
                KnobRouteConfig::new(3, "filter", "cutoff"),
                KnobRouteConfig::new(5, LOOPER, "layer"),
            ],
            switches: vec![
                SwitchRouteConfig::event(0, LOOPER, EventKind::BypassPressed),
                SwitchRouteConfig::event(1, LOOPER, EventKind::AlternatePressed),
                SwitchRouteConfig::event(1, LOOPER, EventKind::AlternateHeld),
                SwitchRouteConfig::event(1, "distortion", EventKind::BypassPressed),
                SwitchRouteConfig::event(1, "filter", EventKind::BypassPressed),
                SwitchRouteConfig::event(4, "router", EventKind::AlternatePressed),
                SwitchRouteConfig::event(4, "router", EventKind::AlternateReleased),
                SwitchRouteConfig::chain_order_select(6),
            ],
        }
    }
}

impl RigConfig {
    /// Load a rig from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let rig = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), modules = rig.chain.len(), "rig loaded");
        Ok(rig)
    }

    /// Parse a rig from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize the rig to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save the rig to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Chain entries as `(id, starts_bypassed)`.
    pub fn chain_entries(&self) -> impl Iterator<Item = (&str, bool)> {
        self.chain.iter().map(|entry| parse_chain_entry(entry))
    }
}

/// Splits the bypass prefix off a chain entry.
///
/// ```rust
/// use looprig_config::parse_chain_entry;
///
/// assert_eq!(parse_chain_entry("!filter"), ("filter", true));
/// assert_eq!(parse_chain_entry(" router "), ("router", false));
/// ```
pub fn parse_chain_entry(entry: &str) -> (&str, bool) {
    let entry = entry.trim();
    match entry.strip_prefix(BYPASS_PREFIX) {
        Some(id) => (id.trim(), true),
        None => (entry, false),
    }
}

/// `[audio]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioSection {
    /// Samples per audio block.
    pub block_size: usize,
    /// Hardware has a true-bypass relay and mute line.
    pub true_bypass: bool,
    /// Whether the effect path is always on or follows the bypass request.
    pub policy: PolicyConfig,
    /// Initial chain order.
    pub order: OrderConfig,
}

impl Default for AudioSection {
    fn default() -> Self {
        Self {
            block_size: 48,
            true_bypass: true,
            policy: PolicyConfig::AlwaysOn,
            order: OrderConfig::LooperFirst,
        }
    }
}

/// Effect path enable policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyConfig {
    /// Always on.
    #[default]
    AlwaysOn,
    /// Follows the bypass request.
    Requested,
}

impl From<PolicyConfig> for EnablePolicy {
    fn from(policy: PolicyConfig) -> Self {
        match policy {
            PolicyConfig::AlwaysOn => EnablePolicy::AlwaysOn,
            PolicyConfig::Requested => EnablePolicy::Requested,
        }
    }
}

/// Chain order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OrderConfig {
    /// Looper before the chain.
    #[default]
    LooperFirst,
    /// Chain before the looper.
    ChainFirst,
}

impl From<OrderConfig> for ChainOrder {
    fn from(order: OrderConfig) -> Self {
        match order {
            OrderConfig::LooperFirst => ChainOrder::LooperFirst,
            OrderConfig::ChainFirst => ChainOrder::ChainFirst,
        }
    }
}

/// `[transitions]`, all in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransitionSection {
    /// Dry/wet crossfade length.
    pub crossfade_secs: f64,
    /// Output mute after a bypass toggle.
    pub mute_secs: f64,
    /// Relay flip point inside the mute.
    pub relay_secs: f64,
}

impl Default for TransitionSection {
    fn default() -> Self {
        Self {
            crossfade_secs: 0.1,
            mute_secs: 0.02,
            relay_secs: 0.01,
        }
    }
}

/// `[controls]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControlSection {
    /// Knob count.
    pub knobs: usize,
    /// Switch count, including each toggle position.
    pub switches: usize,
    /// LED count.
    pub leds: usize,
    /// Knob dead zone at each end of travel.
    pub dead_zone: f64,
    /// Knob movement that wakes a knob.
    pub tolerance: f64,
    /// Seconds a knob stays active after it stops moving.
    pub knob_idle_secs: f64,
    /// Start-up settling time.
    pub settle_secs: f64,
    /// Switch hold threshold.
    pub hold_ms: f64,
    /// Double-tap window.
    pub double_tap_secs: f64,
    /// What drives the LEDs.
    pub led_source: LedSourceConfig,
}

impl Default for ControlSection {
    fn default() -> Self {
        Self {
            knobs: 6,
            switches: 8,
            leds: 2,
            dead_zone: 0.05,
            tolerance: 1.0 / 256.0,
            knob_idle_secs: 1.0,
            settle_secs: 1.0,
            hold_ms: 1000.0,
            double_tap_secs: 2.0,
            led_source: LedSourceConfig::Modules,
        }
    }
}

/// LED source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LedSourceConfig {
    /// Module LEDs, looper first.
    #[default]
    Modules,
    /// MIDI beat.
    Beat,
}

impl From<LedSourceConfig> for LedSource {
    fn from(source: LedSourceConfig) -> Self {
        match source {
            LedSourceConfig::Modules => LedSource::Modules,
            LedSourceConfig::Beat => LedSource::Beat,
        }
    }
}

/// `[looper]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LooperSection {
    /// Layers in the bank.
    pub layers: usize,
    /// Longest loop in seconds.
    pub max_seconds: f64,
    /// Layer knob hysteresis.
    pub knob_hysteresis: f64,
    /// LED pattern step.
    pub blink_interval_ms: u32,
}

impl Default for LooperSection {
    fn default() -> Self {
        Self {
            layers: 7,
            max_seconds: 30.0,
            knob_hysteresis: 0.05,
            blink_interval_ms: 80,
        }
    }
}

/// `[midi]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MidiSection {
    /// Channel to listen on, `1..=16`, or `0` for every channel.
    pub channel: u8,
}

impl MidiSection {
    /// The channel as a filter.
    pub fn filter(&self) -> ChannelFilter {
        match self.channel {
            0 => ChannelFilter::Omni,
            ch => ChannelFilter::Channel(ch),
        }
    }
}

/// `[router]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RouterSection {
    /// Module id placed inside the router. Empty routers pass audio
    /// through unchanged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner: Option<String>,
}

/// Shape applied to a knob reading before it reaches a parameter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TransformKind {
    /// Unchanged.
    #[default]
    Identity,
    /// `1 - x`.
    Invert,
    /// On above one half.
    Gate,
    /// `x ^ exponent`.
    Power,
    /// Linear map onto `[from, to]`.
    Range,
}

/// One `[[knob]]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnobRouteConfig {
    /// Knob index.
    pub knob: usize,
    /// Target module id.
    pub module: String,
    /// Parameter name or short name.
    pub param: String,
    /// Shape.
    #[serde(default)]
    pub transform: TransformKind,
    /// Exponent for `power`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exponent: Option<f64>,
    /// Lower end for `range`, default 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<f64>,
    /// Upper end for `range`, default 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<f64>,
}

impl KnobRouteConfig {
    /// Identity route from `knob` to `module.param`.
    pub fn new(knob: usize, module: impl Into<String>, param: impl Into<String>) -> Self {
        Self {
            knob,
            module: module.into(),
            param: param.into(),
            transform: TransformKind::Identity,
            exponent: None,
            from: None,
            to: None,
        }
    }

    /// Power curve.
    pub fn with_power(mut self, exponent: f64) -> Self {
        self.transform = TransformKind::Power;
        self.exponent = Some(exponent);
        self
    }

    /// Linear range.
    pub fn with_range(mut self, from: f64, to: f64) -> Self {
        self.transform = TransformKind::Range;
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// The runtime transform. `None` when `power` lacks an exponent.
    pub fn knob_transform(&self) -> Option<KnobTransform> {
        Some(match self.transform {
            TransformKind::Identity => KnobTransform::Identity,
            TransformKind::Invert => KnobTransform::Invert,
            TransformKind::Gate => KnobTransform::Gate,
            TransformKind::Power => KnobTransform::Power(self.exponent? as f32),
            TransformKind::Range => KnobTransform::Range {
                from: self.from.unwrap_or(0.0) as f32,
                to: self.to.unwrap_or(1.0) as f32,
            },
        })
    }
}

/// What a `[[switch]]` table does.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SwitchAction {
    /// Deliver `event` to `module`.
    #[default]
    Event,
    /// Press selects chain-first, release selects looper-first.
    ChainOrderSelect,
}

/// Footswitch event names.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    /// Bypass down.
    BypassPressed,
    /// Bypass up.
    BypassReleased,
    /// Bypass held.
    BypassHeld,
    /// Alternate down.
    AlternatePressed,
    /// Alternate up.
    AlternateReleased,
    /// Alternate held.
    AlternateHeld,
    /// Auxiliary switch `id` down.
    Pressed,
    /// Auxiliary switch `id` up.
    Released,
}

/// One `[[switch]]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SwitchRouteConfig {
    /// Switch index.
    pub switch: usize,
    /// Action.
    #[serde(default)]
    pub action: SwitchAction,
    /// Target module id for `event`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// Event delivered to the module.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<EventKind>,
    /// Auxiliary id for `pressed` and `released`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u8>,
}

impl SwitchRouteConfig {
    /// Event route.
    pub fn event(switch: usize, module: impl Into<String>, event: EventKind) -> Self {
        Self {
            switch,
            action: SwitchAction::Event,
            module: Some(module.into()),
            event: Some(event),
            id: None,
        }
    }

    /// Chain-order select route.
    pub fn chain_order_select(switch: usize) -> Self {
        Self {
            switch,
            action: SwitchAction::ChainOrderSelect,
            module: None,
            event: None,
            id: None,
        }
    }

    /// The footswitch event, if the table describes a complete one.
    pub fn footswitch_event(&self) -> Option<FootswitchEvent> {
        Some(match self.event? {
            EventKind::BypassPressed => FootswitchEvent::BypassPressed,
            EventKind::BypassReleased => FootswitchEvent::BypassReleased,
            EventKind::BypassHeld => FootswitchEvent::BypassHeld,
            EventKind::AlternatePressed => FootswitchEvent::AlternatePressed,
            EventKind::AlternateReleased => FootswitchEvent::AlternateReleased,
            EventKind::AlternateHeld => FootswitchEvent::AlternateHeld,
            EventKind::Pressed => FootswitchEvent::Pressed(self.id?),
            EventKind::Released => FootswitchEvent::Released(self.id?),
        })
    }
}
