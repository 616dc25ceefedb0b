//! Control timelines for offline renders.
//!
//! A script is a TOML file of timed surface actions that stand in for a
//! player's hands and feet:
//!
//! ```toml
//! knobs = [0.0, 0.0, 0.0, 0.5, 0.0, 0.0]
//!
//! [clock]
//! bpm = 120.0
//!
//! [[event]]
//! at = 0.5
//! switch = 0
//! action = "tap"
//!
//! [[event]]
//! at = 4.0
//! knob = 5
//! value = 0.3
//!
//! [[event]]
//! at = 6.0
//! toggle = 4
//! position = "left"
//!
//! [[event]]
//! at = 8.0
//! midi = [0xB0, 14, 64]
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;

use looprig_platform::{MidiEvent, TICKS_PER_BEAT, ThreeWay};

/// Press length for `tap`.
const TAP: Duration = Duration::from_millis(40);

/// Script file as written.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Knob positions before the first block.
    #[serde(default)]
    pub knobs: Vec<f32>,
    /// Generated MIDI clock.
    #[serde(default)]
    pub clock: Option<ClockSpec>,
    /// Timed actions.
    #[serde(default, rename = "event")]
    pub events: Vec<EventSpec>,
}

/// `[clock]`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClockSpec {
    /// Tempo.
    pub bpm: f64,
    /// Start time in seconds.
    #[serde(default)]
    pub start: f64,
}

/// Switch gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gesture {
    /// Switch goes down.
    Press,
    /// Switch comes up.
    Release,
    /// Short press and release.
    Tap,
}

/// Toggle position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    /// Left.
    Left,
    /// Middle.
    Middle,
    /// Right.
    Right,
}

impl From<Position> for ThreeWay {
    fn from(position: Position) -> Self {
        match position {
            Position::Left => ThreeWay::Left,
            Position::Middle => ThreeWay::Middle,
            Position::Right => ThreeWay::Right,
        }
    }
}

/// One `[[event]]` table. Exactly one of `switch`, `knob`, `toggle` or
/// `midi` is set.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventSpec {
    /// Seconds from the start of the render.
    pub at: f64,
    /// Switch index.
    pub switch: Option<usize>,
    /// What the switch does, default `tap`.
    pub action: Option<Gesture>,
    /// Knob index.
    pub knob: Option<usize>,
    /// Knob position.
    pub value: Option<f32>,
    /// Left switch index of a three-position toggle.
    pub toggle: Option<usize>,
    /// Toggle position.
    pub position: Option<Position>,
    /// Raw MIDI message.
    pub midi: Option<Vec<u8>>,
}

/// A resolved surface action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Switch down.
    Press(usize),
    /// Switch up.
    Release(usize),
    /// Knob to a position.
    Knob(usize, f32),
    /// Toggle to a position.
    Toggle(usize, ThreeWay),
    /// MIDI message into the pedal.
    Midi(MidiEvent),
}

/// Actions in time order, consumed as the render advances.
#[derive(Debug, Default)]
pub struct Timeline {
    initial_knobs: Vec<f32>,
    actions: Vec<(Duration, Action)>,
    next: usize,
}

impl Script {
    /// Reads a script file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in script {}", path.display()))
    }

    /// Parses script text.
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Resolves the script into a timeline covering `length` of audio.
    pub fn into_timeline(self, length: Duration) -> anyhow::Result<Timeline> {
        let mut actions = Vec::with_capacity(self.events.len() * 2);
        for (i, event) in self.events.iter().enumerate() {
            resolve(event, &mut actions)
                .with_context(|| format!("event {} (at {}s)", i + 1, event.at))?;
        }

        if let Some(clock) = &self.clock {
            if !(clock.bpm > 0.0 && clock.bpm.is_finite()) {
                bail!("clock bpm must be positive, got {}", clock.bpm);
            }
            let start = secs(clock.start)?;
            let tick = Duration::from_secs_f64(60.0 / (clock.bpm * f64::from(TICKS_PER_BEAT)));
            actions.push((start, Action::Midi(MidiEvent::Start)));
            let mut at = start;
            while at < length {
                actions.push((at, Action::Midi(MidiEvent::Clock)));
                at += tick;
            }
        }

        // Stable, so same-time actions keep file order.
        actions.sort_by_key(|(at, _)| *at);
        Ok(Timeline {
            initial_knobs: self.knobs,
            actions,
            next: 0,
        })
    }
}

fn secs(at: f64) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(at).map_err(|_| anyhow::anyhow!("invalid time {at}"))
}

fn resolve(event: &EventSpec, out: &mut Vec<(Duration, Action)>) -> anyhow::Result<()> {
    let at = secs(event.at)?;
    let targets = [
        event.switch.is_some(),
        event.knob.is_some(),
        event.toggle.is_some(),
        event.midi.is_some(),
    ];
    if targets.iter().filter(|&&t| t).count() != 1 {
        bail!("exactly one of switch, knob, toggle or midi is required");
    }

    if let Some(switch) = event.switch {
        match event.action.unwrap_or(Gesture::Tap) {
            Gesture::Press => out.push((at, Action::Press(switch))),
            Gesture::Release => out.push((at, Action::Release(switch))),
            Gesture::Tap => {
                out.push((at, Action::Press(switch)));
                out.push((at + TAP, Action::Release(switch)));
            }
        }
    } else if let Some(knob) = event.knob {
        let value = event.value.context("knob event needs a value")?;
        out.push((at, Action::Knob(knob, value)));
    } else if let Some(toggle) = event.toggle {
        let position = event.position.context("toggle event needs a position")?;
        out.push((at, Action::Toggle(toggle, position.into())));
    } else if let Some(bytes) = &event.midi {
        let message = MidiEvent::from_bytes(bytes)
            .with_context(|| format!("unrecognised MIDI message {bytes:02X?}"))?;
        out.push((at, Action::Midi(message)));
    }
    Ok(())
}

impl Timeline {
    /// Knob positions to apply before the first block.
    pub fn initial_knobs(&self) -> &[f32] {
        &self.initial_knobs
    }

    /// Actions scheduled at or before `now` that have not been taken yet.
    pub fn due(&mut self, now: Duration) -> &[(Duration, Action)] {
        let start = self.next;
        while self
            .actions
            .get(self.next)
            .is_some_and(|(at, _)| *at <= now)
        {
            self.next += 1;
        }
        &self.actions[start..self.next]
    }

    /// Scheduled actions, including ones already taken.
    pub fn scheduled(&self) -> usize {
        self.actions.len()
    }

    /// Actions not yet taken.
    pub fn remaining(&self) -> usize {
        self.actions.len() - self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline(text: &str, secs: u64) -> Timeline {
        Script::parse(text)
            .unwrap()
            .into_timeline(Duration::from_secs(secs))
            .unwrap()
    }

    #[test]
    fn tap_expands_to_press_and_release() {
        let mut t = timeline("[[event]]\nat = 1.0\nswitch = 0\n", 2);
        assert_eq!(t.scheduled(), 2);
        assert!(t.due(Duration::from_millis(999)).is_empty());
        assert_eq!(
            t.due(Duration::from_secs(1)),
            &[(Duration::from_secs(1), Action::Press(0))]
        );
        assert_eq!(t.due(Duration::from_secs(2))[0].1, Action::Release(0));
        assert_eq!(t.remaining(), 0);
    }

    #[test]
    fn actions_come_out_in_time_order() {
        let mut t = timeline(
            r#"
            [[event]]
            at = 2.0
            knob = 1
            value = 0.5

            [[event]]
            at = 0.5
            toggle = 4
            position = "left"

            [[event]]
            at = 1.0
            switch = 1
            action = "press"
            "#,
            3,
        );
        let all: Vec<Action> = t
            .due(Duration::from_secs(3))
            .iter()
            .map(|(_, a)| *a)
            .collect();
        assert_eq!(
            all,
            vec![
                Action::Toggle(4, ThreeWay::Left),
                Action::Press(1),
                Action::Knob(1, 0.5)
            ]
        );
    }

    #[test]
    fn clock_ticks_at_tempo() {
        let t = timeline("[clock]\nbpm = 125.0\n", 1);
        // 20 ms per tick at 125 bpm.
        assert_eq!(t.scheduled(), 1 + 50);
    }

    #[test]
    fn midi_bytes_parse() {
        let mut t = timeline("[[event]]\nat = 0.0\nmidi = [0xB0, 14, 64]\n", 1);
        let due = t.due(Duration::ZERO);
        assert!(matches!(
            due[0].1,
            Action::Midi(MidiEvent::ControlChange { cc: 14, .. })
        ));
    }

    #[test]
    fn rejects_ambiguous_events() {
        let script =
            Script::parse("[[event]]\nat = 0.0\nswitch = 0\nknob = 1\nvalue = 0.2\n").unwrap();
        assert!(script.into_timeline(Duration::from_secs(1)).is_err());

        let script = Script::parse("[[event]]\nat = 0.0\nknob = 1\n").unwrap();
        assert!(script.into_timeline(Duration::from_secs(1)).is_err());

        let script = Script::parse("[[event]]\nat = -1.0\nswitch = 0\n").unwrap();
        assert!(script.into_timeline(Duration::from_secs(1)).is_err());
    }

    #[test]
    fn unknown_fields_rejected() {
        assert!(Script::parse("[[event]]\nat = 0.0\nswitches = 0\n").is_err());
    }
}
