//! MIDI input: transport clock and channel filtering.
//!
//! The pedal follows an external clock at quarter-note resolution only:
//! [`MidiClock`] counts 24-PPQN ticks while the transport runs and flips a
//! beat flag on every quarter note, which the LEDs can show. Channel
//! messages pass through a [`ChannelFilter`] and are counted.

/// Clock ticks per quarter note.
pub const TICKS_PER_BEAT: u32 = 24;

/// A decoded MIDI message.
///
/// Channels are the wire value, `0..=15`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    /// Timing clock (0xF8).
    Clock,
    /// Transport start (0xFA).
    Start,
    /// Transport continue (0xFB).
    Continue,
    /// Transport stop (0xFC).
    Stop,
    /// Control change.
    ControlChange {
        /// Channel.
        channel: u8,
        /// Controller number.
        cc: u8,
        /// Value.
        value: u8,
    },
    /// Note on.
    NoteOn {
        /// Channel.
        channel: u8,
        /// Note number.
        note: u8,
        /// Velocity.
        velocity: u8,
    },
    /// Note off.
    NoteOff {
        /// Channel.
        channel: u8,
        /// Note number.
        note: u8,
        /// Release velocity.
        velocity: u8,
    },
    /// Program change.
    ProgramChange {
        /// Channel.
        channel: u8,
        /// Program number.
        program: u8,
    },
}

impl MidiEvent {
    /// Decodes one complete message. Running status, SysEx and messages
    /// the pedal does not use return `None`.
    ///
    /// ```rust
    /// use looprig_platform::MidiEvent;
    ///
    /// assert_eq!(MidiEvent::from_bytes(&[0xF8]), Some(MidiEvent::Clock));
    /// assert_eq!(
    ///     MidiEvent::from_bytes(&[0xB2, 14, 100]),
    ///     Some(MidiEvent::ControlChange { channel: 2, cc: 14, value: 100 })
    /// );
    /// ```
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let (&status, data) = bytes.split_first()?;
        let channel = status & 0x0F;
        let d = |i: usize| data.get(i).map(|b| b & 0x7F);
        match status {
            0xF8 => Some(Self::Clock),
            0xFA => Some(Self::Start),
            0xFB => Some(Self::Continue),
            0xFC => Some(Self::Stop),
            0x80..=0x8F => Some(Self::NoteOff {
                channel,
                note: d(0)?,
                velocity: d(1)?,
            }),
            // Note on with velocity zero is a note off.
            0x90..=0x9F => {
                let (note, velocity) = (d(0)?, d(1)?);
                Some(if velocity == 0 {
                    Self::NoteOff {
                        channel,
                        note,
                        velocity,
                    }
                } else {
                    Self::NoteOn {
                        channel,
                        note,
                        velocity,
                    }
                })
            }
            0xB0..=0xBF => Some(Self::ControlChange {
                channel,
                cc: d(0)?,
                value: d(1)?,
            }),
            0xC0..=0xCF => Some(Self::ProgramChange {
                channel,
                program: d(0)?,
            }),
            _ => None,
        }
    }

    /// Channel of a channel message; `None` for real-time messages.
    pub const fn channel(&self) -> Option<u8> {
        match *self {
            Self::ControlChange { channel, .. }
            | Self::NoteOn { channel, .. }
            | Self::NoteOff { channel, .. }
            | Self::ProgramChange { channel, .. } => Some(channel),
            Self::Clock | Self::Start | Self::Continue | Self::Stop => None,
        }
    }
}

/// Which channel messages are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelFilter {
    /// Every channel.
    #[default]
    Omni,
    /// One channel, numbered `1..=16`.
    Channel(u8),
}

impl ChannelFilter {
    /// True when a message on wire channel `channel` (`0..=15`) passes.
    ///
    /// A filter naming a channel outside `1..=16` accepts nothing.
    pub const fn accepts(&self, channel: u8) -> bool {
        match *self {
            Self::Omni => true,
            Self::Channel(n) => n >= 1 && n <= 16 && channel == n - 1,
        }
    }
}

/// Transport state driven by real-time messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MidiClock {
    tick_count: u32,
    running: bool,
    odd_beat: bool,
}

impl MidiClock {
    /// Stopped clock at tick zero.
    pub const fn new() -> Self {
        Self {
            tick_count: 0,
            running: false,
            odd_beat: false,
        }
    }

    /// Applies a real-time message. Returns `true` when the beat flag flipped.
    pub fn handle(&mut self, event: &MidiEvent) -> bool {
        match event {
            MidiEvent::Clock => {
                if !self.running {
                    return false;
                }
                self.tick_count = self.tick_count.wrapping_add(1);
                if self.tick_count % TICKS_PER_BEAT == 0 {
                    self.odd_beat = !self.odd_beat;
                    return true;
                }
            }
            MidiEvent::Start => {
                self.tick_count = 0;
                self.running = true;
                #[cfg(feature = "tracing")]
                tracing::debug!("midi_clock: start");
            }
            MidiEvent::Continue => {
                self.running = true;
                #[cfg(feature = "tracing")]
                tracing::debug!("midi_clock: continue at tick {}", self.tick_count);
            }
            MidiEvent::Stop => {
                self.running = false;
                #[cfg(feature = "tracing")]
                tracing::debug!("midi_clock: stop at tick {}", self.tick_count);
            }
            _ => {}
        }
        false
    }

    /// Ticks counted since the last start.
    pub fn tick_count(&self) -> u32 {
        self.tick_count
    }

    /// Transport running.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Flips every quarter note.
    pub fn odd_beat(&self) -> bool {
        self.odd_beat
    }
}

/// Clock plus channel filter; the pedal's MIDI input stage.
#[derive(Debug, Clone, Default)]
pub struct MidiInput {
    clock: MidiClock,
    filter: ChannelFilter,
    accepted: u32,
    rejected: u32,
}

impl MidiInput {
    /// Input listening on `filter`.
    pub fn new(filter: ChannelFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Handles one message.
    pub fn handle(&mut self, event: &MidiEvent) {
        match event.channel() {
            None => {
                self.clock.handle(event);
            }
            Some(channel) if self.filter.accepts(channel) => {
                self.accepted = self.accepted.saturating_add(1);
                #[cfg(feature = "tracing")]
                tracing::debug!("midi_in: {event:?}");
            }
            Some(_) => {
                self.rejected = self.rejected.saturating_add(1);
            }
        }
    }

    /// Transport clock.
    pub fn clock(&self) -> &MidiClock {
        &self.clock
    }

    /// Channel filter in use.
    pub fn filter(&self) -> ChannelFilter {
        self.filter
    }

    /// Channel messages that passed the filter.
    pub fn accepted(&self) -> u32 {
        self.accepted
    }

    /// Channel messages the filter dropped.
    pub fn rejected(&self) -> u32 {
        self.rejected
    }
}
