//! The pedal application context.
//!
//! [`Pedal`] owns everything both loops share: the module [`Rack`], the
//! [`AudioPipeline`], the [`ControlBridge`] and the MIDI input. The host
//! threads one `&mut Pedal` into each entry point:
//!
//! - [`Pedal::process_block`] from the audio callback
//! - [`Pedal::control_tick`] from the control loop
//!
//! MIDI bytes arriving in the control loop are queued with
//! [`Pedal::queue_midi`] and handled at the top of the next audio block, so
//! the clock advances in step with the audio.

use core::time::Duration;

use heapless::Deque;
use looprig_core::{AudioPipeline, HardwareState, Rack};

use crate::bridge::{ControlBridge, TickReport};
use crate::midi::{ChannelFilter, MidiEvent, MidiInput};
use crate::surface::ControlSurface;

/// Depth of the MIDI event queue.
pub const MIDI_QUEUE_DEPTH: usize = 64;

/// What drives the surface LEDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LedSource {
    /// LEDs of the looper, then of each chain module, in order.
    #[default]
    Modules,
    /// MIDI beat: LED 0 on odd beats, LED 1 on even beats.
    Beat,
}

/// Rack, pipeline, control bridge and MIDI input of one pedal.
pub struct Pedal {
    rack: Rack,
    pipeline: AudioPipeline,
    bridge: ControlBridge,
    midi: MidiInput,
    midi_queue: Deque<MidiEvent, MIDI_QUEUE_DEPTH>,
    led_source: LedSource,
    clock: Duration,
    hardware: HardwareState,
}

impl core::fmt::Debug for Pedal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pedal")
            .field("modules", &self.rack.len())
            .field("pipeline", &self.pipeline)
            .field("led_source", &self.led_source)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl Pedal {
    /// Assembles a pedal. Routes in `bridge` must refer to modules in `rack`.
    pub fn new(rack: Rack, pipeline: AudioPipeline, bridge: ControlBridge) -> Self {
        let hardware = pipeline.hardware_state();
        Self {
            rack,
            pipeline,
            bridge,
            midi: MidiInput::default(),
            midi_queue: Deque::new(),
            led_source: LedSource::default(),
            clock: Duration::ZERO,
            hardware,
        }
    }

    /// Selects the LED source.
    pub fn with_led_source(mut self, source: LedSource) -> Self {
        self.led_source = source;
        self
    }

    /// Listens for channel messages on `filter`.
    pub fn with_midi_filter(mut self, filter: ChannelFilter) -> Self {
        self.midi = MidiInput::new(filter);
        self
    }

    /// Module rack.
    pub fn rack(&self) -> &Rack {
        &self.rack
    }

    /// Module rack, mutably.
    pub fn rack_mut(&mut self) -> &mut Rack {
        &mut self.rack
    }

    /// Audio pipeline.
    pub fn pipeline(&self) -> &AudioPipeline {
        &self.pipeline
    }

    /// Audio pipeline, mutably.
    pub fn pipeline_mut(&mut self) -> &mut AudioPipeline {
        &mut self.pipeline
    }

    /// Control bridge.
    pub fn bridge(&self) -> &ControlBridge {
        &self.bridge
    }

    /// MIDI input state.
    pub fn midi(&self) -> &MidiInput {
        &self.midi
    }

    /// LED source.
    pub fn led_source(&self) -> LedSource {
        self.led_source
    }

    /// Changes the LED source.
    pub fn set_led_source(&mut self, source: LedSource) {
        self.led_source = source;
    }

    /// Control-loop time since start.
    pub fn uptime(&self) -> Duration {
        self.clock
    }

    /// Hardware outputs from the last audio block.
    pub fn hardware_state(&self) -> HardwareState {
        self.hardware
    }

    /// Queues a MIDI message for the next audio block. Returns `false` when
    /// the queue is full and the message was dropped.
    pub fn queue_midi(&mut self, event: MidiEvent) -> bool {
        let queued = self.midi_queue.push_back(event).is_ok();
        #[cfg(feature = "tracing")]
        if !queued {
            tracing::warn!("midi_queue: full, dropped {event:?}");
        }
        queued
    }

    /// Audio entry point: handles queued MIDI, then runs the pipeline.
    pub fn process_block(
        &mut self,
        in_l: &[f32],
        in_r: &[f32],
        out_l: &mut [f32],
        out_r: &mut [f32],
    ) -> HardwareState {
        while let Some(event) = self.midi_queue.pop_front() {
            self.midi.handle(&event);
        }
        self.hardware = self
            .pipeline
            .process_block(&mut self.rack, in_l, in_r, out_l, out_r);
        self.hardware
    }

    /// Control entry point: reads the surface, applies routes, polls and
    /// animates the modules, and writes LEDs and the bypass hardware.
    pub fn control_tick<S: ControlSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        elapsed: Duration,
    ) -> TickReport {
        surface.poll();
        let mut report = self.bridge.tick(
            &*surface,
            elapsed.as_secs_f32(),
            &mut self.rack,
            &mut self.pipeline,
        );

        report.modules_changed = self.rack.poll_all();
        #[cfg(feature = "tracing")]
        if report.modules_changed {
            tracing::debug!("modules_changed at {:?}", self.clock);
        }

        self.clock += elapsed;
        self.rack.tick_all(self.clock.as_millis() as u32);

        self.write_leds(surface);
        if surface.supports_true_bypass() {
            surface.set_mute(self.hardware.muted);
            surface.set_bypass(self.hardware.relay_engaged);
        }
        report
    }

    fn write_leds<S: ControlSurface + ?Sized>(&self, surface: &mut S) {
        let count = surface.led_count();
        match self.led_source {
            LedSource::Beat => {
                let odd = self.midi.clock().odd_beat();
                if count > 0 {
                    surface.set_led(0, if odd { 1.0 } else { 0.0 });
                }
                if count > 1 {
                    surface.set_led(1, if odd { 0.0 } else { 1.0 });
                }
            }
            LedSource::Modules => {
                let ids = self
                    .pipeline
                    .looper()
                    .into_iter()
                    .chain(self.pipeline.chain().iter().copied());
                let mut led = 0;
                'modules: for id in ids {
                    let Some(module) = self.rack.get(id) else {
                        continue;
                    };
                    for i in 0..module.led_count() {
                        if led >= count {
                            break 'modules;
                        }
                        surface.set_led(led, module.led_brightness(i));
                        led += 1;
                    }
                }
                for rest in led..count {
                    surface.set_led(rest, 0.0);
                }
            }
        }
    }
}
