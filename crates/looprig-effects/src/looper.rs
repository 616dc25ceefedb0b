//! Multi-layer tape-style looper.
//!
//! The looper records takes into a fixed bank of layers and plays them back
//! summed with the live input. The first take fixes the loop length; later
//! takes overdub onto the next layer up. Layers live in a single arena
//! allocated at construction, so nothing is allocated while running.
//!
//! # Controls
//!
//! | Event | Action |
//! |-------|--------|
//! | Bypass pressed | Start a take, or commit the running one |
//! | Alternate pressed | Toggle the speed/slice modifier |
//! | Alternate held | Clear everything |
//!
//! Footswitch callbacks only enqueue a [`LooperCommand`]. The queue is
//! drained at the top of the next block, so layer memory is only ever
//! touched from the audio context.
//!
//! # Layer Discipline
//!
//! Starting a take on top of layer `k` clears every layer above `k` before
//! the first sample is written. When the take lands in the top layer, the
//! bank is squashed on commit: layers 0 and 1 are mixed into layer 0 and
//! everything above shifts down one, freeing the top layer again.
//!
//! The looper is mono. The left input is recorded and the result is written
//! to both outputs.

#[cfg(not(feature = "std"))]
use alloc::vec;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use heapless::Deque;
use libm::fabsf;
use looprig_core::{EffectModule, FootswitchEvent, ParamBank, ParamDescriptor, PositionHead};

use crate::blink::{LedAnimator, LooperView};

/// Parameter index of the layer select knob.
pub const LAYER: usize = 0;
/// Parameter index of the overdub fade amount.
pub const FADING: usize = 1;
/// Parameter index of the modifier playback speed.
pub const SPEED: usize = 2;
/// Parameter index of the modifier slice length.
pub const SLICE: usize = 3;

/// Depth of the footswitch command queue.
pub const COMMAND_QUEUE_DEPTH: usize = 8;

pub(crate) static PARAMS: [ParamDescriptor; 4] = [
    ParamDescriptor::float("Layer", "Layer", 0.0)
        .with_knob(0)
        .with_midi_cc(14),
    ParamDescriptor::float("Fading", "Fade", 0.0).with_midi_cc(15),
    // Float view is the modifier speed: 4 × (m - 0.5)
    ParamDescriptor::float("Speed", "Speed", 0.75).with_range(-2.0, 2.0),
    ParamDescriptor::float("Slice", "Slice", 1.0),
];

/// Request latched by a footswitch callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LooperCommand {
    /// Start a take, or commit the running one.
    ToggleRecord,
    /// Toggle the speed/slice modifier.
    ToggleModifier,
    /// Clear every layer and return to the empty state.
    Reset,
}

/// Looper sizing and control constants.
#[derive(Debug, Clone, PartialEq)]
pub struct LooperConfig {
    /// Number of layers in the bank. At least two.
    pub layers: usize,
    /// Longest loop in seconds.
    pub max_seconds: f32,
    /// Layer knob movement needed to change the selection.
    pub knob_hysteresis: f32,
    /// LED pattern step interval.
    pub blink_interval_ms: u32,
}

impl Default for LooperConfig {
    fn default() -> Self {
        Self {
            layers: 7,
            max_seconds: 30.0,
            knob_hysteresis: 0.05,
            blink_interval_ms: 80,
        }
    }
}

impl LooperConfig {
    /// Layer capacity in samples at `sample_rate`.
    pub fn capacity(&self, sample_rate: f32) -> usize {
        ((self.max_seconds.max(0.0) * sample_rate) as usize).max(1)
    }
}

#[derive(Debug, Clone, Copy)]
struct BlockParams {
    fading: f32,
    slice: f32,
}

/// Layered looper module.
///
/// # Example
///
/// ```rust
/// use looprig_core::{EffectModule, FootswitchEvent};
/// use looprig_effects::{Looper, LooperConfig};
///
/// let config = LooperConfig { max_seconds: 1.0, ..LooperConfig::default() };
/// let mut looper = Looper::new(1000.0, config);
///
/// looper.on_footswitch(FootswitchEvent::BypassPressed);
/// let take = [0.1, 0.2, 0.3];
/// let mut out = [0.0; 3];
/// let mut out_r = [0.0; 3];
/// looper.process_stereo_block(&take, &take, &mut out, &mut out_r);
///
/// looper.on_footswitch(FootswitchEvent::BypassPressed);
/// looper.process_stereo_block(&[0.0; 3], &[0.0; 3], &mut out, &mut out_r);
/// assert_eq!(out, take);
/// assert_eq!(looper.loop_length(), 3);
/// ```
pub struct Looper {
    params: ParamBank<4>,
    layer_count: usize,
    max_seconds: f32,
    hysteresis: f32,
    capacity: usize,
    buffer: Vec<f32>,
    commands: Deque<LooperCommand, COMMAND_QUEUE_DEPTH>,
    enabled: bool,
    is_playing: bool,
    is_recording: bool,
    first_layer: bool,
    recorded: usize,
    loop_length: usize,
    recording_layer: usize,
    selected_layer: usize,
    n_recorded: usize,
    record_knob: f32,
    play_knob: f32,
    modifier_on: bool,
    offset: f32,
    play_head: PositionHead,
    record_head: PositionHead,
    leds: LedAnimator,
    state_changed: bool,
}

impl core::fmt::Debug for Looper {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Looper")
            .field("layers", &self.layer_count)
            .field("capacity", &self.capacity)
            .field("n_recorded", &self.n_recorded)
            .field("loop_length", &self.loop_length)
            .field("is_recording", &self.is_recording)
            .field("is_playing", &self.is_playing)
            .finish_non_exhaustive()
    }
}

impl Looper {
    /// Creates an empty looper and allocates the layer arena.
    pub fn new(sample_rate: f32, config: LooperConfig) -> Self {
        let layer_count = config.layers.max(2);
        let capacity = config.capacity(sample_rate);
        Self {
            params: ParamBank::new(&PARAMS),
            layer_count,
            max_seconds: config.max_seconds,
            hysteresis: config.knob_hysteresis,
            capacity,
            buffer: vec![0.0; layer_count * capacity],
            commands: Deque::new(),
            enabled: true,
            is_playing: false,
            is_recording: false,
            first_layer: true,
            recorded: 0,
            loop_length: 0,
            recording_layer: 0,
            selected_layer: 0,
            n_recorded: 0,
            record_knob: 0.0,
            play_knob: 0.0,
            modifier_on: false,
            offset: 0.0,
            play_head: PositionHead::new(),
            record_head: PositionHead::new(),
            leds: LedAnimator::new(config.blink_interval_ms),
            state_changed: false,
        }
    }

    /// Latches a command for the next block. Returns `false` when the queue
    /// is full and the command was dropped.
    pub fn enqueue(&mut self, command: LooperCommand) -> bool {
        if self.commands.push_back(command).is_ok() {
            #[cfg(feature = "tracing")]
            tracing::debug!("looper_command: {command:?}");
            true
        } else {
            #[cfg(feature = "tracing")]
            tracing::warn!("looper_command: queue full, dropped {command:?}");
            false
        }
    }

    /// Commands waiting for the next block.
    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    /// Number of layers in the bank.
    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    /// Samples per layer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Committed loop length; zero until the first take is committed.
    pub fn loop_length(&self) -> usize {
        self.loop_length
    }

    /// Number of committed layers.
    pub fn n_recorded_layers(&self) -> usize {
        self.n_recorded
    }

    /// Layer the running (or last started) take writes to.
    pub fn recording_layer(&self) -> usize {
        self.recording_layer
    }

    /// Topmost layer included in playback.
    pub fn selected_layer(&self) -> usize {
        self.selected_layer
    }

    /// True while a take is running.
    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    /// True once anything has been recorded.
    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// True until the first take is committed.
    pub fn is_first_layer(&self) -> bool {
        self.first_layer
    }

    /// Speed/slice modifier latch.
    pub fn modifier_on(&self) -> bool {
        self.modifier_on
    }

    /// Play head position in samples.
    pub fn play_position(&self) -> f32 {
        self.play_head.position()
    }

    /// Record head position in samples.
    pub fn record_position(&self) -> f32 {
        self.record_head.position()
    }

    /// Samples of layer `index`, or `None` past the bank.
    pub fn layer(&self, index: usize) -> Option<&[f32]> {
        (index < self.layer_count)
            .then(|| &self.buffer[index * self.capacity..(index + 1) * self.capacity])
    }

    /// Snapshot of the state the LED animator reads.
    pub fn view(&self) -> LooperView {
        LooperView {
            is_recording: self.is_recording,
            modifier_on: self.modifier_on,
            selected_layer: self.selected_layer,
            play_position: self.play_head.position(),
            loop_span: self.effective_length(),
            record_wraps: self.record_head.wrap_count(),
        }
    }

    /// Length the heads wrap at: the full capacity during the first take,
    /// the committed length afterwards.
    fn effective_length(&self) -> usize {
        if self.first_layer {
            self.capacity
        } else {
            self.loop_length
        }
    }

    /// Region of each layer that can hold audio.
    fn used_region(&self) -> usize {
        let region = if self.first_layer {
            self.recorded
        } else {
            self.loop_length
        };
        region.min(self.capacity)
    }

    fn layer_for_knob(&self, knob: f32) -> usize {
        if self.n_recorded == 0 {
            0
        } else {
            ((knob * self.n_recorded as f32) as usize).min(self.n_recorded - 1)
        }
    }

    fn zero_layers(&mut self, from: usize, to: usize, region: usize) {
        for layer in from..to.min(self.layer_count) {
            let start = layer * self.capacity;
            self.buffer[start..start + region].fill(0.0);
        }
    }

    fn apply(&mut self, command: LooperCommand) {
        match command {
            LooperCommand::ToggleRecord => {
                if self.is_recording {
                    self.commit();
                } else {
                    self.start_take();
                }
            }
            LooperCommand::ToggleModifier => self.toggle_modifier(),
            LooperCommand::Reset => self.clear(),
        }
        self.state_changed = true;
    }

    fn start_take(&mut self) {
        let target = if self.n_recorded == 0 {
            0
        } else {
            let knob = self.params.magnitude(LAYER);
            if fabsf(knob - self.record_knob) > self.hysteresis {
                self.record_knob = knob;
                self.selected_layer = self.layer_for_knob(knob);
            }
            (self.selected_layer + 1).min(self.layer_count - 1)
        };

        // Layers at and above the target go silent before the first write.
        let top = self.n_recorded.max(target + 1);
        let region = self.used_region();
        self.zero_layers(target, top, region);
        self.n_recorded = self.n_recorded.min(target);

        self.recording_layer = target;
        self.is_recording = true;
        self.is_playing = true;
    }

    fn commit(&mut self) {
        if self.first_layer && self.recorded == 0 {
            // Nothing was written; drop the take instead of locking a
            // zero-length loop.
            self.is_recording = false;
            self.is_playing = false;
            self.play_head.reset();
            self.record_head.reset();
            return;
        }

        self.n_recorded = self.recording_layer + 1;
        if self.recording_layer == self.layer_count - 1 {
            self.squash();
        }

        if self.first_layer {
            self.loop_length = self.recorded.min(self.capacity);
            self.first_layer = false;
            self.play_head.wrap_into(self.loop_length);
            self.record_head.wrap_into(self.loop_length);
        }

        self.selected_layer = self.n_recorded - 1;
        self.is_recording = false;
        self.is_playing = true;
    }

    /// Mixes layer 1 into layer 0 and shifts the rest down one.
    fn squash(&mut self) {
        let cap = self.capacity;
        let region = self.used_region();

        let (bottom, rest) = self.buffer.split_at_mut(cap);
        for (dst, &src) in bottom[..region].iter_mut().zip(rest[..region].iter()) {
            *dst += src;
        }
        for layer in 1..self.layer_count - 1 {
            let src = (layer + 1) * cap;
            self.buffer.copy_within(src..src + region, layer * cap);
        }
        let top = self.layer_count - 1;
        self.zero_layers(top, top + 1, region);
        self.n_recorded = self.layer_count - 1;
    }

    fn toggle_modifier(&mut self) {
        self.modifier_on = !self.modifier_on;
        if self.modifier_on {
            self.offset = self.play_head.position();
        } else {
            self.offset = 0.0;
            self.play_head.sync_to(&self.record_head);
        }
    }

    /// Zeroes every layer and returns to the empty state.
    fn clear(&mut self) {
        let region = self.used_region();
        self.zero_layers(0, self.layer_count, region);
        self.is_playing = false;
        self.is_recording = false;
        self.first_layer = true;
        self.recorded = 0;
        self.loop_length = 0;
        self.recording_layer = 0;
        self.selected_layer = 0;
        self.n_recorded = 0;
        self.record_knob = 0.0;
        self.play_knob = 0.0;
        self.modifier_on = false;
        self.offset = 0.0;
        self.play_head.reset();
        self.record_head.reset();
    }

    /// Applies latched commands and snapshots the parameters.
    fn begin_block(&mut self) -> BlockParams {
        while let Some(command) = self.commands.pop_front() {
            self.apply(command);
        }

        let knob = self.params.magnitude(LAYER);
        if fabsf(knob - self.play_knob) > self.hysteresis {
            self.play_knob = knob;
            self.selected_layer = self.layer_for_knob(knob);
        }

        let (speed, slice) = if self.modifier_on {
            (
                self.params.as_float(SPEED),
                self.params.magnitude(SLICE).max(0.01),
            )
        } else {
            (1.0, 1.0)
        };
        self.play_head.set_speed(speed);

        BlockParams {
            fading: 1.0 - self.params.magnitude(FADING),
            slice,
        }
    }

    #[inline]
    fn process_frame(&mut self, input: f32, block: BlockParams) -> f32 {
        let cap = self.capacity;
        let play = self.play_head.index().min(cap - 1);
        let rec = self.record_head.index().min(cap - 1);

        let active = if self.is_recording {
            self.recording_layer
        } else {
            self.selected_layer
        };
        let mut out = input;
        for layer in 0..=active {
            out += self.buffer[layer * cap + play];
        }

        if self.is_recording {
            for layer in 0..=self.recording_layer {
                self.buffer[layer * cap + rec] *= block.fading;
            }
            self.buffer[self.recording_layer * cap + rec] += input;
            if self.first_layer {
                self.recorded += 1;
            }
        }

        if self.is_playing {
            let length = self.effective_length();
            self.play_head
                .update_position(self.first_layer, length, block.slice, self.offset);
            self.record_head
                .update_position(self.first_layer, length, 1.0, 0.0);
        }

        if self.is_recording && self.first_layer && self.recorded >= cap {
            self.commit();
        }

        out
    }
}

impl EffectModule for Looper {
    fn name(&self) -> &'static str {
        "looper"
    }

    /// Resizes the arena when the capacity changes. Call before the first
    /// block; a resize clears every layer.
    fn set_sample_rate(&mut self, sample_rate: f32) {
        let capacity = LooperConfig {
            max_seconds: self.max_seconds,
            ..LooperConfig::default()
        }
        .capacity(sample_rate);
        if capacity != self.capacity {
            self.capacity = capacity;
            self.buffer = vec![0.0; self.layer_count * capacity];
            self.clear();
        }
    }

    fn reset(&mut self) {
        self.commands.clear();
        self.clear();
    }

    fn process_stereo(&mut self, left: f32, _right: f32) -> (f32, f32) {
        let block = self.begin_block();
        let out = self.process_frame(left, block);
        (out, out)
    }

    fn process_stereo_block(
        &mut self,
        in_l: &[f32],
        _in_r: &[f32],
        out_l: &mut [f32],
        out_r: &mut [f32],
    ) {
        let block = self.begin_block();
        for ((&x, l), r) in in_l.iter().zip(out_l.iter_mut()).zip(out_r.iter_mut()) {
            let y = self.process_frame(x, block);
            *l = y;
            *r = y;
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn param_count(&self) -> usize {
        self.params.len()
    }

    fn param_descriptor(&self, index: usize) -> Option<&'static ParamDescriptor> {
        self.params.descriptor(index)
    }

    fn magnitude(&self, index: usize) -> f32 {
        self.params.magnitude(index)
    }

    fn set_magnitude(&mut self, index: usize, value: f32) {
        self.params.set_magnitude(index, value);
    }

    fn on_footswitch(&mut self, event: FootswitchEvent) -> bool {
        let command = match event {
            FootswitchEvent::BypassPressed => LooperCommand::ToggleRecord,
            FootswitchEvent::AlternatePressed => LooperCommand::ToggleModifier,
            FootswitchEvent::AlternateHeld => LooperCommand::Reset,
            _ => return false,
        };
        self.enqueue(command)
    }

    fn led_count(&self) -> usize {
        2
    }

    fn led_brightness(&self, led: usize) -> f32 {
        self.leds.brightness(led)
    }

    fn tick(&mut self, now_ms: u32) {
        let view = self.view();
        self.leds.tick(now_ms, &view);
    }

    fn poll(&mut self) -> bool {
        core::mem::take(&mut self.state_changed)
    }
}
