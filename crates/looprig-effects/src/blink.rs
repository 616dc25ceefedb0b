//! LED blink patterns for the looper.
//!
//! Patterns are sequences of on/off steps played at a fixed interval. A
//! running pattern overrides the LED's base brightness until its last step
//! has been shown.
//!
//! The looper encodes the selected layer on LED 0 every time the loop comes
//! around, using short (`on, off`) and long (`on, on, on, off`) blinks:
//!
//! | Layer | Code |
//! |-------|------|
//! | 0 | `•` |
//! | 1 | `• •` |
//! | 2 | `• • •` |
//! | 3 | `—` |
//! | 4 | `— •` |
//! | 5 | `— • •` |
//! | 6 | `— • • •` |

use heapless::Vec;

/// Longest pattern one LED can hold.
pub const MAX_BLINK_STEPS: usize = 32;

const SHORT: [u8; 2] = [1, 0];
const LONG: [u8; 4] = [1, 1, 1, 0];

/// Blink code for a zero-based layer index.
///
/// Codes longer than [`MAX_BLINK_STEPS`] are truncated at a whole blink.
pub fn layer_code(layer: usize) -> Vec<u8, MAX_BLINK_STEPS> {
    let mut code = Vec::new();
    let shorts = if layer < 3 {
        layer + 1
    } else {
        let _ = code.extend_from_slice(&LONG);
        layer - 3
    };
    for _ in 0..shorts {
        if code.extend_from_slice(&SHORT).is_err() {
            break;
        }
    }
    code
}

/// Looper state the animator reads each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LooperView {
    /// A take is being recorded.
    pub is_recording: bool,
    /// Speed/slice modifier is latched.
    pub modifier_on: bool,
    /// Layer selected for playback.
    pub selected_layer: usize,
    /// Play head position in samples.
    pub play_position: f32,
    /// Length the heads currently wrap at.
    pub loop_span: usize,
    /// Record head wrap counter.
    pub record_wraps: u32,
}

#[derive(Debug, Clone, Default)]
struct Blink {
    steps: Vec<u8, MAX_BLINK_STEPS>,
    step: usize,
    active: bool,
    next_ms: u32,
}

impl Blink {
    fn start(&mut self, steps: &[u8], now_ms: u32, interval_ms: u32) {
        self.steps.clear();
        let _ = self.steps.extend_from_slice(&steps[..steps.len().min(MAX_BLINK_STEPS)]);
        self.step = 0;
        self.active = !self.steps.is_empty();
        self.next_ms = now_ms.wrapping_add(interval_ms);
    }

    fn cancel(&mut self) {
        self.active = false;
        self.step = 0;
    }

    fn advance(&mut self, now_ms: u32, interval_ms: u32) {
        // Millisecond clock wraps every ~49.7 days.
        if !self.active || (now_ms.wrapping_sub(self.next_ms) as i32) < 0 {
            return;
        }
        self.next_ms = now_ms.wrapping_add(interval_ms);
        self.step += 1;
        if self.step >= self.steps.len() {
            self.cancel();
        }
    }

    fn level(&self) -> Option<f32> {
        if !self.active {
            return None;
        }
        let on = self.steps.get(self.step).copied().unwrap_or(0) > 0;
        Some(if on { 1.0 } else { 0.0 })
    }
}

/// Two-LED animator for the looper.
///
/// LED 0 shows recording progress (solid, then fading over the last fifth of
/// the loop) and plays the layer code on every record-head wrap. LED 1 shows
/// the modifier latch and blinks once when the selected layer changes.
#[derive(Debug, Clone)]
pub struct LedAnimator {
    interval_ms: u32,
    base: [f32; 2],
    blinks: [Blink; 2],
    last_wraps: u32,
    last_selected: usize,
}

impl LedAnimator {
    /// Creates an animator stepping patterns every `interval_ms`.
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            base: [0.0; 2],
            blinks: Default::default(),
            last_wraps: 0,
            last_selected: 0,
        }
    }

    /// Advances animation to `now_ms` against the current looper state.
    pub fn tick(&mut self, now_ms: u32, view: &LooperView) {
        self.base[0] = if view.is_recording && view.loop_span > 0 {
            let phase = view.play_position / view.loop_span as f32;
            if phase <= 0.8 {
                1.0
            } else {
                1.0 - ((phase - 0.8) / 0.2).min(1.0)
            }
        } else {
            0.0
        };

        if view.is_recording {
            self.blinks[0].cancel();
        } else if view.record_wraps != self.last_wraps {
            self.last_wraps = view.record_wraps;
            let code = layer_code(view.selected_layer);
            self.blinks[0].start(&code, now_ms, self.interval_ms);
        }

        self.base[1] = if view.modifier_on { 1.0 } else { 0.0 };
        if view.selected_layer != self.last_selected {
            self.last_selected = view.selected_layer;
            self.blinks[1].start(&SHORT, now_ms, self.interval_ms);
        }

        for blink in &mut self.blinks {
            blink.advance(now_ms, self.interval_ms);
        }
    }

    /// Brightness of `led`; zero for LEDs the looper does not drive.
    pub fn brightness(&self, led: usize) -> f32 {
        match (self.blinks.get(led), self.base.get(led)) {
            (Some(blink), Some(&base)) => blink.level().unwrap_or(base),
            _ => 0.0,
        }
    }

    /// True while a pattern is playing on `led`.
    pub fn is_blinking(&self, led: usize) -> bool {
        self.blinks.get(led).is_some_and(|b| b.active)
    }
}
