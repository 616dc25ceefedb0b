//! Fractional read/write cursor over a circular loop region.
//!
//! A [`PositionHead`] walks a loop of `loop_length` samples at a variable
//! speed. Playback can be confined to a *slice*: a sub-window of the loop
//! that starts at `start_pos` and spans `loop_length × slice` samples in the
//! direction of travel. When the head runs off the end of the window it
//! re-enters at the opposite edge, carrying the overshoot, and the wrap
//! counter advances once per traversal.
//!
//! The looper owns two heads (play and record) and advances both once per
//! sample while playing.
//!
//! # Example
//!
//! ```rust
//! use looprig_core::PositionHead;
//!
//! let mut head = PositionHead::new();
//! for _ in 0..10 {
//!     head.update_position(false, 4, 1.0, 0.0);
//! }
//! assert_eq!(head.position(), 2.0);
//! assert_eq!(head.wrap_count(), 2);
//! ```

use libm::{fabsf, floorf, fmodf};

/// Wraps `x` into `(0, length]` the way loop boundaries are computed.
///
/// Negative values wrap from the top. A zero remainder of a nonzero input
/// maps to `length` rather than `0`, so a window that spans the whole loop
/// ends at `length` instead of collapsing to zero width.
///
/// ```rust
/// use looprig_core::position_head::wrapf;
///
/// assert_eq!(wrapf(12.0, 10.0), 2.0);
/// assert_eq!(wrapf(-3.0, 10.0), 7.0);
/// assert_eq!(wrapf(10.0, 10.0), 10.0);
/// assert_eq!(wrapf(0.0, 10.0), 0.0);
/// ```
#[inline]
pub fn wrapf(x: f32, length: f32) -> f32 {
    let r = fmodf(x, length);
    if r < 0.0 {
        r + length
    } else if r == 0.0 && x != 0.0 {
        length
    } else {
        r
    }
}

/// Wraps `x` into the half-open range `[0, length)`.
#[inline]
fn wrap_index(x: f32, length: f32) -> f32 {
    let mut r = fmodf(x, length);
    if r < 0.0 {
        r += length;
    }
    // fmod of a tiny negative value can round up to exactly `length`
    if r >= length { 0.0 } else { r }
}

/// A cursor into a circular loop buffer with speed, slicing and wrap counting.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionHead {
    position: f32,
    speed: f32,
    wrap_count: u32,
}

impl Default for PositionHead {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionHead {
    /// Creates a head at position zero moving forward at unity speed.
    pub const fn new() -> Self {
        Self {
            position: 0.0,
            speed: 1.0,
            wrap_count: 0,
        }
    }

    /// Returns the head to position zero.
    ///
    /// Speed and the wrap counter are kept so observers keyed off the counter
    /// never see it run backwards.
    pub fn reset(&mut self) {
        self.position = 0.0;
    }

    /// Sets the playback speed in samples per update. Negative runs backward.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    /// Current speed.
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Current fractional position.
    pub fn position(&self) -> f32 {
        self.position
    }

    /// Current position truncated to a sample index.
    #[inline]
    pub fn index(&self) -> usize {
        self.position as usize
    }

    /// Number of completed window traversals since construction. Saturates
    /// rather than wrapping.
    pub fn wrap_count(&self) -> u32 {
        self.wrap_count
    }

    /// Copies another head's position, leaving speed and wrap count alone.
    pub fn sync_to(&mut self, other: &PositionHead) {
        self.position = other.position;
    }

    /// Folds the position into a (possibly shorter) loop of `loop_length`.
    ///
    /// Used when the first recording fixes the loop length and the heads may
    /// sit at or beyond the new end.
    pub fn wrap_into(&mut self, loop_length: usize) {
        if loop_length > 0 {
            self.position = wrap_index(self.position, loop_length as f32);
        } else {
            self.position = 0.0;
        }
    }

    /// Advances the head by one step.
    ///
    /// # Arguments
    /// * `is_first_layer` - The first recording pass always travels forward
    /// * `loop_length` - Loop length in samples; zero leaves the head untouched
    /// * `slice` - Window length as a fraction of the loop, `0.0..=1.0`
    /// * `start_pos` - Window anchor in samples
    pub fn update_position(
        &mut self,
        is_first_layer: bool,
        loop_length: usize,
        slice: f32,
        start_pos: f32,
    ) {
        if loop_length == 0 {
            return;
        }
        let length = loop_length as f32;

        let speed = if is_first_layer && self.speed < 0.0 {
            -self.speed
        } else {
            self.speed
        };
        if speed == 0.0 {
            return;
        }

        let window = wrapf(length * slice.clamp(0.0, 1.0), length);
        let start = wrap_index(start_pos, length);
        if window <= 0.0 {
            self.position = start;
            return;
        }

        // Distance already covered inside the window, measured from its
        // anchor in the direction of travel.
        let forward = speed > 0.0;
        let covered = if forward {
            wrap_index(self.position - start, length)
        } else {
            wrap_index(start - self.position, length)
        };

        let mut travelled = covered + fabsf(speed);
        if travelled >= window {
            let laps = floorf(travelled / window);
            travelled = fmodf(travelled, window);
            self.wrap_count = self.wrap_count.saturating_add((laps as u32).max(1));
        }

        self.position = if forward {
            wrap_index(start + travelled, length)
        } else {
            wrap_index(start - travelled, length)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_full_loop_wraps_once_per_pass() {
        let mut head = PositionHead::new();
        for _ in 0..300 {
            head.update_position(false, 100, 1.0, 0.0);
        }
        assert_eq!(head.wrap_count(), 3);
        assert_eq!(head.position(), 0.0);
    }

    #[test]
    fn zero_speed_holds_position() {
        let mut head = PositionHead::new();
        head.update_position(false, 10, 1.0, 0.0);
        head.set_speed(0.0);
        for _ in 0..50 {
            head.update_position(false, 10, 1.0, 0.0);
        }
        assert_eq!(head.position(), 1.0);
        assert_eq!(head.wrap_count(), 0);
    }

    #[test]
    fn first_layer_forces_forward() {
        let mut head = PositionHead::new();
        head.set_speed(-1.0);
        head.update_position(true, 10, 1.0, 0.0);
        assert_eq!(head.position(), 1.0);

        head.update_position(false, 10, 1.0, 0.0);
        assert_eq!(head.position(), 0.0);
    }

    #[test]
    fn backward_wraps_from_top() {
        let mut head = PositionHead::new();
        head.set_speed(-1.0);
        head.update_position(false, 10, 1.0, 0.0);
        assert_eq!(head.position(), 9.0);
        for _ in 0..9 {
            head.update_position(false, 10, 1.0, 0.0);
        }
        assert_eq!(head.position(), 0.0);
        assert_eq!(head.wrap_count(), 1);
    }

    #[test]
    fn slice_repeats_sub_window() {
        let mut head = PositionHead::new();
        // Window [20, 45) in a 100-sample loop; the first step pulls the
        // head in from position 0 at offset 6.
        head.update_position(false, 100, 0.25, 20.0);
        assert_eq!(head.position(), 26.0);
        let entered = head.wrap_count();
        for _ in 0..100 {
            head.update_position(false, 100, 0.25, 20.0);
            assert!(
                (20.0..45.0).contains(&head.position()),
                "escaped slice: {}",
                head.position()
            );
        }
        assert_eq!(head.wrap_count() - entered, 4);
    }

    #[test]
    fn slice_wrapping_past_loop_end() {
        let mut head = PositionHead::new();
        // Window starts at 90 and spans 20 samples: [90, 100) ∪ [0, 10)
        for _ in 0..60 {
            head.update_position(false, 100, 0.2, 90.0);
            let p = head.position();
            assert!(p >= 90.0 || p < 10.0, "outside wrapped slice: {p}");
        }
    }

    #[test]
    fn backward_slice_overshoot_reenters_at_anchor() {
        let mut head = PositionHead::new();
        head.set_speed(-3.0);
        // Window runs down from 50 for 10 samples: (40, 50]
        head.update_position(false, 100, 0.1, 50.0);
        let mut seen = [false; 100];
        for _ in 0..40 {
            head.update_position(false, 100, 0.1, 50.0);
            let p = head.position();
            assert!(p > 40.0 && p <= 50.0, "outside backward slice: {p}");
            seen[p as usize] = true;
        }
        assert!(seen.iter().filter(|&&s| s).count() > 1);
    }

    #[test]
    fn wrap_into_folds_position() {
        let mut head = PositionHead::new();
        for _ in 0..1000 {
            head.update_position(true, 48000, 1.0, 0.0);
        }
        head.wrap_into(1000);
        assert_eq!(head.position(), 0.0);
        head.wrap_into(0);
        assert_eq!(head.position(), 0.0);
    }

    #[test]
    fn reset_keeps_wrap_count() {
        let mut head = PositionHead::new();
        for _ in 0..25 {
            head.update_position(false, 10, 1.0, 0.0);
        }
        head.reset();
        assert_eq!(head.position(), 0.0);
        assert_eq!(head.wrap_count(), 2);
    }

    #[test]
    fn wrapf_maps_exact_multiple_to_length() {
        assert_eq!(wrapf(20.0, 10.0), 10.0);
        assert_eq!(wrapf(-10.0, 10.0), 10.0);
        assert_eq!(wrapf(0.0, 10.0), 0.0);
        assert_eq!(wrapf(-0.5, 10.0), 9.5);
    }

    #[test]
    fn zero_length_loop_is_noop() {
        let mut head = PositionHead::new();
        head.update_position(false, 0, 1.0, 0.0);
        assert_eq!(head.position(), 0.0);
        assert_eq!(head.wrap_count(), 0);
    }
}
