//! # Gamepad Event Module
//!
//! Parses raw evdev events from a gamepad into the latest stick positions.
//!
//! ## Axis Codes (EV_ABS)
//!
//! | Axis | evdev Code | Function |
//! |------|------------|----------|
//! | Left Stick X | ABS_X | Drive turn |
//! | Left Stick Y | ABS_Y | Drive forward/backward |
//! | Right Stick X | ABS_RX | Head yaw |
//! | Right Stick Y | ABS_RY | Head pitch |
//!
//! Buttons, triggers, d-pad and motion sensors are ignored.
//!
//! ## Usage
//!
//! ```
//! use evdev::{AbsoluteAxisType, EventType, InputEvent};
//! use robot_teleop::controller::events::AxisTracker;
//!
//! let mut tracker = AxisTracker::new();
//! tracker.process_event(&InputEvent::new(EventType::ABSOLUTE, AbsoluteAxisType::ABS_X.0, 255));
//!
//! let sample = tracker.state().to_sample(0, 255);
//! assert_eq!(sample.drive_x, 1.0);
//! ```

use evdev::{AbsoluteAxisType, InputEvent, InputEventKind};

use super::calibration::normalize_axis;
use super::mapper::RawInputSample;

/// Raw stick positions as last reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisState {
    pub drive_x: i32,
    pub drive_y: i32,
    pub head_x: i32,
    pub head_y: i32,
}

impl AxisState {
    /// All sticks at the center of `[min, max]`.
    #[must_use]
    pub fn centered(min: i32, max: i32) -> Self {
        // Widened so the full i32 range cannot overflow; the result lies in [min, max]
        let center = (i64::from(min) + (i64::from(max) - i64::from(min)) / 2) as i32;
        Self {
            drive_x: center,
            drive_y: center,
            head_x: center,
            head_y: center,
        }
    }

    /// Normalizes the raw positions into a mapper sample.
    #[must_use]
    pub fn to_sample(&self, min: i32, max: i32) -> RawInputSample {
        RawInputSample {
            drive_x: normalize_axis(self.drive_x, min, max),
            drive_y: normalize_axis(self.drive_y, min, max),
            head_x: normalize_axis(self.head_x, min, max),
            head_y: normalize_axis(self.head_y, min, max),
        }
    }
}

impl Default for AxisState {
    fn default() -> Self {
        Self::centered(0, 255)
    }
}

/// Accumulates axis events into an [`AxisState`].
///
/// # Thread Safety
///
/// `AxisTracker` is not thread-safe. Use from a single task only.
#[derive(Debug, Default)]
pub struct AxisTracker {
    state: AxisState,
}

impl AxisTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tracker whose sticks start centered in `[min, max]`.
    #[must_use]
    pub fn with_range(min: i32, max: i32) -> Self {
        Self {
            state: AxisState::centered(min, max),
        }
    }

    #[must_use]
    pub fn state(&self) -> &AxisState {
        &self.state
    }

    /// Processes a single evdev input event. Returns `true` if a tracked axis changed.
    pub fn process_event(&mut self, event: &InputEvent) -> bool {
        match event.kind() {
            InputEventKind::AbsAxis(axis) => self.process_axis_event(axis, event.value()),
            _ => false,
        }
    }

    fn process_axis_event(&mut self, axis: AbsoluteAxisType, value: i32) -> bool {
        let slot = match axis {
            AbsoluteAxisType::ABS_X => &mut self.state.drive_x,
            AbsoluteAxisType::ABS_Y => &mut self.state.drive_y,
            AbsoluteAxisType::ABS_RX => &mut self.state.head_x,
            AbsoluteAxisType::ABS_RY => &mut self.state.head_y,
            _ => return false,
        };
        *slot = value;
        true
    }
}
