//! # Calibration Module
//!
//! Deadzone filtering and range conversion for gamepad axes.
//!
//! ## Deadzone
//!
//! Values strictly inside `(-deadzone, deadzone)` are treated as exactly zero.
//! Unlike a rescaling deadzone, values at or beyond the threshold pass through
//! unchanged, so a stick resting just outside the zone keeps its raw value.
//!
//! ## Command Range
//!
//! Normalized axes in `[-1, 1]` map linearly onto robot command units in
//! `[-100, 100]` and are floored to an integer:
//!
//! `scaled = floor((v - (-1)) / (1 - (-1)) * (100 - (-100)) + (-100))`
//!
//! Flooring biases slightly toward negative values near zero (`0.123 -> 12`
//! but `-0.123 -> -13`). The robot has always received values produced this
//! way, so the bias is kept.
//!
//! ## Usage
//!
//! ```
//! use robot_teleop::controller::calibration::{apply_deadzone, scale_to_command_range};
//!
//! assert_eq!(apply_deadzone(0.05, 0.1), 0.0);
//! assert_eq!(scale_to_command_range(-1.0, 1.0), (-100, 100));
//! ```

/// Lower bound of a normalized axis.
pub const AXIS_DOMAIN_MIN: f64 = -1.0;
/// Upper bound of a normalized axis.
pub const AXIS_DOMAIN_MAX: f64 = 1.0;

/// Lower bound of a robot command value.
pub const COMMAND_MIN: i32 = -100;
/// Upper bound of a robot command value.
pub const COMMAND_MAX: i32 = 100;

/// Zeroes values strictly inside the deadzone.
///
/// # Examples
///
/// ```
/// use robot_teleop::controller::calibration::apply_deadzone;
///
/// assert_eq!(apply_deadzone(-0.09, 0.1), 0.0);
/// assert_eq!(apply_deadzone(0.1, 0.1), 0.1);  // Boundary passes through
/// assert_eq!(apply_deadzone(-0.7, 0.1), -0.7);
/// ```
#[must_use]
pub fn apply_deadzone(value: f64, deadzone: f64) -> f64 {
    if -deadzone < value && value < deadzone {
        0.0
    } else {
        value
    }
}

/// Scales a single normalized axis into command units.
#[inline]
#[must_use]
pub fn scale_axis(value: f64) -> i32 {
    let fraction = (value - AXIS_DOMAIN_MIN) / (AXIS_DOMAIN_MAX - AXIS_DOMAIN_MIN);
    let scaled = fraction * f64::from(COMMAND_MAX - COMMAND_MIN) + f64::from(COMMAND_MIN);
    scaled.floor() as i32
}

/// Scales a stick pair into command units.
///
/// # Examples
///
/// ```
/// use robot_teleop::controller::calibration::scale_to_command_range;
///
/// assert_eq!(scale_to_command_range(-1.0, -1.0), (-100, -100));
/// assert_eq!(scale_to_command_range(0.0, 0.5), (0, 50));
/// assert_eq!(scale_to_command_range(1.0, 1.0), (100, 100));
/// ```
#[must_use]
pub fn scale_to_command_range(x: f64, y: f64) -> (i32, i32) {
    (scale_axis(x), scale_axis(y))
}

/// Bounds a value to `[lo, hi]`.
#[inline]
#[must_use]
pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}

/// Converts a raw evdev axis reading to a normalized value in `[-1, 1]`.
///
/// # Arguments
///
/// * `raw` - Raw axis value reported by the device
/// * `min` - Smallest value the axis reports
/// * `max` - Largest value the axis reports
///
/// Readings outside `[min, max]` are clamped.
///
/// # Examples
///
/// ```
/// use robot_teleop::controller::calibration::normalize_axis;
///
/// assert_eq!(normalize_axis(0, 0, 255), -1.0);
/// assert_eq!(normalize_axis(255, 0, 255), 1.0);
/// assert!(normalize_axis(128, 0, 255).abs() < 0.01);
/// assert!(normalize_axis(0, -32768, 32767).abs() < 0.001);
/// ```
#[must_use]
pub fn normalize_axis(raw: i32, min: i32, max: i32) -> f64 {
    let center = (f64::from(min) + f64::from(max)) / 2.0;
    let half_range = (f64::from(max) - f64::from(min)) / 2.0;
    clamp(
        (f64::from(raw) - center) / half_range,
        AXIS_DOMAIN_MIN,
        AXIS_DOMAIN_MAX,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Deadzone Tests ====================

    #[test]
    fn test_deadzone_interior_is_zero() {
        for v in [-0.099, -0.05, -0.0001, 0.0, 0.0001, 0.05, 0.099] {
            assert_eq!(apply_deadzone(v, 0.1), 0.0, "{} should be inside deadzone", v);
        }
    }

    #[test]
    fn test_deadzone_boundary_passes_through() {
        assert_eq!(apply_deadzone(0.1, 0.1), 0.1);
        assert_eq!(apply_deadzone(-0.1, 0.1), -0.1);
    }

    #[test]
    fn test_deadzone_outside_unchanged() {
        assert_eq!(apply_deadzone(0.5, 0.1), 0.5);
        assert_eq!(apply_deadzone(-1.0, 0.1), -1.0);
    }

    #[test]
    fn test_zero_deadzone_is_identity() {
        assert_eq!(apply_deadzone(0.0001, 0.0), 0.0001);
        assert_eq!(apply_deadzone(-0.0001, 0.0), -0.0001);
    }

    // ==================== Scaling Tests ====================

    #[test]
    fn test_scale_domain_bounds() {
        assert_eq!(scale_to_command_range(-1.0, -1.0), (-100, -100));
        assert_eq!(scale_to_command_range(1.0, 1.0), (100, 100));
    }

    #[test]
    fn test_scale_center() {
        assert_eq!(scale_axis(0.0), 0);
    }

    #[test]
    fn test_scale_quarter_points() {
        assert_eq!(scale_axis(-0.5), -50);
        assert_eq!(scale_axis(0.5), 50);
        assert_eq!(scale_axis(0.25), 25);
        assert_eq!(scale_axis(-0.25), -25);
    }

    #[test]
    fn test_scale_floors_toward_negative() {
        assert_eq!(scale_axis(0.123), 12);
        assert_eq!(scale_axis(-0.123), -13);
    }

    #[test]
    fn test_scale_pair_keeps_order() {
        assert_eq!(scale_to_command_range(1.0, -1.0), (100, -100));
    }

    // ==================== Clamp Tests ====================

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(150.0, -100.0, 100.0), 100.0);
        assert_eq!(clamp(-150.0, -100.0, 100.0), -100.0);
        assert_eq!(clamp(42.5, -100.0, 100.0), 42.5);
    }

    // ==================== Normalization Tests ====================

    #[test]
    fn test_normalize_axis_bounds() {
        assert_eq!(normalize_axis(0, 0, 255), -1.0);
        assert_eq!(normalize_axis(255, 0, 255), 1.0);
    }

    #[test]
    fn test_normalize_axis_center() {
        assert!(normalize_axis(128, 0, 255).abs() < 0.01);
        assert!(normalize_axis(0, -32768, 32767).abs() < 0.001);
    }

    #[test]
    fn test_normalize_axis_clamps() {
        assert_eq!(normalize_axis(-10, 0, 255), -1.0);
        assert_eq!(normalize_axis(300, 0, 255), 1.0);
    }

    #[test]
    fn test_full_pipeline() {
        let normalized = normalize_axis(255, 0, 255);
        let filtered = apply_deadzone(normalized, 0.1);
        assert_eq!(scale_axis(filtered), COMMAND_MAX);

        let normalized = normalize_axis(128, 0, 255);
        let filtered = apply_deadzone(normalized, 0.1);
        assert_eq!(scale_axis(filtered), 0);
    }
}
