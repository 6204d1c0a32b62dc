//! # Controller Module
//!
//! Gamepad input handling.
//!
//! This module handles:
//! - Gamepad detection and connection via evdev
//! - Tracking analog stick positions
//! - Applying deadzones and scaling to command units
//! - Mapping sticks to rate-limited head and drive commands

pub mod calibration;
pub mod events;
pub mod gamepad;
pub mod mapper;
