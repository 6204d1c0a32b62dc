//! # Input Mapper Module
//!
//! Turns per-frame gamepad samples into rate-limited robot commands.
//!
//! ## Stick Assignments
//!
//! | Stick | Axes | Function |
//! |-------|------|----------|
//! | Left  | drive X / drive Y | Base drive (angular / linear velocity) |
//! | Right | head X / head Y   | Head yaw / pitch, accumulated |
//!
//! ## Frame Pipeline
//!
//! Every frame tick the mapper:
//!
//! 1. Zeroes axes inside the deadzone
//! 2. Scales the head stick to command units and accumulates it, scaled by
//!    the sensitivity, into the head orientation (clamped to ±100)
//! 3. Scales the drive stick to command units
//! 4. Advances the head and body frame counters. When a counter reaches
//!    `frames_per_command`, it emits that channel's command and restarts
//!    from zero
//!
//! The head accumulates every frame even though a [`HeadCommand`] only goes
//! out once per period, so the robot receives the orientation reached by the
//! end of the period. Drive commands carry the stick position of the
//! emitting frame only.
//!
//! ## Usage
//!
//! ```
//! use robot_teleop::controller::mapper::{InputMapper, RawInputSample};
//!
//! let mut mapper = InputMapper::new();
//! let sample = RawInputSample::from_axes([0.0, -1.0, 0.0, 0.0]);
//!
//! let mut drives = 0;
//! for _ in 0..180 {
//!     drives += mapper.on_frame(&sample).drive.iter().count();
//! }
//! assert_eq!(drives, 1);
//! ```

use super::calibration::{apply_deadzone, clamp, scale_to_command_range, COMMAND_MAX, COMMAND_MIN};
use crate::command::{Command, DriveCommand, HeadCommand};

/// Default deadzone applied to every axis.
pub const DEFAULT_DEADZONE: f64 = 0.1;

/// Default factor applied to head deltas before accumulation.
pub const DEFAULT_SENSITIVITY: f64 = 0.02;

/// Default number of frames between two commands of the same channel.
pub const DEFAULT_FRAMES_PER_COMMAND: u32 = 180;

/// Default head movement velocity.
pub const DEFAULT_HEAD_VELOCITY: i32 = 100;

/// One poll of the four gamepad axes, each normalized to `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawInputSample {
    /// Left stick X (turn).
    pub drive_x: f64,
    /// Left stick Y (forward/backward).
    pub drive_y: f64,
    /// Right stick X (head yaw).
    pub head_x: f64,
    /// Right stick Y (head pitch).
    pub head_y: f64,
}

impl RawInputSample {
    /// Builds a sample from axes in standard gamepad order:
    /// left X, left Y, right X, right Y.
    #[must_use]
    pub fn from_axes(axes: [f64; 4]) -> Self {
        Self {
            drive_x: axes[0],
            drive_y: axes[1],
            head_x: axes[2],
            head_y: axes[3],
        }
    }

    /// Returns a copy with every axis inside the deadzone set to zero.
    #[must_use]
    pub fn filtered(&self, deadzone: f64) -> Self {
        Self {
            drive_x: apply_deadzone(self.drive_x, deadzone),
            drive_y: apply_deadzone(self.drive_y, deadzone),
            head_x: apply_deadzone(self.head_x, deadzone),
            head_y: apply_deadzone(self.head_y, deadzone),
        }
    }
}

/// Accumulated head angle, each component within `[-100, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeadOrientation {
    x: f64,
    y: f64,
}

impl HeadOrientation {
    /// Horizontal component (drives yaw).
    #[must_use]
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Vertical component (drives pitch).
    #[must_use]
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Adds a scaled delta and clamps both components back into range.
    pub fn accumulate(&mut self, dx: i32, dy: i32, sensitivity: f64) {
        let lo = f64::from(COMMAND_MIN);
        let hi = f64::from(COMMAND_MAX);
        self.x = clamp(self.x + f64::from(dx) * sensitivity, lo, hi);
        self.y = clamp(self.y + f64::from(dy) * sensitivity, lo, hi);
    }
}

/// Frames elapsed since the last command on each channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameCounters {
    /// Frames since the last head command.
    pub head: u32,
    /// Frames since the last drive command.
    pub body: u32,
}

/// Advances `counter` and reports whether it reached `threshold`, resetting it if so.
#[inline]
fn advance(counter: &mut u32, threshold: u32) -> bool {
    *counter += 1;
    if *counter >= threshold {
        *counter = 0;
        true
    } else {
        false
    }
}

/// Tuning parameters for [`InputMapper`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapperSettings {
    /// Axis deadzone (values strictly inside are zeroed).
    pub deadzone: f64,
    /// Factor applied to head deltas before accumulation.
    pub sensitivity: f64,
    /// Frames between two commands of the same channel.
    pub frames_per_command: u32,
    /// Velocity attached to every head command.
    pub head_velocity: i32,
}

impl Default for MapperSettings {
    fn default() -> Self {
        Self {
            deadzone: DEFAULT_DEADZONE,
            sensitivity: DEFAULT_SENSITIVITY,
            frames_per_command: DEFAULT_FRAMES_PER_COMMAND,
            head_velocity: DEFAULT_HEAD_VELOCITY,
        }
    }
}

/// Commands emitted by a single frame. Either, both or neither may be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MappedCommands {
    pub head: Option<HeadCommand>,
    pub drive: Option<DriveCommand>,
}

impl MappedCommands {
    /// True when the frame emitted nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.head.is_none() && self.drive.is_none()
    }

    /// Emitted commands, head first.
    pub fn into_commands(self) -> impl Iterator<Item = Command> {
        self.head
            .map(Command::from)
            .into_iter()
            .chain(self.drive.map(Command::from))
    }
}

/// Maps gamepad samples to throttled head and drive commands.
///
/// # Thread Safety
///
/// `InputMapper` is not thread-safe. Drive it from the single task that owns
/// the frame loop.
#[derive(Debug, Clone)]
pub struct InputMapper {
    settings: MapperSettings,
    orientation: HeadOrientation,
    counters: FrameCounters,
}

impl Default for InputMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl InputMapper {
    /// Creates a mapper with default settings, head centered and counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(MapperSettings::default())
    }

    /// Creates a mapper with explicit settings.
    #[must_use]
    pub fn with_settings(settings: MapperSettings) -> Self {
        Self {
            settings,
            orientation: HeadOrientation::default(),
            counters: FrameCounters::default(),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &MapperSettings {
        &self.settings
    }

    #[must_use]
    pub fn orientation(&self) -> HeadOrientation {
        self.orientation
    }

    #[must_use]
    pub fn counters(&self) -> FrameCounters {
        self.counters
    }

    /// Processes one frame tick.
    ///
    /// `None` means no gamepad is connected: nothing accumulates and the
    /// frame counters do not advance.
    pub fn update(&mut self, sample: Option<&RawInputSample>) -> MappedCommands {
        match sample {
            Some(sample) => self.on_frame(sample),
            None => MappedCommands::default(),
        }
    }

    /// Processes one frame tick with a connected gamepad.
    ///
    /// # Examples
    ///
    /// ```
    /// use robot_teleop::controller::mapper::{InputMapper, RawInputSample};
    ///
    /// let mut mapper = InputMapper::new();
    /// let sample = RawInputSample::from_axes([0.0, 0.0, 1.0, 0.0]);
    ///
    /// let out = mapper.on_frame(&sample);
    /// assert!(out.is_empty());
    /// assert_eq!(mapper.orientation().x(), 2.0); // 100 * 0.02
    /// ```
    pub fn on_frame(&mut self, sample: &RawInputSample) -> MappedCommands {
        let filtered = sample.filtered(self.settings.deadzone);

        let (head_dx, head_dy) = scale_to_command_range(filtered.head_x, filtered.head_y);
        self.orientation
            .accumulate(head_dx, head_dy, self.settings.sensitivity);

        let (drive_x, drive_y) = scale_to_command_range(filtered.drive_x, filtered.drive_y);

        let mut out = MappedCommands::default();

        if advance(&mut self.counters.head, self.settings.frames_per_command) {
            out.head = Some(HeadCommand {
                pitch: self.orientation.y.trunc() as i32,
                yaw: -(self.orientation.x.trunc() as i32),
                velocity: self.settings.head_velocity,
            });
        }

        if advance(&mut self.counters.body, self.settings.frames_per_command) {
            out.drive = Some(DriveCommand {
                linear_velocity: drive_y,
                angular_velocity: drive_x,
            });
        }

        out
    }

    /// Recenters the head and restarts both frame counters.
    pub fn reset(&mut self) {
        self.orientation = HeadOrientation::default();
        self.counters = FrameCounters::default();
    }
}
