//! # Robot Commands
//!
//! Movement and maintenance commands sent to the robot. Commands are built by
//! the input mapper, handed to a transport, and never retained.

use std::fmt;

/// Moves the robot's head to an absolute orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadCommand {
    /// Head pitch in command units (-100 to 100).
    pub pitch: i32,
    /// Head yaw in command units (-100 to 100).
    pub yaw: i32,
    /// Movement velocity (0 to 100).
    pub velocity: i32,
}

/// Drives the robot base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveCommand {
    /// Forward/backward velocity (-100 to 100).
    pub linear_velocity: i32,
    /// Rotational velocity (-100 to 100).
    pub angular_velocity: i32,
}

/// Any command produced by the input mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Head(HeadCommand),
    Drive(DriveCommand),
}

impl From<HeadCommand> for Command {
    fn from(cmd: HeadCommand) -> Self {
        Command::Head(cmd)
    }
}

impl From<DriveCommand> for Command {
    fn from(cmd: DriveCommand) -> Self {
        Command::Drive(cmd)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Head(h) => write!(
                f,
                "head(pitch={}, yaw={}, velocity={})",
                h.pitch, h.yaw, h.velocity
            ),
            Command::Drive(d) => write!(
                f,
                "drive(linear={}, angular={})",
                d.linear_velocity, d.angular_velocity
            ),
        }
    }
}

/// Reboot request flags.
///
/// The client only ever restarts the robot's non-core services and keeps
/// sensors running, so [`RestartRequest::default`] carries those flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartRequest {
    /// Reboot the robot's core processor as well.
    pub reboot_core: bool,
    /// Keep sensory services running across the restart.
    pub keep_sensory_services: bool,
}

impl Default for RestartRequest {
    fn default() -> Self {
        Self {
            reboot_core: false,
            keep_sensory_services: true,
        }
    }
}
