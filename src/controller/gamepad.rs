//! # Gamepad Module
//!
//! Gamepad detection and input reading using the Linux evdev interface.
//!
//! ## Controller Detection
//!
//! Any device exposing both analog sticks is accepted:
//! - Left stick: ABS_X, ABS_Y
//! - Right stick: ABS_RX, ABS_RY
//!
//! A configured device path skips the scan.
//!
//! ## Reading
//!
//! [`Gamepad::spawn_reader`] moves the device into a tokio task that reads its
//! event stream and publishes the latest stick positions on a `watch` channel.
//! The frame loop polls the returned [`GamepadHandle`] without ever blocking
//! on the device. When the device disappears, the handle reports disconnected
//! and polls return `None`.

use evdev::{AbsoluteAxisType, Device};
use std::path::Path;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::events::{AxisState, AxisTracker};
use super::mapper::RawInputSample;
use crate::error::{Result, TeleopError};

/// Axes a device must expose to be used as a gamepad.
const REQUIRED_AXES: [AbsoluteAxisType; 4] = [
    AbsoluteAxisType::ABS_X,
    AbsoluteAxisType::ABS_Y,
    AbsoluteAxisType::ABS_RX,
    AbsoluteAxisType::ABS_RY,
];

/// Source of one raw input sample per frame tick.
pub trait InputSource {
    /// Latest sample, or `None` when no gamepad is connected.
    fn poll(&mut self) -> Option<RawInputSample>;
}

/// Snapshot published by the reader task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GamepadSnapshot {
    pub axes: AxisState,
    pub connected: bool,
}

/// Gamepad handle
///
/// Represents an opened evdev gamepad that has not started reading yet.
pub struct Gamepad {
    device: Device,
    device_path: String,
}

impl std::fmt::Debug for Gamepad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gamepad")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl Gamepad {
    /// Open a gamepad
    ///
    /// With a non-empty `device_path`, opens that device directly. Otherwise
    /// scans `/dev/input/event*` in sorted order and opens the first device
    /// exposing both sticks.
    ///
    /// # Errors
    ///
    /// - `ControllerNotFound`: No suitable device found on the system
    /// - `Controller`: The configured device could not be opened or lacks sticks
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use robot_teleop::controller::gamepad::Gamepad;
    ///
    /// let gamepad = Gamepad::open("")?;
    /// println!("Connected to gamepad at: {}", gamepad.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(device_path: &str) -> Result<Self> {
        if !device_path.is_empty() {
            return Self::open_path(Path::new(device_path));
        }

        let input_dir = Path::new("/dev/input");

        if !input_dir.exists() {
            return Err(TeleopError::Controller(
                "/dev/input directory not found".to_string(),
            ));
        }

        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| TeleopError::Controller(format!("Failed to read /dev/input: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| TeleopError::Controller(format!("Failed to read directory entry: {}", e)))?;

        // Deterministic choice when several gamepads are connected
        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();

            let is_event_node = path
                .file_name()
                .map(|name| name.to_string_lossy().starts_with("event"))
                .unwrap_or(false);
            if !is_event_node {
                continue;
            }

            match Device::open(&path) {
                Ok(device) => {
                    debug!(
                        "Found input device: {} ({})",
                        path.display(),
                        device.name().unwrap_or("unnamed")
                    );

                    if has_sticks(&device) {
                        let device_path = path.to_string_lossy().to_string();
                        info!("Found gamepad at: {}", device_path);
                        return Ok(Self { device, device_path });
                    }
                }
                Err(e) => {
                    // Permission denied or other errors - skip device
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(TeleopError::ControllerNotFound)
    }

    fn open_path(path: &Path) -> Result<Self> {
        let device = Device::open(path).map_err(|e| {
            TeleopError::Controller(format!("Failed to open {}: {}", path.display(), e))
        })?;

        if !has_sticks(&device) {
            return Err(TeleopError::Controller(format!(
                "{} does not expose two analog sticks",
                path.display()
            )));
        }

        let device_path = path.to_string_lossy().to_string();
        info!("Opened gamepad at: {}", device_path);
        Ok(Self { device, device_path })
    }

    /// Returns the `/dev/input/eventX` path used to open this gamepad.
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Human-readable device name, if the driver reports one.
    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }

    /// Starts reading events on a tokio task.
    ///
    /// `axis_min` and `axis_max` are the raw range reported by the device's
    /// sticks and are used to normalize samples.
    ///
    /// # Errors
    ///
    /// Returns `Controller` if the device cannot be switched to async reads.
    pub fn spawn_reader(self, axis_min: i32, axis_max: i32) -> Result<GamepadHandle> {
        let mut stream = self.device.into_event_stream().map_err(|e| {
            TeleopError::Controller(format!("Failed to create event stream: {}", e))
        })?;

        let (tx, rx) = watch::channel(GamepadSnapshot {
            axes: AxisState::centered(axis_min, axis_max),
            connected: true,
        });
        let device_path = self.device_path;

        let task = tokio::spawn(async move {
            let mut tracker = AxisTracker::with_range(axis_min, axis_max);
            loop {
                match stream.next_event().await {
                    Ok(event) => {
                        if tracker.process_event(&event) {
                            tx.send_replace(GamepadSnapshot {
                                axes: *tracker.state(),
                                connected: true,
                            });
                        }
                    }
                    Err(e) => {
                        warn!("Gamepad {} disconnected: {}", device_path, e);
                        tx.send_replace(GamepadSnapshot {
                            axes: *tracker.state(),
                            connected: false,
                        });
                        break;
                    }
                }
            }
        });

        Ok(GamepadHandle {
            rx,
            axis_min,
            axis_max,
            task: Some(task),
        })
    }
}

fn has_sticks(device: &Device) -> bool {
    device
        .supported_absolute_axes()
        .map(|axes| REQUIRED_AXES.iter().all(|&axis| axes.contains(axis)))
        .unwrap_or(false)
}

/// Polling side of a running gamepad reader.
#[derive(Debug)]
pub struct GamepadHandle {
    rx: watch::Receiver<GamepadSnapshot>,
    axis_min: i32,
    axis_max: i32,
    task: Option<JoinHandle<()>>,
}

impl GamepadHandle {
    /// Builds a handle over an existing snapshot channel.
    #[must_use]
    pub fn from_receiver(rx: watch::Receiver<GamepadSnapshot>, axis_min: i32, axis_max: i32) -> Self {
        Self {
            rx,
            axis_min,
            axis_max,
            task: None,
        }
    }

    /// True while the device is still delivering events.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.rx.borrow().connected
    }
}

impl InputSource for GamepadHandle {
    fn poll(&mut self) -> Option<RawInputSample> {
        let snapshot = *self.rx.borrow();
        snapshot
            .connected
            .then(|| snapshot.axes.to_sample(self.axis_min, self.axis_max))
    }
}

impl Drop for GamepadHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
