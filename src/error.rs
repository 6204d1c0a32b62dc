//! # Error Types
//!
//! Custom error types for Robot Teleop using `thiserror`.

use thiserror::Error;

/// Main error type for Robot Teleop
#[derive(Debug, Error)]
pub enum TeleopError {
    /// The robot refused or failed to start a video stream
    #[error("Failed to start video stream: {0}")]
    StreamStart(String),

    /// A stream start was requested while another one is still pending
    #[error("A stream start request is already in progress")]
    StartInProgress,

    /// Command or session transport failures
    #[error("Transport error: {0}")]
    Transport(String),

    /// Frame socket failures
    #[error("Socket error: {0}")]
    Socket(String),

    /// Gamepad access failures
    #[error("Controller error: {0}")]
    Controller(String),

    /// No usable gamepad was found
    #[error("No gamepad found in /dev/input")]
    ControllerNotFound,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Robot Teleop
pub type Result<T> = std::result::Result<T, TeleopError>;
