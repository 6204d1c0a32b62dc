//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::controller::mapper::MapperSettings;
use crate::error::{Result, TeleopError};
use crate::stream::StreamParams;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub robot: RobotConfig,
    pub controller: ControllerConfig,
    pub mapper: MapperConfig,
    pub stream: StreamConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Robot endpoint configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RobotConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Gamepad configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControllerConfig {
    #[serde(default)]
    pub device_path: String,

    #[serde(default = "default_deadzone")]
    pub deadzone: f64,

    #[serde(default = "default_axis_min")]
    pub axis_min: i32,

    #[serde(default = "default_axis_max")]
    pub axis_max: i32,
}

/// Input mapper configuration
#[derive(Debug, Deserialize, Clone)]
pub struct MapperConfig {
    #[serde(default = "default_frame_rate_hz")]
    pub frame_rate_hz: u32,

    #[serde(default = "default_frames_per_command")]
    pub frames_per_command: u32,

    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,

    #[serde(default = "default_head_velocity")]
    pub head_velocity: i32,
}

/// Video stream configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StreamConfig {
    #[serde(default = "default_stream_enabled")]
    pub enabled: bool,

    #[serde(default = "default_stream_port")]
    pub port: u16,

    #[serde(default = "default_rotation")]
    pub rotation: u16,

    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_quality")]
    pub quality: u8,
}

/// Log output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default)]
    pub log_dir: String,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: String::new(),
            file_prefix: default_file_prefix(),
        }
    }
}

// Default value functions
fn default_host() -> String { "192.168.1.100".to_string() }
fn default_request_timeout_ms() -> u64 { 2000 }

fn default_deadzone() -> f64 { 0.1 }
fn default_axis_min() -> i32 { 0 }
fn default_axis_max() -> i32 { 255 }

fn default_frame_rate_hz() -> u32 { 60 }
fn default_frames_per_command() -> u32 { 180 }
fn default_sensitivity() -> f64 { 0.02 }
fn default_head_velocity() -> i32 { 100 }

fn default_stream_enabled() -> bool { true }
fn default_stream_port() -> u16 { 5678 }
fn default_rotation() -> u16 { 90 }
fn default_width() -> u32 { 400 }
fn default_height() -> u32 { 540 }
fn default_quality() -> u8 { 100 }

fn default_file_prefix() -> String { "robot-teleop.log".to_string() }

fn invalid(msg: &str) -> TeleopError {
    TeleopError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use robot_teleop::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Mapper tuning derived from the `[controller]` and `[mapper]` sections.
    #[must_use]
    pub fn mapper_settings(&self) -> MapperSettings {
        MapperSettings {
            deadzone: self.controller.deadzone,
            sensitivity: self.mapper.sensitivity,
            frames_per_command: self.mapper.frames_per_command,
            head_velocity: self.mapper.head_velocity,
        }
    }

    /// Stream negotiation parameters from the `[stream]` section.
    #[must_use]
    pub fn stream_params(&self) -> StreamParams {
        StreamParams {
            port: self.stream.port,
            rotation: self.stream.rotation,
            width: self.stream.width,
            height: self.stream.height,
            quality: self.stream.quality,
        }
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if self.robot.host.is_empty() {
            return Err(invalid("robot host cannot be empty"));
        }

        if self.robot.request_timeout_ms == 0 || self.robot.request_timeout_ms > 60000 {
            return Err(invalid("request_timeout_ms must be between 1 and 60000"));
        }

        // Controller device_path can be empty (auto-detect)

        if !(0.0..0.5).contains(&self.controller.deadzone) {
            return Err(invalid("deadzone must be between 0.0 and 0.5"));
        }

        if self.controller.axis_min >= self.controller.axis_max {
            return Err(invalid("axis_min must be less than axis_max"));
        }

        if self.mapper.frame_rate_hz == 0 || self.mapper.frame_rate_hz > 240 {
            return Err(invalid("frame_rate_hz must be between 1 and 240"));
        }

        if self.mapper.frames_per_command == 0 {
            return Err(invalid("frames_per_command must be greater than 0"));
        }

        if self.mapper.sensitivity <= 0.0 || self.mapper.sensitivity > 1.0 {
            return Err(invalid("sensitivity must be greater than 0.0 and at most 1.0"));
        }

        if !(0..=100).contains(&self.mapper.head_velocity) {
            return Err(invalid("head_velocity must be between 0 and 100"));
        }

        if self.stream.port == 0 {
            return Err(invalid("stream port must be greater than 0"));
        }

        if ![0, 90, 180, 270].contains(&self.stream.rotation) {
            return Err(invalid("rotation must be one of: 0, 90, 180, 270"));
        }

        if self.stream.width == 0 || self.stream.height == 0 {
            return Err(invalid("stream width and height must be greater than 0"));
        }

        if self.stream.quality == 0 || self.stream.quality > 100 {
            return Err(invalid("quality must be between 1 and 100"));
        }

        if !self.logging.log_dir.is_empty() && self.logging.file_prefix.is_empty() {
            return Err(invalid("file_prefix cannot be empty when log_dir is set"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_valid_config() -> Config {
        Config {
            robot: RobotConfig {
                host: default_host(),
                request_timeout_ms: default_request_timeout_ms(),
            },
            controller: ControllerConfig {
                device_path: String::new(),
                deadzone: default_deadzone(),
                axis_min: default_axis_min(),
                axis_max: default_axis_max(),
            },
            mapper: MapperConfig {
                frame_rate_hz: default_frame_rate_hz(),
                frames_per_command: default_frames_per_command(),
                sensitivity: default_sensitivity(),
                head_velocity: default_head_velocity(),
            },
            stream: StreamConfig {
                enabled: default_stream_enabled(),
                port: default_stream_port(),
                rotation: default_rotation(),
                width: default_width(),
                height: default_height(),
                quality: default_quality(),
            },
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_default_config() {
        assert!(create_valid_config().validate().is_ok());
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[robot]
host = "10.0.0.7"

[controller]

[mapper]

[stream]
width = 640
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.robot.host, "10.0.0.7");
        assert_eq!(config.stream.width, 640);
        assert_eq!(config.stream.height, 540);
        assert!(config.logging.log_dir.is_empty());
    }

    #[test]
    fn test_full_i32_axis_range_is_usable() {
        use crate::controller::events::AxisState;
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[robot]

[controller]
axis_min = -2147483648
axis_max = 2147483647

[mapper]

[stream]
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        let state = AxisState::centered(config.controller.axis_min, config.controller.axis_max);
        assert_eq!(state.head_y, -1);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/robot-teleop.toml");
        assert!(matches!(result, Err(TeleopError::Io(_))));
    }

    #[test]
    fn test_load_malformed_toml() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[robot\nhost = ").unwrap();
        temp_file.flush().unwrap();

        let result = Config::load(temp_file.path());
        assert!(matches!(result, Err(TeleopError::Config(_))));
    }

    #[test]
    fn test_empty_host() {
        let mut config = create_valid_config();
        config.robot.host = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_request_timeout_zero() {
        let mut config = create_valid_config();
        config.robot.request_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_request_timeout_too_high() {
        let mut config = create_valid_config();
        config.robot.request_timeout_ms = 60001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deadzone_negative() {
        let mut config = create_valid_config();
        config.controller.deadzone = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deadzone_too_high() {
        let mut config = create_valid_config();
        config.controller.deadzone = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deadzone_zero_allowed() {
        let mut config = create_valid_config();
        config.controller.deadzone = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_axis_range_inverted() {
        let mut config = create_valid_config();
        config.controller.axis_min = 255;
        config.controller.axis_max = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_frame_rate_zero() {
        let mut config = create_valid_config();
        config.mapper.frame_rate_hz = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_frame_rate_too_high() {
        let mut config = create_valid_config();
        config.mapper.frame_rate_hz = 241;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_frames_per_command_zero() {
        let mut config = create_valid_config();
        config.mapper.frames_per_command = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sensitivity_zero() {
        let mut config = create_valid_config();
        config.mapper.sensitivity = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_head_velocity_out_of_range() {
        let mut config = create_valid_config();
        config.mapper.head_velocity = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_stream_port_zero() {
        let mut config = create_valid_config();
        config.stream.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_rotation() {
        let mut config = create_valid_config();
        config.stream.rotation = 45;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_rotations() {
        for &rotation in &[0, 90, 180, 270] {
            let mut config = create_valid_config();
            config.stream.rotation = rotation;
            assert!(config.validate().is_ok(), "Rotation {} should be valid", rotation);
        }
    }

    #[test]
    fn test_zero_dimensions() {
        let mut config = create_valid_config();
        config.stream.width = 0;
        assert!(config.validate().is_err());

        let mut config = create_valid_config();
        config.stream.height = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_quality_bounds() {
        let mut config = create_valid_config();
        config.stream.quality = 0;
        assert!(config.validate().is_err());

        config.stream.quality = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_dir_without_prefix() {
        let mut config = create_valid_config();
        config.logging.log_dir = "./logs".to_string();
        config.logging.file_prefix = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mapper_settings_from_config() {
        let settings = create_valid_config().mapper_settings();
        assert_eq!(settings, MapperSettings::default());
    }

    #[test]
    fn test_stream_params_from_config() {
        let params = create_valid_config().stream_params();
        assert_eq!(params.port, 5678);
        assert_eq!(params.rotation, 90);
        assert_eq!(params.width, 400);
        assert_eq!(params.height, 540);
        assert_eq!(params.quality, 100);
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_host(), "192.168.1.100");
        assert_eq!(default_request_timeout_ms(), 2000);
        assert_eq!(default_deadzone(), 0.1);
        assert_eq!(default_axis_min(), 0);
        assert_eq!(default_axis_max(), 255);
        assert_eq!(default_frame_rate_hz(), 60);
        assert_eq!(default_frames_per_command(), 180);
        assert_eq!(default_sensitivity(), 0.02);
        assert_eq!(default_head_velocity(), 100);
        assert!(default_stream_enabled());
        assert_eq!(default_file_prefix(), "robot-teleop.log");
    }
}
