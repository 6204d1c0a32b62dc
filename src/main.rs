//! # Robot Teleop
//!
//! Drive a networked robot with a gamepad and watch its camera stream.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use robot_teleop::config::{Config, LoggingConfig};
use robot_teleop::controller::events::AxisState;
use robot_teleop::controller::gamepad::{Gamepad, GamepadHandle, GamepadSnapshot};
use robot_teleop::controller::mapper::InputMapper;
use robot_teleop::stream::{LoggingFrameSink, StreamManager, StreamSession};
use robot_teleop::teleop::{CommandDispatcher, TeleopLoop};
use robot_teleop::transport::rest::RestTransport;

/// Config file used when no path is given on the command line.
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Flag that sends a single restart request and exits.
const RESTART_FLAG: &str = "--restart";

/// Frames between status log messages.
const LOG_INTERVAL_FRAMES: u64 = 600;

/// Main entry point
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first non-flag argument, or `config/default.toml`)
///    - Set up logging to stdout and, if configured, a daily log file
///    - Open the gamepad; run without one if none is found
///    - Negotiate the video stream if enabled
///
/// 2. **Main Loop**
///    - Tick the teleop loop at the configured frame rate
///    - Render frames on a separate task
///    - Handle Ctrl+C for graceful shutdown
///
/// 3. **Graceful Shutdown**
///    - Close the stream session (one stop notification)
///    - Log totals
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/default.toml
/// cargo run --release -- --restart
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let restart_only = args.iter().any(|a| a == RESTART_FLAG);
    let config_path = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_PATH);

    let config = Config::load(config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;
    let _log_guard = init_logging(&config.logging)?;

    info!("Robot Teleop v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Robot at {}", config.robot.host);

    let transport = Arc::new(RestTransport::new(
        &config.robot.host,
        Duration::from_millis(config.robot.request_timeout_ms),
    )?);
    let manager = StreamManager::new(transport.clone(), transport.clone());

    if restart_only {
        manager.restart().await.context("Restart request failed")?;
        info!("Restart requested");
        return Ok(());
    }

    let input = open_gamepad(&config);
    let mut teleop = TeleopLoop::new(
        input,
        InputMapper::with_settings(config.mapper_settings()),
        CommandDispatcher::new(transport.clone()),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let stream_task = if config.stream.enabled {
        match manager.start(config.stream_params()).await {
            Ok(session) => Some(tokio::spawn(run_stream(session, shutdown_rx))),
            Err(e) => {
                warn!("Video stream unavailable: {}", e);
                None
            }
        }
    } else {
        info!("Video stream disabled");
        None
    };

    let period = frame_period(config.mapper.frame_rate_hz);
    let mut frame_interval = interval(period);
    frame_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Starting teleop loop at {}Hz", config.mapper.frame_rate_hz);
    info!("Press Ctrl+C to exit");

    let mut last_log_tick: u64 = 0;

    loop {
        tokio::select! {
            _ = frame_interval.tick() => {
                teleop.tick();

                if teleop.ticks() - last_log_tick >= LOG_INTERVAL_FRAMES {
                    let orientation = teleop.mapper().orientation();
                    info!(
                        "{} frames, {} commands sent, head at ({:.1}, {:.1})",
                        teleop.ticks(),
                        teleop.commands_sent(),
                        orientation.x(),
                        orientation.y()
                    );
                    last_log_tick = teleop.ticks();
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    let _ = shutdown_tx.send(true);
    if let Some(task) = stream_task {
        if let Err(e) = task.await {
            warn!("Stream task failed: {}", e);
        }
    }

    info!(
        "Total frames: {}, commands sent: {}",
        teleop.ticks(),
        teleop.commands_sent()
    );
    Ok(())
}

/// Install the tracing subscriber. The returned guard flushes the file
/// writer on drop.
fn init_logging(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let stdout_layer = tracing_subscriber::fmt::layer();

    if logging.log_dir.is_empty() {
        tracing_subscriber::registry()
            .with(filter)
            .with(stdout_layer)
            .try_init()?;
        return Ok(None);
    }

    let appender = tracing_appender::rolling::daily(&logging.log_dir, &logging.file_prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer))
        .try_init()?;
    Ok(Some(guard))
}

/// Open the configured gamepad, or fall back to a permanently disconnected
/// source so the loop keeps running without emitting commands.
fn open_gamepad(config: &Config) -> GamepadHandle {
    let (min, max) = (config.controller.axis_min, config.controller.axis_max);

    let opened = Gamepad::open(&config.controller.device_path)
        .and_then(|gamepad| {
            info!(
                "Gamepad {} at {}",
                gamepad.name().unwrap_or("(unnamed)"),
                gamepad.device_path()
            );
            gamepad.spawn_reader(min, max)
        });

    match opened {
        Ok(handle) => handle,
        Err(e) => {
            warn!("No gamepad available ({}), robot will not be commanded", e);
            let (_tx, rx) = watch::channel(GamepadSnapshot {
                axes: AxisState::centered(min, max),
                connected: false,
            });
            GamepadHandle::from_receiver(rx, min, max)
        }
    }
}

async fn run_stream(mut session: StreamSession, mut shutdown: watch::Receiver<bool>) {
    let mut sink = LoggingFrameSink::new();

    tokio::select! {
        rendered = session.pump(&mut sink) => {
            info!("Video stream ended after {} frames", rendered);
        }
        _ = shutdown.changed() => {}
    }

    session.close().await;
}

fn frame_period(frame_rate_hz: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(frame_rate_hz.max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_period_at_60hz() {
        let period = frame_period(60);
        assert_eq!(period.as_micros(), 16_666);
    }

    #[test]
    fn test_frame_period_guards_zero() {
        assert_eq!(frame_period(0), Duration::from_secs(1));
    }

    #[test]
    fn test_log_interval_constant() {
        // At 60Hz, 600 frames = 10 seconds
        let seconds = LOG_INTERVAL_FRAMES as f64 / 60.0;
        assert_eq!(seconds, 10.0);
    }

    #[test]
    fn test_default_config_path() {
        assert_eq!(DEFAULT_CONFIG_PATH, "config/default.toml");
    }
}
