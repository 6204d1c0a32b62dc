//! Frame consumers.

use tracing::{debug, info};

use super::FrameEvent;

/// Frames between throughput log lines.
pub const LOG_INTERVAL_FRAMES: u64 = 100;

/// Receives frames from an active session.
///
/// Decoding and display belong to the implementor.
pub trait FrameSink: Send {
    fn render(&mut self, frame: &FrameEvent);
}

/// Sink that only logs throughput.
#[derive(Debug, Default)]
pub struct LoggingFrameSink {
    frames: u64,
    bytes: u64,
}

impl LoggingFrameSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

impl FrameSink for LoggingFrameSink {
    fn render(&mut self, frame: &FrameEvent) {
        self.frames += 1;
        self.bytes += frame.data.len() as u64;
        debug!("Frame #{} ({} bytes)", frame.sequence, frame.data.len());

        if self.frames % LOG_INTERVAL_FRAMES == 0 {
            info!(
                "Received {} frames ({} KiB total)",
                self.frames,
                self.bytes / 1024
            );
        }
    }
}
