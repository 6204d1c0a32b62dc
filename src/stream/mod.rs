//! # Stream Module
//!
//! Video stream negotiation and session lifecycle.
//!
//! ## Session States
//!
//! ```text
//! Idle -> Starting -> Active -> Closing -> Closed
//!             |                               ^
//!             +-------------------------------+  (negotiation failed)
//! ```
//!
//! Entering `Closing` dispatches exactly one stop notification to the robot.
//! The session reaches `Closed` once that notification has finished, whether
//! it succeeded or not.

pub mod session;
pub mod sink;

pub use session::{CloseReason, FrameEvent, StreamSession};
pub use sink::{FrameSink, LoggingFrameSink};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::command::RestartRequest;
use crate::error::{Result, TeleopError};
use crate::transport::{CommandTransport, SessionTransport, StartResponse};

/// Default frame socket port.
pub const DEFAULT_STREAM_PORT: u16 = 5678;

/// Default image rotation in degrees.
pub const DEFAULT_ROTATION: u16 = 90;

/// Stream negotiation parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamParams {
    /// Port the robot serves frames on.
    pub port: u16,
    /// Image rotation in degrees.
    pub rotation: u16,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Encoder quality (1-100).
    pub quality: u8,
}

impl Default for StreamParams {
    fn default() -> Self {
        Self {
            port: DEFAULT_STREAM_PORT,
            rotation: DEFAULT_ROTATION,
            width: 400,
            height: 540,
            quality: 100,
        }
    }
}

/// Lifecycle state of a stream session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Starting,
    Active,
    Closing,
    Closed,
}

impl SessionState {
    /// Whether moving from `self` to `next` is a legal transition.
    #[must_use]
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Idle, Starting)
                | (Starting, Active)
                | (Starting, Closed)
                | (Active, Closing)
                | (Closing, Closed)
        )
    }
}

/// Resets the in-flight flag even if the start future is dropped.
struct StartGuard<'a>(&'a AtomicBool);

impl Drop for StartGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Starts stream sessions and issues robot restarts.
pub struct StreamManager {
    sessions: Arc<dyn SessionTransport>,
    commands: Arc<dyn CommandTransport>,
    starting: AtomicBool,
}

impl StreamManager {
    #[must_use]
    pub fn new(sessions: Arc<dyn SessionTransport>, commands: Arc<dyn CommandTransport>) -> Self {
        Self {
            sessions,
            commands,
            starting: AtomicBool::new(false),
        }
    }

    /// True while a `start` call is awaiting the robot.
    #[must_use]
    pub fn is_starting(&self) -> bool {
        self.starting.load(Ordering::Acquire)
    }

    /// Negotiate a stream and connect to its frame socket.
    ///
    /// The start request is not retried and has no timeout of its own; the
    /// transport's request timeout applies.
    ///
    /// # Errors
    ///
    /// - `StartInProgress`: another `start` on this manager has not finished
    /// - `StreamStart`: the robot rejected the request, could not be reached,
    ///   or the frame socket could not be opened
    pub async fn start(&self, params: StreamParams) -> Result<StreamSession> {
        if self.starting.swap(true, Ordering::AcqRel) {
            return Err(TeleopError::StartInProgress);
        }
        let _guard = StartGuard(&self.starting);

        let mut state = SessionState::Idle;
        advance(&mut state, SessionState::Starting);
        info!(
            "Starting video stream on port {} ({}x{}, rotation {}, quality {})",
            params.port, params.width, params.height, params.rotation, params.quality
        );

        let response = match self.sessions.start_session(&params).await {
            Ok(response) => response,
            Err(e) => {
                advance(&mut state, SessionState::Closed);
                return Err(TeleopError::StreamStart(e.to_string()));
            }
        };

        if let StartResponse::Rejected(reason) = response {
            advance(&mut state, SessionState::Closed);
            return Err(TeleopError::StreamStart(reason));
        }

        let socket = match self.sessions.connect(params.port).await {
            Ok(socket) => socket,
            Err(e) => {
                // The robot is already streaming; ask it to stop
                if let Err(stop_err) = self.sessions.stop_session().await {
                    warn!("Stop notification failed: {}", stop_err);
                }
                advance(&mut state, SessionState::Closed);
                return Err(TeleopError::StreamStart(e.to_string()));
            }
        };

        advance(&mut state, SessionState::Active);
        info!("Video stream active on port {}", params.port);
        Ok(StreamSession::new(params, socket, self.sessions.clone()))
    }

    /// Ask the robot to restart its non-core services, keeping sensors up.
    ///
    /// One request, no retry. Only delivery is checked.
    pub async fn restart(&self) -> Result<()> {
        info!("Requesting robot restart");
        self.commands.restart(RestartRequest::default()).await
    }
}

fn advance(state: &mut SessionState, next: SessionState) {
    debug_assert!(state.can_transition_to(next), "{:?} -> {:?}", state, next);
    tracing::debug!("Stream session {:?} -> {:?}", state, next);
    *state = next;
}
