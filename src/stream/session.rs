//! Active stream session: frame reception and teardown.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{SessionState, StreamParams};
use crate::transport::{FrameSocket, SessionTransport};

/// One frame received from the robot.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameEvent {
    /// 1-based position of the frame within its session.
    pub sequence: u64,
    pub received_at: DateTime<Utc>,
    /// Encoded image bytes as sent by the robot.
    pub data: Bytes,
}

/// Why a session left the `Active` state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The robot closed the frame socket.
    Remote,
    /// The frame socket failed.
    Error(String),
    /// `close()` was called.
    Client,
    /// The session was dropped while active.
    Dropped,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::Remote => write!(f, "closed by robot"),
            CloseReason::Error(msg) => write!(f, "socket error: {}", msg),
            CloseReason::Client => write!(f, "closed by client"),
            CloseReason::Dropped => write!(f, "session dropped"),
        }
    }
}

/// A negotiated stream with an open frame socket.
///
/// Created in `Active` by [`StreamManager::start`](super::StreamManager::start).
/// Leaving `Active` for any reason spawns exactly one stop notification.
pub struct StreamSession {
    params: StreamParams,
    state: SessionState,
    socket: Box<dyn FrameSocket>,
    transport: Arc<dyn SessionTransport>,
    started_at: DateTime<Utc>,
    frames_received: u64,
    close_reason: Option<CloseReason>,
    stop_task: Option<JoinHandle<()>>,
}

impl fmt::Debug for StreamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSession")
            .field("params", &self.params)
            .field("state", &self.state)
            .field("frames_received", &self.frames_received)
            .finish_non_exhaustive()
    }
}

impl StreamSession {
    pub(crate) fn new(
        params: StreamParams,
        socket: Box<dyn FrameSocket>,
        transport: Arc<dyn SessionTransport>,
    ) -> Self {
        Self {
            params,
            state: SessionState::Active,
            socket,
            transport,
            started_at: Utc::now(),
            frames_received: 0,
            close_reason: None,
            stop_task: None,
        }
    }

    pub fn params(&self) -> &StreamParams {
        &self.params
    }

    /// Current state. A `Closing` session reports `Closed` once its stop
    /// notification has finished.
    pub fn state(&self) -> SessionState {
        match (&self.state, &self.stop_task) {
            (SessionState::Closing, Some(task)) if task.is_finished() => SessionState::Closed,
            (state, _) => *state,
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn frame_count(&self) -> u64 {
        self.frames_received
    }

    pub fn close_reason(&self) -> Option<&CloseReason> {
        self.close_reason.as_ref()
    }

    /// Wait for the next frame.
    ///
    /// Returns `None` when the session is not active. A remote close or a
    /// socket error moves the session to `Closing` and also returns `None`.
    pub async fn next_frame(&mut self) -> Option<FrameEvent> {
        if self.state != SessionState::Active {
            return None;
        }

        match self.socket.next_frame().await {
            Some(Ok(data)) => {
                self.frames_received += 1;
                Some(FrameEvent {
                    sequence: self.frames_received,
                    received_at: Utc::now(),
                    data,
                })
            }
            Some(Err(e)) => {
                warn!("Frame socket error: {}", e);
                self.begin_close(CloseReason::Error(e.to_string()));
                None
            }
            None => {
                self.begin_close(CloseReason::Remote);
                None
            }
        }
    }

    /// Feed frames into `sink` until the session stops being active.
    ///
    /// Returns the number of frames rendered by this call.
    pub async fn pump(&mut self, sink: &mut dyn super::FrameSink) -> u64 {
        let mut rendered = 0;
        while let Some(frame) = self.next_frame().await {
            sink.render(&frame);
            rendered += 1;
        }
        rendered
    }

    /// Close the session from the client side and wait for the stop
    /// notification to finish. No-op on a closed session.
    pub async fn close(&mut self) {
        if self.state == SessionState::Active {
            if let Err(e) = self.socket.close().await {
                debug!("Frame socket close failed: {}", e);
            }
            self.begin_close(CloseReason::Client);
        }
        self.wait_closed().await;
    }

    /// Wait until a `Closing` session reaches `Closed`.
    pub async fn wait_closed(&mut self) {
        if let Some(task) = self.stop_task.take() {
            if let Err(e) = task.await {
                warn!("Stop notification task failed: {}", e);
            }
        }
        if self.state == SessionState::Closing {
            self.state = SessionState::Closed;
        }
    }

    fn begin_close(&mut self, reason: CloseReason) {
        if self.state != SessionState::Active {
            return;
        }

        info!(
            "Video stream on port {} closing after {} frames ({})",
            self.params.port, self.frames_received, reason
        );
        self.state = SessionState::Closing;
        self.close_reason = Some(reason);

        match Handle::try_current() {
            Ok(handle) => {
                self.stop_task = Some(handle.spawn(notify_stop(self.transport.clone())));
            }
            Err(_) => {
                warn!("No async runtime available, skipping stop notification");
                self.state = SessionState::Closed;
            }
        }
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.begin_close(CloseReason::Dropped);
    }
}

async fn notify_stop(transport: Arc<dyn SessionTransport>) {
    match transport.stop_session().await {
        Ok(()) => debug!("Stop notification delivered"),
        Err(e) => warn!("Stop notification failed: {}", e),
    }
}
