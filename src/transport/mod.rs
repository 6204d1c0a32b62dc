//! # Transport Module
//!
//! Collaborator interfaces between the teleop core and the robot, plus the
//! concrete REST and WebSocket implementations.
//!
//! The core never awaits a command's effect on the robot. A
//! [`CommandTransport`] call resolves once the request is delivered (or
//! fails to be), and callers on the frame loop send through
//! [`CommandDispatcher`](crate::teleop::CommandDispatcher), which spawns the
//! call and only logs its outcome. Implementations must not assume ordering
//! between two commands sent from successive frames.

pub mod rest;
pub mod websocket;

use async_trait::async_trait;
use bytes::Bytes;

use crate::command::{Command, DriveCommand, HeadCommand, RestartRequest};
use crate::error::Result;
use crate::stream::StreamParams;

/// Outcome of a stream start negotiation that reached the robot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartResponse {
    /// The robot accepted the stream parameters.
    Ok,
    /// The robot answered with anything other than success.
    Rejected(String),
}

/// Sends movement and maintenance commands.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandTransport: Send + Sync {
    /// Move the head to an absolute orientation.
    async fn move_head(&self, cmd: HeadCommand) -> Result<()>;

    /// Drive the base.
    async fn drive(&self, cmd: DriveCommand) -> Result<()>;

    /// Request a reboot. Delivery is the only thing checked.
    async fn restart(&self, req: RestartRequest) -> Result<()>;
}

/// Routes a mapper command to the matching transport call.
pub async fn send_command(transport: &dyn CommandTransport, command: Command) -> Result<()> {
    match command {
        Command::Head(cmd) => transport.move_head(cmd).await,
        Command::Drive(cmd) => transport.drive(cmd).await,
    }
}

/// Negotiates video streams and opens their frame sockets.
#[async_trait]
pub trait SessionTransport: Send + Sync {
    /// Ask the robot to start streaming with `params`.
    async fn start_session(&self, params: &StreamParams) -> Result<StartResponse>;

    /// Ask the robot to stop streaming. Best-effort.
    async fn stop_session(&self) -> Result<()>;

    /// Open the frame socket on the negotiated port.
    async fn connect(&self, port: u16) -> Result<Box<dyn FrameSocket>>;
}

/// Inbound side of a streaming connection.
#[async_trait]
pub trait FrameSocket: Send {
    /// Next raw frame. `None` once the connection has closed; an error means
    /// the connection failed.
    async fn next_frame(&mut self) -> Option<Result<Bytes>>;

    /// Close the connection from the client side.
    async fn close(&mut self) -> Result<()>;
}


#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_send_command_routes_head() {
        let cmd = HeadCommand { pitch: 5, yaw: -5, velocity: 100 };
        let mut transport = MockCommandTransport::new();
        transport.expect_move_head().with(eq(cmd)).times(1).returning(|_| Ok(()));
        transport.expect_drive().never();

        tokio_test::assert_ok!(send_command(&transport, Command::Head(cmd)).await);
    }

    #[tokio::test]
    async fn test_send_command_routes_drive() {
        let cmd = DriveCommand { linear_velocity: 20, angular_velocity: -3 };
        let mut transport = MockCommandTransport::new();
        transport.expect_drive().with(eq(cmd)).times(1).returning(|_| Ok(()));
        transport.expect_move_head().never();

        tokio_test::assert_ok!(send_command(&transport, Command::Drive(cmd)).await);
    }
}
