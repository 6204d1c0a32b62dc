//! # Teleop Loop
//!
//! Per-frame glue between the gamepad, the input mapper, and the robot.
//!
//! Each tick polls the input source once, feeds the sample to the mapper, and
//! hands any emitted commands to the dispatcher. Dispatch never blocks the
//! tick: every send runs on its own task and only its failure is logged.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::command::Command;
use crate::controller::gamepad::InputSource;
use crate::controller::mapper::InputMapper;
use crate::transport::{send_command, CommandTransport};

/// Fire-and-forget command sender.
#[derive(Clone)]
pub struct CommandDispatcher {
    transport: Arc<dyn CommandTransport>,
}

impl CommandDispatcher {
    pub fn new(transport: Arc<dyn CommandTransport>) -> Self {
        Self { transport }
    }

    /// Spawn delivery of `command`. Must be called from within a tokio runtime.
    pub fn dispatch(&self, command: Command) {
        let transport = self.transport.clone();
        debug!("Dispatching {}", command);
        tokio::spawn(async move {
            if let Err(e) = send_command(transport.as_ref(), command).await {
                warn!("Failed to send {}: {}", command, e);
            }
        });
    }
}

/// Frame-rate driven teleop pipeline.
pub struct TeleopLoop<S: InputSource> {
    source: S,
    mapper: InputMapper,
    dispatcher: CommandDispatcher,
    ticks: u64,
    commands_sent: u64,
}

impl<S: InputSource> TeleopLoop<S> {
    pub fn new(source: S, mapper: InputMapper, dispatcher: CommandDispatcher) -> Self {
        Self {
            source,
            mapper,
            dispatcher,
            ticks: 0,
            commands_sent: 0,
        }
    }

    /// Run one frame. Returns the commands that were dispatched.
    pub fn tick(&mut self) -> Vec<Command> {
        self.ticks += 1;
        let sample = self.source.poll();
        let commands: Vec<Command> = self.mapper.update(sample.as_ref()).into_commands().collect();

        for command in &commands {
            self.dispatcher.dispatch(*command);
        }
        self.commands_sent += commands.len() as u64;
        commands
    }

    pub fn mapper(&self) -> &InputMapper {
        &self.mapper
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn commands_sent(&self) -> u64 {
        self.commands_sent
    }
}
