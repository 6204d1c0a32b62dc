//! # Robot Teleop Library
//!
//! Drive a networked robot with a gamepad and watch its camera stream.
//!
//! The gamepad's left stick drives the base and the right stick steers the
//! head. Inputs are sampled once per frame, converted to robot commands by the
//! [`controller::mapper`], and sent over the robot's REST API. The camera
//! stream is negotiated over REST and received over a WebSocket.

pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod stream;
pub mod teleop;
pub mod transport;
