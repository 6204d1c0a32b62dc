//! # REST Transport
//!
//! Talks to the robot's HTTP API.
//!
//! | Request | Endpoint | Body |
//! |---------|----------|------|
//! | Head move | `POST /api/head` | `{Pitch, Roll, Yaw, Velocity}` |
//! | Drive | `POST /api/drive` | `{LinearVelocity, AngularVelocity}` |
//! | Stream start | `POST /api/videostreaming/start` | `{Port, Rotation, Width, Height, Quality}` |
//! | Stream stop | `POST /api/videostreaming/stop` | `{}` |
//! | Reboot | `POST /api/reboot` | `{Core, SensoryServices}` |
//!
//! Any 2xx status counts as success. Frame sockets are WebSockets on the
//! negotiated port of the same host.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use super::websocket::WebSocketFrameSocket;
use super::{CommandTransport, FrameSocket, SessionTransport, StartResponse};
use crate::command::{DriveCommand, HeadCommand, RestartRequest};
use crate::error::{Result, TeleopError};
use crate::stream::StreamParams;

const HEAD_PATH: &str = "head";
const DRIVE_PATH: &str = "drive";
const STREAM_START_PATH: &str = "videostreaming/start";
const STREAM_STOP_PATH: &str = "videostreaming/stop";
const REBOOT_PATH: &str = "reboot";

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
struct HeadBody {
    pitch: i32,
    roll: i32,
    yaw: i32,
    velocity: i32,
}

impl From<HeadCommand> for HeadBody {
    fn from(cmd: HeadCommand) -> Self {
        Self {
            pitch: cmd.pitch,
            roll: 0,
            yaw: cmd.yaw,
            velocity: cmd.velocity,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
struct DriveBody {
    linear_velocity: i32,
    angular_velocity: i32,
}

impl From<DriveCommand> for DriveBody {
    fn from(cmd: DriveCommand) -> Self {
        Self {
            linear_velocity: cmd.linear_velocity,
            angular_velocity: cmd.angular_velocity,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
struct StreamStartBody {
    port: u16,
    rotation: u16,
    width: u32,
    height: u32,
    quality: u8,
}

impl From<&StreamParams> for StreamStartBody {
    fn from(params: &StreamParams) -> Self {
        Self {
            port: params.port,
            rotation: params.rotation,
            width: params.width,
            height: params.height,
            quality: params.quality,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
struct RebootBody {
    core: bool,
    sensory_services: bool,
}

impl From<RestartRequest> for RebootBody {
    fn from(req: RestartRequest) -> Self {
        Self {
            core: req.reboot_core,
            sensory_services: req.keep_sensory_services,
        }
    }
}

#[derive(Debug, Serialize)]
struct EmptyBody {}

/// HTTP client for one robot
#[derive(Debug, Clone)]
pub struct RestTransport {
    client: reqwest::Client,
    host: String,
    /// Host without port, IPv6 literals keep their brackets.
    hostname: String,
}

impl RestTransport {
    /// Create a transport for the robot at `host` (name or IP, optionally with `:port`).
    ///
    /// # Errors
    ///
    /// Returns `Transport` if `host` is not a valid URL authority or the HTTP
    /// client cannot be built.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use robot_teleop::transport::rest::RestTransport;
    /// use std::time::Duration;
    ///
    /// let transport = RestTransport::new("192.168.1.100", Duration::from_secs(2))?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(host: &str, timeout: Duration) -> Result<Self> {
        let hostname = Url::parse(&format!("http://{}", host))
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .ok_or_else(|| TeleopError::Transport(format!("Invalid robot host: {}", host)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TeleopError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        info!("REST transport targeting http://{}", host);
        Ok(Self {
            client,
            host: host.to_string(),
            hostname,
        })
    }

    /// Robot host as configured.
    pub fn host(&self) -> &str {
        &self.host
    }

    fn endpoint(&self, path: &str) -> String {
        format!("http://{}/api/{}", self.host, path)
    }

    /// WebSocket URL of the frame stream on `port`.
    ///
    /// Any port already present in the configured host is replaced.
    pub fn stream_url(&self, port: u16) -> String {
        format!("ws://{}:{}", self.hostname, port)
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<StatusCode> {
        let url = self.endpoint(path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| TeleopError::Transport(format!("POST {} failed: {}", url, e)))?;

        let status = response.status();
        debug!("POST {} -> {}", url, status);
        Ok(status)
    }

    async fn post_expect_success<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let status = self.post(path, body).await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(TeleopError::Transport(format!(
                "{} returned HTTP {}",
                self.endpoint(path),
                status
            )))
        }
    }
}

#[async_trait]
impl CommandTransport for RestTransport {
    async fn move_head(&self, cmd: HeadCommand) -> Result<()> {
        self.post_expect_success(HEAD_PATH, &HeadBody::from(cmd)).await
    }

    async fn drive(&self, cmd: DriveCommand) -> Result<()> {
        self.post_expect_success(DRIVE_PATH, &DriveBody::from(cmd)).await
    }

    async fn restart(&self, req: RestartRequest) -> Result<()> {
        // Delivery only: the robot may drop the connection while restarting
        self.post(REBOOT_PATH, &RebootBody::from(req)).await.map(|_| ())
    }
}

#[async_trait]
impl SessionTransport for RestTransport {
    async fn start_session(&self, params: &StreamParams) -> Result<StartResponse> {
        let status = self
            .post(STREAM_START_PATH, &StreamStartBody::from(params))
            .await?;

        if status.is_success() {
            Ok(StartResponse::Ok)
        } else {
            Ok(StartResponse::Rejected(format!("HTTP {}", status)))
        }
    }

    async fn stop_session(&self) -> Result<()> {
        self.post_expect_success(STREAM_STOP_PATH, &EmptyBody {}).await
    }

    async fn connect(&self, port: u16) -> Result<Box<dyn FrameSocket>> {
        let socket = WebSocketFrameSocket::connect(&self.stream_url(port)).await?;
        Ok(Box::new(socket))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transport(host: &str) -> RestTransport {
        RestTransport::new(host, Duration::from_millis(200)).unwrap()
    }

    #[test]
    fn test_endpoint() {
        let t = transport("10.0.0.7");
        assert_eq!(t.endpoint(HEAD_PATH), "http://10.0.0.7/api/head");
        assert_eq!(
            t.endpoint(STREAM_START_PATH),
            "http://10.0.0.7/api/videostreaming/start"
        );
    }

    #[test]
    fn test_stream_url() {
        assert_eq!(transport("10.0.0.7").stream_url(5678), "ws://10.0.0.7:5678");
        assert_eq!(transport("robot.local:8080").stream_url(5678), "ws://robot.local:5678");
    }

    #[test]
    fn test_stream_url_ipv6() {
        assert_eq!(transport("[::1]:8080").stream_url(5678), "ws://[::1]:5678");
        assert_eq!(transport("[fe80::2]").stream_url(5678), "ws://[fe80::2]:5678");
    }

    #[test]
    fn test_invalid_host_rejected() {
        let result = RestTransport::new("bad host/", Duration::from_millis(200));
        assert!(matches!(result, Err(TeleopError::Transport(_))));
    }

    #[test]
    fn test_head_body() {
        let body = HeadBody::from(HeadCommand { pitch: 12, yaw: -40, velocity: 100 });
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"Pitch": 12, "Roll": 0, "Yaw": -40, "Velocity": 100})
        );
    }

    #[test]
    fn test_drive_body() {
        let body = DriveBody::from(DriveCommand { linear_velocity: -100, angular_velocity: 25 });
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"LinearVelocity": -100, "AngularVelocity": 25})
        );
    }

    #[test]
    fn test_stream_start_body() {
        let params = StreamParams {
            port: 5678,
            rotation: 90,
            width: 400,
            height: 540,
            quality: 100,
        };
        assert_eq!(
            serde_json::to_value(StreamStartBody::from(&params)).unwrap(),
            json!({"Port": 5678, "Rotation": 90, "Width": 400, "Height": 540, "Quality": 100})
        );
    }

    #[test]
    fn test_reboot_body() {
        let body = RebootBody::from(RestartRequest::default());
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"Core": false, "SensoryServices": true})
        );
    }

    #[tokio::test]
    async fn test_unreachable_robot_is_transport_error() {
        // Port 9 (discard) on localhost is closed in test environments
        let t = transport("127.0.0.1:9");
        let result = t.drive(DriveCommand { linear_velocity: 0, angular_velocity: 0 }).await;
        match result {
            Err(TeleopError::Transport(msg)) => assert!(msg.contains("/api/drive")),
            other => panic!("Expected Transport error, got: {:?}", other),
        }
    }

    // Integration test - only runs with a robot on the network
    #[tokio::test]
    #[ignore]
    async fn test_start_stream_with_real_robot() {
        let host = std::env::var("ROBOT_HOST").unwrap_or_else(|_| "192.168.1.100".to_string());
        let t = RestTransport::new(&host, Duration::from_secs(2)).unwrap();
        let response = t.start_session(&StreamParams::default()).await.unwrap();
        assert_eq!(response, StartResponse::Ok);
        t.stop_session().await.unwrap();
    }
}
