//! WebSocket frame socket for the robot's video stream.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use super::FrameSocket;
use crate::error::{Result, TeleopError};

/// Receives stream frames over a WebSocket.
///
/// Binary messages are frames. Text messages are forwarded as their UTF-8
/// bytes. Control messages are skipped.
pub struct WebSocketFrameSocket {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    url: String,
}

impl std::fmt::Debug for WebSocketFrameSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketFrameSocket")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl WebSocketFrameSocket {
    /// Connect to `url` (e.g. `ws://192.168.1.100:5678`).
    ///
    /// # Errors
    ///
    /// Returns `Socket` if the handshake fails.
    pub async fn connect(url: &str) -> Result<Self> {
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| TeleopError::Socket(format!("Failed to connect to {}: {}", url, e)))?;

        info!("Frame socket connected to {}", url);
        Ok(Self {
            stream,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FrameSocket for WebSocketFrameSocket {
    async fn next_frame(&mut self) -> Option<Result<Bytes>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Binary(data)) => return Some(Ok(Bytes::from(data))),
                Ok(Message::Text(text)) => return Some(Ok(Bytes::from(text.into_bytes()))),
                Ok(Message::Close(frame)) => {
                    debug!("Frame socket {} closed by remote: {:?}", self.url, frame);
                    return None;
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => continue,
                Err(e) => {
                    return Some(Err(TeleopError::Socket(format!(
                        "Read from {} failed: {}",
                        self.url, e
                    ))))
                }
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.stream
            .close(None)
            .await
            .map_err(|e| TeleopError::Socket(format!("Failed to close {}: {}", self.url, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_refused() {
        let result = WebSocketFrameSocket::connect("ws://127.0.0.1:9").await;
        match result {
            Err(TeleopError::Socket(msg)) => assert!(msg.contains("ws://127.0.0.1:9")),
            other => panic!("Expected Socket error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_receives_binary_frames_until_close() {
        use futures_util::SinkExt;
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            ws.send(Message::Binary(vec![1, 2, 3])).await.unwrap();
            ws.send(Message::Ping(vec![])).await.unwrap();
            ws.send(Message::Text("hi".to_string())).await.unwrap();
            ws.close(None).await.unwrap();
        });

        let mut socket = WebSocketFrameSocket::connect(&format!("ws://{}", addr))
            .await
            .unwrap();

        assert_eq!(socket.next_frame().await.unwrap().unwrap(), Bytes::from_static(&[1, 2, 3]));
        assert_eq!(socket.next_frame().await.unwrap().unwrap(), Bytes::from_static(b"hi"));
        assert!(socket.next_frame().await.is_none());

        server.await.unwrap();
    }
}
