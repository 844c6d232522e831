//! TCP control server

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::protocol::{ControlCommand, ControlResponse};

/// Implemented by the application to answer control commands
pub trait ControlHandler: Send + Sync + 'static {
    fn handle_command(&mut self, cmd: ControlCommand) -> ControlResponse;
}

/// Errors decoding one request line
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Empty command")]
    Empty,
    #[error("Invalid command JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Decode one request line
pub fn parse_command(line: &str) -> Result<ControlCommand, ProtocolError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(ProtocolError::Empty);
    }
    Ok(serde_json::from_str(trimmed)?)
}

/// Control server handle; dropping it stops accepting connections
pub struct ControlServer {
    handle: tokio::task::JoinHandle<()>,
    local_addr: SocketAddr,
}

impl ControlServer {
    /// Bind `addr` inside the current tokio runtime, then serve in a task
    ///
    /// Bind errors are returned; the bound address is known on return.
    pub async fn bind(handler: Arc<Mutex<dyn ControlHandler>>, addr: &str) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        log::info!("Control server listening on {}", local_addr);
        let handle = tokio::spawn(accept_loop(listener, handler));
        Ok(Self { handle, local_addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections
    pub fn stop(&self) {
        if !self.handle.is_finished() {
            self.handle.abort();
            log::info!("Control server stopped");
        }
    }
}

impl Drop for ControlServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn accept_loop(listener: TcpListener, handler: Arc<Mutex<dyn ControlHandler>>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                log::info!("Control client connected from {}", peer);
                let handler = handler.clone();
                tokio::spawn(async move {
                    handle_connection(stream, handler).await;
                    log::info!("Control client disconnected: {}", peer);
                });
            }
            Err(e) => {
                log::error!("Control server accept error: {}", e);
            }
        }
    }
}

async fn handle_connection(
    stream: tokio::net::TcpStream,
    handler: Arc<Mutex<dyn ControlHandler>>,
) {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break, // Connection closed
            Ok(_) => {
                let response = match parse_command(&line) {
                    Ok(cmd) => {
                        log::debug!("Control command: {:?}", cmd);
                        let mut h = handler.lock().await;
                        h.handle_command(cmd)
                    }
                    Err(ProtocolError::Empty) => continue,
                    Err(e) => ControlResponse::error(e.to_string()),
                };

                let mut resp_json =
                    serde_json::to_string(&response).unwrap_or_else(|e| {
                        format!(
                            "{{\"status\":\"error\",\"message\":\"Serialize error: {}\"}}",
                            e
                        )
                    });
                resp_json.push('\n');

                if let Err(e) = writer.write_all(resp_json.as_bytes()).await {
                    log::error!("Control server write error: {}", e);
                    break;
                }
                if let Err(e) = writer.flush().await {
                    log::error!("Control server flush error: {}", e);
                    break;
                }
            }
            Err(e) => {
                log::error!("Control server read error: {}", e);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ResponseData;
    use tokio::net::TcpStream;

    struct Recorder {
        seen: Vec<ControlCommand>,
    }

    impl ControlHandler for Recorder {
        fn handle_command(&mut self, cmd: ControlCommand) -> ControlResponse {
            self.seen.push(cmd.clone());
            match cmd {
                ControlCommand::Ping => ControlResponse::pong(),
                ControlCommand::SetShading { .. } => ControlResponse::queued("shading"),
                _ => ControlResponse::error("unsupported"),
            }
        }
    }

    #[test]
    fn test_parse_command() {
        assert!(matches!(parse_command("  \n"), Err(ProtocolError::Empty)));
        assert!(matches!(parse_command("{not json"), Err(ProtocolError::InvalidJson(_))));
        assert_eq!(parse_command("{\"cmd\":\"ClearRegion\"}\n").unwrap(), ControlCommand::ClearRegion);
    }

    #[tokio::test]
    async fn test_line_round_trip() {
        let recorder = Arc::new(Mutex::new(Recorder { seen: Vec::new() }));
        let server = ControlServer::bind(recorder.clone(), "127.0.0.1:0").await.unwrap();
        let addr = server.local_addr();

        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        writer.write_all(b"{\"cmd\":\"Ping\"}\n\n{\"cmd\":\"SetShading\",\"params\":{\"enabled\":true}}\ngarbage\n").await.unwrap();

        let first: ControlResponse = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(first, ControlResponse::pong());

        let second: ControlResponse = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(second, ControlResponse::ok(ResponseData::Queued { description: "shading".into() }));

        let third: ControlResponse = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert!(!third.is_ok());

        assert_eq!(recorder.lock().await.seen.len(), 2);
        server.stop();
    }
}
