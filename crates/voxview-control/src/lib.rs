//! Remote control for voxview - line-delimited JSON over TCP
//!
//! Start the control server in your app:
//! ```ignore
//! let handler = Arc::new(Mutex::new(MyHandler::new()));
//! let server = ControlServer::bind(handler, &format!("127.0.0.1:{}", DEFAULT_PORT)).await?;
//! ```

pub mod protocol;
pub mod server;

pub use protocol::*;
pub use server::{parse_command, ControlHandler, ControlServer, ProtocolError};

/// Default control server port
pub const DEFAULT_PORT: u16 = 9742;
