//! # norns-transport
//!
//! Client-side WebSocket transport for the norns matron REPL.
//!
//! matron exposes its live-coding REPL as a WebSocket endpoint (port 5555 on
//! the device) that speaks newline-terminated text lines and requires the
//! `bus.sp.nanomsg.org` sub-protocol during the handshake. This crate
//! provides the connection half of that exchange: a client that connects
//! with the sub-protocol advertised, sends text lines, and delivers every
//! inbound frame through an event channel in arrival order.
//!
//! ## Example
//!
//! ```no_run
//! use norns_transport::{ClientConfig, ReplEvent, WsRepl, REPL_SUBPROTOCOL};
//!
//! # async fn run() -> norns_transport::TransportResult<()> {
//! let config = ClientConfig::new("norns.local:5555").with_subprotocol(REPL_SUBPROTOCOL);
//! let mut client = WsRepl::connect(&config).await?;
//!
//! client.send_line("print(1+1)").await?;
//!
//! while let Some(event) = client.next_event().await {
//!     match event {
//!         ReplEvent::Text(line) => println!("{}", line),
//!         ReplEvent::Closed => break,
//!         ReplEvent::Error(e) => return Err(e),
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The crate is organized into layers:
//!
//! 1. **Config**: connection settings with builder methods
//! 2. **Errors**: transport-agnostic error taxonomy
//! 3. **WebSocket**: the protocol-specific client
//!
//! The client owns the write half of the stream; a reader task pumps the
//! read half into an unbounded channel, so callers consume events instead of
//! installing callbacks.

pub mod config;
pub mod error;
pub mod websocket;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{TransportError, TransportResult};
pub use websocket::{ReplEvent, WsRepl, REPL_SUBPROTOCOL};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::*;
    pub use crate::error::*;
    pub use crate::websocket::*;
}
