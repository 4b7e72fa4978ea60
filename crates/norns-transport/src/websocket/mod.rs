//! WebSocket transport implementation (client side)

pub mod client;

pub use client::{ReplEvent, WsRepl};

/// Sub-protocol token matron's WebSocket framing requires
pub const REPL_SUBPROTOCOL: &str = "bus.sp.nanomsg.org";
