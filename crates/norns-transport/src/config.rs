//! Client configuration for the REPL transport

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// WebSocket client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Address to connect: `host:port`, or a full `ws://` / `wss://` URL
    pub address: String,

    /// Sub-protocol advertised during the handshake (None = none)
    pub subprotocol: Option<String>,

    /// Timeout for blocking operations (None = infinite)
    pub timeout: Option<Duration>,

    /// Grace delay between end-of-response and connection close
    pub linger: Duration,

    /// Maximum inbound message size (None = unlimited)
    pub max_message_size: Option<usize>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:5555".to_string(),
            subprotocol: None,
            timeout: Some(Duration::from_secs(5)),
            linger: Duration::from_millis(250),
            max_message_size: Some(10 * 1024 * 1024), // 10 MB default
        }
    }
}

impl ClientConfig {
    /// Create a new config with the given address
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    /// Set the handshake sub-protocol
    pub fn with_subprotocol(mut self, subprotocol: impl Into<String>) -> Self {
        self.subprotocol = Some(subprotocol.into());
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set no timeout (blocking)
    pub fn with_no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Set linger time
    pub fn with_linger(mut self, linger: Duration) -> Self {
        self.linger = linger;
        self
    }

    /// Set maximum inbound message size
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = Some(size);
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.address.is_empty() {
            return Err("Address cannot be empty".to_string());
        }

        if let Some(max_size) = self.max_message_size {
            if max_size == 0 {
                return Err("Maximum message size must be greater than 0".to_string());
            }
        }

        Ok(())
    }

    /// Resolve the configured address into a `ws://` URL
    pub(crate) fn url(&self) -> String {
        if self.address.starts_with("ws://") || self.address.starts_with("wss://") {
            self.address.clone()
        } else {
            format!("ws://{}", self.address)
        }
    }
}
