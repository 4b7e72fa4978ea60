//! Runner configuration
//!
//! Connection settings for the one-shot exchange, sourced from the
//! environment with fixed defaults.

use norns_transport::{ClientConfig, TransportError, TransportResult, REPL_SUBPROTOCOL};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default device hostname
pub const DEFAULT_HOST: &str = "norns.local";

/// Default matron REPL port
pub const DEFAULT_PORT: u16 = 5555;

/// Command sent when none is given on the command line
pub const DEFAULT_COMMAND: &str = r#"print("Hello from Makefile!")"#;

/// Environment variable overriding the device hostname
pub const HOST_ENV: &str = "NORNS_HOST";

/// Environment variable overriding the REPL port
pub const PORT_ENV: &str = "NORNS_PORT";

/// Settings for a single command exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Device hostname or address
    pub host: String,

    /// matron REPL port
    pub port: u16,

    /// Overall deadline for the exchange, armed when the run starts
    pub command_timeout: Duration,

    /// Grace delay between completion-marker detection and close
    pub linger: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            command_timeout: Duration::from_secs(5),
            linger: Duration::from_millis(250),
        }
    }
}

impl RunnerConfig {
    /// Read host and port from the environment, falling back to defaults
    pub fn from_env() -> TransportResult<Self> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var(HOST_ENV) {
            if !host.is_empty() {
                config.host = host;
            }
        }

        if let Ok(port) = std::env::var(PORT_ENV) {
            config.port = port.parse().map_err(|_| {
                TransportError::InvalidConfig(format!(
                    "{} must be a port number, got '{}'",
                    PORT_ENV, port
                ))
            })?;
        }

        Ok(config)
    }

    /// Set the device host
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the REPL port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the overall deadline
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Set the post-completion grace delay
    pub fn with_linger(mut self, linger: Duration) -> Self {
        self.linger = linger;
        self
    }

    /// Transport configuration for the REPL connection
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(format!("{}:{}", self.host, self.port))
            .with_subprotocol(REPL_SUBPROTOCOL)
            .with_timeout(self.command_timeout)
            .with_linger(self.linger)
    }
}
