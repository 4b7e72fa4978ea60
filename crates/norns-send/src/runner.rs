// Copyright 2025 norns-tools developers
// SPDX-License-Identifier: Apache-2.0

//! One-shot command execution against the matron REPL
//!
//! The exchange is a small state machine (Connecting, AwaitingResponse,
//! Done) driven by transport events from a channel. All mutable state lives
//! in one `run` invocation, so nothing stops a future version from holding
//! several runners at once.

use crate::config::RunnerConfig;
use norns_transport::{ReplEvent, TransportResult, WsRepl};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Literal marker matron emits when a command's output is complete
pub const SENTINEL: &str = "<ok>";

/// Banner printed above the response block
pub const OUTPUT_HEADER: &str = "--- Full Output ---";

/// Banner printed below the response block
pub const OUTPUT_FOOTER: &str = "-------------------";

/// Result of one command exchange
#[derive(Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Completion marker observed; `lines` holds every received message,
    /// trimmed, in arrival order (the marker line included)
    Completed { lines: Vec<String> },

    /// Peer closed the connection before the completion marker arrived
    ClosedWithoutResponse,

    /// No completion marker within the configured window
    TimedOut,
}

/// Where the exchange currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Connecting,
    AwaitingResponse,
    Done,
}

/// Executes a single command against the REPL
pub struct CommandRunner {
    config: RunnerConfig,
}

impl CommandRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Run one command to completion: connect, transmit once, collect lines
    /// until the completion marker or the deadline, then close.
    pub async fn run(&self, command: &str) -> TransportResult<RunOutcome> {
        let deadline = Instant::now() + self.config.command_timeout;
        let mut state = RunState::Connecting;
        debug!("run state: {:?}", state);

        let client_config = self.config.client_config();
        let connect = WsRepl::connect(&client_config);
        let mut client = match tokio::time::timeout_at(deadline, connect).await {
            Ok(Ok(client)) => client,
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                warn!(
                    "gave up connecting after {:?}",
                    self.config.command_timeout
                );
                return Ok(RunOutcome::TimedOut);
            }
        };

        info!("sending command: {}", command);
        client.send_line(command).await?;
        state = RunState::AwaitingResponse;
        debug!("run state: {:?}", state);

        let mut lines: Vec<String> = Vec::new();
        // Re-aimed at now + linger once the marker lands, which also makes
        // the original deadline a no-op after completion
        let mut wake_at = deadline;

        loop {
            tokio::select! {
                event = client.next_event() => match event {
                    Some(ReplEvent::Text(text)) => {
                        lines.push(text.trim().to_string());
                        if state == RunState::AwaitingResponse && text.contains(SENTINEL) {
                            state = RunState::Done;
                            wake_at = Instant::now() + self.config.linger;
                            debug!("run state: {:?}, closing in {:?}", state, self.config.linger);
                        }
                    }
                    Some(ReplEvent::Closed) | None => {
                        return Ok(match state {
                            RunState::Done => RunOutcome::Completed { lines },
                            _ => RunOutcome::ClosedWithoutResponse,
                        });
                    }
                    Some(ReplEvent::Error(e)) => return Err(e),
                },
                _ = tokio::time::sleep_until(wake_at) => {
                    let _ = client.close().await;
                    return Ok(match state {
                        RunState::Done => RunOutcome::Completed { lines },
                        _ => {
                            warn!("no completion marker within {:?}", self.config.command_timeout);
                            RunOutcome::TimedOut
                        }
                    });
                }
            }
        }
    }
}

/// Render the response block: buffered lines wrapped in banners, with empty
/// lines and exact marker lines removed
pub fn render_output(lines: &[String]) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(OUTPUT_HEADER);
    out.push('\n');

    for line in lines {
        if line.is_empty() || line.as_str() == SENTINEL {
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }

    out.push_str(OUTPUT_FOOTER);
    out.push('\n');
    out
}
