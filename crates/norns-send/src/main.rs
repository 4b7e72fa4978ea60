// Copyright 2025 norns-tools developers
// SPDX-License-Identifier: Apache-2.0

//! One-shot norns REPL command sender
//!
//! Sends a single command to a norns device over matron's WebSocket REPL and
//! prints the response lines.
//!
//! Usage:
//!   norns-send '<lua expression>'
//!
//! Environment:
//!   NORNS_HOST  device hostname (default: norns.local)
//!   NORNS_PORT  matron REPL port (default: 5555)
//!   RUST_LOG    diagnostic verbosity, e.g. RUST_LOG=debug for a
//!               per-message receive echo

use norns_send::config::{RunnerConfig, DEFAULT_COMMAND};
use norns_send::runner::{render_output, CommandRunner, RunOutcome};
use std::env;
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .try_init();

    // An empty first argument falls back to the sample expression too
    let command = env::args()
        .nth(1)
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_COMMAND.to_string());

    let config = match RunnerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    println!("Sending command: {}", command);

    match CommandRunner::new(config).run(&command).await {
        Ok(RunOutcome::Completed { lines }) => {
            print!("{}", render_output(&lines));
        }
        Ok(RunOutcome::ClosedWithoutResponse) => {
            // Soft failure: notice only, implicit success status
            println!("Connection closed without receiving response");
        }
        Ok(RunOutcome::TimedOut) => {
            println!("Timeout: No response received");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("WebSocket error: {}", e);
            process::exit(1);
        }
    }
}
