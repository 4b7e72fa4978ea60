//! # norns-send
//!
//! One-shot command client for the norns matron REPL.
//!
//! Connects to a device's WebSocket REPL, transmits a single command, and
//! collects the lines streamed back until matron's `<ok>` completion marker
//! arrives or the deadline elapses. The binary in this crate wraps
//! [`runner::CommandRunner`] with environment-sourced configuration and
//! exit-code handling.

pub mod config;
pub mod runner;

pub use config::RunnerConfig;
pub use runner::{CommandRunner, RunOutcome};
