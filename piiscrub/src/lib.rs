// piiscrub/src/lib.rs
//! The `piiscrub` command-line application.
//!
//! The binary in `main.rs` is a thin wrapper; argument definitions, commands
//! and terminal output live here so integration tests can reach them.
//!
//! License: MIT OR Apache-2.0

pub mod cli;
pub mod commands;
pub mod logger;
pub mod ui;
