// piiscrub/src/logger.rs
//! Logging setup for the CLI.
//!
//! Logs go to stderr so that sanitized output on stdout stays clean for pipes.

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// Initializes `env_logger`.
///
/// An explicit level wins over `RUST_LOG`. Without one, `RUST_LOG` is honoured
/// and defaults to `warn`. Calling this twice is harmless.
pub fn init_logger(level: Option<LevelFilter>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("warn"));
    builder.target(Target::Stderr);
    builder.format_timestamp(None);

    if let Some(level) = level {
        builder.filter_level(level);
    }

    if builder.try_init().is_err() {
        log::debug!("Logger already initialized.");
    }
}
