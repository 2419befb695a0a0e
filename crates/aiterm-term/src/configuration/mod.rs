//! Configuration registry for the terminal assistant.
//!
//! Values resolve from built in defaults, then `config.toml`, then command
//! line flags and `AITERM_*` environment variables.

mod config;

pub use config::*;
