//! Application layer wiring the session controller to a real terminal.
//!
//! This module owns command-line parsing and the interactive loop that turns
//! raw terminal input into session events and draws the result.

pub mod cli;
pub mod ui;
pub mod view;
