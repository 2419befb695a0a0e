//! Interactive terminal assistant.
//!
//! Reads input from the terminal, streams answers from a language model back
//! into it and keeps every exchange as conversation history on disk.

pub mod application;
pub mod configuration;
pub mod domain;
pub mod infrastructure;
pub use application::ui::{destruct_terminal_for_panic, start_loop};
pub use configuration::{Config, ConfigKey};
pub use domain::models::{Action, Event, ModelClient, ModelName};
pub use domain::services::{AppState, AppStateProps, Renderer};
pub use infrastructure::clients::ModelClientManager;
