mod action;
mod checkpoint;
mod error;
mod event;
mod mode;
mod model_client;
mod output_format;
mod slash_commands;

pub use action::*;
pub use checkpoint::*;
pub use error::*;
pub use event::*;
pub use mode::*;
pub use model_client::*;
pub use output_format::*;
pub use slash_commands::*;

pub use aiterm_core::Message;
pub use aiterm_core::Role;
