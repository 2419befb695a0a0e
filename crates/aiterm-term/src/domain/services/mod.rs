mod actions;
mod app_state;
mod checkpoints;
mod events;
mod input_history;
mod renderer;
mod stream_buffer;

pub use actions::*;
pub use app_state::*;
pub use checkpoints::*;
pub use events::*;
pub use input_history::*;
pub use renderer::*;
pub use stream_buffer::*;
