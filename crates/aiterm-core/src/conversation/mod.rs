//! Durable, id-keyed conversation history.
//!
//! Each conversation lives in its own file under the history directory and is
//! rewritten as a whole on every change.

pub mod codec;
mod store;

pub use store::{new_conversation_id, ConversationSummary, HistoryStore, HISTORY_EXT};
