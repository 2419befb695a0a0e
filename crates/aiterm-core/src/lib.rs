//! Conversation persistence for the aiterm terminal assistant.
//!
//! This crate owns the durable side of a chat session: the message types that
//! flow between the terminal and the model backend, the versioned on-disk
//! format for a conversation, and the history store that keeps one file per
//! conversation id.

pub mod conversation;
pub mod core_types;
pub mod errors;

pub use conversation::{new_conversation_id, ConversationSummary, HistoryStore};
pub use core_types::{Message, Role};
pub use errors::{CodecError, HistoryError};
