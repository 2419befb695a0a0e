use tokio::sync::oneshot;
use tui_textarea::Input;

use super::Checkpoint;
use super::SessionError;

/// Sequence number of a dispatched command. Background events carry the id of
/// the command that produced them.
pub type CommandId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamChunk {
    pub text: String,
    pub is_last: bool,
}

#[derive(Debug)]
pub struct ConfirmationRequest {
    pub question: String,
    pub reply: oneshot::Sender<Result<bool, SessionError>>,
}

#[derive(Debug)]
pub enum Event {
    Checkpoint(CommandId, Checkpoint),
    StreamChunk(CommandId, StreamChunk),
    ConfirmationRequest(CommandId, ConfirmationRequest),
    KeyboardCharInput(Input),
    KeyboardCTRLC,
    KeyboardCTRLL,
    KeyboardCTRLO,
    KeyboardCTRLR,
    KeyboardDown,
    KeyboardEnter,
    KeyboardPaste(String),
    KeyboardUp,
    UITick,
}
