use aiterm_core::Message;

use super::CommandId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    /// Send `input` to the model with `conversation` as the prior turns.
    Chat {
        conversation: Vec<Message>,
        input: String,
    },
    /// Check that the model endpoint is reachable.
    Status,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub id: CommandId,
    pub kind: CommandKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Execute(CommandRequest),
    Abort,
}
