use aiterm_core::HistoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("{0}")]
    Model(String),
    #[error("user aborted")]
    UserAborted,
    #[error("conversation history: {0}")]
    History(#[from] HistoryError),
}
