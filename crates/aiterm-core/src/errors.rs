//! Error types for conversation persistence.
//!
//! Failures are split by their source so callers can tell a programming error
//! (an invalid conversation id), a data-integrity problem (a payload that does
//! not decode) and an environmental problem (the disk) apart.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("malformed history payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unsupported history format version {found}; expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
}

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("invalid conversation id {0:?}")]
    InvalidId(String),
    #[error("conversation '{0}' not found")]
    NotFound(String),
    #[error("failed to decode {path}: {source}")]
    Codec {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
    #[error("I/O error while {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HistoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, HistoryError::NotFound(_))
    }
}
