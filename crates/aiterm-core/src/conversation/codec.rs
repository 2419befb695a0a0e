//! On-disk representation of a conversation.
//!
//! A conversation file is a single JSON document carrying a format version and
//! the ordered message list:
//!
//! ```json
//! {"version":1,"messages":[{"role":"human","content":"hi"}]}
//! ```
//!
//! The version is checked before the message list is interpreted so a file
//! written by a newer format is reported as such instead of as garbage.

use serde::{Deserialize, Serialize};

use crate::core_types::Message;
use crate::errors::CodecError;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    messages: &'a [Message],
}

#[derive(Deserialize)]
struct Header {
    version: u32,
}

#[derive(Deserialize)]
struct Envelope {
    messages: Vec<Message>,
}

pub fn encode(messages: &[Message]) -> Result<Vec<u8>, CodecError> {
    let envelope = EnvelopeRef {
        version: FORMAT_VERSION,
        messages,
    };
    Ok(serde_json::to_vec(&envelope)?)
}

pub fn decode(bytes: &[u8]) -> Result<Vec<Message>, CodecError> {
    let header: Header = serde_json::from_slice(bytes)?;
    if header.version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion {
            found: header.version,
            expected: FORMAT_VERSION,
        });
    }

    let envelope: Envelope = serde_json::from_slice(bytes)?;
    Ok(envelope.messages)
}
