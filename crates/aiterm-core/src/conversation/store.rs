use std::collections::HashMap;
use std::fs;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tempfile::NamedTempFile;

use super::codec;
use crate::core_types::Message;
use crate::errors::HistoryError;

pub const HISTORY_EXT: &str = "json";

/// Summary line for one persisted conversation, as shown by `history list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub id: String,
    pub message_count: usize,
    pub modified: DateTime<Local>,
}

pub fn new_conversation_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn validate_id(id: &str) -> Result<(), HistoryError> {
    if id.is_empty() || id.contains('/') || id.contains('\\') || id.contains("..") {
        return Err(HistoryError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// One file per conversation under `dir`, each holding the whole message list.
///
/// Every write replaces the file atomically (temp file + rename), so a crash
/// mid-write leaves the previous content in place. Loaded conversations are
/// cached for the lifetime of the store and the cache only changes after the
/// corresponding write has succeeded.
///
/// The store is not synchronized. It is owned by the session event loop; a
/// caller sharing it between tasks has to serialize load-modify-persist per
/// conversation id itself.
#[derive(Debug)]
pub struct HistoryStore {
    dir: PathBuf,
    messages: HashMap<String, Vec<Message>>,
}

impl HistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            messages: HashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn add_user_message(&mut self, id: &str, text: &str) -> Result<(), HistoryError> {
        self.add_message(id, Message::human(text))
    }

    pub fn add_assistant_message(&mut self, id: &str, text: &str) -> Result<(), HistoryError> {
        self.add_message(id, Message::ai(text))
    }

    /// Appends one message. A conversation without a backing file starts out
    /// empty; any other load failure aborts the append.
    pub fn add_message(&mut self, id: &str, message: Message) -> Result<(), HistoryError> {
        validate_id(id)?;

        let mut messages = match self.cached_or_load(id) {
            Ok(messages) => messages,
            Err(err) if err.is_not_found() => vec![],
            Err(err) => return Err(err),
        };
        messages.push(message);

        self.persist(id, &messages)?;
        self.messages.insert(id.to_string(), messages);
        Ok(())
    }

    pub fn set_messages(&mut self, id: &str, messages: Vec<Message>) -> Result<(), HistoryError> {
        validate_id(id)?;

        match self.invalidate(id) {
            Ok(()) => {}
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err),
        }
        // The old file is gone, so the cached copy must go too even if the
        // write below fails.
        self.messages.remove(id);

        self.persist(id, &messages)?;
        self.messages.insert(id.to_string(), messages);
        Ok(())
    }

    pub fn get_messages(&mut self, id: &str) -> Result<Vec<Message>, HistoryError> {
        validate_id(id)?;
        self.cached_or_load(id)
    }

    pub fn delete(&mut self, id: &str) -> Result<(), HistoryError> {
        validate_id(id)?;
        self.messages.remove(id);
        self.invalidate(id)
    }

    pub fn list(&self) -> Result<Vec<ConversationSummary>, HistoryError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
            Err(source) => {
                return Err(HistoryError::Io {
                    operation: "listing",
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut summaries = vec![];
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(source) => {
                    return Err(HistoryError::Io {
                        operation: "listing",
                        path: self.dir.clone(),
                        source,
                    })
                }
            };
            if path.extension().and_then(|ext| ext.to_str()) != Some(HISTORY_EXT) {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            let modified = fs::metadata(&path)
                .and_then(|meta| meta.modified())
                .map_err(|source| HistoryError::Io {
                    operation: "reading metadata of",
                    path: path.clone(),
                    source,
                })?;

            match read_file(&path) {
                Ok(messages) => summaries.push(ConversationSummary {
                    id: id.to_string(),
                    message_count: messages.len(),
                    modified: DateTime::<Local>::from(modified),
                }),
                Err(err) => log::warn!("Skipping unreadable conversation file: {}", err),
            }
        }

        summaries.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(summaries)
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.{HISTORY_EXT}"))
    }

    fn cached_or_load(&mut self, id: &str) -> Result<Vec<Message>, HistoryError> {
        if let Some(messages) = self.messages.get(id) {
            return Ok(messages.clone());
        }

        let path = self.path_for(id);
        let messages = read_file(&path).map_err(|err| match err {
            HistoryError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                HistoryError::NotFound(id.to_string())
            }
            err => err,
        })?;

        log::debug!("Loaded {} messages for conversation {}", messages.len(), id);
        self.messages.insert(id.to_string(), messages.clone());
        Ok(messages)
    }

    fn persist(&self, id: &str, messages: &[Message]) -> Result<(), HistoryError> {
        let path = self.path_for(id);
        let payload = codec::encode(messages).map_err(|source| HistoryError::Codec {
            path: path.clone(),
            source,
        })?;

        fs::create_dir_all(&self.dir).map_err(|source| HistoryError::Io {
            operation: "creating",
            path: self.dir.clone(),
            source,
        })?;

        let io_err = |source: io::Error| HistoryError::Io {
            operation: "writing",
            path: path.clone(),
            source,
        };
        let mut file = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        file.write_all(&payload).map_err(io_err)?;
        file.as_file().sync_all().map_err(io_err)?;
        file.persist(&path).map_err(|err| io_err(err.error))?;

        log::debug!("Persisted {} messages for conversation {}", messages.len(), id);
        Ok(())
    }

    fn invalidate(&self, id: &str) -> Result<(), HistoryError> {
        let path = self.path_for(id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(HistoryError::NotFound(id.to_string()))
            }
            Err(source) => Err(HistoryError::Io {
                operation: "deleting",
                path,
                source,
            }),
        }
    }
}

fn read_file(path: &Path) -> Result<Vec<Message>, HistoryError> {
    let bytes = fs::read(path).map_err(|source| HistoryError::Io {
        operation: "reading",
        path: path.to_path_buf(),
        source,
    })?;

    codec::decode(&bytes).map_err(|source| HistoryError::Codec {
        path: path.to_path_buf(),
        source,
    })
}
