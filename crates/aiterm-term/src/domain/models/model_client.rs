use aiterm_core::Message;
use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use strum::IntoEnumIterator;
use strum_macros::Display;
use strum_macros::EnumIter;
use strum_macros::EnumString;
use strum_macros::EnumVariantNames;
use tokio::sync::mpsc;
use tokio::sync::oneshot;

use super::Checkpoint;
use super::CommandId;
use super::ConfirmationRequest;
use super::Event;
use super::SessionError;
use super::StreamChunk;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumVariantNames, EnumIter)]
pub enum ModelName {
    #[default]
    #[strum(serialize = "openai")]
    OpenAI,
}

impl ModelName {
    pub fn parse(s: &str) -> Option<ModelName> {
        return ModelName::iter().find(|e| return e.to_string() == s);
    }
}

/// Where a streaming model call delivers its chunks.
///
/// The first chunk optionally emits a checkpoint before it, which lets the
/// worker flip its "Asking" checkpoint to success once the model answers.
/// `finish` sends the closing chunk at most once.
pub struct ChunkSink {
    command_id: CommandId,
    event_tx: mpsc::Sender<Event>,
    first_chunk: Option<Checkpoint>,
    finished: bool,
}

impl ChunkSink {
    pub fn new(command_id: CommandId, event_tx: mpsc::Sender<Event>) -> ChunkSink {
        return ChunkSink {
            command_id,
            event_tx,
            first_chunk: None,
            finished: false,
        };
    }

    pub fn on_first_chunk(mut self, checkpoint: Checkpoint) -> ChunkSink {
        self.first_chunk = Some(checkpoint);
        return self;
    }

    pub async fn push(&mut self, text: &str) -> Result<()> {
        self.send(text, false).await
    }

    pub async fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.send("", true).await
    }

    /// Asks the user a yes or no question and waits for the answer. Fails
    /// with `SessionError::UserAborted` when the user escapes or the session
    /// goes away before answering.
    pub async fn confirm(&mut self, question: &str) -> Result<bool> {
        let (reply, answer) = oneshot::channel();
        self.event_tx
            .send(Event::ConfirmationRequest(
                self.command_id,
                ConfirmationRequest {
                    question: question.to_string(),
                    reply,
                },
            ))
            .await?;

        return match answer.await {
            Ok(answer) => Ok(answer?),
            Err(_) => bail!(SessionError::UserAborted),
        };
    }

    async fn send(&mut self, text: &str, is_last: bool) -> Result<()> {
        if self.finished {
            return Ok(());
        }

        if let Some(checkpoint) = self.first_chunk.take() {
            self.event_tx
                .send(Event::Checkpoint(self.command_id, checkpoint))
                .await?;
        }

        self.event_tx
            .send(Event::StreamChunk(
                self.command_id,
                StreamChunk {
                    text: text.to_string(),
                    is_last,
                },
            ))
            .await?;

        self.finished = is_last;
        return Ok(());
    }
}

#[async_trait]
pub trait ModelClient: Send + Sync {
    fn name(&self) -> ModelName;
    fn model(&self) -> String;
    async fn health_check(&self) -> Result<String>;
    async fn stream_chat(
        &self,
        conversation: &[Message],
        input: &str,
        sink: &mut ChunkSink,
    ) -> Result<()>;
}

pub type ModelClientBox = Box<dyn ModelClient>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn it_waits_for_the_confirmation_answer() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut sink = ChunkSink::new(3, tx);

        let answer = tokio::spawn(async move { sink.confirm("Continue?").await });
        match rx.recv().await.unwrap() {
            Event::ConfirmationRequest(3, request) => {
                assert_eq!(request.question, "Continue?");
                request.reply.send(Ok(true)).unwrap();
            }
            other => panic!("unexpected {other:?}"),
        }

        assert!(answer.await.unwrap().unwrap());
    }

    #[tokio::test]
    async fn it_fails_when_the_question_is_dropped() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut sink = ChunkSink::new(3, tx);

        let answer = tokio::spawn(async move { sink.confirm("Continue?").await });
        let request = rx.recv().await.unwrap();
        drop(request);

        let err = answer.await.unwrap().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SessionError>(),
            Some(SessionError::UserAborted)
        ));
    }
}
