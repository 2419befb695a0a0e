use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::models::Action;
use crate::domain::models::Checkpoint;
use crate::domain::models::ChunkSink;
use crate::domain::models::CommandId;
use crate::domain::models::CommandKind;
use crate::domain::models::CommandRequest;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::ModelClient;
use crate::domain::models::ModelClientBox;

async fn chat(
    client: &dyn ModelClient,
    id: CommandId,
    conversation: Vec<Message>,
    input: String,
    event_tx: &mpsc::Sender<Event>,
) -> Result<()> {
    let description = format!("Asking {}", client.model());
    event_tx
        .send(Event::Checkpoint(id, Checkpoint::loading(&description)))
        .await?;

    let mut sink = ChunkSink::new(id, event_tx.clone())
        .on_first_chunk(Checkpoint::success(&description));

    if let Err(err) = client.stream_chat(&conversation, &input, &mut sink).await {
        tracing::error!(error = ?err, command_id = id, "chat request failed");
        event_tx
            .send(Event::Checkpoint(
                id,
                Checkpoint::error(&description, &format!("{err:#}")),
            ))
            .await?;
        return Ok(());
    }

    sink.finish().await?;
    return Ok(());
}

async fn status(client: &dyn ModelClient, id: CommandId, event_tx: &mpsc::Sender<Event>) -> Result<()> {
    let description = format!("Checking {} endpoint", client.name());
    event_tx
        .send(Event::Checkpoint(id, Checkpoint::loading(&description)))
        .await?;

    let checkpoint = match client.health_check().await {
        Ok(detail) => Checkpoint::success(&description)
            .with_detail(&detail)
            .finished(),
        Err(err) => Checkpoint::error(&description, &format!("{err:#}")),
    };
    event_tx.send(Event::Checkpoint(id, checkpoint)).await?;

    return Ok(());
}

async fn run_command(
    client: &dyn ModelClient,
    request: CommandRequest,
    event_tx: &mpsc::Sender<Event>,
) -> Result<()> {
    match request.kind {
        CommandKind::Chat {
            conversation,
            input,
        } => chat(client, request.id, conversation, input, event_tx).await,
        CommandKind::Status => status(client, request.id, event_tx).await,
    }
}

pub struct ActionsService {}

impl ActionsService {
    /// Runs one worker task per `Execute` and reports back on `event_tx`.
    /// Returns once the action channel closes.
    pub async fn start(
        client: ModelClientBox,
        event_tx: mpsc::Sender<Event>,
        rx: &mut mpsc::UnboundedReceiver<Action>,
    ) -> Result<()> {
        let client: Arc<dyn ModelClient> = Arc::from(client);
        let mut worker: Option<JoinHandle<()>> = None;

        while let Some(action) = rx.recv().await {
            match action {
                Action::Abort => {
                    if let Some(handle) = worker.take() {
                        tracing::debug!("aborting running command");
                        handle.abort();
                    }
                }
                Action::Execute(request) => {
                    if let Some(handle) = worker.take() {
                        handle.abort();
                    }

                    tracing::debug!(command_id = request.id, "dispatching command");
                    let client_worker = client.clone();
                    let worker_event_tx = event_tx.clone();
                    worker = Some(tokio::spawn(async move {
                        let id = request.id;
                        if let Err(err) =
                            run_command(client_worker.as_ref(), request, &worker_event_tx).await
                        {
                            tracing::error!(error = ?err, command_id = id, "worker stopped");
                        }
                    }));
                }
            }
        }

        if let Some(handle) = worker.take() {
            handle.abort();
        }

        return Ok(());
    }
}
