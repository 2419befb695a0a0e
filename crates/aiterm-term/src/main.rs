use std::fs;

use aiterm_core::HistoryStore;
use aiterm_term::application::cli;
use aiterm_term::application::ui;
use aiterm_term::configuration::Config;
use aiterm_term::configuration::ConfigKey;
use aiterm_term::domain::models::Action;
use aiterm_term::domain::models::Event;
use aiterm_term::domain::services::ActionsService;
use aiterm_term::domain::services::AppStateProps;
use aiterm_term::domain::services::EVENT_CHANNEL_CAPACITY;
use aiterm_term::infrastructure::clients::ModelClientManager;
use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Logs go to a file so they never draw over the session.
fn init_tracing() -> Result<WorkerGuard> {
    let log_dir = Config::log_dir();
    fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "aiterm.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Config::get(ConfigKey::LogLevel)));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(writer)
        .init();

    return Ok(guard);
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli::build().get_matches();
    Config::load(cli::build(), cli::all_matches(&matches)).await?;
    let _guard = init_tracing()?;
    Config::log_summary();

    if cli::handle_subcommands(&matches)? {
        return Ok(());
    }

    std::panic::set_hook(Box::new(|panic_info| {
        ui::destruct_terminal_for_panic();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let mut conversation_id = Config::get(ConfigKey::ConversationID);
    if conversation_id.is_empty() {
        conversation_id = aiterm_core::new_conversation_id();
    }

    let model_client = ModelClientManager::from_config(&Config::get(ConfigKey::ModelClient))?;
    let app_state_props = AppStateProps {
        history: HistoryStore::new(Config::get(ConfigKey::HistoryDir)),
        conversation_id: conversation_id.to_string(),
        model_label: format!("{}/{}", model_client.name(), model_client.model()),
        renderer: cli::renderer(),
    };
    tracing::info!(conversation_id = %conversation_id, "starting session");

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let (event_tx, event_rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAPACITY);

    let mut background_futures = task::JoinSet::new();
    background_futures.spawn(async move {
        return ActionsService::start(model_client, event_tx, &mut action_rx).await;
    });

    let result = tokio::select!(
        res = background_futures.join_next() => match res {
            Some(Ok(res)) => res,
            Some(Err(err)) => Err(err.into()),
            None => Ok(()),
        },
        res = ui::run(app_state_props, action_tx, event_rx) => res,
    );
    background_futures.abort_all();

    if result.is_err() {
        ui::destruct_terminal_for_panic();
    }
    result?;

    println!(
        "{}",
        cli::renderer().render_comment(&format!(
            "Resume this conversation with: aiterm --conversation-id {conversation_id}"
        ))
    );

    return Ok(());
}
