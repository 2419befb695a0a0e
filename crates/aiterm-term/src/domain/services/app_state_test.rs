use std::fs;

use aiterm_core::HistoryStore;
use aiterm_core::Message;
use tempfile::tempdir;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tui_textarea::Input;
use tui_textarea::Key;

use super::*;

fn setup() -> (AppState<'static>, mpsc::UnboundedReceiver<Action>, TempDir) {
    let dir = tempdir().unwrap();
    return setup_in(dir);
}

fn setup_in(dir: TempDir) -> (AppState<'static>, mpsc::UnboundedReceiver<Action>, TempDir) {
    let (action_tx, action_rx) = mpsc::unbounded_channel();
    let props = AppStateProps {
        history: HistoryStore::new(dir.path()),
        conversation_id: "c1".to_string(),
        model_label: "openai/mock".to_string(),
        renderer: Renderer::plain(),
    };

    let mut app_state = AppState::new(props, action_tx);
    app_state.take_output();
    return (app_state, action_rx, dir);
}

fn submit(app_state: &mut AppState, text: &str) -> LoopControl {
    app_state
        .handle_event(Event::KeyboardPaste(text.to_string()))
        .unwrap();
    return app_state.handle_event(Event::KeyboardEnter).unwrap();
}

fn key(app_state: &mut AppState, key: Key) {
    app_state
        .handle_event(Event::KeyboardCharInput(Input {
            key,
            ..Default::default()
        }))
        .unwrap();
}

fn chunk(id: CommandId, text: &str, is_last: bool) -> Event {
    return Event::StreamChunk(
        id,
        StreamChunk {
            text: text.to_string(),
            is_last,
        },
    );
}

fn expect_execute(action_rx: &mut mpsc::UnboundedReceiver<Action>) -> CommandRequest {
    match action_rx.try_recv().unwrap() {
        Action::Execute(request) => return request,
        other => panic!("unexpected action {other:?}"),
    }
}

fn stored(dir: &TempDir) -> Vec<Message> {
    return HistoryStore::new(dir.path()).get_messages("c1").unwrap();
}

#[test]
fn test_submit_streams_and_persists_the_exchange() {
    let (mut app_state, mut action_rx, dir) = setup();

    assert_eq!(submit(&mut app_state, "hello"), LoopControl::Continue);
    assert!(app_state.session.mode.is_querying());
    assert!(app_state.session.textarea.is_empty());

    let request = expect_execute(&mut action_rx);
    assert_eq!(
        request.kind,
        CommandKind::Chat {
            conversation: vec![],
            input: "hello".to_string(),
        }
    );
    assert_eq!(stored(&dir), vec![Message::human("hello")]);

    let id = request.id;
    app_state
        .handle_event(Event::Checkpoint(id, Checkpoint::loading("Asking mock")))
        .unwrap();
    app_state
        .handle_event(Event::Checkpoint(id, Checkpoint::success("Asking mock")))
        .unwrap();
    app_state.handle_event(chunk(id, "Hi", false)).unwrap();
    assert_eq!(app_state.session.stream_buffer.as_str(), "Hi");
    assert!(app_state.session.mode.is_querying());

    app_state.handle_event(chunk(id, " there", true)).unwrap();
    assert!(app_state.session.mode.is_idle());
    assert!(app_state.session.stream_buffer.is_empty());
    assert_eq!(app_state.session.checkpoints.snapshot().len(), 1);

    let output = app_state.take_output();
    assert_eq!(
        output,
        vec![
            "> hello".to_string(),
            "✓ Asking mock".to_string(),
            "Hi there".to_string(),
        ]
    );
    assert_eq!(
        stored(&dir),
        vec![Message::human("hello"), Message::ai("Hi there")]
    );
}

#[test]
fn test_terminal_success_checkpoint_completes_and_persists() {
    let (mut app_state, mut action_rx, dir) = setup();
    submit(&mut app_state, "hello");
    let id = expect_execute(&mut action_rx).id;

    app_state.handle_event(chunk(id, "Hi", false)).unwrap();
    app_state
        .handle_event(Event::Checkpoint(
            id,
            Checkpoint::success("Asking mock")
                .with_detail("1 reply")
                .finished(),
        ))
        .unwrap();

    assert!(app_state.session.mode.is_idle());
    assert!(app_state.session.stream_buffer.is_empty());
    assert_eq!(
        app_state.take_output(),
        vec![
            "> hello".to_string(),
            "✓ Asking mock".to_string(),
            "Hi".to_string(),
            "1 reply".to_string(),
        ]
    );
    assert_eq!(stored(&dir), vec![Message::human("hello"), Message::ai("Hi")]);

    // Chunks arriving after completion are stale.
    app_state.handle_event(chunk(id, " late", true)).unwrap();
    assert!(app_state.take_output().is_empty());
    assert_eq!(stored(&dir), vec![Message::human("hello"), Message::ai("Hi")]);
}

#[test]
fn test_prior_messages_are_sent_with_the_next_input() {
    let dir = tempdir().unwrap();
    HistoryStore::new(dir.path())
        .set_messages("c1", vec![Message::human("q"), Message::ai("a")])
        .unwrap();

    let (mut app_state, mut action_rx, _dir) = setup_in(dir);
    submit(&mut app_state, "follow up");

    match expect_execute(&mut action_rx).kind {
        CommandKind::Chat {
            conversation,
            input,
        } => {
            assert_eq!(conversation, vec![Message::human("q"), Message::ai("a")]);
            assert_eq!(input, "follow up");
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_error_checkpoint_keeps_the_session_usable() {
    let (mut app_state, mut action_rx, dir) = setup();
    submit(&mut app_state, "hello");
    let id = expect_execute(&mut action_rx).id;
    app_state.take_output();

    app_state.handle_event(chunk(id, "partial", false)).unwrap();
    app_state
        .handle_event(Event::Checkpoint(id, Checkpoint::error("Asking mock", "boom")))
        .unwrap();

    assert!(app_state.session.mode.is_idle());
    assert!(app_state.session.stream_buffer.is_empty());
    assert!(matches!(
        &app_state.session.last_error,
        Some(SessionError::Model(detail)) if detail == "boom"
    ));
    assert_eq!(
        app_state.take_output(),
        vec!["✗ Asking mock".to_string(), "Error: boom".to_string()]
    );
    assert_eq!(stored(&dir), vec![Message::human("hello")]);

    submit(&mut app_state, "again");
    assert!(app_state.session.mode.is_querying());
    assert!(app_state.session.last_error.is_none());
    assert!(app_state.session.checkpoints.is_empty());
    assert_eq!(expect_execute(&mut action_rx).id, id + 1);
}

#[test]
fn test_events_of_a_previous_command_are_ignored() {
    let (mut app_state, mut action_rx, _dir) = setup();
    submit(&mut app_state, "one");
    let first = expect_execute(&mut action_rx).id;
    app_state.handle_event(chunk(first, "1", true)).unwrap();

    submit(&mut app_state, "two");
    let second = expect_execute(&mut action_rx).id;
    assert_ne!(first, second);

    app_state.handle_event(chunk(first, "late", false)).unwrap();
    app_state
        .handle_event(Event::Checkpoint(first, Checkpoint::error("x", "late")))
        .unwrap();
    assert!(app_state.session.stream_buffer.is_empty());
    assert!(app_state.session.checkpoints.is_empty());
    assert!(app_state.session.mode.is_querying());
}

#[test]
fn test_enter_is_ignored_while_querying() {
    let (mut app_state, mut action_rx, _dir) = setup();
    submit(&mut app_state, "one");
    expect_execute(&mut action_rx);

    submit(&mut app_state, "two");
    assert!(action_rx.try_recv().is_err());
    assert_eq!(app_state.session.textarea.lines(), ["two"]);
}

#[test]
fn test_confirmation_defers_background_events() {
    let (mut app_state, mut action_rx, _dir) = setup();
    submit(&mut app_state, "hello");
    let id = expect_execute(&mut action_rx).id;

    let (reply, mut answer) = oneshot::channel();
    app_state
        .handle_event(Event::ConfirmationRequest(
            id,
            ConfirmationRequest {
                question: "Run it?".to_string(),
                reply,
            },
        ))
        .unwrap();
    assert!(app_state.session.mode.is_confirming());

    app_state.handle_event(chunk(id, "abc", false)).unwrap();
    app_state
        .handle_event(Event::KeyboardPaste("typed".to_string()))
        .unwrap();
    assert!(app_state.session.stream_buffer.is_empty());

    key(&mut app_state, Key::Tab);
    match &app_state.session.mode {
        Mode::Confirming(confirmation) => assert!(!confirmation.selected),
        _ => panic!("expected confirming"),
    }

    key(&mut app_state, Key::Char('y'));
    assert!(matches!(answer.try_recv(), Ok(Ok(true))));
    assert!(app_state.session.mode.is_querying());
    assert_eq!(app_state.session.stream_buffer.as_str(), "abc");
    assert!(app_state.session.textarea.is_empty());
}

#[test]
fn test_escape_aborts_a_confirmation() {
    let (mut app_state, mut action_rx, _dir) = setup();
    submit(&mut app_state, "hello");
    let id = expect_execute(&mut action_rx).id;

    let (reply, mut answer) = oneshot::channel();
    app_state
        .handle_event(Event::ConfirmationRequest(
            id,
            ConfirmationRequest {
                question: "Run it?".to_string(),
                reply,
            },
        ))
        .unwrap();
    key(&mut app_state, Key::Esc);

    assert!(matches!(answer.try_recv(), Ok(Err(SessionError::UserAborted))));
    assert!(app_state.session.mode.is_querying());
}

#[test]
fn test_forget_wipes_the_conversation_after_confirmation() {
    let dir = tempdir().unwrap();
    HistoryStore::new(dir.path())
        .set_messages("c1", vec![Message::human("q"), Message::ai("a")])
        .unwrap();
    let (mut app_state, mut action_rx, dir) = setup_in(dir);

    submit(&mut app_state, "/forget");
    assert!(app_state.session.mode.is_confirming());
    key(&mut app_state, Key::Char('n'));
    assert!(app_state.session.mode.is_idle());
    assert_eq!(stored(&dir).len(), 2);

    submit(&mut app_state, "/forget");
    app_state.handle_event(Event::KeyboardEnter).unwrap();
    assert!(app_state.session.mode.is_idle());
    assert_eq!(stored(&dir), vec![]);
    assert!(app_state
        .take_output()
        .contains(&"Conversation forgotten.".to_string()));
    assert!(action_rx.try_recv().is_err());

    // The input history went with it.
    app_state.handle_event(Event::KeyboardUp).unwrap();
    assert!(app_state.session.textarea.is_empty());
}

#[test]
fn test_status_reports_through_checkpoints() {
    let (mut app_state, mut action_rx, dir) = setup();
    submit(&mut app_state, "/status");

    let request = expect_execute(&mut action_rx);
    assert_eq!(request.kind, CommandKind::Status);
    app_state.take_output();

    app_state
        .handle_event(Event::Checkpoint(
            request.id,
            Checkpoint::success("Checking openai endpoint")
                .with_detail("3 models available")
                .finished(),
        ))
        .unwrap();

    assert!(app_state.session.mode.is_idle());
    assert_eq!(
        app_state.take_output(),
        vec![
            "✓ Checking openai endpoint".to_string(),
            "3 models available".to_string(),
        ]
    );
    assert!(!dir.path().join("c1.json").exists());
}

#[test]
fn test_up_and_down_recall_inputs() {
    let (mut app_state, _action_rx, _dir) = setup();
    submit(&mut app_state, "/help");
    submit(&mut app_state, "/clear");
    assert!(app_state.take_clear_screen());

    app_state.handle_event(Event::KeyboardUp).unwrap();
    assert_eq!(app_state.session.textarea.lines(), ["/clear"]);
    app_state.handle_event(Event::KeyboardUp).unwrap();
    app_state.handle_event(Event::KeyboardUp).unwrap();
    assert_eq!(app_state.session.textarea.lines(), ["/help"]);

    app_state.handle_event(Event::KeyboardDown).unwrap();
    assert_eq!(app_state.session.textarea.lines(), ["/clear"]);
    app_state.handle_event(Event::KeyboardDown).unwrap();
    assert!(app_state.session.textarea.is_empty());
}

#[test]
fn test_reset_clears_session_caches() {
    let (mut app_state, mut action_rx, _dir) = setup();
    submit(&mut app_state, "hello");
    let id = expect_execute(&mut action_rx).id;
    app_state
        .handle_event(Event::Checkpoint(id, Checkpoint::error("Asking mock", "boom")))
        .unwrap();

    app_state.handle_event(Event::KeyboardCTRLR).unwrap();
    assert!(app_state.session.checkpoints.is_empty());
    assert!(app_state.session.last_error.is_none());

    app_state.handle_event(Event::KeyboardUp).unwrap();
    assert!(app_state.session.textarea.is_empty());
}

#[test]
fn test_history_failure_is_reported_without_dispatching() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("c1.json"), b"garbage").unwrap();
    let (mut app_state, mut action_rx, _dir) = setup_in(dir);

    submit(&mut app_state, "hello");
    assert!(app_state.session.mode.is_idle());
    assert!(matches!(
        app_state.session.last_error,
        Some(SessionError::History(_))
    ));
    assert!(action_rx.try_recv().is_err());
}

#[test]
fn test_interrupt_aborts_and_exits() {
    let (mut app_state, mut action_rx, _dir) = setup();
    submit(&mut app_state, "hello");
    expect_execute(&mut action_rx);

    let control = app_state.handle_event(Event::KeyboardCTRLC).unwrap();
    assert_eq!(control, LoopControl::Exit);
    assert_eq!(action_rx.try_recv().unwrap(), Action::Abort);
}

#[test]
fn test_quit_command_exits() {
    let (mut app_state, _action_rx, _dir) = setup();
    assert_eq!(submit(&mut app_state, "/quit"), LoopControl::Exit);
}
