use std::collections::VecDeque;
use std::mem;

use aiterm_core::HistoryStore;
use anyhow::Result;
use tokio::sync::mpsc;
use tui_textarea::CursorMove;
use tui_textarea::Key;
use tui_textarea::TextArea;

use super::help_text;
use super::CheckpointTracker;
use super::InputHistory;
use super::Renderer;
use super::StreamBuffer;
use crate::domain::models::Action;
use crate::domain::models::Checkpoint;
use crate::domain::models::CheckpointStatus;
use crate::domain::models::CommandId;
use crate::domain::models::CommandKind;
use crate::domain::models::CommandRequest;
use crate::domain::models::Confirmation;
use crate::domain::models::ConfirmationRequest;
use crate::domain::models::ConfirmationTarget;
use crate::domain::models::Event;
use crate::domain::models::Mode;
use crate::domain::models::ResumeMode;
use crate::domain::models::SessionError;
use crate::domain::models::SlashCommand;
use crate::domain::models::StreamChunk;

#[cfg(test)]
#[path = "app_state_test.rs"]
mod tests;

const FORGET_QUESTION: &str = "Forget every saved message of this conversation?";

/// Everything the live view draws. Only the event loop mutates it.
#[derive(Default)]
pub struct SessionState<'a> {
    pub mode: Mode,
    pub textarea: TextArea<'a>,
    pub stream_buffer: StreamBuffer,
    pub checkpoints: CheckpointTracker,
    pub last_error: Option<SessionError>,
    pub spinner_frame: usize,
}

pub struct AppStateProps {
    pub history: HistoryStore,
    pub conversation_id: String,
    pub model_label: String,
    pub renderer: Renderer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

struct ActiveCommand {
    id: CommandId,
    persist_response: bool,
}

pub struct AppState<'a> {
    pub session: SessionState<'a>,
    pub conversation_id: String,
    renderer: Renderer,
    history: HistoryStore,
    input_history: InputHistory,
    action_tx: mpsc::UnboundedSender<Action>,
    current_command: Option<ActiveCommand>,
    next_command_id: CommandId,
    deferred: VecDeque<Event>,
    output: Vec<String>,
    clear_screen: bool,
}

fn textarea_from<'b>(text: &str) -> TextArea<'b> {
    let mut textarea = TextArea::new(text.split('\n').map(|e| return e.to_string()).collect());
    textarea.move_cursor(CursorMove::Bottom);
    textarea.move_cursor(CursorMove::End);
    return textarea;
}

impl<'a> AppState<'a> {
    pub fn new(props: AppStateProps, action_tx: mpsc::UnboundedSender<Action>) -> AppState<'a> {
        let mut app_state = AppState {
            session: SessionState::default(),
            conversation_id: props.conversation_id,
            renderer: props.renderer,
            history: props.history,
            input_history: InputHistory::default(),
            action_tx,
            current_command: None,
            next_command_id: 0,
            deferred: VecDeque::new(),
            output: vec![],
            clear_screen: false,
        };

        app_state.output.push(app_state.renderer.render_comment(&format!(
            "aiterm · {} · conversation {}",
            props.model_label, app_state.conversation_id
        )));

        match app_state.history.get_messages(&app_state.conversation_id) {
            Ok(messages) => {
                app_state.output.push(app_state.renderer.render_comment(&format!(
                    "Resuming with {} saved messages.",
                    messages.len()
                )));
            }
            Err(err) if err.is_not_found() => {}
            Err(err) => app_state.report_error(err.into()),
        }

        app_state
            .output
            .push(app_state.renderer.render_comment("Type /help for commands."));

        return app_state;
    }

    /// Lines to print above the live view, oldest first.
    pub fn take_output(&mut self) -> Vec<String> {
        return mem::take(&mut self.output);
    }

    pub fn take_clear_screen(&mut self) -> bool {
        return mem::take(&mut self.clear_screen);
    }

    pub fn renderer(&self) -> &Renderer {
        return &self.renderer;
    }

    pub fn handle_event(&mut self, event: Event) -> Result<LoopControl> {
        match event {
            Event::KeyboardCTRLC => {
                self.interrupt();
                return Ok(LoopControl::Exit);
            }
            Event::UITick => {
                if self.session.mode.is_querying() {
                    self.session.spinner_frame = self.session.spinner_frame.wrapping_add(1);
                }
            }
            event if self.session.mode.is_confirming() => {
                return self.handle_confirming(event);
            }
            Event::Checkpoint(id, checkpoint) => {
                self.handle_checkpoint(id, checkpoint);
            }
            Event::StreamChunk(id, chunk) => {
                self.handle_stream_chunk(id, chunk);
            }
            Event::ConfirmationRequest(id, request) => {
                self.handle_confirmation_request(id, request);
            }
            Event::KeyboardEnter => {
                return self.submit();
            }
            Event::KeyboardCharInput(input) => {
                self.session.textarea.input(input);
            }
            Event::KeyboardPaste(text) => {
                for (idx, line) in text.split('\n').enumerate() {
                    if idx > 0 {
                        self.session.textarea.insert_newline();
                    }
                    self.session.textarea.insert_str(line.trim_end_matches('\r'));
                }
            }
            Event::KeyboardCTRLO => {
                self.session.textarea.insert_newline();
            }
            Event::KeyboardCTRLL => {
                self.clear_screen = true;
            }
            Event::KeyboardCTRLR => {
                if self.session.mode.is_idle() {
                    self.reset_session();
                    self.output
                        .push(self.renderer.render_comment("Session reset."));
                }
            }
            Event::KeyboardUp => {
                if self.session.mode.is_idle() {
                    if let Some(text) = self.input_history.previous() {
                        self.session.textarea = textarea_from(&text);
                    }
                }
            }
            Event::KeyboardDown => {
                if self.session.mode.is_idle() {
                    let browsing = self.input_history.is_browsing();
                    match self.input_history.next() {
                        Some(text) => self.session.textarea = textarea_from(&text),
                        None if browsing => self.session.textarea = TextArea::default(),
                        None => {}
                    }
                }
            }
        }

        return Ok(LoopControl::Continue);
    }

    fn interrupt(&mut self) {
        if self.current_command.take().is_some() && self.action_tx.send(Action::Abort).is_err() {
            tracing::debug!("actions service already stopped");
        }

        if let Mode::Confirming(confirmation) = mem::take(&mut self.session.mode) {
            if let ConfirmationTarget::Command(reply) = confirmation.target {
                let _ = reply.send(Err(SessionError::UserAborted));
            }
        }
    }

    fn handle_confirming(&mut self, event: Event) -> Result<LoopControl> {
        match event {
            Event::Checkpoint(..) | Event::StreamChunk(..) | Event::ConfirmationRequest(..) => {
                self.deferred.push_back(event);
            }
            Event::KeyboardEnter => {
                let selected = match &self.session.mode {
                    Mode::Confirming(confirmation) => confirmation.selected,
                    _ => false,
                };
                self.resolve_confirmation(Ok(selected))?;
            }
            Event::KeyboardCharInput(input) => match input.key {
                Key::Char('y') | Key::Char('Y') => self.resolve_confirmation(Ok(true))?,
                Key::Char('n') | Key::Char('N') => self.resolve_confirmation(Ok(false))?,
                Key::Esc => self.resolve_confirmation(Err(SessionError::UserAborted))?,
                Key::Left | Key::Right | Key::Tab => {
                    if let Mode::Confirming(confirmation) = &mut self.session.mode {
                        confirmation.toggle();
                    }
                }
                _ => {}
            },
            _ => {}
        }

        return Ok(LoopControl::Continue);
    }

    fn resolve_confirmation(&mut self, answer: Result<bool, SessionError>) -> Result<()> {
        let confirmation = match mem::take(&mut self.session.mode) {
            Mode::Confirming(confirmation) => confirmation,
            mode => {
                self.session.mode = mode;
                return Ok(());
            }
        };
        self.session.mode = Mode::from(confirmation.resume);

        match confirmation.target {
            ConfirmationTarget::Command(reply) => {
                if reply.send(answer).is_err() {
                    tracing::debug!("confirmation answered after the command went away");
                }
            }
            ConfirmationTarget::ForgetConversation => match answer {
                Ok(true) => self.forget_conversation(),
                Ok(false) => self
                    .output
                    .push(self.renderer.render_comment("Kept the conversation.")),
                Err(_) => self.output.push(self.renderer.render_comment("Aborted.")),
            },
        }

        // Background events that arrived while the question was open.
        while !self.session.mode.is_confirming() {
            let Some(event) = self.deferred.pop_front() else {
                break;
            };
            self.handle_event(event)?;
        }

        return Ok(());
    }

    fn is_current(&self, id: CommandId) -> bool {
        return self
            .current_command
            .as_ref()
            .map(|e| return e.id == id)
            .unwrap_or(false);
    }

    fn handle_checkpoint(&mut self, id: CommandId, checkpoint: Checkpoint) {
        if !self.is_current(id) {
            tracing::debug!(command_id = id, "dropping checkpoint of a finished command");
            return;
        }

        let terminal = checkpoint.terminal;
        let status = checkpoint.status;
        let detail = checkpoint.detail.clone();
        self.session.checkpoints.push(checkpoint);

        if !terminal {
            return;
        }

        if status == CheckpointStatus::Error {
            self.fail_command(detail.unwrap_or_default());
        } else {
            self.complete_command(detail);
        }
    }

    fn handle_stream_chunk(&mut self, id: CommandId, chunk: StreamChunk) {
        if !self.is_current(id) {
            tracing::debug!(command_id = id, "dropping chunk of a finished command");
            return;
        }
        if !self.session.mode.is_querying() {
            return;
        }

        if self.session.stream_buffer.append(&chunk) {
            self.complete_command(None);
        }
    }

    fn handle_confirmation_request(&mut self, id: CommandId, request: ConfirmationRequest) {
        if !self.is_current(id) {
            tracing::debug!(command_id = id, "dropping confirmation of a finished command");
            return;
        }

        self.session.mode = Mode::Confirming(Confirmation::new(
            &request.question,
            self.session.mode.resume_mode(),
            ConfirmationTarget::Command(request.reply),
        ));
    }

    fn flush_checkpoints(&mut self) {
        let lines = self
            .session
            .checkpoints
            .iter()
            .map(|e| return self.renderer.render_checkpoint(e))
            .collect::<Vec<String>>();
        self.output.extend(lines);
    }

    fn complete_command(&mut self, detail: Option<String>) {
        let Some(command) = self.current_command.take() else {
            return;
        };
        self.session.mode = Mode::Idle;
        self.flush_checkpoints();

        let text = self.session.stream_buffer.take();
        if !text.trim().is_empty() {
            self.output.push(self.renderer.render_content(&text));
            if command.persist_response {
                if let Err(err) = self
                    .history
                    .add_assistant_message(&self.conversation_id, &text)
                {
                    self.report_error(err.into());
                }
            }
        }

        if let Some(detail) = detail {
            self.output.push(self.renderer.render_content(&detail));
        }

        tracing::debug!(command_id = command.id, "command finished");
    }

    fn fail_command(&mut self, detail: String) {
        if self.current_command.take().is_none() {
            return;
        }
        self.session.mode = Mode::Idle;
        self.flush_checkpoints();
        self.session.stream_buffer.clear();
        self.report_error(SessionError::Model(detail));
    }

    fn report_error(&mut self, err: SessionError) {
        tracing::error!(error = %err, "session error");
        self.output
            .push(self.renderer.render_error(&err.to_string()));
        self.session.last_error = Some(err);
    }

    fn submit(&mut self) -> Result<LoopControl> {
        if !self.session.mode.is_idle() {
            return Ok(LoopControl::Continue);
        }

        let input = self.session.textarea.lines().join("\n");
        if input.trim().is_empty() {
            return Ok(LoopControl::Continue);
        }

        self.session.textarea = TextArea::default();
        self.input_history.add(&input);
        self.output
            .push(format!("{}{}", self.renderer.render_prompt(), input));

        if let Some(command) = SlashCommand::parse(&input) {
            return self.handle_slash_command(command);
        }

        return self.start_chat(input);
    }

    fn handle_slash_command(&mut self, command: SlashCommand) -> Result<LoopControl> {
        match command {
            SlashCommand::Help => {
                self.output.push(self.renderer.render_content(&help_text()));
            }
            SlashCommand::Quit => {
                return Ok(LoopControl::Exit);
            }
            SlashCommand::Clear => {
                self.clear_screen = true;
            }
            SlashCommand::Reset => {
                self.reset_session();
                self.output
                    .push(self.renderer.render_comment("Session reset."));
            }
            SlashCommand::Forget => {
                self.session.mode = Mode::Confirming(Confirmation::new(
                    FORGET_QUESTION,
                    ResumeMode::Idle,
                    ConfirmationTarget::ForgetConversation,
                ));
            }
            SlashCommand::Status => {
                return self.dispatch(CommandKind::Status, false);
            }
            SlashCommand::Unknown(name) => {
                self.output.push(self.renderer.render_warning(&format!(
                    "Unknown command {name}. Type /help for commands."
                )));
            }
        }

        return Ok(LoopControl::Continue);
    }

    fn start_chat(&mut self, input: String) -> Result<LoopControl> {
        let conversation = match self.history.get_messages(&self.conversation_id) {
            Ok(messages) => messages,
            Err(err) if err.is_not_found() => vec![],
            Err(err) => {
                self.report_error(err.into());
                return Ok(LoopControl::Continue);
            }
        };

        if let Err(err) = self.history.add_user_message(&self.conversation_id, &input) {
            self.report_error(err.into());
            return Ok(LoopControl::Continue);
        }

        return self.dispatch(
            CommandKind::Chat {
                conversation,
                input,
            },
            true,
        );
    }

    fn dispatch(&mut self, kind: CommandKind, persist_response: bool) -> Result<LoopControl> {
        self.next_command_id += 1;
        let id = self.next_command_id;

        self.session.checkpoints.reset();
        self.session.stream_buffer.clear();
        self.session.last_error = None;
        self.session.spinner_frame = 0;
        self.current_command = Some(ActiveCommand {
            id,
            persist_response,
        });
        self.session.mode = Mode::Querying;

        tracing::debug!(command_id = id, "starting command");
        self.action_tx
            .send(Action::Execute(CommandRequest { id, kind }))?;

        return Ok(LoopControl::Continue);
    }

    fn reset_session(&mut self) {
        self.session.checkpoints.reset();
        self.session.stream_buffer.clear();
        self.session.last_error = None;
        self.input_history.reset();
        self.deferred.clear();
    }

    fn forget_conversation(&mut self) {
        self.reset_session();
        match self.history.set_messages(&self.conversation_id, vec![]) {
            Ok(()) => self
                .output
                .push(self.renderer.render_success("Conversation forgotten.")),
            Err(err) => self.report_error(err.into()),
        }
    }
}
