use std::io;
use std::io::Write;

use anyhow::Result;
use crossterm::cursor;
use crossterm::event::DisableBracketedPaste;
use crossterm::event::EnableBracketedPaste;
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use crossterm::terminal::ClearType;
use tokio::sync::mpsc;

use super::view::live_view;
use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::services::AppState;
use crate::domain::services::AppStateProps;
use crate::domain::services::EventsService;
use crate::domain::services::LoopControl;

pub fn destruct_terminal_for_panic() {
    let _ = disable_raw_mode();
    let _ = crossterm::execute!(io::stdout(), DisableBracketedPaste, cursor::Show);
}

/// Tracks where the live view sits so the next frame can erase it. The view
/// is drawn inline below the scrollback instead of on an alternate screen.
#[derive(Default)]
struct InlineView {
    cursor_row: u16,
}

impl InlineView {
    fn erase<W: Write>(&mut self, out: &mut W) -> Result<()> {
        queue!(out, cursor::MoveToColumn(0))?;
        if self.cursor_row > 0 {
            queue!(out, cursor::MoveUp(self.cursor_row))?;
        }
        queue!(out, terminal::Clear(ClearType::FromCursorDown))?;
        self.cursor_row = 0;

        return Ok(());
    }

    fn draw<W: Write>(
        &mut self,
        out: &mut W,
        app_state: &mut AppState,
        size: (u16, u16),
    ) -> Result<()> {
        self.erase(out)?;

        if app_state.take_clear_screen() {
            queue!(
                out,
                terminal::Clear(ClearType::All),
                terminal::Clear(ClearType::Purge),
                cursor::MoveTo(0, 0)
            )?;
        }

        for entry in app_state.take_output() {
            for line in entry.split('\n') {
                queue!(out, Print(line), Print("\r\n"))?;
            }
        }

        let (width, height) = size;
        let view = live_view(&app_state.session, app_state.renderer(), width, height);
        let last_row = view.lines.len().saturating_sub(1) as u16;
        for (idx, line) in view.lines.iter().enumerate() {
            queue!(out, Print(line))?;
            if idx < view.lines.len() - 1 {
                queue!(out, Print("\r\n"))?;
            }
        }

        match view.cursor {
            Some((col, row)) => {
                if last_row > row {
                    queue!(out, cursor::MoveUp(last_row - row))?;
                }
                queue!(out, cursor::MoveToColumn(col), cursor::Show)?;
                self.cursor_row = row;
            }
            None => {
                queue!(out, cursor::Hide)?;
                self.cursor_row = last_row;
            }
        }

        out.flush()?;
        return Ok(());
    }

    fn close<W: Write>(&mut self, out: &mut W, app_state: &mut AppState) -> Result<()> {
        self.erase(out)?;
        for entry in app_state.take_output() {
            for line in entry.split('\n') {
                queue!(out, Print(line), Print("\r\n"))?;
            }
        }
        queue!(out, cursor::Show)?;
        out.flush()?;

        return Ok(());
    }
}

pub async fn start_loop<W: Write>(
    out: &mut W,
    app_state_props: AppStateProps,
    action_tx: mpsc::UnboundedSender<Action>,
    event_rx: mpsc::Receiver<Event>,
) -> Result<()> {
    let mut events = EventsService::new(event_rx);
    let mut app_state = AppState::new(app_state_props, action_tx);
    let mut inline_view = InlineView::default();

    inline_view.draw(out, &mut app_state, terminal::size()?)?;

    loop {
        let event = events.next().await?;
        let is_tick = matches!(event, Event::UITick);

        if app_state.handle_event(event)? == LoopControl::Exit {
            break;
        }

        // Ticks only animate the spinner.
        if is_tick && !app_state.session.mode.is_querying() {
            continue;
        }

        inline_view.draw(out, &mut app_state, terminal::size()?)?;
    }

    inline_view.close(out, &mut app_state)?;
    return Ok(());
}

pub async fn run(
    app_state_props: AppStateProps,
    action_tx: mpsc::UnboundedSender<Action>,
    event_rx: mpsc::Receiver<Event>,
) -> Result<()> {
    let mut stdout = io::stdout();

    enable_raw_mode()?;
    crossterm::execute!(stdout, EnableBracketedPaste)?;

    let result = start_loop(&mut stdout, app_state_props, action_tx, event_rx).await;

    disable_raw_mode()?;
    crossterm::execute!(stdout, DisableBracketedPaste, cursor::Show)?;

    return result;
}
