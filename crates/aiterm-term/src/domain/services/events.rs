use anyhow::Result;
use crossterm::event::Event as CrosstermEvent;
use crossterm::event::EventStream;
use crossterm::event::KeyCode;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time;
use tui_textarea::Input;
use tui_textarea::Key;

use crate::domain::models::Event;

/// Capacity of the channel workers use to report back to the event loop.
/// Workers wait for room when the loop falls behind.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

const TICK_MILLIS: u64 = 100;

pub fn map_crossterm(event: CrosstermEvent) -> Option<Event> {
    match event {
        CrosstermEvent::Paste(text) => {
            return Some(Event::KeyboardPaste(text));
        }
        CrosstermEvent::Key(keyevent) => {
            if keyevent.kind == KeyEventKind::Release {
                return None;
            }

            let key = match keyevent.code {
                KeyCode::Char(c) => Key::Char(c),
                KeyCode::Enter => Key::Enter,
                KeyCode::Left => Key::Left,
                KeyCode::Right => Key::Right,
                KeyCode::Up => Key::Up,
                KeyCode::Down => Key::Down,
                KeyCode::Home => Key::Home,
                KeyCode::End => Key::End,
                KeyCode::Tab => Key::Tab,
                KeyCode::Delete => Key::Delete,
                KeyCode::Backspace => Key::Backspace,
                KeyCode::Esc => Key::Esc,
                _ => return None,
            };

            let input = Input {
                key,
                ctrl: keyevent.modifiers.contains(KeyModifiers::CONTROL),
                alt: keyevent.modifiers.contains(KeyModifiers::ALT),
                shift: keyevent.modifiers.contains(KeyModifiers::SHIFT),
            };
            match input {
                Input { key: Key::Up, .. } => {
                    return Some(Event::KeyboardUp);
                }
                Input { key: Key::Down, .. } => {
                    return Some(Event::KeyboardDown);
                }
                Input {
                    key: Key::Char('c'),
                    ctrl: true,
                    ..
                } => {
                    return Some(Event::KeyboardCTRLC);
                }
                Input {
                    key: Key::Char('l'),
                    ctrl: true,
                    ..
                } => {
                    return Some(Event::KeyboardCTRLL);
                }
                Input {
                    key: Key::Char('o'),
                    ctrl: true,
                    ..
                } => {
                    return Some(Event::KeyboardCTRLO);
                }
                Input {
                    key: Key::Char('r'),
                    ctrl: true,
                    ..
                } => {
                    return Some(Event::KeyboardCTRLR);
                }
                Input {
                    key: Key::Enter, ..
                } => {
                    return Some(Event::KeyboardEnter);
                }
                input => {
                    return Some(Event::KeyboardCharInput(input));
                }
            }
        }
        _ => return None,
    }
}

/// Merges keyboard input, background results and a UI tick into one ordered
/// stream. The loop calls `next` again after handling each event.
pub struct EventsService {
    crossterm_events: EventStream,
    events: mpsc::Receiver<Event>,
    events_closed: bool,
}

impl EventsService {
    pub fn new(events: mpsc::Receiver<Event>) -> EventsService {
        return EventsService {
            crossterm_events: EventStream::new(),
            events,
            events_closed: false,
        };
    }

    pub async fn next(&mut self) -> Result<Event> {
        loop {
            let evt = tokio::select! {
                event = self.events.recv(), if !self.events_closed => {
                    if event.is_none() {
                        tracing::debug!("background event channel closed");
                        self.events_closed = true;
                    }
                    event
                },
                event = self.crossterm_events.next() => match event {
                    Some(Ok(input)) => map_crossterm(input),
                    Some(Err(err)) => {
                        tracing::error!(error = ?err, "failed to read terminal event");
                        None
                    },
                    None => None
                },
                _ = time::sleep(time::Duration::from_millis(TICK_MILLIS)) => Some(Event::UITick)
            };

            if let Some(event) = evt {
                return Ok(event);
            }
        }
    }
}
