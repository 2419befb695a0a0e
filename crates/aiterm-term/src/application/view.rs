use crate::domain::models::CheckpointStatus;
use crate::domain::models::Mode;
use crate::domain::models::ResumeMode;
use crate::domain::services::Renderer;
use crate::domain::services::SessionState;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const PROMPT_WIDTH: usize = 2;

/// The redrawable bottom of the screen: progress, the partial response and the
/// input prompt. Everything finished is printed above it and never redrawn.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LiveView {
    pub lines: Vec<String>,
    /// Column and row of the text cursor relative to the first line, when the
    /// cursor should be visible.
    pub cursor: Option<(u16, u16)>,
}

fn truncate(text: &str, width: usize) -> String {
    return text.chars().take(width).collect();
}

fn checkpoint_lines(session: &SessionState, renderer: &Renderer, width: usize) -> Vec<String> {
    return session
        .checkpoints
        .iter()
        .map(|checkpoint| {
            if checkpoint.status == CheckpointStatus::Loading {
                let frame = SPINNER[session.spinner_frame % SPINNER.len()];
                let line = truncate(&format!("{frame} {}", checkpoint.description), width);
                return renderer.render_comment(&line);
            }

            let mut truncated = checkpoint.clone();
            truncated.description = truncate(&checkpoint.description, width.saturating_sub(2));
            return renderer.render_checkpoint(&truncated);
        })
        .collect();
}

fn prompt_lines(session: &SessionState, renderer: &Renderer, width: usize) -> LiveView {
    let (cursor_row, cursor_col) = session.textarea.cursor();
    let available = width.saturating_sub(PROMPT_WIDTH).max(1);

    let mut view = LiveView::default();
    for (idx, line) in session.textarea.lines().iter().enumerate() {
        let prefix = if idx == 0 {
            renderer.render_prompt()
        } else {
            " ".repeat(PROMPT_WIDTH)
        };

        // Scroll the cursor line horizontally so the cursor stays on screen.
        let offset = if idx == cursor_row {
            (cursor_col + 1).saturating_sub(available)
        } else {
            0
        };
        let visible = line.chars().skip(offset).take(available).collect::<String>();
        view.lines.push(format!("{prefix}{visible}"));

        if idx == cursor_row {
            let col = PROMPT_WIDTH + cursor_col - offset;
            view.cursor = Some((col as u16, idx as u16));
        }
    }

    return view;
}

fn confirm_line(question: &str, selected: bool, renderer: &Renderer, width: usize) -> String {
    let (yes, no) = if selected {
        ("[Yes]", " No ")
    } else {
        (" Yes ", "[No]")
    };

    let line = truncate(&format!("? {question} {yes} / {no}"), width);
    return renderer.render_warning(&line);
}

pub fn live_view(session: &SessionState, renderer: &Renderer, width: u16, height: u16) -> LiveView {
    let width = usize::from(width).max(1);
    let height = usize::from(height).max(1);

    let querying = match &session.mode {
        Mode::Querying => true,
        Mode::Confirming(confirmation) => confirmation.resume == ResumeMode::Querying,
        Mode::Idle => false,
    };

    let mut top = vec![];
    if querying {
        top.extend(checkpoint_lines(session, renderer, width));
    }

    let mut bottom = match &session.mode {
        Mode::Confirming(confirmation) => LiveView {
            lines: vec![confirm_line(
                &confirmation.question,
                confirmation.selected,
                renderer,
                width,
            )],
            cursor: None,
        },
        _ => prompt_lines(session, renderer, width),
    };

    // The partial response fills what is left, newest lines first.
    let mut streamed = vec![];
    if querying && !session.stream_buffer.is_empty() {
        let budget = height.saturating_sub(top.len() + bottom.lines.len());
        let lines = session.stream_buffer.as_str().lines().collect::<Vec<&str>>();
        let skip = lines.len().saturating_sub(budget);
        streamed = lines
            .iter()
            .skip(skip)
            .map(|e| return truncate(e, width))
            .collect::<Vec<String>>();
    }

    let mut lines = top;
    lines.extend(streamed);

    // Keep the prompt when the terminal is too short for everything.
    let overflow = (lines.len() + bottom.lines.len()).saturating_sub(height);
    lines.drain(..overflow.min(lines.len()));

    let offset = lines.len() as u16;
    bottom.cursor = bottom.cursor.map(|(col, row)| return (col, row + offset));
    lines.extend(bottom.lines);

    return LiveView {
        lines,
        cursor: bottom.cursor,
    };
}
