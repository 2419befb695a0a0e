use yansi::Paint;

use crate::domain::models::Checkpoint;
use crate::domain::models::CheckpointStatus;
use crate::domain::models::OutputFormat;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /help (/h) - Provides this help menu.
- /quit /exit (/q) - Exit aiterm.
- /clear - Clears the screen.
- /reset - Clears progress, input history and the pending response.
- /forget - Wipes the saved messages of this conversation, after confirmation.
- /status - Checks that the model endpoint is reachable.

HOTKEYS:
- Enter - Submit your message.
- Up arrow - Previous input.
- Down arrow - Next input.
- CTRL+O - Insert a line break at the cursor position.
- CTRL+L - Clear the screen.
- CTRL+R - Reset the session.
- CTRL+C - Exit, aborting any response in progress.
"#;

    return text.trim().to_string();
}

/// Turns text into display-ready strings. A plain renderer leaves text
/// unstyled, which is what tests and non-tty output want.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    styled: bool,
    raw: bool,
}

impl Default for Renderer {
    fn default() -> Renderer {
        return Renderer::new(OutputFormat::default());
    }
}

impl Renderer {
    /// Raw output skips styling and hands model text through untouched.
    pub fn new(format: OutputFormat) -> Renderer {
        return match format {
            OutputFormat::Markdown => Renderer {
                styled: true,
                raw: false,
            },
            OutputFormat::Raw => Renderer {
                styled: false,
                raw: true,
            },
        };
    }

    pub fn plain() -> Renderer {
        return Renderer {
            styled: false,
            raw: false,
        };
    }

    pub fn render_content(&self, text: &str) -> String {
        if self.raw {
            return text.to_string();
        }
        return text.trim_end().to_string();
    }

    pub fn render_error(&self, text: &str) -> String {
        if !self.styled {
            return format!("Error: {text}");
        }
        return Paint::red(format!("Error: {text}")).bold().to_string();
    }

    pub fn render_success(&self, text: &str) -> String {
        if !self.styled {
            return text.to_string();
        }
        return Paint::green(text).to_string();
    }

    pub fn render_warning(&self, text: &str) -> String {
        if !self.styled {
            return text.to_string();
        }
        return Paint::yellow(text).to_string();
    }

    pub fn render_comment(&self, text: &str) -> String {
        if !self.styled {
            return text.to_string();
        }
        return Paint::new(text).dimmed().to_string();
    }

    pub fn render_checkpoint(&self, checkpoint: &Checkpoint) -> String {
        let line = format!("{} {}", checkpoint.icon(), checkpoint.description);
        if !self.styled {
            return line;
        }

        return match checkpoint.status {
            CheckpointStatus::Loading => Paint::new(line).dimmed().to_string(),
            CheckpointStatus::Success => Paint::green(line).to_string(),
            CheckpointStatus::Warning => Paint::yellow(line).to_string(),
            CheckpointStatus::Error => Paint::red(line).to_string(),
        };
    }

    pub fn render_prompt(&self) -> String {
        if !self.styled {
            return "> ".to_string();
        }
        return Paint::cyan("> ").bold().to_string();
    }
}
