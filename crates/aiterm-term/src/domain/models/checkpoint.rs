use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CheckpointStatus {
    Loading,
    Success,
    Warning,
    Error,
}

/// One progress step of a running command.
///
/// A terminal checkpoint ends the command: with `Error` status its detail is
/// the failure shown to the user, otherwise the detail is the command's final
/// output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub description: String,
    pub status: CheckpointStatus,
    pub detail: Option<String>,
    pub terminal: bool,
}

impl Checkpoint {
    pub fn new(status: CheckpointStatus, description: &str) -> Checkpoint {
        return Checkpoint {
            description: description.to_string(),
            status,
            detail: None,
            terminal: false,
        };
    }

    pub fn loading(description: &str) -> Checkpoint {
        return Checkpoint::new(CheckpointStatus::Loading, description);
    }

    pub fn success(description: &str) -> Checkpoint {
        return Checkpoint::new(CheckpointStatus::Success, description);
    }

    pub fn warning(description: &str) -> Checkpoint {
        return Checkpoint::new(CheckpointStatus::Warning, description);
    }

    pub fn error(description: &str, detail: &str) -> Checkpoint {
        return Checkpoint::new(CheckpointStatus::Error, description)
            .with_detail(detail)
            .finished();
    }

    pub fn with_detail(mut self, detail: &str) -> Checkpoint {
        self.detail = Some(detail.to_string());
        return self;
    }

    pub fn finished(mut self) -> Checkpoint {
        self.terminal = true;
        return self;
    }

    pub fn icon(&self) -> &'static str {
        return match self.status {
            CheckpointStatus::Loading => "•",
            CheckpointStatus::Success => "✓",
            CheckpointStatus::Warning => "!",
            CheckpointStatus::Error => "✗",
        };
    }
}
