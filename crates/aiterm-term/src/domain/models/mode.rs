use tokio::sync::oneshot;

use super::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeMode {
    Idle,
    Querying,
}

#[derive(Debug)]
pub enum ConfirmationTarget {
    /// A background command is waiting on the answer.
    Command(oneshot::Sender<Result<bool, SessionError>>),
    /// `/forget` asked before wiping the conversation.
    ForgetConversation,
}

#[derive(Debug)]
pub struct Confirmation {
    pub question: String,
    pub selected: bool,
    pub resume: ResumeMode,
    pub target: ConfirmationTarget,
}

impl Confirmation {
    pub fn new(question: &str, resume: ResumeMode, target: ConfirmationTarget) -> Confirmation {
        return Confirmation {
            question: question.to_string(),
            selected: true,
            resume,
            target,
        };
    }

    pub fn toggle(&mut self) {
        self.selected = !self.selected;
    }
}

#[derive(Debug, Default)]
pub enum Mode {
    #[default]
    Idle,
    Querying,
    Confirming(Confirmation),
}

impl Mode {
    pub fn is_idle(&self) -> bool {
        return matches!(self, Mode::Idle);
    }

    pub fn is_querying(&self) -> bool {
        return matches!(self, Mode::Querying);
    }

    pub fn is_confirming(&self) -> bool {
        return matches!(self, Mode::Confirming(_));
    }

    pub fn resume_mode(&self) -> ResumeMode {
        return match self {
            Mode::Querying => ResumeMode::Querying,
            Mode::Confirming(confirmation) => confirmation.resume,
            Mode::Idle => ResumeMode::Idle,
        };
    }
}

impl From<ResumeMode> for Mode {
    fn from(resume: ResumeMode) -> Mode {
        return match resume {
            ResumeMode::Idle => Mode::Idle,
            ResumeMode::Querying => Mode::Querying,
        };
    }
}
