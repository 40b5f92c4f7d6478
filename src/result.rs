use std::fmt;

/// Outcome of a command invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    Failure,
    /// The command declined to report success or failure.
    Undetermined,
    /// Explicit request to stop the current script or session.
    Abort,
}

/// Status plus the textual output of a command.
///
/// Results are never mutated after construction; the dispatcher re-wraps them
/// when a failure crosses a sub-command or chain boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    status: CommandStatus,
    message: String,
}

impl CommandResult {
    pub fn new(status: CommandStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(CommandStatus::Success, message)
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(CommandStatus::Failure, message)
    }

    pub fn abort(message: impl Into<String>) -> Self {
        Self::new(CommandStatus::Abort, message)
    }

    pub fn status(&self) -> CommandStatus {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn into_message(self) -> String {
        self.message
    }

    pub fn is_success(&self) -> bool {
        self.status == CommandStatus::Success
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            CommandStatus::Failure => write!(f, "FAIL: {}", self.message),
            CommandStatus::Undetermined => write!(f, "WARNING: {}", self.message),
            CommandStatus::Success | CommandStatus::Abort => f.write_str(&self.message),
        }
    }
}
