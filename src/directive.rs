use std::str::FromStr;

use crate::error::DirectiveError;

/// Tri-state switches steering script execution.
///
/// `None` means "not specified here"; [`ExecutionDirective::patch`] only copies
/// the fields that are specified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionDirective {
    pub echo_off: Option<bool>,
    pub stop_on_error: Option<bool>,
    pub ignore_unknown_commands: Option<bool>,
}

impl ExecutionDirective {
    /// The directive a script run starts from.
    pub fn defaults() -> Self {
        Self {
            echo_off: Some(false),
            stop_on_error: Some(true),
            ignore_unknown_commands: Some(false),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.echo_off.is_none()
            && self.stop_on_error.is_none()
            && self.ignore_unknown_commands.is_none()
    }

    /// Overrides each field that `other` specifies.
    pub fn patch(&mut self, other: &ExecutionDirective) {
        if other.echo_off.is_some() {
            self.echo_off = other.echo_off;
        }
        if other.stop_on_error.is_some() {
            self.stop_on_error = other.stop_on_error;
        }
        if other.ignore_unknown_commands.is_some() {
            self.ignore_unknown_commands = other.ignore_unknown_commands;
        }
    }

    pub fn patched(mut self, other: &ExecutionDirective) -> Self {
        self.patch(other);
        self
    }

    pub fn echo_off(&self) -> bool {
        self.echo_off.unwrap_or(false)
    }

    pub fn stop_on_error(&self) -> bool {
        self.stop_on_error.unwrap_or(false)
    }

    pub fn ignore_unknown_commands(&self) -> bool {
        self.ignore_unknown_commands.unwrap_or(false)
    }
}

impl FromStr for ExecutionDirective {
    type Err = DirectiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut directive = Self::default();
        match s.trim().to_lowercase().as_str() {
            "echooff" => directive.echo_off = Some(true),
            "echoon" => directive.echo_off = Some(false),
            "stoponerror" => directive.stop_on_error = Some(true),
            "continueonerror" => directive.stop_on_error = Some(false),
            "ignoreunknowncommands" => directive.ignore_unknown_commands = Some(true),
            _ => return Err(DirectiveError(s.trim().to_string())),
        }
        Ok(directive)
    }
}
