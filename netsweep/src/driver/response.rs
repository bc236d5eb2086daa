//! Output types for command execution.

use std::time::Duration;

use super::interactive::AutoAnswer;
use crate::channel::DevicePrompt;

/// Output of one command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// The command that was executed.
    pub command: String,

    /// The command output (command echo and trailing prompt removed).
    pub output: String,

    /// Time from sending the command until the prompt returned.
    pub elapsed: Duration,

    /// Interactive questions answered along the way.
    pub answers: Vec<AutoAnswer>,
}

impl CommandOutput {
    /// Create a new command output.
    pub fn new(
        command: impl Into<String>,
        output: impl Into<String>,
        elapsed: Duration,
        answers: Vec<AutoAnswer>,
    ) -> Self {
        Self {
            command: command.into(),
            output: output.into(),
            elapsed,
            answers,
        }
    }

    /// Check if the output contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.output.contains(pattern)
    }
}

impl std::fmt::Display for CommandOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.output)
    }
}

/// Everything collected from one host, in command order.
///
/// Filled in as commands complete, so it still holds the finished
/// commands when a later one fails.
#[derive(Debug, Clone, Default)]
pub struct HostOutput {
    /// Prompt captured when the session opened.
    pub prompt: DevicePrompt,

    /// One entry per completed command.
    pub outputs: Vec<CommandOutput>,
}

impl HostOutput {
    /// Outputs of all completed commands, separated by blank lines.
    pub fn joined(&self) -> String {
        join_outputs(&self.outputs)
    }
}

/// Command outputs in order, separated by blank lines.
pub(crate) fn join_outputs(outputs: &[CommandOutput]) -> String {
    outputs
        .iter()
        .map(|o| o.output.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
