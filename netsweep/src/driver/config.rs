//! Timing and bounds for driving commands.

use std::time::Duration;

/// How the [`CommandDriver`](super::CommandDriver) paces and bounds a session.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Backoff between polls while a command is still running.
    pub poll_interval: Duration,

    /// Pause after sending an answer to an interactive question.
    pub response_delay: Duration,

    /// How long to wait for the welcome banner before reading the prompt.
    pub prompt_settle: Duration,

    /// Upper bound on a single user command, firmware installs included.
    pub command_timeout: Duration,

    /// Upper bound on each session-setup command.
    pub setup_timeout: Duration,

    /// Maximum number of auto-answers for one command.
    pub max_interactive_responses: usize,

    /// Commands run after the prompt is captured; their output is discarded.
    pub on_open_commands: Vec<String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            response_delay: Duration::from_secs(2),
            prompt_settle: Duration::from_secs(2),
            command_timeout: Duration::from_secs(30 * 60),
            setup_timeout: Duration::from_secs(30),
            max_interactive_responses: 64,
            on_open_commands: vec!["terminal length 0".to_string()],
        }
    }
}

impl DriverConfig {
    /// Set the wait between polls while a command is still running.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the pause after sending an automatic answer.
    pub fn with_response_delay(mut self, delay: Duration) -> Self {
        self.response_delay = delay;
        self
    }

    /// Set how long to wait for the welcome banner before reading the prompt.
    pub fn with_prompt_settle(mut self, settle: Duration) -> Self {
        self.prompt_settle = settle;
        self
    }

    /// Set the longest a single command may run.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Set the longest a session-setup command may run.
    pub fn with_setup_timeout(mut self, timeout: Duration) -> Self {
        self.setup_timeout = timeout;
        self
    }

    /// Set how many automatic answers one command may receive.
    pub fn with_max_interactive_responses(mut self, max: usize) -> Self {
        self.max_interactive_responses = max;
        self
    }

    /// Replace the session-setup commands.
    pub fn with_on_open_commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.on_open_commands = commands.into_iter().map(Into::into).collect();
        self
    }
}
