//! Per-host command sequencing.

use std::time::Instant;

use log::{debug, info, trace, warn};

use super::config::DriverConfig;
use super::interactive::AutoAnswer;
use super::response::{CommandOutput, HostOutput};
use crate::channel::{CaptureOutcome, PromptDetector, PromptKind, ScreenBuffer, TerminalSession};
use crate::error::{DriverError, Result};

/// Where a single command is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    SendingCommand,
    AwaitingCompletion,
    HandlingInteractivePrompt(PromptKind),
}

/// Sends a command sequence through a [`TerminalSession`] and waits for
/// the device prompt after each one.
///
/// # Example
///
/// ```rust,no_run
/// use netsweep::channel::{PtyConfig, SshTerminal, TerminalSession};
/// use netsweep::driver::{CommandDriver, DriverConfig, HostOutput};
/// use netsweep::transport::{AuthMethod, SshConfig};
///
/// # async fn example() -> Result<(), netsweep::Error> {
/// let ssh = SshConfig::new("192.168.1.1", "admin", AuthMethod::password("secret"));
/// let mut session = SshTerminal::open(ssh, PtyConfig::default()).await?;
///
/// let driver = CommandDriver::new(DriverConfig::default());
/// let mut output = HostOutput::default();
/// let result = driver.run(&mut session, &["show version".to_string()], &mut output).await;
/// session.close().await?;
/// result?;
///
/// println!("{}", output.joined());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandDriver {
    config: DriverConfig,
}

impl CommandDriver {
    /// Create a driver. It holds no session state and can be shared
    /// across hosts.
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    /// Capture the device prompt and run the session-setup commands.
    pub async fn open<S: TerminalSession>(&self, session: &mut S) -> Result<PromptDetector> {
        let prompt = session.capture_prompt(self.config.prompt_settle).await?;
        if prompt.is_empty() {
            warn!("no prompt captured after banner; commands cannot be detected as complete");
        } else {
            debug!("captured device prompt {:?}", prompt.as_str());
        }

        let detector = PromptDetector::new(prompt);
        for command in &self.config.on_open_commands {
            self.execute(session, &detector, command, self.config.setup_timeout)
                .await?;
        }

        Ok(detector)
    }

    /// Send one command and wait for the prompt to come back.
    pub async fn send_command<S: TerminalSession>(
        &self,
        session: &mut S,
        detector: &PromptDetector,
        command: &str,
    ) -> Result<CommandOutput> {
        self.execute(session, detector, command, self.config.command_timeout)
            .await
    }

    /// Open the session and run every command in order.
    ///
    /// Completed commands are appended to `output` as they finish. The
    /// first failure stops the sequence and is returned; whatever finished
    /// before it stays in `output`.
    pub async fn run<S: TerminalSession>(
        &self,
        session: &mut S,
        commands: &[String],
        output: &mut HostOutput,
    ) -> Result<()> {
        let detector = self.open(session).await?;
        output.prompt = detector.prompt().clone();

        for (index, command) in commands.iter().enumerate() {
            let result = self.send_command(session, &detector, command).await?;
            info!(
                "{}: command {}/{} done in {:?}: {}",
                detector.prompt().hostname(),
                index + 1,
                commands.len(),
                result.elapsed,
                command
            );
            output.outputs.push(result);
        }

        Ok(())
    }

    async fn execute<S: TerminalSession>(
        &self,
        session: &mut S,
        detector: &PromptDetector,
        command: &str,
        timeout: std::time::Duration,
    ) -> Result<CommandOutput> {
        let start = Instant::now();
        let mut screen = ScreenBuffer::new();
        let mut answers: Vec<AutoAnswer> = Vec::new();
        // start of the screen line last answered; its echo must not re-trigger
        let mut answered_line: Option<usize> = None;
        let mut step = Step::SendingCommand;

        loop {
            step = match step {
                Step::SendingCommand => {
                    session.send(&format!("{command}\n")).await?;
                    Step::AwaitingCompletion
                }

                Step::AwaitingCompletion => {
                    if start.elapsed() >= timeout {
                        return Err(exceeded(command, start, answers.len()));
                    }

                    let chunk = session.poll_buffer().await?;
                    let outcome = if chunk.is_empty() {
                        CaptureOutcome::StillRunning
                    } else {
                        screen.extend(&chunk);
                        detector.detect(screen.as_slice(), command)
                    };

                    match outcome {
                        CaptureOutcome::Complete(text) => {
                            return Ok(CommandOutput::new(command, text, start.elapsed(), answers));
                        }
                        CaptureOutcome::InteractivePrompt(kind)
                            if answered_line != Some(screen.last_line_start()) =>
                        {
                            Step::HandlingInteractivePrompt(kind)
                        }
                        _ => {
                            trace!("{:?} still running after {:?}", command, start.elapsed());
                            tokio::time::sleep(self.config.poll_interval).await;
                            Step::AwaitingCompletion
                        }
                    }
                }

                Step::HandlingInteractivePrompt(kind) => {
                    if answers.len() >= self.config.max_interactive_responses {
                        return Err(exceeded(command, start, answers.len()));
                    }

                    let line = String::from_utf8_lossy(screen.last_line()).trim().to_string();
                    info!("answering {:?} with {:?} ({:?})", line, kind.response(), kind);
                    session.send(kind.response()).await?;

                    answered_line = Some(screen.last_line_start());
                    answers.push(AutoAnswer::new(kind, line));
                    tokio::time::sleep(self.config.response_delay).await;
                    Step::AwaitingCompletion
                }
            };
        }
    }
}

fn exceeded(command: &str, start: Instant, responses: usize) -> crate::Error {
    DriverError::InteractiveLoopExceeded {
        command: command.to_string(),
        elapsed: start.elapsed(),
        responses,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::channel::NO_CHANGE_DETECTED;
    use crate::error::{ChannelError, Error};
    use crate::testing::{Reply, ScriptedSession, fast_config};

    fn commands(list: &[&str]) -> Vec<String> {
        list.iter().map(|c| c.to_string()).collect()
    }

    #[tokio::test]
    async fn test_single_command_success() {
        let mut session = ScriptedSession::new(vec![
            Reply::data("\r\nSwitch1#"),
            Reply::data("show version\r\nCisco IOS XE Software, Version 17.09.04a\r\nSwitch1#"),
        ]);
        let driver = CommandDriver::new(fast_config());
        let mut output = HostOutput::default();

        driver
            .run(&mut session, &commands(&["show version"]), &mut output)
            .await
            .unwrap();

        assert_eq!(output.prompt.as_str(), "Switch1#");
        assert_eq!(output.outputs.len(), 1);
        assert_eq!(output.outputs[0].output, "Cisco IOS XE Software, Version 17.09.04a");
        assert!(!output.outputs[0].contains("show version"));
        assert!(!output.outputs[0].contains("Switch1#"));
        assert_eq!(session.sent(), vec!["show version\n"]);
    }

    #[tokio::test]
    async fn test_setup_commands_run_first_and_are_not_reported() {
        let mut session = ScriptedSession::new(vec![
            Reply::data("Switch1#"),
            Reply::data("terminal length 0\r\nSwitch1#"),
            Reply::data("show clock\r\n*10:00:00.000 UTC Mon Jan 1 2024\r\nSwitch1#"),
        ]);
        let driver = CommandDriver::new(fast_config().with_on_open_commands(["terminal length 0"]));
        let mut output = HostOutput::default();

        driver
            .run(&mut session, &commands(&["show clock"]), &mut output)
            .await
            .unwrap();

        assert_eq!(session.sent(), vec!["terminal length 0\n", "show clock\n"]);
        assert_eq!(output.outputs.len(), 1);
        assert_eq!(output.outputs[0].command, "show clock");
    }

    #[tokio::test]
    async fn test_confirm_prompt_answered_once() {
        let mut session = ScriptedSession::new(vec![
            Reply::data("Switch1#"),
            Reply::data("reload\r\nContinue? [confirm]"),
            Reply::data("\r\nSwitch1#"),
        ]);
        let driver = CommandDriver::new(fast_config());
        let mut output = HostOutput::default();

        driver
            .run(&mut session, &commands(&["reload"]), &mut output)
            .await
            .unwrap();

        assert_eq!(session.sent(), vec!["reload\n", "\n"]);
        let result = &output.outputs[0];
        assert_eq!(result.answers, vec![AutoAnswer::new(PromptKind::AcceptDefault, "Continue? [confirm]")]);
        assert_eq!(result.output, "Continue? [confirm]");
    }

    #[tokio::test]
    async fn test_yes_no_prompt_sends_y() {
        let mut session = ScriptedSession::new(vec![
            Reply::data("Switch1#"),
            Reply::data("request platform software package clean\r\nProceed with cleanup? [y/n]"),
            Reply::Silence,
            Reply::data("y\r\nFiles deleted\r\nSwitch1#"),
        ]);
        let driver = CommandDriver::new(fast_config());
        let mut output = HostOutput::default();

        driver
            .run(
                &mut session,
                &commands(&["request platform software package clean"]),
                &mut output,
            )
            .await
            .unwrap();

        assert_eq!(
            session.sent(),
            vec!["request platform software package clean\n", "y\n"]
        );
        assert!(output.outputs[0].contains("Files deleted"));
    }

    #[tokio::test]
    async fn test_echo_on_answered_line_does_not_reanswer() {
        let mut session = ScriptedSession::new(vec![
            Reply::data("Switch1#"),
            Reply::data("install\r\nProceed? [y/n]"),
            Reply::data("y"),
            Reply::data("\r\nInstalling...\r\nSwitch1#"),
        ]);
        let driver = CommandDriver::new(fast_config());
        let mut output = HostOutput::default();

        driver
            .run(&mut session, &commands(&["install"]), &mut output)
            .await
            .unwrap();

        assert_eq!(session.sent(), vec!["install\n", "y\n"]);
    }

    #[tokio::test]
    async fn test_long_running_command_polls_until_prompt() {
        let mut session = ScriptedSession::new(vec![
            Reply::data("Switch1#"),
            Reply::data("request platform software package install switch all file flash:cat9k.bin\r\n"),
            Reply::Silence,
            Reply::data("--- Starting install ---\r\n"),
            Reply::Silence,
            Reply::Silence,
            Reply::data("SUCCESS: install finished\r\nSwitch1#"),
        ]);
        let driver = CommandDriver::new(fast_config());
        let mut output = HostOutput::default();

        driver
            .run(
                &mut session,
                &commands(&["request platform software package install switch all file flash:cat9k.bin"]),
                &mut output,
            )
            .await
            .unwrap();

        assert_eq!(
            output.outputs[0].output,
            "--- Starting install ---\nSUCCESS: install finished"
        );
    }

    #[tokio::test]
    async fn test_prompt_only_screen_uses_sentinel() {
        let mut session = ScriptedSession::new(vec![Reply::data("Switch1#"), Reply::data("Switch1#")]);
        let driver = CommandDriver::new(fast_config());
        let mut output = HostOutput::default();

        driver
            .run(&mut session, &commands(&["clear counters"]), &mut output)
            .await
            .unwrap();

        assert_eq!(output.outputs[0].output, NO_CHANGE_DETECTED);
    }

    #[tokio::test]
    async fn test_all_command_outputs_retained() {
        let mut session = ScriptedSession::new(vec![
            Reply::data("Switch1#"),
            Reply::data("show clock\r\n*10:00\r\nSwitch1#"),
            Reply::data("show users\r\nvty 0 admin\r\nSwitch1#"),
        ]);
        let driver = CommandDriver::new(fast_config());
        let mut output = HostOutput::default();

        driver
            .run(&mut session, &commands(&["show clock", "show users"]), &mut output)
            .await
            .unwrap();

        assert_eq!(output.outputs.len(), 2);
        assert_eq!(output.joined(), "*10:00\n\nvty 0 admin");
    }

    #[tokio::test]
    async fn test_failure_mid_sequence_keeps_completed_outputs() {
        let mut session = ScriptedSession::new(vec![
            Reply::data("Switch1#"),
            Reply::data("show clock\r\n*10:00\r\nSwitch1#"),
            Reply::Fail,
        ]);
        let driver = CommandDriver::new(fast_config());
        let mut output = HostOutput::default();

        let err = driver
            .run(
                &mut session,
                &commands(&["show clock", "show users", "show version"]),
                &mut output,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Channel(ChannelError::Closed)));
        assert_eq!(output.outputs.len(), 1);
        assert_eq!(session.sent(), vec!["show clock\n", "show users\n"]);
    }

    #[tokio::test]
    async fn test_never_returning_prompt_is_bounded() {
        let mut session = ScriptedSession::new(vec![Reply::data("Switch1#"), Reply::data("debug all\r\n")])
            .with_tail(Reply::data("%DEBUG: packet\r\n"));
        let driver = CommandDriver::new(fast_config().with_command_timeout(Duration::from_millis(30)));
        let mut output = HostOutput::default();

        let err = driver
            .run(&mut session, &commands(&["debug all"]), &mut output)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Driver(DriverError::InteractiveLoopExceeded { ref command, .. }) if command == "debug all"
        ));
    }

    #[tokio::test]
    async fn test_endless_questions_are_bounded() {
        let mut session = ScriptedSession::new(vec![Reply::data("Switch1#")])
            .with_tail(Reply::data("\r\nAre you sure? [confirm]"));
        let driver = CommandDriver::new(fast_config().with_max_interactive_responses(3));
        let mut output = HostOutput::default();

        let err = driver
            .run(&mut session, &commands(&["delete flash:old.bin"]), &mut output)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Driver(DriverError::InteractiveLoopExceeded { responses: 3, .. })
        ));
        assert_eq!(session.sent().len(), 4);
    }

    #[tokio::test]
    async fn test_missing_banner_degrades_to_timeout() {
        let mut session = ScriptedSession::new(vec![Reply::Silence, Reply::data("show clock\r\n*10:00\r\nSwitch1#")]);
        let driver = CommandDriver::new(fast_config().with_command_timeout(Duration::from_millis(20)));
        let mut output = HostOutput::default();

        let err = driver
            .run(&mut session, &commands(&["show clock"]), &mut output)
            .await
            .unwrap_err();

        assert!(output.prompt.is_empty());
        assert!(matches!(err, Error::Driver(DriverError::InteractiveLoopExceeded { .. })));
    }

    #[tokio::test]
    async fn test_replay_is_idempotent() {
        let script = || {
            ScriptedSession::new(vec![
                Reply::data("Switch1#"),
                Reply::data("show inventory\r\nNAME: \"Switch 1\"\r\n"),
                Reply::data("PID: C9300-48P\r\nContinue? [confirm]"),
                Reply::data("\r\nSwitch1#"),
            ])
        };
        let driver = CommandDriver::new(fast_config());

        let mut first = HostOutput::default();
        driver
            .run(&mut script(), &commands(&["show inventory"]), &mut first)
            .await
            .unwrap();
        let mut second = HostOutput::default();
        driver
            .run(&mut script(), &commands(&["show inventory"]), &mut second)
            .await
            .unwrap();

        assert_eq!(first.joined(), second.joined());
        assert_eq!(first.outputs[0].answers, second.outputs[0].answers);
    }
}
