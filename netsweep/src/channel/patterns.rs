//! Completion detection over the screen buffer.
//!
//! Only the last line of the screen is inspected. It is either an
//! interactive question the device is blocked on, the device prompt (the
//! command finished), or anything else (still running).

use std::sync::LazyLock;

use log::{debug, trace};
use regex::bytes::Regex;

use super::prompt::DevicePrompt;

/// Output reported when the screen holds fewer than two lines.
pub const NO_CHANGE_DETECTED: &str = "No change detected.";

static YES_NO_CUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i-u)\b(?:y/n|yes/no|yes or no)\b").expect("yes/no cue pattern is valid")
});

/// Kind of interactive question found on the last screen line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Bracketed yes/no question, e.g. `Proceed? [y/n]`.
    ConfirmYes,
    /// Bracketed default, e.g. `Destination filename [startup-config]?`.
    AcceptDefault,
    /// Pagination marker `-More-`.
    Paginate,
}

impl PromptKind {
    /// The exact bytes sent to answer this kind of question.
    pub fn response(self) -> &'static str {
        match self {
            PromptKind::ConfirmYes => "y\n",
            PromptKind::AcceptDefault => "\n",
            PromptKind::Paginate => " ",
        }
    }

    /// Classify a single screen line.
    pub fn classify(line: &str) -> Option<Self> {
        if line.contains('[') && line.contains(']') {
            if YES_NO_CUE.is_match(line.as_bytes()) {
                Some(PromptKind::ConfirmYes)
            } else {
                Some(PromptKind::AcceptDefault)
            }
        } else if line.contains("-More-") {
            Some(PromptKind::Paginate)
        } else {
            None
        }
    }
}

/// Result of one detection cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Nothing conclusive yet; poll again after a backoff.
    StillRunning,
    /// The device is waiting for an answer.
    InteractivePrompt(PromptKind),
    /// The prompt came back. Holds the output without echo and prompt lines.
    Complete(String),
}

/// Decides whether a command is finished by comparing the last screen
/// line against the captured [`DevicePrompt`].
///
/// A last line equal to the prompt always completes. Otherwise interactive
/// questions take priority, and a last line that merely starts with the
/// prompt also completes.
#[derive(Debug, Clone)]
pub struct PromptDetector {
    prompt: DevicePrompt,
}

impl PromptDetector {
    /// Create a detector for the prompt captured when the session opened.
    pub fn new(prompt: DevicePrompt) -> Self {
        Self { prompt }
    }

    /// The prompt this detector completes on.
    pub fn prompt(&self) -> &DevicePrompt {
        &self.prompt
    }

    /// Classify the screen accumulated since `command` was sent.
    pub fn detect(&self, screen: &[u8], command: &str) -> CaptureOutcome {
        if screen.is_empty() {
            return CaptureOutcome::StillRunning;
        }

        let start = memchr::memrchr(b'\n', screen).map_or(0, |pos| pos + 1);
        let last_line = match std::str::from_utf8(&screen[start..]) {
            Ok(line) => line.trim(),
            Err(_) => {
                debug!("undecodable last line while running {:?}", command);
                return CaptureOutcome::StillRunning;
            }
        };

        trace!("last line for {:?}: {:?}", command, last_line);

        if self.prompt.is_exact(last_line) {
            return CaptureOutcome::Complete(extract_output(screen));
        }

        if let Some(kind) = PromptKind::classify(last_line) {
            return CaptureOutcome::InteractivePrompt(kind);
        }

        if self.prompt.matches(last_line) {
            return CaptureOutcome::Complete(extract_output(screen));
        }

        CaptureOutcome::StillRunning
    }
}

/// Drop the first line (command echo) and the last line (prompt).
fn extract_output(screen: &[u8]) -> String {
    let (Some(first), Some(last)) = (
        memchr::memchr(b'\n', screen),
        memchr::memrchr(b'\n', screen),
    ) else {
        return NO_CHANGE_DETECTED.to_string();
    };

    if first == last {
        return String::new();
    }

    String::from_utf8_lossy(&screen[first + 1..last])
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .collect::<Vec<_>>()
        .join("\n")
}
