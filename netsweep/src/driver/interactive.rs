//! Record of interactive questions answered on the device's behalf.
//!
//! Some commands stop and ask before continuing:
//! - `request platform software package clean` asks "Proceed? [y/n]"
//! - `copy running-config startup-config` asks for a destination filename
//! - long `show` output pauses at `--More--`
//!
//! The driver answers these from a fixed table (see [`PromptKind::response`])
//! and keeps an [`AutoAnswer`] for each one so the report shows what was
//! accepted.

use crate::channel::PromptKind;

/// One question answered while a command was running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoAnswer {
    /// What kind of question was detected.
    pub kind: PromptKind,

    /// The screen line that was answered.
    pub line: String,
}

impl AutoAnswer {
    /// Record an answer of `kind` given to the question on `line`.
    pub fn new(kind: PromptKind, line: impl Into<String>) -> Self {
        Self {
            kind,
            line: line.into(),
        }
    }

    /// The text that was sent.
    pub fn response(&self) -> &'static str {
        self.kind.response()
    }
}
