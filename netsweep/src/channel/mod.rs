//! Channel layer for screen capture and completion detection.
//!
//! This module handles the interactive session: reading the device's
//! screen, stripping escape codes, and deciding from the last line
//! whether a command has finished.

mod ansi;
mod buffer;
mod patterns;
mod prompt;
mod pty;

pub use ansi::AnsiStripper;
pub use buffer::ScreenBuffer;
pub use patterns::{CaptureOutcome, NO_CHANGE_DETECTED, PromptDetector, PromptKind};
pub use prompt::DevicePrompt;
pub use pty::{PtyConfig, SshTerminal, TerminalSession};
