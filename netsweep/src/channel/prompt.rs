//! The device prompt captured at session start.

use std::fmt;

/// Trailing shell prompt a device prints once it is idle (e.g. `Switch1#`).
///
/// Captured once per session and assumed fixed for its lifetime. An empty
/// prompt is a degraded mode: it never matches, so no command can complete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DevicePrompt(String);

impl DevicePrompt {
    /// Create a prompt from text, trimming surrounding whitespace.
    pub fn new(prompt: impl AsRef<str>) -> Self {
        Self(prompt.as_ref().trim().to_string())
    }

    /// The last non-empty line of an (already ANSI-stripped) banner.
    pub fn from_screen(screen: &[u8]) -> Self {
        String::from_utf8_lossy(screen)
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(Self::new)
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Exact comparison against a trimmed screen line.
    pub fn is_exact(&self, line: &str) -> bool {
        !self.0.is_empty() && line == self.0
    }

    /// Prefix comparison: the line starts with the prompt.
    pub fn matches(&self, line: &str) -> bool {
        !self.0.is_empty() && line.starts_with(&self.0)
    }

    /// Device hostname: the prompt without its trailing `#` or `>`.
    pub fn hostname(&self) -> &str {
        self.0.trim_end_matches(['#', '>']).trim_end()
    }
}

impl fmt::Display for DevicePrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
