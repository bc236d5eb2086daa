//! Screen buffer accumulating the visible output of one command.
//!
//! Each chunk read from the terminal is stripped of escape sequences and
//! appended. Prompt detection only ever looks at the last line, so the
//! buffer keeps track of where that line starts.

use bytes::BytesMut;

use super::ansi::AnsiStripper;

/// Accumulated, ANSI-stripped screen output for a single command.
#[derive(Debug)]
pub struct ScreenBuffer {
    /// The accumulated output.
    buffer: BytesMut,

    /// Escape parser state carried between chunks.
    stripper: AnsiStripper,

    /// Scratch space reused for stripped chunks.
    scratch: Vec<u8>,
}

impl ScreenBuffer {
    /// Create an empty buffer with fresh escape-parser state.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            stripper: AnsiStripper::new(),
            scratch: Vec::with_capacity(1024),
        }
    }

    /// Extend the buffer with new data, stripping ANSI escape codes.
    ///
    /// Returns the number of visible bytes that were appended.
    pub fn extend(&mut self, data: &[u8]) -> usize {
        self.scratch.clear();
        self.stripper.strip(data, &mut self.scratch);
        self.buffer.extend_from_slice(&self.scratch);
        self.scratch.len()
    }

    /// Byte offset at which the last line begins.
    pub fn last_line_start(&self) -> usize {
        memchr::memrchr(b'\n', &self.buffer).map_or(0, |pos| pos + 1)
    }

    /// The bytes after the final newline.
    pub fn last_line(&self) -> &[u8] {
        &self.buffer[self.last_line_start()..]
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }
}

impl Default for ScreenBuffer {
    fn default() -> Self {
        Self::new()
    }
}
