//! Streaming ANSI escape stripper built on `vte`.
//!
//! Device output arrives in arbitrary chunks, so an escape sequence may be
//! split across two reads. The parser keeps its state between calls to
//! [`AnsiStripper::strip`].

use vte::{Parser, Perform};

/// Removes escape sequences and control bytes from terminal output.
///
/// Printable text, `\n`, `\r` and `\t` are kept. A backspace erases the
/// previous character on the current line, which is how pagination
/// markers get wiped after they are answered.
pub struct AnsiStripper {
    parser: Parser,
}

impl AnsiStripper {
    /// Create a stripper in the ground state.
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    /// Strip one chunk, appending the visible text to `out`.
    pub fn strip(&mut self, data: &[u8], out: &mut Vec<u8>) {
        let mut sink = TextSink { out };
        self.parser.advance(&mut sink, data);
    }
}

impl Default for AnsiStripper {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AnsiStripper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnsiStripper").finish_non_exhaustive()
    }
}

struct TextSink<'a> {
    out: &'a mut Vec<u8>,
}

impl TextSink<'_> {
    fn backspace(&mut self) {
        match self.out.last() {
            None | Some(b'\n') => {}
            Some(_) => {
                // drop a whole UTF-8 sequence, not just its last byte
                while let Some(byte) = self.out.pop() {
                    if byte & 0xC0 != 0x80 {
                        break;
                    }
                }
            }
        }
    }
}

impl Perform for TextSink<'_> {
    fn print(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            b'\n' | b'\r' | b'\t' => self.out.push(byte),
            0x08 => self.backspace(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(data: &[u8]) -> String {
        let mut out = Vec::new();
        AnsiStripper::new().strip(data, &mut out);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_color_codes_removed() {
        assert_eq!(strip(b"\x1b[32mGreen text\x1b[0m"), "Green text");
    }

    #[test]
    fn test_line_endings_kept() {
        assert_eq!(strip(b"show clock\r\n*10:00:00\r\nSwitch1#"), "show clock\r\n*10:00:00\r\nSwitch1#");
    }

    #[test]
    fn test_backspace_erases_more_marker() {
        assert_eq!(strip(b"line\r\n --More-- \x08\x08\x08\x08\x08\x08\x08\x08\x08\x08next"), "line\r\nnext");
    }

    #[test]
    fn test_sequence_split_across_chunks() {
        let mut stripper = AnsiStripper::new();
        let mut out = Vec::new();
        stripper.strip(b"abc\x1b[3", &mut out);
        stripper.strip(b"1mdef", &mut out);
        assert_eq!(out, b"abcdef");
    }
}
