//! Positional view over the current record text during decode.
//!
//! A [`LineCursor`] is created per record, consumed by the codec, and not
//! retained afterwards. It keeps a back-reference to the [`ForwardReader`]
//! that supplied the line so multi-line records can pull continuation
//! lines, and it remembers the line number for diagnostics.

use std::io::Read;

use crate::reader::ForwardReader;

/// Mutable view over one record's raw text.
pub struct LineCursor<'r, R> {
    line: String,
    /// Byte offset of the unconsumed remainder.
    pos: usize,
    line_number: usize,
    reader: &'r mut ForwardReader<R>,
}

impl<'r, R: Read> LineCursor<'r, R> {
    /// Wraps the line most recently produced by `reader`.
    pub fn new(line: String, reader: &'r mut ForwardReader<R>) -> Self {
        let line_number = reader.line_number();
        Self { line, pos: 0, line_number, reader }
    }

    /// Full record text, including any pulled continuation lines.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.line
    }

    /// Line number of the record's first physical line (1-based).
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Unconsumed remainder of the record text.
    #[must_use]
    pub fn remaining(&self) -> &str {
        &self.line[self.pos..]
    }

    /// Whether the whole record text has been consumed.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.line.len()
    }

    /// Takes exactly `width` characters from the current position.
    ///
    /// Returns `None` when fewer than `width` characters remain; the
    /// position is not advanced in that case.
    pub fn take_chars(&mut self, width: usize) -> Option<&str> {
        let rest = &self.line[self.pos..];
        let mut taken = 0;
        let mut end = 0;
        for (offset, ch) in rest.char_indices() {
            if taken == width {
                break;
            }
            taken += 1;
            end = offset + ch.len_utf8();
        }
        if taken < width {
            return None;
        }
        let start = self.pos;
        self.pos += end;
        Some(&self.line[start..start + end])
    }

    /// Pulls the next physical line from the reader and appends it to the
    /// record text (separated by `\n`).
    ///
    /// Returns `Ok(false)` at end of stream, or when the reader's
    /// `discard_forward` flag is off — continuation consumes lines
    /// permanently, so it is only allowed in discard mode.
    pub fn pull_continuation(&mut self) -> std::io::Result<bool> {
        if !self.reader.discard_forward() {
            return Ok(false);
        }
        match self.reader.read_next_line()? {
            Some(next) => {
                self.line.push('\n');
                self.line.push_str(&next);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
