//! Read cursor over a single input chunk.
//!
//! The cursor never owns text and never fails: running out of chunk is the
//! only signal, and the state machine suspends on it.

use memchr::memchr;

#[derive(Clone, Copy, Debug)]
pub(crate) struct Cursor<'c> {
    text: &'c str,
    pos: usize,
}

impl<'c> Cursor<'c> {
    pub(crate) fn new(text: &'c str) -> Self {
        Self { text, pos: 0 }
    }

    /// Byte offset of the cursor inside the chunk.
    pub(crate) fn offset(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> &'c str {
        &self.text[self.pos..]
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.pos >= self.text.len()
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// Character immediately before byte offset `at`, or `None` at the start
    /// of the chunk.
    pub(crate) fn char_before(&self, at: usize) -> Option<char> {
        self.text.get(..at)?.chars().next_back()
    }

    /// Text already consumed from this chunk.
    pub(crate) fn consumed(&self) -> &'c str {
        &self.text[..self.pos]
    }

    /// Move to `offset`, clamped to the chunk and rounded down to a char
    /// boundary.
    pub(crate) fn reset(&mut self, offset: usize) {
        let mut target = offset.min(self.text.len());
        while !self.text.is_char_boundary(target) {
            target -= 1;
        }
        self.pos = target;
    }

    /// Advance `n` bytes, rounding up to the next char boundary.
    pub(crate) fn advance(&mut self, n: usize) {
        let mut target = self.pos.saturating_add(n).min(self.text.len());
        while !self.text.is_char_boundary(target) {
            target += 1;
        }
        self.pos = target;
    }

    /// Consume one character.
    pub(crate) fn step(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Skip contiguous whitespace, never more than `limit` bytes. Returns the
    /// number of bytes skipped.
    pub(crate) fn skip_whitespace(&mut self, limit: usize) -> usize {
        let start = self.pos;
        for ch in self.remaining().chars() {
            if !ch.is_whitespace() || self.pos - start + ch.len_utf8() > limit {
                break;
            }
            self.pos += ch.len_utf8();
        }
        self.pos - start
    }

    pub(crate) fn read_whitespace(&mut self) -> &'c str {
        let start = self.pos;
        self.skip_whitespace(usize::MAX);
        &self.text[start..self.pos]
    }

    /// Read up to the chunk-relative byte `offset`.
    pub(crate) fn read_to(&mut self, offset: usize) -> &'c str {
        let start = self.pos;
        self.reset(offset.max(start));
        &self.text[start..self.pos]
    }

    /// Read up to (not including) the first `delim`, or to the end of the
    /// chunk when it does not occur. `delim` must be ASCII.
    pub(crate) fn read_to_delim(&mut self, delim: u8) -> &'c str {
        debug_assert!(delim.is_ascii());
        match memchr(delim, self.remaining().as_bytes()) {
            Some(rel) => self.read_to(self.pos + rel),
            None => self.read_to_end(),
        }
    }

    pub(crate) fn read_to_end(&mut self) -> &'c str {
        self.read_to(self.text.len())
    }

    /// Read an operator or operand: everything up to the first whitespace or
    /// `)`.
    pub(crate) fn read_token(&mut self) -> &'c str {
        let rest = self.remaining();
        let end = rest
            .char_indices()
            .find(|&(_, ch)| ch == ')' || ch.is_whitespace())
            .map_or(rest.len(), |(idx, _)| idx);
        self.read_to(self.pos + end)
    }
}

#[cfg(test)]
mod tests {
    use super::Cursor;

    #[test]
    fn read_token_stops_at_whitespace_or_close() {
        let mut cursor = Cursor::new("nbsp 4)");
        assert_eq!(cursor.read_token(), "nbsp");
        assert_eq!(cursor.peek(), Some(' '));
        cursor.step();
        assert_eq!(cursor.read_token(), "4");
        assert_eq!(cursor.peek(), Some(')'));
    }

    #[test]
    fn read_token_runs_to_chunk_end() {
        let mut cursor = Cursor::new("div");
        assert_eq!(cursor.read_token(), "div");
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.read_token(), "");
    }

    #[test]
    fn read_to_delim_without_match_reads_everything() {
        let mut cursor = Cursor::new("va\"l");
        assert_eq!(cursor.read_to_delim(b')'), "va\"l");
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn read_to_delim_leaves_delimiter_unconsumed() {
        let mut cursor = Cursor::new("((val)) tail");
        assert_eq!(cursor.read_to_delim(b')'), "((val");
        assert_eq!(cursor.peek(), Some(')'));
        assert_eq!(cursor.consumed(), "((val");
    }

    #[test]
    fn skip_whitespace_honours_limit() {
        let mut cursor = Cursor::new("   x");
        assert_eq!(cursor.skip_whitespace(2), 2);
        assert_eq!(cursor.offset(), 2);
        assert_eq!(cursor.read_whitespace(), " ");
        assert_eq!(cursor.peek(), Some('x'));
    }

    #[test]
    fn reset_clamps_to_char_boundary() {
        let mut cursor = Cursor::new("aé)");
        cursor.reset(2);
        assert_eq!(cursor.offset(), 1);
        cursor.reset(99);
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn advance_rounds_up_inside_multibyte_char() {
        let mut cursor = Cursor::new("é)");
        cursor.advance(1);
        assert_eq!(cursor.peek(), Some(')'));
    }

    #[test]
    fn char_before_is_none_at_chunk_start() {
        let cursor = Cursor::new("\\'x");
        assert_eq!(cursor.char_before(0), None);
        assert_eq!(cursor.char_before(1), Some('\\'));
    }
}
