//! Advisory parse diagnostics.
//!
//! Nothing here stops translation: every diagnostic is raised after the
//! machine has already chosen its best-effort output.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParseErrorCode {
    InvalidAttributeName,
    InvalidRepeatCount,
    EmptySpecialChar,
}

impl fmt::Display for ParseErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorCode::InvalidAttributeName => f.write_str("invalid-attribute-name"),
            ParseErrorCode::InvalidRepeatCount => f.write_str("invalid-repeat-count"),
            ParseErrorCode::EmptySpecialChar => f.write_str("empty-special-char"),
        }
    }
}

/// Location of a diagnostic. `line` is 1-based; `offset` is the byte offset
/// from the start of the document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub offset: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub code: ParseErrorCode,
    pub message: String,
    pub position: Position,
    pub token: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at line {} (byte {}): {} [{:?}]",
            self.code, self.position.line, self.position.offset, self.message, self.token
        )
    }
}

pub trait DiagnosticSink {
    fn on_parse_error(&mut self, error: ParseError);
}

/// Default sink: one `warn` record per diagnostic.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn on_parse_error(&mut self, error: ParseError) {
        log::warn!(target: "sxml::diagnostics", "{error}");
    }
}

impl DiagnosticSink for Vec<ParseError> {
    fn on_parse_error(&mut self, error: ParseError) {
        self.push(error);
    }
}

impl<D: DiagnosticSink + ?Sized> DiagnosticSink for &mut D {
    fn on_parse_error(&mut self, error: ParseError) {
        (**self).on_parse_error(error);
    }
}
