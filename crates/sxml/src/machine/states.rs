//! Lexical modes of the translator.

use crate::frame::Quote;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Plain text outside any pending construct.
    Scanning,
    /// `(` consumed; the next character picks the construct.
    OpenBracketSeen,
    TagName,
    AfterTagName,
    /// `(` seen while a tag still accepts attributes.
    AfterTagOpenParen,
    /// `(@` consumed.
    AttrFirstChar,
    /// Malformed attribute form, echoed up to its `)`.
    BadAttribute,
    AttrName,
    AttrAfterName,
    AttrValueQuoted(Quote),
    AttrValueUnquoted,
    /// `(&` consumed; reading the entity token.
    EscapeOperator,
    EscapeCount,
    /// Operands after the count, ignored up to `)`.
    EscapeDiscard,
    /// Entered with the cursor on the form's closing `)`.
    EscapeResolve,
    /// A bracket literal closed; one more `)` is swallowed.
    BracketLiteralClose,
    /// Inside `#( ... )#`.
    TrapdoorOpen,
    TrapdoorMaybeClose,
    /// A chunk ended on `#`.
    PossibleEscape,
}
