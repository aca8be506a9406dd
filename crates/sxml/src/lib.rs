//! Streaming translator from s-expression markup to HTML.
//!
//! `(tag ...)` forms become elements, `(@name value)` forms in a tag's
//! leading position become attributes, `(&tok n)` repeats a character
//! entity, `((...))` passes parenthesized text through and `#( ... )#`
//! passes raw text through untouched. Input may arrive in chunks of any
//! size; see [`Session`].

pub mod diagnostics;
pub mod frame;
pub mod operator;
pub mod render;
pub mod special;

mod cursor;
mod machine;
mod session;

pub use crate::diagnostics::{DiagnosticSink, LogSink, ParseError, ParseErrorCode, Position};
pub use crate::frame::{Attribute, AttributeValue, Quote, SpecialChar, Tag};
pub use crate::machine::State;
pub use crate::operator::{Operator, classify};
pub use crate::render::{HtmlRenderer, Render, RenderEvent};
pub use crate::session::{Session, SessionConfig, SessionStats, translate};
