//! Open-construct frames and the lexical stack that owns them.

use crate::machine::State;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quote {
    Double,
    Single,
}

impl Quote {
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '"' => Some(Quote::Double),
            '\'' => Some(Quote::Single),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Quote::Double => '"',
            Quote::Single => '\'',
        }
    }

    pub(crate) fn as_byte(self) -> u8 {
        self.as_char() as u8
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttributeValue {
    Quoted { quote: Quote, text: String },
    Unquoted(String),
}

impl AttributeValue {
    pub(crate) fn push_str(&mut self, more: &str) {
        match self {
            AttributeValue::Quoted { text, .. } | AttributeValue::Unquoted(text) => {
                text.push_str(more)
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attribute {
    pub leading_whitespace: String,
    pub name: String,
    pub values: Vec<AttributeValue>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tag {
    pub leading_whitespace: String,
    pub name: String,
    pub attributes: Vec<Attribute>,
    /// Whitespace written before a self-closing `)`.
    pub trailing_whitespace: String,
    /// Set once the open-tag text has been rendered.
    pub opened: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpecialChar {
    pub token: String,
    pub count_text: String,
    pub repeat: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameKind {
    Tag(Tag),
    Attribute(Attribute),
    BracketLiteral,
    SpecialChar(SpecialChar),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub kind: FrameKind,
    /// State entered when this frame pops.
    pub(crate) resume: State,
}

impl Frame {
    pub(crate) fn new(kind: FrameKind, resume: State) -> Self {
        Self { kind, resume }
    }
}

#[derive(Debug, Default)]
pub(crate) struct LexicalStack {
    frames: Vec<Frame>,
}

impl LexicalStack {
    pub(crate) fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub(crate) fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    pub(crate) fn len(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub(crate) fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub(crate) fn top_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    /// The top frame when it is a tag whose open-tag has not been rendered.
    /// Attributes attach only to this tag.
    pub(crate) fn pending_tag_mut(&mut self) -> Option<&mut Tag> {
        match self.top_mut() {
            Some(Frame {
                kind: FrameKind::Tag(tag),
                ..
            }) if !tag.opened => Some(tag),
            _ => None,
        }
    }

    pub(crate) fn has_pending_tag(&self) -> bool {
        matches!(
            self.top(),
            Some(Frame {
                kind: FrameKind::Tag(tag),
                ..
            }) if !tag.opened
        )
    }

    pub(crate) fn top_tag_mut(&mut self) -> Option<&mut Tag> {
        match self.top_mut() {
            Some(Frame {
                kind: FrameKind::Tag(tag),
                ..
            }) => Some(tag),
            _ => None,
        }
    }

    pub(crate) fn top_attribute_mut(&mut self) -> Option<&mut Attribute> {
        match self.top_mut() {
            Some(Frame {
                kind: FrameKind::Attribute(attr),
                ..
            }) => Some(attr),
            _ => None,
        }
    }

    pub(crate) fn top_special_mut(&mut self) -> Option<&mut SpecialChar> {
        match self.top_mut() {
            Some(Frame {
                kind: FrameKind::SpecialChar(special),
                ..
            }) => Some(special),
            _ => None,
        }
    }
}

/// Attribute-name check: empty names, `" ' > / =`, controls, space and
/// Unicode noncharacters are rejected.
pub fn is_valid_attribute_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_attribute_name_char)
}

fn is_attribute_name_char(ch: char) -> bool {
    let cp = ch as u32;
    if matches!(ch, '"' | '\'' | '>' | '/' | '=') || cp <= 0x20 {
        return false;
    }
    if (0xFDD0..=0xFDEF).contains(&cp) {
        return false;
    }
    !matches!(cp & 0xFFFF, 0xFFFE | 0xFFFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &str) -> Frame {
        Frame::new(
            FrameKind::Tag(Tag {
                name: name.to_string(),
                ..Tag::default()
            }),
            State::Scanning,
        )
    }

    #[test]
    fn pending_tag_only_until_opened() {
        let mut stack = LexicalStack::default();
        assert!(stack.pending_tag_mut().is_none());
        stack.push(tag("p"));
        assert!(stack.has_pending_tag());
        if let Some(pending) = stack.pending_tag_mut() {
            pending.opened = true;
        }
        assert!(!stack.has_pending_tag());
        assert!(stack.top_tag_mut().is_some());
    }

    #[test]
    fn bracket_literal_hides_enclosing_tag() {
        let mut stack = LexicalStack::default();
        stack.push(tag("p"));
        stack.push(Frame::new(FrameKind::BracketLiteral, State::BracketLiteralClose));
        assert!(stack.pending_tag_mut().is_none());
        assert_eq!(stack.len(), 2);
        assert_eq!(
            stack.pop().map(|f| f.resume),
            Some(State::BracketLiteralClose)
        );
        assert!(stack.has_pending_tag());
    }

    #[test]
    fn attribute_names() {
        assert!(is_valid_attribute_name("data-x"));
        assert!(is_valid_attribute_name("ünï"));
        assert!(!is_valid_attribute_name(""));
        for bad in ["a=b", "a/b", "a>", "a\"", "a'", "a b", "a\u{7}"] {
            assert!(!is_valid_attribute_name(bad), "{bad:?}");
        }
    }

    #[test]
    fn noncharacters_are_rejected() {
        assert!(!is_valid_attribute_name("x\u{FDD0}"));
        assert!(!is_valid_attribute_name("x\u{FFFE}"));
        assert!(!is_valid_attribute_name("x\u{1FFFF}"));
        assert!(is_valid_attribute_name("x\u{FDF0}"));
    }
}
