//! Chunked translation state machine.
//!
//! Each step consumes as much of the current chunk as forms one complete
//! decision and returns. A step that runs out of chunk mid-construct leaves
//! everything it needs in the session (state, frame payloads, whitespace
//! buffer) and reports `NeedMoreInput`; the next chunk picks up from there.
//!
//! Invariants:
//! - `NeedMoreInput` is only returned once the chunk is exhausted.
//! - The whitespace buffer is empty whenever the machine is in `Scanning`.
//! - Diagnostics never change output.

use memchr::{memchr, memchr3};

use crate::cursor::Cursor;
use crate::diagnostics::{DiagnosticSink, ParseError, ParseErrorCode, Position};
use crate::frame::{
    Attribute, AttributeValue, Frame, FrameKind, Quote, SpecialChar, Tag, is_valid_attribute_name,
};
use crate::operator::{Operator, classify};
use crate::render::{Render, RenderEvent};
use crate::session::Session;
use crate::special::{entity_for, escape_angle_brackets, parse_repeat};

mod states;

pub use states::State;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Progress,
    NeedMoreInput,
}

/// Steps allowed without the cursor moving before the machine is considered
/// stuck.
const MAX_STEPS_PER_PUMP: usize = 16_384;

impl<R: Render, D: DiagnosticSink> Session<R, D> {
    /// Run the machine over `chunk` until it asks for more input.
    pub(crate) fn pump(&mut self, chunk: &str) {
        let mut cursor = Cursor::new(chunk);
        let mut window_start = cursor.offset();
        let mut remaining_budget = MAX_STEPS_PER_PUMP;

        loop {
            self.stats.steps = self.stats.steps.saturating_add(1);
            match self.step(&mut cursor) {
                Step::Progress => {}
                Step::NeedMoreInput => break,
            }
            remaining_budget -= 1;
            if remaining_budget == 0 {
                #[cfg(any(test, feature = "debug-stats"))]
                log::trace!(
                    target: "sxml.machine",
                    "step budget window closed: state={:?} cursor={} (window start {})",
                    self.state,
                    cursor.offset(),
                    window_start
                );
                assert_ne!(
                    cursor.offset(),
                    window_start,
                    "translator step budget exhausted without progress: state={:?} cursor={} frames={}",
                    self.state,
                    cursor.offset(),
                    self.stack.len()
                );
                window_start = cursor.offset();
                remaining_budget = MAX_STEPS_PER_PUMP;
            }
        }

        debug_assert!(
            cursor.is_exhausted(),
            "machine suspended with unread input: state={:?} cursor={}",
            self.state,
            cursor.offset()
        );
    }

    fn transition_to(&mut self, next: State) {
        if self.state == next {
            return;
        }
        #[cfg(any(test, feature = "debug-stats"))]
        {
            log::trace!(target: "sxml.machine", "state {:?} -> {:?}", self.state, next);
        }
        self.state = next;
        self.stats.state_transitions = self.stats.state_transitions.saturating_add(1);
    }

    fn step(&mut self, cursor: &mut Cursor<'_>) -> Step {
        match self.state {
            State::Scanning => self.step_scanning(cursor),
            State::OpenBracketSeen => self.step_open_bracket_seen(cursor),
            State::TagName => self.step_tag_name(cursor),
            State::AfterTagName => self.step_after_tag_name(cursor),
            State::AfterTagOpenParen => self.step_after_tag_open_paren(cursor),
            State::AttrFirstChar => self.step_attr_first_char(cursor),
            State::BadAttribute => self.step_bad_attribute(cursor),
            State::AttrName => self.step_attr_name(cursor),
            State::AttrAfterName => self.step_attr_after_name(cursor),
            State::AttrValueQuoted(quote) => self.step_attr_value_quoted(cursor, quote),
            State::AttrValueUnquoted => self.step_attr_value_unquoted(cursor),
            State::EscapeOperator => self.step_escape_operator(cursor),
            State::EscapeCount => self.step_escape_count(cursor),
            State::EscapeDiscard => self.step_escape_discard(cursor),
            State::EscapeResolve => self.step_escape_resolve(cursor),
            State::BracketLiteralClose => self.step_bracket_literal_close(cursor),
            State::TrapdoorOpen => self.step_trapdoor_open(cursor),
            State::TrapdoorMaybeClose => self.step_trapdoor_maybe_close(cursor),
            State::PossibleEscape => self.step_possible_escape(cursor),
        }
    }

    fn step_scanning(&mut self, cursor: &mut Cursor<'_>) -> Step {
        if cursor.is_exhausted() {
            return Step::NeedMoreInput;
        }
        let rest = cursor.remaining().as_bytes();
        let base = cursor.offset();
        let mut search_from = 0usize;
        loop {
            let Some(rel) = memchr3(b'(', b')', b'#', &rest[search_from..]) else {
                let text = cursor.read_to_end();
                self.emit_text(text);
                return Step::NeedMoreInput;
            };
            let at = search_from + rel;
            match rest[at] {
                b'#' => match rest.get(at + 1) {
                    Some(b'(') => {
                        let text = cursor.read_to(base + at);
                        self.emit_text(text);
                        cursor.advance(2);
                        self.transition_to(State::TrapdoorOpen);
                        return Step::Progress;
                    }
                    None => {
                        let text = cursor.read_to(base + at);
                        self.emit_text(text);
                        cursor.step();
                        self.transition_to(State::PossibleEscape);
                        return Step::Progress;
                    }
                    Some(_) => search_from = at + 1,
                },
                b'(' => {
                    let text = cursor.read_to(base + at);
                    self.emit_text(text);
                    cursor.step();
                    self.transition_to(State::OpenBracketSeen);
                    return Step::Progress;
                }
                _ => {
                    let text = cursor.read_to(base + at);
                    self.emit_text(text);
                    cursor.step();
                    self.close_top_frame(cursor);
                    return Step::Progress;
                }
            }
        }
    }

    fn step_open_bracket_seen(&mut self, cursor: &mut Cursor<'_>) -> Step {
        if cursor.is_exhausted() {
            return Step::NeedMoreInput;
        }
        let operator = classify(cursor.remaining());
        self.begin_form(cursor, operator, String::new())
    }

    /// Start the construct selected by `operator`. The cursor sits on the
    /// discriminating character.
    fn begin_form(
        &mut self,
        cursor: &mut Cursor<'_>,
        operator: Operator,
        leading_whitespace: String,
    ) -> Step {
        match operator {
            Operator::Tag => {
                let tag = Tag {
                    leading_whitespace,
                    ..Tag::default()
                };
                self.stack
                    .push(Frame::new(FrameKind::Tag(tag), State::Scanning));
                self.transition_to(State::TagName);
            }
            Operator::Attribute => {
                cursor.step();
                self.transition_to(State::AttrFirstChar);
            }
            Operator::Bracket => {
                cursor.step();
                self.stack.push(Frame::new(
                    FrameKind::BracketLiteral,
                    State::BracketLiteralClose,
                ));
                let text = self.renderer.render(RenderEvent::BeginEscapeBracket);
                self.emit(text);
                self.transition_to(State::Scanning);
            }
            Operator::SpecialChar => {
                cursor.step();
                self.stack.push(Frame::new(
                    FrameKind::SpecialChar(SpecialChar::default()),
                    State::Scanning,
                ));
                self.transition_to(State::EscapeOperator);
            }
            Operator::None => {
                self.emit("(".to_string());
                self.transition_to(State::Scanning);
            }
        }
        Step::Progress
    }

    fn step_tag_name(&mut self, cursor: &mut Cursor<'_>) -> Step {
        let token = cursor.read_token();
        if let Some(tag) = self.stack.top_tag_mut() {
            tag.name.push_str(token);
        }
        if cursor.is_exhausted() {
            return Step::NeedMoreInput;
        }
        self.transition_to(State::AfterTagName);
        Step::Progress
    }

    fn step_after_tag_name(&mut self, cursor: &mut Cursor<'_>) -> Step {
        let whitespace = cursor.read_whitespace();
        self.whitespace.push_str(whitespace);
        match cursor.peek() {
            None => Step::NeedMoreInput,
            Some(')') => {
                cursor.step();
                let trailing = std::mem::take(&mut self.whitespace);
                if let Some(tag) = self.stack.top_tag_mut() {
                    tag.trailing_whitespace = trailing;
                }
                self.close_top_frame(cursor);
                Step::Progress
            }
            Some('(') => {
                cursor.step();
                self.transition_to(State::AfterTagOpenParen);
                Step::Progress
            }
            Some(_) => {
                self.open_pending_tag();
                let separator = self.take_normalized_whitespace();
                self.emit(separator);
                self.transition_to(State::Scanning);
                Step::Progress
            }
        }
    }

    fn step_after_tag_open_paren(&mut self, cursor: &mut Cursor<'_>) -> Step {
        if cursor.is_exhausted() {
            return Step::NeedMoreInput;
        }
        match classify(cursor.remaining()) {
            Operator::Attribute => {
                // Buffered whitespace becomes the attribute's leading whitespace.
                cursor.step();
                self.transition_to(State::AttrFirstChar);
                Step::Progress
            }
            Operator::Tag => {
                let leading = self.take_normalized_whitespace();
                self.open_pending_tag();
                self.begin_form(cursor, Operator::Tag, leading)
            }
            other => {
                self.open_pending_tag();
                let separator = self.take_normalized_whitespace();
                self.emit(separator);
                self.begin_form(cursor, other, String::new())
            }
        }
    }

    fn step_attr_first_char(&mut self, cursor: &mut Cursor<'_>) -> Step {
        let Some(ch) = cursor.peek() else {
            return Step::NeedMoreInput;
        };
        let pending = self.stack.has_pending_tag();

        if ch == ')' {
            self.diagnose(
                cursor,
                ParseErrorCode::InvalidAttributeName,
                "empty attribute name",
                "",
            );
            cursor.step();
            if pending {
                self.transition_to(State::AfterTagName);
            } else {
                self.barf_whitespace();
                self.transition_to(State::Scanning);
            }
            return Step::Progress;
        }

        if ch.is_whitespace() || Quote::from_char(ch).is_some() {
            self.diagnose(
                cursor,
                ParseErrorCode::InvalidAttributeName,
                "attribute form must start with a name",
                ch.encode_utf8(&mut [0; 4]),
            );
            self.open_pending_tag();
            self.barf_whitespace();
            self.transition_to(State::BadAttribute);
            return Step::Progress;
        }

        cursor.step();
        let attr = Attribute {
            leading_whitespace: std::mem::take(&mut self.whitespace),
            name: ch.to_string(),
            values: Vec::new(),
        };
        let resume = if pending {
            State::AfterTagName
        } else {
            State::Scanning
        };
        self.stack
            .push(Frame::new(FrameKind::Attribute(attr), resume));
        self.transition_to(State::AttrName);
        Step::Progress
    }

    fn step_bad_attribute(&mut self, cursor: &mut Cursor<'_>) -> Step {
        let text = cursor.read_to_delim(b')');
        self.emit(text.to_string());
        if cursor.is_exhausted() {
            return Step::NeedMoreInput;
        }
        cursor.step();
        self.transition_to(State::Scanning);
        Step::Progress
    }

    fn step_attr_name(&mut self, cursor: &mut Cursor<'_>) -> Step {
        let token = cursor.read_token();
        if let Some(attr) = self.stack.top_attribute_mut() {
            attr.name.push_str(token);
        }
        if cursor.is_exhausted() {
            return Step::NeedMoreInput;
        }
        let invalid = self
            .stack
            .top_attribute_mut()
            .filter(|attr| !is_valid_attribute_name(&attr.name))
            .map(|attr| attr.name.clone());
        if let Some(name) = invalid {
            self.diagnose(
                cursor,
                ParseErrorCode::InvalidAttributeName,
                "invalid attribute name",
                &name,
            );
        }
        self.transition_to(State::AttrAfterName);
        Step::Progress
    }

    fn step_attr_after_name(&mut self, cursor: &mut Cursor<'_>) -> Step {
        cursor.skip_whitespace(usize::MAX);
        let Some(ch) = cursor.peek() else {
            return Step::NeedMoreInput;
        };
        if ch == ')' {
            cursor.step();
            self.close_top_frame(cursor);
            return Step::Progress;
        }
        let (value, next) = match Quote::from_char(ch) {
            Some(quote) => {
                cursor.step();
                (
                    AttributeValue::Quoted {
                        quote,
                        text: String::new(),
                    },
                    State::AttrValueQuoted(quote),
                )
            }
            None => (
                AttributeValue::Unquoted(String::new()),
                State::AttrValueUnquoted,
            ),
        };
        if let Some(attr) = self.stack.top_attribute_mut() {
            attr.values.push(value);
        }
        self.transition_to(next);
        Step::Progress
    }

    fn step_attr_value_quoted(&mut self, cursor: &mut Cursor<'_>, quote: Quote) -> Step {
        if cursor.is_exhausted() {
            return Step::NeedMoreInput;
        }
        let rest = cursor.remaining().as_bytes();
        let base = cursor.offset();
        let mut search_from = 0usize;
        loop {
            let Some(rel) = memchr(quote.as_byte(), &rest[search_from..]) else {
                let text = cursor.read_to_end();
                self.append_value_text(text);
                return Step::NeedMoreInput;
            };
            let at = base + search_from + rel;
            if self.quote_is_escaped(cursor, at) {
                search_from += rel + 1;
                continue;
            }
            let text = cursor.read_to(at);
            self.append_value_text(text);
            cursor.step();
            self.transition_to(State::AttrAfterName);
            return Step::Progress;
        }
    }

    /// A quote is escaped when a backslash precedes it, looking back into the
    /// previous chunk when the quote opens this one.
    fn quote_is_escaped(&self, cursor: &Cursor<'_>, at: usize) -> bool {
        let before = if at == 0 {
            self.tail_char
        } else {
            cursor.char_before(at)
        };
        before == Some('\\')
    }

    fn step_attr_value_unquoted(&mut self, cursor: &mut Cursor<'_>) -> Step {
        let text = cursor.read_to_delim(b')');
        self.append_value_text(text);
        if cursor.is_exhausted() {
            return Step::NeedMoreInput;
        }
        self.transition_to(State::AttrAfterName);
        Step::Progress
    }

    fn append_value_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(value) = self
            .stack
            .top_attribute_mut()
            .and_then(|attr| attr.values.last_mut())
        {
            value.push_str(text);
        }
    }

    fn step_escape_operator(&mut self, cursor: &mut Cursor<'_>) -> Step {
        let token = cursor.read_token();
        let Some(special) = self.stack.top_special_mut() else {
            return Step::NeedMoreInput;
        };
        special.token.push_str(token);
        match cursor.peek() {
            None => Step::NeedMoreInput,
            Some(')') => {
                special.repeat = 1;
                self.transition_to(State::EscapeResolve);
                Step::Progress
            }
            Some(_) => {
                cursor.step();
                self.transition_to(State::EscapeCount);
                Step::Progress
            }
        }
    }

    fn step_escape_count(&mut self, cursor: &mut Cursor<'_>) -> Step {
        let Some(special) = self.stack.top_special_mut() else {
            return Step::NeedMoreInput;
        };
        if special.count_text.is_empty() {
            cursor.skip_whitespace(usize::MAX);
        }
        special.count_text.push_str(cursor.read_token());
        let Some(next) = cursor.peek() else {
            return Step::NeedMoreInput;
        };
        self.settle_repeat_count(cursor);
        if next == ')' {
            self.transition_to(State::EscapeResolve);
        } else {
            self.transition_to(State::EscapeDiscard);
        }
        Step::Progress
    }

    fn settle_repeat_count(&mut self, cursor: &Cursor<'_>) {
        let limit = self.config.max_entity_repeat;
        let Some(special) = self.stack.top_special_mut() else {
            return;
        };
        let (repeat, problem) = match parse_repeat(&special.count_text) {
            None => (0, Some("repeat count has no digits")),
            Some(n) if n > limit => (limit, Some("repeat count above configured maximum")),
            Some(n) => (n, None),
        };
        special.repeat = repeat;
        if let Some(message) = problem {
            let count_text = special.count_text.clone();
            self.diagnose(
                cursor,
                ParseErrorCode::InvalidRepeatCount,
                message,
                &count_text,
            );
        }
    }

    fn step_escape_discard(&mut self, cursor: &mut Cursor<'_>) -> Step {
        cursor.read_to_delim(b')');
        if cursor.is_exhausted() {
            return Step::NeedMoreInput;
        }
        self.transition_to(State::EscapeResolve);
        Step::Progress
    }

    fn step_escape_resolve(&mut self, cursor: &mut Cursor<'_>) -> Step {
        match cursor.peek() {
            None => Step::NeedMoreInput,
            Some(ch) => {
                debug_assert_eq!(ch, ')');
                cursor.step();
                self.close_top_frame(cursor);
                Step::Progress
            }
        }
    }

    fn step_bracket_literal_close(&mut self, cursor: &mut Cursor<'_>) -> Step {
        match cursor.peek() {
            None => Step::NeedMoreInput,
            Some(ch) => {
                if ch == ')' {
                    cursor.step();
                }
                self.transition_to(State::Scanning);
                Step::Progress
            }
        }
    }

    fn step_trapdoor_open(&mut self, cursor: &mut Cursor<'_>) -> Step {
        let raw = cursor.read_to_delim(b')');
        self.emit(raw.to_string());
        if cursor.is_exhausted() {
            return Step::NeedMoreInput;
        }
        cursor.step();
        self.transition_to(State::TrapdoorMaybeClose);
        Step::Progress
    }

    fn step_trapdoor_maybe_close(&mut self, cursor: &mut Cursor<'_>) -> Step {
        match cursor.peek() {
            None => Step::NeedMoreInput,
            Some('#') => {
                cursor.step();
                self.transition_to(State::Scanning);
                Step::Progress
            }
            Some(_) => {
                self.emit(")".to_string());
                self.transition_to(State::TrapdoorOpen);
                Step::Progress
            }
        }
    }

    fn step_possible_escape(&mut self, cursor: &mut Cursor<'_>) -> Step {
        match cursor.peek() {
            None => Step::NeedMoreInput,
            Some('(') => {
                cursor.step();
                self.transition_to(State::TrapdoorOpen);
                Step::Progress
            }
            Some(_) => {
                self.emit("#".to_string());
                self.transition_to(State::Scanning);
                Step::Progress
            }
        }
    }

    /// Pop the top frame after its `)` was consumed and render whatever it
    /// produces. With an empty stack the `)` is literal text.
    fn close_top_frame(&mut self, cursor: &Cursor<'_>) {
        let Some(frame) = self.stack.pop() else {
            self.emit(")".to_string());
            return;
        };
        match frame.kind {
            FrameKind::Tag(tag) => {
                let event = if tag.opened {
                    RenderEvent::CloseTag(&tag)
                } else {
                    RenderEvent::CloseTagNoChildren(&tag)
                };
                let text = self.renderer.render(event);
                self.emit(text);
            }
            FrameKind::Attribute(attr) => self.finish_attribute(attr),
            FrameKind::BracketLiteral => {
                let text = self.renderer.render(RenderEvent::EndEscapeBracket);
                self.emit(text);
            }
            FrameKind::SpecialChar(special) => self.resolve_special(cursor, &special),
        }
        self.transition_to(frame.resume);
    }

    fn finish_attribute(&mut self, attr: Attribute) {
        if let Some(tag) = self.stack.pending_tag_mut() {
            tag.attributes.push(attr);
            return;
        }
        let text = self.renderer.render(RenderEvent::LooseAttribute(&attr));
        self.emit(text);
    }

    fn resolve_special(&mut self, cursor: &Cursor<'_>, special: &SpecialChar) {
        if special.token.is_empty() {
            self.diagnose(
                cursor,
                ParseErrorCode::EmptySpecialChar,
                "special character form has no token",
                &special.count_text,
            );
        }
        if special.repeat == 0 {
            return;
        }
        let entity = entity_for(&special.token);
        self.emit(entity.repeat(special.repeat));
    }

    fn open_pending_tag(&mut self) {
        let Some(tag) = self.stack.pending_tag_mut() else {
            return;
        };
        let text = self.renderer.render(RenderEvent::OpenTag(&*tag));
        tag.opened = true;
        self.emit(text);
    }

    /// Whitespace between an open-tag and its first child: kept whole when it
    /// spans lines, otherwise minus one separator character.
    fn take_normalized_whitespace(&mut self) -> String {
        let mut whitespace = std::mem::take(&mut self.whitespace);
        if !whitespace.is_empty() && !whitespace.contains('\n') {
            whitespace.remove(0);
        }
        whitespace
    }

    fn barf_whitespace(&mut self) {
        let whitespace = std::mem::take(&mut self.whitespace);
        self.emit(whitespace);
    }

    fn emit_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let text = if self.config.escape_text {
            escape_angle_brackets(text).into_owned()
        } else {
            text.to_string()
        };
        self.emit(text);
    }

    fn emit(&mut self, fragment: String) {
        if fragment.is_empty() {
            return;
        }
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(target: "sxml.machine", "emit {:?} in {:?}", fragment, self.state);
        self.fragments.push(fragment);
        self.stats.fragments_emitted = self.stats.fragments_emitted.saturating_add(1);
    }

    fn diagnose(
        &mut self,
        cursor: &Cursor<'_>,
        code: ParseErrorCode,
        message: &str,
        token: &str,
    ) {
        let newlines = memchr::memchr_iter(b'\n', cursor.consumed().as_bytes()).count();
        let error = ParseError {
            code,
            message: message.to_string(),
            position: Position {
                line: self.line + newlines + 1,
                offset: self.offset + cursor.offset(),
            },
            token: token.to_string(),
        };
        self.stats.diagnostics = self.stats.diagnostics.saturating_add(1);
        self.diagnostics.on_parse_error(error);
    }
}
