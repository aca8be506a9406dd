//! Translation session public API.
//!
//! A session owns all parse state for one document. Text is fed in chunks of
//! any size; each call returns the output fragments that became final while
//! processing that chunk.
//!
//! Invariants:
//! - Chunk-equivalence: the concatenated output of any chunking of a
//!   document equals the output of feeding it whole.
//! - Nothing is ever flushed implicitly: constructs still open when input
//!   stops are not rendered.

use crate::diagnostics::{DiagnosticSink, LogSink};
use crate::frame::LexicalStack;
use crate::machine::State;
use crate::render::{HtmlRenderer, Render};

/// Session configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Upper bound for the repeat count of a special-character form.
    pub max_entity_repeat: usize,
    /// Replace `<` and `>` in literal text with entities.
    pub escape_text: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_entity_repeat: 4096,
            escape_text: true,
        }
    }
}

/// Session instrumentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub steps: u64,
    pub state_transitions: u64,
    pub fragments_emitted: u64,
    pub diagnostics: u64,
    pub chunks: u64,
}

pub struct Session<R: Render = HtmlRenderer, D: DiagnosticSink = LogSink> {
    pub(crate) config: SessionConfig,
    pub(crate) renderer: R,
    pub(crate) diagnostics: D,
    pub(crate) state: State,
    pub(crate) stack: LexicalStack,
    pub(crate) whitespace: String,
    pub(crate) tail_char: Option<char>,
    /// Newlines seen in earlier chunks.
    pub(crate) line: usize,
    /// Byte offset of the current chunk within the document.
    pub(crate) offset: usize,
    pub(crate) fragments: Vec<String>,
    pub(crate) stats: SessionStats,
}

impl Session {
    pub fn new() -> Self {
        Self::with_renderer(HtmlRenderer, SessionConfig::default())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Render> Session<R, LogSink> {
    pub fn with_renderer(renderer: R, config: SessionConfig) -> Self {
        Session {
            config,
            renderer,
            diagnostics: LogSink,
            state: State::Scanning,
            stack: LexicalStack::default(),
            whitespace: String::new(),
            tail_char: None,
            line: 0,
            offset: 0,
            fragments: Vec::new(),
            stats: SessionStats::default(),
        }
    }
}

impl<R: Render, D: DiagnosticSink> Session<R, D> {
    /// Replace the diagnostic sink. Intended to be called before the first
    /// chunk is fed.
    pub fn with_diagnostics<D2: DiagnosticSink>(self, diagnostics: D2) -> Session<R, D2> {
        Session {
            config: self.config,
            renderer: self.renderer,
            diagnostics,
            state: self.state,
            stack: self.stack,
            whitespace: self.whitespace,
            tail_char: self.tail_char,
            line: self.line,
            offset: self.offset,
            fragments: self.fragments,
            stats: self.stats,
        }
    }

    /// Process one chunk and return the fragments it produced.
    pub fn feed(&mut self, chunk: &str) -> Vec<String> {
        let mut out = Vec::new();
        self.feed_into(chunk, &mut out);
        out
    }

    /// Process one chunk, appending produced fragments to `out`.
    pub fn feed_into(&mut self, chunk: &str, out: &mut Vec<String>) {
        self.stats.chunks = self.stats.chunks.saturating_add(1);
        self.pump(chunk);
        out.append(&mut self.fragments);

        if let Some(last) = chunk.chars().next_back() {
            self.tail_char = Some(last);
        }
        self.line += memchr::memchr_iter(b'\n', chunk.as_bytes()).count();
        self.offset += chunk.len();
    }

    /// True when no construct is open.
    pub fn is_balanced(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn open_frames(&self) -> usize {
        self.stack.len()
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn diagnostics(&self) -> &D {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> D {
        self.diagnostics
    }
}

/// Translate a whole document with the default renderer and configuration.
pub fn translate(source: &str) -> String {
    let mut session = Session::new();
    session.feed(source).concat()
}
