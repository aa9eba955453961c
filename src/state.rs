//! Per-parse mutable state and the parse result.
//!
//! A [`ParseState`] is created fresh for every top-level parse. It holds the
//! input, the cursor, the sticky fatal error, and the stack of tree nodes that
//! are still being built. Each open node records the cursor at which it began,
//! so the stack depth always equals the current nesting of
//! [`Rule::apply`](crate::Rule::apply).

use tracing::warn;

use crate::diagnostics::{to_error_source, SprigError};
use crate::{err_ctx, Grammar, Span, SyntaxTree};

/// Message carried by the fatal error raised by the depth guard.
pub const SYNTAX_ERROR_MESSAGE: &str = "Syntax Error";

/// A tree node that has been opened but not yet completed or discarded.
#[derive(Debug)]
struct OpenNode {
    kind: String,
    start: usize,
    children: Vec<SyntaxTree>,
}

// ============================================================================
// PARSE STATE
// ============================================================================

/// Mutable context threaded through every rule application of one parse.
///
/// Custom matchers (see [`Rule::custom`](crate::Rule::custom)) read the
/// input through [`remaining`](Self::remaining) and move the cursor with
/// [`advance`](Self::advance) or [`set_position`](Self::set_position).
#[derive(Debug)]
pub struct ParseState<'a> {
    grammar: &'a Grammar,
    input: &'a str,
    pos: usize,
    error: Option<SprigError>,
    open: Vec<OpenNode>,
    root: Option<SyntaxTree>,
}

impl<'a> ParseState<'a> {
    pub fn new(grammar: &'a Grammar, input: &'a str) -> Self {
        Self {
            grammar,
            input,
            pos: 0,
            error: None,
            open: Vec::new(),
            root: None,
        }
    }

    pub fn grammar(&self) -> &'a Grammar {
        self.grammar
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    /// Current cursor, as a byte offset into the input.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The unconsumed rest of the input.
    pub fn remaining(&self) -> &'a str {
        self.input.get(self.pos..).unwrap_or("")
    }

    /// Moves the cursor forward by `bytes`, stopping at the end of input.
    /// See [`set_position`](Self::set_position) for offsets inside a character.
    pub fn advance(&mut self, bytes: usize) {
        self.set_position(self.pos.saturating_add(bytes));
    }

    /// Moves the cursor to `pos`, clamped to the input length.
    ///
    /// An offset inside a multi-byte character is rounded up to the end of
    /// that character, so the cursor always sits on a character boundary.
    pub fn set_position(&mut self, pos: usize) {
        let mut pos = pos.min(self.input.len());
        while !self.input.is_char_boundary(pos) {
            pos += 1;
        }
        self.pos = pos;
    }

    /// Number of rule applications currently open.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    pub fn max_depth(&self) -> usize {
        self.grammar.config().max_depth
    }

    /// Whether a fatal error has been raised. Once set it is never cleared.
    pub fn is_aborted(&self) -> bool {
        self.error.is_some()
    }

    pub fn error(&self) -> Option<&SprigError> {
        self.error.as_ref()
    }

    /// Skips a run of ASCII spaces when the grammar is configured to.
    /// Tabs and newlines are not skipped.
    pub(crate) fn skip_whitespace(&mut self) {
        if !self.grammar.config().skip_whitespace {
            return;
        }
        let skipped = self
            .remaining()
            .bytes()
            .take_while(|&b| b == b' ')
            .count();
        self.pos += skipped;
    }

    /// Raises the sticky fatal error for exceeding the depth cap.
    pub(crate) fn abort_too_deep(&mut self) {
        if self.error.is_some() {
            return;
        }
        let depth = self.depth();
        let max_depth = self.max_depth();
        warn!(position = self.pos, depth, max_depth, "rule nesting limit exceeded; aborting parse");
        let src = to_error_source("input", self.input);
        self.error = Some(err_ctx!(
            Syntax,
            SYNTAX_ERROR_MESSAGE,
            &src,
            Span::point(self.pos),
            format!("more than {max_depth} rules were open at once; the grammar may be left-recursive")
        ));
    }

    // ------------------------------------------------------------------------
    // Node lifecycle
    // ------------------------------------------------------------------------

    /// Opens a node labeled `kind` starting at the current cursor.
    pub(crate) fn begin_node(&mut self, kind: &str) {
        self.open.push(OpenNode {
            kind: kind.to_string(),
            start: self.pos,
            children: Vec::new(),
        });
    }

    /// Completes the innermost open node and attaches it.
    ///
    /// With no parent it becomes the root. A labeled node is appended to its
    /// parent's children; an unlabeled one is dropped and its children are
    /// spliced into the parent in its place.
    pub(crate) fn complete_node(&mut self) {
        let Some(node) = self.open.pop() else {
            return;
        };
        match self.open.last_mut() {
            Some(parent) if node.kind.is_empty() => parent.children.extend(node.children),
            Some(parent) => {
                let tree = finish_node(self.input, self.pos, node);
                parent.children.push(tree);
            }
            None => self.root = Some(finish_node(self.input, self.pos, node)),
        }
    }

    /// Throws away the innermost open node and everything under it, and
    /// moves the cursor back to where that node began.
    pub(crate) fn discard_node(&mut self) {
        if let Some(node) = self.open.pop() {
            self.pos = node.start;
        }
    }

    pub(crate) fn finish(self) -> ParseResult {
        ParseResult {
            tree: self.root,
            error: self.error,
            cursor: self.pos,
            input: self.input.to_string(),
        }
    }
}

fn finish_node(input: &str, end: usize, node: OpenNode) -> SyntaxTree {
    let span = Span::new(node.start, end.max(node.start));
    let value = input.get(span.start..span.end).unwrap_or_default();
    SyntaxTree::with_children(node.kind, value, span, node.children)
}

// ============================================================================
// PARSE RESULT
// ============================================================================

/// How a parse ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The root rule matched (possibly without consuming all input).
    Matched,
    /// The root rule did not match, or the root name was not defined.
    NoMatch,
    /// A fatal error was raised and the parse unwound.
    Aborted,
}

/// Everything a finished parse produced.
#[derive(Debug)]
pub struct ParseResult {
    tree: Option<SyntaxTree>,
    error: Option<SprigError>,
    cursor: usize,
    input: String,
}

impl ParseResult {
    pub(crate) fn empty(input: &str) -> Self {
        Self {
            tree: None,
            error: None,
            cursor: 0,
            input: input.to_string(),
        }
    }

    pub fn outcome(&self) -> ParseOutcome {
        match (&self.error, &self.tree) {
            (Some(_), _) => ParseOutcome::Aborted,
            (None, Some(_)) => ParseOutcome::Matched,
            (None, None) => ParseOutcome::NoMatch,
        }
    }

    pub fn tree(&self) -> Option<&SyntaxTree> {
        self.tree.as_ref()
    }

    pub fn into_tree(self) -> Option<SyntaxTree> {
        self.tree
    }

    pub fn error(&self) -> Option<&SprigError> {
        self.error.as_ref()
    }

    /// The fatal error's message, or an empty string when none was raised.
    pub fn error_message(&self) -> String {
        self.error.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    /// Where the fatal error was raised, or the final cursor when there was none.
    pub fn position(&self) -> usize {
        self.error
            .as_ref()
            .and_then(SprigError::span)
            .map_or(self.cursor, |span| span.start)
    }

    /// The cursor after the root rule returned.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Whether the root rule matched and consumed the whole input.
    pub fn is_complete(&self) -> bool {
        self.outcome() == ParseOutcome::Matched && self.cursor == self.input.len()
    }

    /// Strict view of the result: a tree that covers the whole input, or an error.
    pub fn into_result(self) -> Result<SyntaxTree, SprigError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let src = to_error_source("input", &self.input);
        match self.tree {
            Some(tree) if self.cursor == self.input.len() => Ok(tree),
            Some(_) => Err(err_ctx!(
                Incomplete,
                format!("input not fully consumed; stopped at byte {}", self.cursor),
                &src,
                Span::new(self.cursor, self.input.len()),
                "the root rule matched a prefix of the input"
            )),
            None => Err(err_ctx!(
                Incomplete,
                "the root rule did not match",
                &src,
                Span::point(0),
                "check that the root rule is defined and matches the start of the input"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParserConfig;

    fn grammar() -> Grammar {
        Grammar::with_config(ParserConfig::default())
    }

    #[test]
    fn labeled_nodes_attach_in_order() {
        let g = grammar();
        let mut state = ParseState::new(&g, "ab");
        state.begin_node("root");
        state.begin_node("a");
        state.advance(1);
        state.complete_node();
        state.begin_node("b");
        state.advance(1);
        state.complete_node();
        state.complete_node();
        let tree = state.finish().into_tree().unwrap();
        assert_eq!(tree.kind(), "root");
        assert_eq!(tree.value(), "ab");
        let values: Vec<_> = tree.children().map(|c| c.value()).collect();
        assert_eq!(values, ["a", "b"]);
    }

    #[test]
    fn unlabeled_nodes_are_pruned() {
        let g = grammar();
        let mut state = ParseState::new(&g, "xy");
        state.begin_node("root");
        state.begin_node("");
        state.begin_node("x");
        state.advance(1);
        state.complete_node();
        state.begin_node("y");
        state.advance(1);
        state.complete_node();
        state.complete_node();
        state.complete_node();
        let tree = state.finish().into_tree().unwrap();
        let kinds: Vec<_> = tree.children().map(|c| c.kind()).collect();
        assert_eq!(kinds, ["x", "y"]);
    }

    #[test]
    fn discard_drops_subtree_and_rewinds() {
        let g = grammar();
        let mut state = ParseState::new(&g, "abc");
        state.begin_node("root");
        state.advance(1);
        state.begin_node("tentative");
        state.begin_node("inner");
        state.advance(1);
        state.complete_node();
        state.discard_node();
        assert_eq!(state.position(), 1);
        assert_eq!(state.depth(), 1);
        state.complete_node();
        let tree = state.finish().into_tree().unwrap();
        assert!(!tree.has_children());
        assert_eq!(tree.value(), "a");
    }

    #[test]
    fn whitespace_skip_is_spaces_only() {
        let g = grammar();
        let mut state = ParseState::new(&g, "  \tx");
        state.skip_whitespace();
        assert_eq!(state.position(), 2);

        let off = Grammar::with_config(ParserConfig::default().with_skip_whitespace(false));
        let mut state = ParseState::new(&off, "  x");
        state.skip_whitespace();
        assert_eq!(state.position(), 0);
    }

    #[test]
    fn cursor_is_clamped_to_input() {
        let g = grammar();
        let mut state = ParseState::new(&g, "ab");
        state.advance(10);
        assert_eq!(state.position(), 2);
        assert_eq!(state.remaining(), "");
    }

    #[test]
    fn cursor_snaps_forward_to_char_boundary() {
        let g = grammar();
        let mut state = ParseState::new(&g, "é!");
        state.advance(1);
        assert_eq!(state.position(), 2);
        assert_eq!(state.remaining(), "!");

        let mut state = ParseState::new(&g, "aλ");
        state.set_position(2);
        assert_eq!(state.position(), 3);
    }

    #[test]
    fn abort_is_sticky_and_keeps_first_error() {
        let g = grammar();
        let mut state = ParseState::new(&g, "abc");
        state.advance(2);
        state.abort_too_deep();
        state.set_position(0);
        state.abort_too_deep();
        let result = state.finish();
        assert_eq!(result.outcome(), ParseOutcome::Aborted);
        assert_eq!(result.error_message(), "Syntax Error");
        assert_eq!(result.position(), 2);
        assert_eq!(result.cursor(), 0);
    }

    #[test]
    fn strict_result_reports_leftover_input() {
        let result = ParseResult {
            tree: Some(SyntaxTree::new("a", "a", Span::new(0, 1))),
            error: None,
            cursor: 1,
            input: "ab".to_string(),
        };
        let err = result.into_result().unwrap_err();
        assert_eq!(err.error_type(), crate::diagnostics::ErrorType::Incomplete);
        assert_eq!(err.span(), Some(Span::new(1, 2)));
    }
}
