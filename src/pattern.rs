//! Regular-expression leaf support.
//!
//! A [`Pattern`] answers one question: does the regex match starting exactly
//! at byte offset `pos` of the haystack, and if so where does the match end?
//! The match must begin at `pos` but need not reach the end of the input.

use std::sync::Arc;

use regex_automata::meta::{BuildError, Regex};
use regex_automata::{Anchored, Input};

/// A compiled, start-anchored regular expression.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Arc<Regex>,
}

impl Pattern {
    pub fn compile(source: &str) -> Result<Self, BuildError> {
        let regex = Regex::new(source)?;
        Ok(Self {
            source: source.to_string(),
            regex: Arc::new(regex),
        })
    }

    /// The pattern text this was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Attempts a match anchored at `pos` and returns the exclusive end offset.
    ///
    /// Returns `None` when there is no match or `pos` lies past the end of `haystack`.
    pub fn match_at(&self, haystack: &str, pos: usize) -> Option<usize> {
        if pos > haystack.len() {
            return None;
        }
        let input = Input::new(haystack).range(pos..).anchored(Anchored::Yes);
        self.regex.search(&input).map(|m| m.end())
    }

    /// Whether this pattern can succeed without consuming input.
    pub fn matches_empty(&self) -> bool {
        self.match_at("", 0).is_some()
    }
}
