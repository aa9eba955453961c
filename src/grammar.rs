//! # Grammar Registry
//!
//! A [`Grammar`] owns the named rules of a grammar and is the entry point for
//! parsing. Rules are stored in an arena and addressed by [`RuleId`]; named
//! references inside other rules cache the id they resolve to, so rules can
//! refer to each other (and to themselves) regardless of definition order.
//!
//! ## Usage Workflow
//! ```rust
//! use sprig::combinators::*;
//! use sprig::{Grammar, ParseOutcome};
//!
//! let mut grammar = Grammar::new();
//! // `list` refers to `item` before it exists.
//! grammar.define("list", seq([literal("["), optional(rule("items")), literal("]")]));
//! grammar.define("items", seq([rule("item"), zero_or_more(seq([literal(","), rule("item")]))]));
//! grammar.define("item", or(rule("list"), regex("[a-z]+")));
//!
//! let result = grammar.parse("list", "[a, [b, c], d]");
//! assert_eq!(result.outcome(), ParseOutcome::Matched);
//! assert!(result.is_complete());
//! ```
//!
//! ## Registry Invariant
//! Entries are only ever added or replaced, never removed. Replacing a name
//! reuses its slot, so every cached resolution stays valid.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, trace};

use crate::validation::{self, ValidationReport};
use crate::{ParseResult, ParseState, ParserConfig, Rule};

/// Handle to a rule stored in a [`Grammar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(usize);

impl RuleId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Identity of a [`Grammar`]. A cached [`RuleId`] is only meaningful in the
/// grammar whose key it was cached with. Every grammar, clones included,
/// gets its own key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct GrammarKey(u64);

impl GrammarKey {
    fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Registry of named rules plus the configuration they parse with.
///
/// # Thread Safety
/// A `Grammar` is `Send + Sync`. Reference resolution caches through a
/// thread-safe once-cell, so any number of threads may parse with a shared
/// `&Grammar` at the same time. Definitions need `&mut self` and so cannot
/// race with parsing.
#[derive(Debug)]
pub struct Grammar {
    rules: Vec<Rule>,
    names: HashMap<String, RuleId>,
    config: ParserConfig,
    key: GrammarKey,
}

impl Clone for Grammar {
    /// The copy resolves its own references from scratch; after the two
    /// diverge, the same slot may hold different names.
    fn clone(&self) -> Self {
        let mut rules = self.rules.clone();
        rules.iter_mut().for_each(Rule::forget_resolutions);
        Self {
            rules,
            names: self.names.clone(),
            config: self.config,
            key: GrammarKey::fresh(),
        }
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            names: HashMap::new(),
            config: ParserConfig::default(),
            key: GrammarKey::fresh(),
        }
    }
}

impl Grammar {
    /// Creates an empty grammar with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty grammar with `config`.
    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub(crate) fn key(&self) -> GrammarKey {
        self.key
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ParserConfig) {
        self.config = config;
    }

    /// Turns skipping of ASCII spaces before each rule on or off.
    pub fn set_skip_whitespace(&mut self, skip: bool) {
        self.config.skip_whitespace = skip;
    }

    // ------------------------------------------------------------------------
    // Definition and lookup
    // ------------------------------------------------------------------------

    /// Stores a copy of `rule` under `name`, labeled `name`, and returns its handle.
    ///
    /// Defining an existing name replaces the previous rule in place.
    pub fn define(&mut self, name: &str, rule: Rule) -> RuleId {
        let mut rule = rule.with_label(name);
        rule.forget_resolutions();
        if let Some(&id) = self.names.get(name) {
            trace!(rule = name, ?id, "redefined rule");
            self.rules[id.0] = rule;
            return id;
        }
        let id = RuleId(self.rules.len());
        trace!(rule = name, ?id, "defined rule");
        self.rules.push(rule);
        self.names.insert(name.to_string(), id);
        id
    }

    /// Looks up the rule defined under `name`. Absence is not an error.
    pub fn lookup(&self, name: &str) -> Option<&Rule> {
        self.id_of(name).and_then(|id| self.get(id))
    }

    pub fn id_of(&self, name: &str) -> Option<RuleId> {
        self.names.get(name).copied()
    }

    pub fn get(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id.0)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Defined rule names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// `(name, rule)` pairs, sorted by name.
    pub fn rules(&self) -> impl Iterator<Item = (&str, &Rule)> + '_ {
        self.names()
            .into_iter()
            .filter_map(move |name| self.lookup(name).map(|rule| (name, rule)))
    }

    // ------------------------------------------------------------------------
    // Parsing
    // ------------------------------------------------------------------------

    /// Parses `input` starting from the rule named `root`.
    ///
    /// An undefined `root` is not an error: the result has no tree, no error
    /// message, and a cursor of 0.
    pub fn parse(&self, root: &str, input: &str) -> ParseResult {
        let Some(rule) = self.lookup(root) else {
            debug!(root, "root rule is not defined; nothing to parse");
            return ParseResult::empty(input);
        };
        debug!(root, len = input.len(), "parse started");
        let mut state = ParseState::new(self, input);
        rule.apply(&mut state);
        let result = state.finish();
        debug!(
            root,
            outcome = ?result.outcome(),
            cursor = result.cursor(),
            "parse finished"
        );
        result
    }

    /// Checks the grammar for undefined references, invalid regex patterns,
    /// repetitions that can match empty input, and unreferenced rules.
    pub fn validate(&self) -> ValidationReport {
        validation::validate(self)
    }
}

impl fmt::Display for Grammar {
    /// One `name = rule` line per rule, sorted by name.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, rule) in self.rules() {
            writeln!(f, "{name} = {rule}")?;
        }
        Ok(())
    }
}
