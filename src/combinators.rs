//! Combinator constructors.
//!
//! Each function here is pure: it takes rules and literal values and returns
//! a new [`Rule`] whose matcher owns copies of its arguments. Sub-rules are
//! always run through [`Rule::apply`], so a failing sub-rule has already
//! rewound the cursor by the time the combinator sees the failure.
//!
//! Only [`literal`] and [`regex`] carry labels (`"string"` and `"regex"`), so
//! matched tokens show up in the tree. Everything else is unlabeled and is
//! pruned away, its children promoted into the enclosing labeled node.
//!
//! # Examples
//!
//! ```rust
//! use sprig::combinators::*;
//! use sprig::Grammar;
//!
//! let mut g = Grammar::new();
//! g.define("sum", seq([rule("num"), zero_or_more(seq([or(literal("+"), literal("-")), rule("num")]))]));
//! g.define("num", regex("[0-9]+"));
//!
//! let result = g.parse("sum", "1 + 22 - 3");
//! assert!(result.is_complete());
//! let kinds: Vec<_> = result.tree().unwrap().children().map(|c| c.kind()).collect();
//! assert_eq!(kinds, ["num", "string", "num", "string", "num"]);
//! ```

use std::fmt;

use crate::pattern::Pattern;
use crate::rule::{MatchFn, Rule};
use crate::ParseState;

/// Default label of a [`literal`] leaf.
pub const LITERAL_LABEL: &str = "string";
/// Default label of a [`regex`] leaf.
pub const REGEX_LABEL: &str = "regex";

// ============================================================================
// PUBLIC CONSTRUCTORS
// ============================================================================

/// Matches every rule in order; fails as soon as one fails.
pub fn seq(rules: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::primitive(Matcher::Sequence(rules.into_iter().collect()))
}

/// Ordered choice: tries `a`, and only if it fails tries `b` from the same position.
pub fn or(a: Rule, b: Rule) -> Rule {
    Rule::primitive(Matcher::Choice(vec![a, b]))
}

/// Ordered choice over any number of alternatives. The first match wins.
pub fn choice(rules: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::primitive(Matcher::Choice(rules.into_iter().collect()))
}

/// Matches `a` as many times as possible. Always succeeds.
pub fn zero_or_more(a: Rule) -> Rule {
    Rule::primitive(Matcher::ZeroOrMore(Box::new(a)))
}

/// Matches `a` as many times as possible, at least once.
pub fn one_or_more(a: Rule) -> Rule {
    Rule::primitive(Matcher::OneOrMore(Box::new(a)))
}

/// Tries `a` once. Always succeeds.
pub fn optional(a: Rule) -> Rule {
    Rule::primitive(Matcher::Optional(Box::new(a)))
}

/// Matches `text` byte for byte at the cursor.
pub fn literal(text: impl Into<String>) -> Rule {
    Rule::primitive(Matcher::Literal(text.into())).with_label(LITERAL_LABEL)
}

/// Matches one character whose scalar value lies in `lo..=hi`.
pub fn in_range(lo: char, hi: char) -> Rule {
    Rule::primitive(Matcher::Range(lo, hi))
}

/// Matches `pattern` starting exactly at the cursor.
///
/// A pattern that fails to compile never matches; it does not raise an
/// error during the parse. [`Grammar::validate`](crate::Grammar::validate)
/// reports such patterns.
pub fn regex(pattern: &str) -> Rule {
    let compiled = Pattern::compile(pattern).map_err(|e| e.to_string());
    Rule::primitive(Matcher::Regex(RegexLeaf {
        source: pattern.to_string(),
        compiled,
    }))
    .with_label(REGEX_LABEL)
}

/// A reference to the rule defined under `name`, resolved on first use.
pub fn rule(name: impl Into<String>) -> Rule {
    Rule::reference(name)
}

// ============================================================================
// MATCHERS
// ============================================================================

#[derive(Clone)]
pub(crate) enum Matcher {
    Sequence(Vec<Rule>),
    Choice(Vec<Rule>),
    ZeroOrMore(Box<Rule>),
    OneOrMore(Box<Rule>),
    Optional(Box<Rule>),
    Literal(String),
    Range(char, char),
    Regex(RegexLeaf),
    Custom(MatchFn),
}

#[derive(Clone)]
pub(crate) struct RegexLeaf {
    pub(crate) source: String,
    pub(crate) compiled: Result<Pattern, String>,
}

impl Matcher {
    pub(crate) fn run(&self, state: &mut ParseState<'_>) -> bool {
        match self {
            Matcher::Sequence(rules) => rules.iter().all(|r| r.apply(state)),
            Matcher::Choice(rules) => rules.iter().any(|r| r.apply(state)),
            Matcher::ZeroOrMore(rule) => {
                repeat(rule, state);
                true
            }
            Matcher::OneOrMore(rule) => repeat(rule, state) > 0,
            Matcher::Optional(rule) => {
                let _ = rule.apply(state);
                true
            }
            Matcher::Literal(text) => {
                if state.remaining().as_bytes().starts_with(text.as_bytes()) {
                    state.advance(text.len());
                    true
                } else {
                    false
                }
            }
            Matcher::Range(lo, hi) => match state.remaining().chars().next() {
                Some(c) if (*lo..=*hi).contains(&c) => {
                    state.advance(c.len_utf8());
                    true
                }
                _ => false,
            },
            Matcher::Regex(leaf) => {
                let Ok(pattern) = &leaf.compiled else {
                    return false;
                };
                match pattern.match_at(state.input(), state.position()) {
                    Some(end) => {
                        state.set_position(end);
                        true
                    }
                    None => false,
                }
            }
            Matcher::Custom(f) => f(state),
        }
    }

    pub(crate) fn subrules(&self) -> &[Rule] {
        match self {
            Matcher::Sequence(rules) | Matcher::Choice(rules) => rules,
            Matcher::ZeroOrMore(rule) | Matcher::OneOrMore(rule) | Matcher::Optional(rule) => {
                std::slice::from_ref(&**rule)
            }
            Matcher::Literal(_) | Matcher::Range(..) | Matcher::Regex(_) | Matcher::Custom(_) => &[],
        }
    }

    pub(crate) fn subrules_mut(&mut self) -> &mut [Rule] {
        match self {
            Matcher::Sequence(rules) | Matcher::Choice(rules) => rules,
            Matcher::ZeroOrMore(rule) | Matcher::OneOrMore(rule) | Matcher::Optional(rule) => {
                std::slice::from_mut(&mut **rule)
            }
            Matcher::Literal(_) | Matcher::Range(..) | Matcher::Regex(_) | Matcher::Custom(_) => {
                &mut []
            }
        }
    }

    /// Binding strength when rendered: choice < sequence < postfix < atom.
    pub(crate) fn precedence(&self) -> u8 {
        match self {
            Matcher::Choice(rules) | Matcher::Sequence(rules) if rules.len() <= 1 => 3,
            Matcher::Choice(_) => 0,
            Matcher::Sequence(_) => 1,
            Matcher::ZeroOrMore(_) | Matcher::OneOrMore(_) | Matcher::Optional(_) => 2,
            Matcher::Literal(_) | Matcher::Range(..) | Matcher::Regex(_) | Matcher::Custom(_) => 3,
        }
    }

    pub(crate) fn fmt_body(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Sequence(rules) if rules.is_empty() => f.write_str("()"),
            Matcher::Choice(rules) if rules.is_empty() => f.write_str("!()"),
            Matcher::Sequence(rules) | Matcher::Choice(rules) if rules.len() == 1 => {
                rules[0].fmt_nested(f, 3)
            }
            Matcher::Sequence(rules) => write_joined(f, rules, " ", 2),
            Matcher::Choice(rules) => write_joined(f, rules, " / ", 1),
            Matcher::ZeroOrMore(rule) => postfix(f, rule, '*'),
            Matcher::OneOrMore(rule) => postfix(f, rule, '+'),
            Matcher::Optional(rule) => postfix(f, rule, '?'),
            Matcher::Literal(text) => write!(f, "{text:?}"),
            Matcher::Range(lo, hi) => write!(f, "[{lo:?}-{hi:?}]"),
            Matcher::Regex(leaf) => write!(f, "/{}/", leaf.source),
            Matcher::Custom(_) => f.write_str("<custom>"),
        }
    }
}

/// Applies `rule` until it fails, or until an application succeeds without
/// moving the cursor. Returns the number of successful applications.
fn repeat(rule: &Rule, state: &mut ParseState<'_>) -> usize {
    let mut runs = 0;
    loop {
        let before = state.position();
        if !rule.apply(state) {
            break;
        }
        runs += 1;
        if state.position() == before {
            break;
        }
    }
    runs
}

fn write_joined(f: &mut fmt::Formatter<'_>, rules: &[Rule], sep: &str, min_prec: u8) -> fmt::Result {
    for (i, rule) in rules.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        rule.fmt_nested(f, min_prec)?;
    }
    Ok(())
}

fn postfix(f: &mut fmt::Formatter<'_>, rule: &Rule, op: char) -> fmt::Result {
    rule.fmt_nested(f, 3)?;
    write!(f, "{op}")
}
