//! Static checks over a [`Grammar`].
//!
//! Several grammar mistakes are indistinguishable from an ordinary no-match at
//! parse time: a reference to a name that was never defined, or a regex that
//! does not compile. Validation finds them ahead of time. It never changes how
//! the grammar parses.

use std::collections::{HashMap, HashSet};

use crate::combinators::Matcher;
use crate::rule::Body;
use crate::{err_msg, Grammar, Rule, SprigError};

// =====================
// Core Data Structures
// =====================

/// Findings of [`Grammar::validate`].
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// Problems that make part of the grammar unmatchable.
    pub errors: Vec<SprigError>,
    /// Likely mistakes that still parse deterministically.
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

// =====================
// Traits
// =====================

pub trait ValidationReporter {
    fn report_error(&mut self, error: SprigError);
    fn report_warning(&mut self, message: impl Into<String>);
}

impl ValidationReporter for ValidationReport {
    fn report_error(&mut self, error: SprigError) {
        self.errors.push(error);
    }
    fn report_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

// =====================
// Public API
// =====================

pub(crate) fn validate(grammar: &Grammar) -> ValidationReport {
    let mut report = ValidationReport::new();
    let nullable = nullable_rules(grammar);
    let mut referenced = HashSet::new();

    for (name, rule) in grammar.rules() {
        visit(rule, &mut |node| match node.body() {
            Body::Reference(r) => {
                referenced.insert(r.name.clone());
                if !grammar.contains(&r.name) {
                    report.report_error(err_msg!(
                        Validation,
                        "rule '{}' references undefined rule '{}'",
                        name,
                        r.name
                    ));
                }
            }
            Body::Primitive(Matcher::Regex(leaf)) => {
                if let Err(message) = &leaf.compiled {
                    report.report_error(err_msg!(
                        Validation,
                        "rule '{}' has invalid pattern /{}/: {}",
                        name,
                        leaf.source,
                        message
                    ));
                }
            }
            Body::Primitive(
                Matcher::ZeroOrMore(inner) | Matcher::OneOrMore(inner),
            ) if can_match_empty(inner, &nullable) => {
                report.report_warning(format!(
                    "rule '{name}': repetition `{node}` can match empty input; \
                     it stops after the first iteration that consumes nothing"
                ));
            }
            Body::Primitive(_) => {}
        });
    }

    for name in grammar.names() {
        if !referenced.contains(name) {
            report.report_warning(format!(
                "rule '{name}' is not referenced by any other rule; it is only reachable as a parse root"
            ));
        }
    }

    report
}

// =====================
// Helpers
// =====================

/// Visits `rule` and every sub-rule it captures, in pre-order.
fn visit<'r>(rule: &'r Rule, f: &mut dyn FnMut(&'r Rule)) {
    let mut stack = vec![rule];
    while let Some(node) = stack.pop() {
        f(node);
        stack.extend(node.subrules().iter().rev());
    }
}

/// Names of rules that can succeed without consuming input, computed to a fixpoint.
fn nullable_rules(grammar: &Grammar) -> HashMap<String, bool> {
    let mut nullable: HashMap<String, bool> =
        grammar.names().into_iter().map(|n| (n.to_string(), false)).collect();
    loop {
        let mut changed = false;
        for (name, rule) in grammar.rules() {
            if !nullable[name] && can_match_empty(rule, &nullable) {
                nullable.insert(name.to_string(), true);
                changed = true;
            }
        }
        if !changed {
            return nullable;
        }
    }
}

/// Conservative check: custom matchers are assumed to consume input.
fn can_match_empty(rule: &Rule, nullable: &HashMap<String, bool>) -> bool {
    match rule.body() {
        Body::Reference(r) => nullable.get(&r.name).copied().unwrap_or(false),
        Body::Primitive(m) => match m {
            Matcher::Sequence(rules) => rules.iter().all(|r| can_match_empty(r, nullable)),
            Matcher::Choice(rules) => rules.iter().any(|r| can_match_empty(r, nullable)),
            Matcher::ZeroOrMore(_) | Matcher::Optional(_) => true,
            Matcher::OneOrMore(inner) => can_match_empty(inner, nullable),
            Matcher::Literal(text) => text.is_empty(),
            Matcher::Range(..) | Matcher::Custom(_) => false,
            Matcher::Regex(leaf) => leaf.compiled.as_ref().is_ok_and(|p| p.matches_empty()),
        },
    }
}
