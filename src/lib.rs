//! # Sprig
//!
//! A combinator-based PEG engine. Grammars are assembled at runtime from
//! rule values, registered by name in a [`Grammar`], and applied to input
//! text to produce a concrete [`SyntaxTree`].
//!
//! ```rust
//! use sprig::combinators::{in_range, literal, one_or_more, rule, seq};
//! use sprig::Grammar;
//!
//! let mut grammar = Grammar::new();
//! grammar.define("number", one_or_more(rule("digit")));
//! grammar.define("digit", in_range('0', '9'));
//! grammar.define("sum", seq([rule("number"), literal("+"), rule("number")]));
//!
//! let tree = grammar.parse("sum", "12 + 3").into_result().unwrap();
//! assert_eq!(tree.kind(), "sum");
//! assert_eq!(tree.value(), "12 + 3");
//! ```

pub use crate::config::ParserConfig;
pub use crate::diagnostics::{to_error_source, ErrorContext, ErrorType, SprigError};
pub use crate::grammar::{Grammar, RuleId};
pub use crate::rule::{MatchFn, Rule};
pub use crate::state::{ParseOutcome, ParseResult, ParseState};
pub use crate::tree::{Children, Span, SyntaxTree};
pub use crate::validation::ValidationReport;

pub mod arithmetic;
pub mod cli;
pub mod combinators;
pub mod config;
pub mod diagnostics;
pub mod grammar;
pub mod pattern;
pub mod rule;
pub mod stack;
pub mod state;
pub mod tree;
pub mod validation;
