//! Demonstration grammar for simple arithmetic.
//!
//! ```text
//! expression = product add-op product
//! add-op     = "+" / "-"
//! mult-op    = "*" / "/"
//! product    = value mult-op value / value
//! value      = digit+ / expression
//! digit      = ['0'-'9']
//! ```
//!
//! `value` refers back to `expression`, so the grammar is recursive; an
//! input the top-level alternatives cannot cover drives that recursion until
//! the depth guard aborts the parse.

use crate::combinators::{in_range, literal, one_or_more, or, rule, seq};
use crate::{Grammar, ParserConfig};

/// Root rule of the arithmetic grammar.
pub const ROOT: &str = "expression";

/// Builds the arithmetic grammar with `config`.
pub fn grammar_with(config: ParserConfig) -> Grammar {
    let mut g = Grammar::with_config(config);
    g.define(
        "expression",
        seq([rule("product"), rule("add-op"), rule("product")]),
    );
    g.define("add-op", or(literal("+"), literal("-")));
    g.define("mult-op", or(literal("*"), literal("/")));
    g.define(
        "product",
        or(
            seq([rule("value"), rule("mult-op"), rule("value")]),
            rule("value"),
        ),
    );
    g.define("value", or(one_or_more(rule("digit")), rule("expression")));
    g.define("digit", in_range('0', '9'));
    g
}

/// Builds the arithmetic grammar with the default configuration.
pub fn grammar() -> Grammar {
    grammar_with(ParserConfig::default())
}
