// tests/engine_tests.rs

use sprig::combinators::*;
use sprig::{Grammar, ParseOutcome, ParseState, ParserConfig, Rule, SyntaxTree};

fn no_spaces() -> Grammar {
    Grammar::with_config(ParserConfig::default().with_skip_whitespace(false))
}

// Every node's value is exactly the input slice its span covers, and every
// child span lies inside its parent's.
fn assert_spans_consistent(tree: &SyntaxTree, input: &str) {
    tree.walk(&mut |node, _| {
        let span = node.span();
        assert_eq!(node.value(), &input[span.start..span.end], "node {}", node.kind());
        for child in node.children() {
            assert!(child.span().start >= span.start && child.span().end <= span.end);
        }
    });
}

// ---
// Basic scenarios
// ---

#[test]
fn test_repetition_of_defined_rule() {
    let mut g = Grammar::new();
    g.define("digit", in_range('0', '9'));
    g.define("digits", one_or_more(rule("digit")));

    let result = g.parse("digits", "042");
    assert_eq!(result.outcome(), ParseOutcome::Matched);
    assert_eq!(result.position(), 3);
    let tree = result.tree().unwrap();
    assert_eq!(tree.kind(), "digits");
    assert_eq!(tree.value(), "042");
    let digits: Vec<_> = tree.children().map(|c| (c.kind(), c.value())).collect();
    assert_eq!(digits, [("digit", "0"), ("digit", "4"), ("digit", "2")]);
}

#[test]
fn test_literal_longer_than_input_fails_cleanly() {
    let mut g = no_spaces();
    g.define("ab", literal("ab"));
    let result = g.parse("ab", "a");
    assert_eq!(result.outcome(), ParseOutcome::NoMatch);
    assert_eq!(result.cursor(), 0);
    assert!(result.error().is_none());
}

#[test]
fn test_undefined_reference_is_plain_failure() {
    let mut g = Grammar::new();
    g.define("root", or(rule("ghost"), literal("x")));
    let result = g.parse("root", "x");
    assert_eq!(result.outcome(), ParseOutcome::Matched);

    g.define("root", rule("ghost"));
    let result = g.parse("root", "x");
    assert_eq!(result.outcome(), ParseOutcome::NoMatch);
    assert_eq!(result.error_message(), "");
}

// ---
// Tree construction
// ---

#[test]
fn test_unlabeled_combinators_are_pruned() {
    let mut g = no_spaces();
    g.define("pair", seq([rule("a"), optional(seq([rule("b"), rule("b")]))]));
    g.define("a", literal("a"));
    g.define("b", literal("b"));

    let tree = g.parse("pair", "abb").into_result().unwrap();
    let kinds: Vec<_> = tree.children().map(|c| c.kind()).collect();
    assert_eq!(kinds, ["a", "b", "b"]);
    assert!(tree.children().all(|c| !c.has_children()));
    assert_spans_consistent(&tree, "abb");
}

#[test]
fn test_anonymous_leaves_keep_default_labels() {
    let mut g = no_spaces();
    g.define("assign", seq([regex("[a-z]+"), literal("="), regex("[0-9]+")]));
    let tree = g.parse("assign", "x=42").into_result().unwrap();
    let leaves: Vec<_> = tree.children().map(|c| (c.kind(), c.value())).collect();
    assert_eq!(leaves, [("regex", "x"), ("string", "="), ("regex", "42")]);
}

#[test]
fn test_custom_label_survives_in_tree() {
    let mut g = no_spaces();
    g.define("call", seq([regex("[a-z]+").with_label("name"), literal("()")]));
    let tree = g.parse("call", "run()").into_result().unwrap();
    assert_eq!(tree.find("name").map(|n| n.value()), Some("run"));
}

#[test]
fn test_unlabeled_root_is_kept_and_inner_nodes_pruned() {
    let mut g = no_spaces();
    g.define("", seq([literal("a"), optional(seq([rule("b"), literal("c")]))]));
    g.define("b", literal("b"));

    let result = g.parse("", "abc");
    assert!(result.is_complete());
    let tree = result.tree().unwrap();
    assert_eq!(tree.kind(), "");
    assert_eq!(tree.value(), "abc");
    let kinds: Vec<_> = tree.children().map(|c| c.kind()).collect();
    assert_eq!(kinds, ["string", "b", "string"]);
}

#[test]
fn test_failed_alternative_leaves_no_nodes() {
    let mut g = no_spaces();
    g.define("root", or(seq([rule("a"), rule("a"), literal("!")]), seq([rule("a"), literal("?")])));
    g.define("a", literal("a"));

    let tree = g.parse("root", "a?").into_result().unwrap();
    let kinds: Vec<_> = tree.children().map(|c| c.kind()).collect();
    assert_eq!(kinds, ["a", "string"]);
}

// ---
// Whitespace
// ---

#[test]
fn test_spaces_are_skipped_before_each_rule() {
    let mut g = Grammar::new();
    g.define("sum", seq([rule("n"), literal("+"), rule("n")]));
    g.define("n", regex("[0-9]+"));

    let result = g.parse("sum", "  1 +  2");
    assert!(result.is_complete());
    let tree = result.tree().unwrap();
    assert_eq!(tree.span().start, 2);
    assert_eq!(tree.value(), "1 +  2");
    let values: Vec<_> = tree.children().map(|c| c.value()).collect();
    assert_eq!(values, ["1", "+", "2"]);
    assert_spans_consistent(tree, "  1 +  2");
}

#[test]
fn test_tabs_and_newlines_are_not_skipped() {
    let mut g = Grammar::new();
    g.define("x", literal("x"));
    assert_eq!(g.parse("x", "\tx").outcome(), ParseOutcome::NoMatch);
    assert_eq!(g.parse("x", "\nx").outcome(), ParseOutcome::NoMatch);
}

#[test]
fn test_skipping_can_be_turned_off() {
    let mut g = Grammar::new();
    g.define("x", literal("x"));
    assert!(g.parse("x", " x").tree().is_some());
    g.set_skip_whitespace(false);
    assert!(g.parse("x", " x").tree().is_none());
}

#[test]
fn test_trailing_spaces_are_not_consumed() {
    let mut g = Grammar::new();
    g.define("x", literal("x"));
    let result = g.parse("x", "x  ");
    assert_eq!(result.outcome(), ParseOutcome::Matched);
    assert_eq!(result.cursor(), 1);
    assert!(!result.is_complete());
}

// ---
// Depth guard
// ---

#[test]
fn test_left_recursion_aborts_with_syntax_error() {
    let mut g = Grammar::new();
    g.define("x", or(rule("x"), literal("a")));
    let result = g.parse("x", "a");
    assert_eq!(result.outcome(), ParseOutcome::Aborted);
    assert!(result.tree().is_none());
    assert_eq!(result.error_message(), "Syntax Error");
    assert_eq!(result.position(), 0);
}

#[test]
fn test_fatal_error_suppresses_later_alternatives() {
    let mut g = Grammar::new();
    // Without the sticky error the second alternative would match "a".
    g.define("root", or(rule("loop"), literal("a")));
    g.define("loop", seq([rule("loop"), literal("b")]));
    let result = g.parse("root", "a");
    assert_eq!(result.outcome(), ParseOutcome::Aborted);
    assert!(result.tree().is_none());
}

#[test]
fn test_max_depth_is_configurable() {
    let nest = |depth: usize| {
        let mut g = Grammar::with_config(ParserConfig::default().with_max_depth(depth));
        g.define("a", rule("b"));
        g.define("b", rule("c"));
        g.define("c", literal("c"));
        g.parse("a", "c").outcome()
    };
    // a -> b -> c: three open applications at the deepest point.
    assert_eq!(nest(3), ParseOutcome::Matched);
    assert_eq!(nest(2), ParseOutcome::Aborted);
}

#[test]
fn test_long_repetitions_do_not_nest() {
    let mut g = Grammar::new();
    g.define("many", one_or_more(literal("a")));
    let input = "a".repeat(100_000);
    let result = g.parse("many", &input);
    assert!(result.is_complete());
    assert_eq!(result.tree().unwrap().children().count(), 100_000);
}

#[test]
fn test_long_result_can_be_cloned_compared_and_debugged() {
    let mut g = Grammar::new();
    g.define("many", one_or_more(literal("a")));
    let input = "a".repeat(200_000);
    let result = g.parse("many", &input);
    let tree = result.tree().unwrap();

    let copy = tree.clone();
    assert!(copy == *tree);
    assert_eq!(copy.children().count(), 200_000);

    let text = format!("{result:?}");
    assert_eq!(text.matches("kind: \"string\"").count(), 200_000);
}

// ---
// Rules and registry
// ---

#[test]
fn test_forward_and_mutual_references() {
    let mut g = no_spaces();
    g.define("list", seq([literal("("), zero_or_more(rule("item")), literal(")")]));
    g.define("item", or(rule("list"), regex("[a-z]")));

    let tree = g.parse("list", "(a(b(c))d)").into_result().unwrap();
    assert_eq!(tree.find("list").unwrap().value(), "(a(b(c))d)");
    assert_spans_consistent(&tree, "(a(b(c))d)");
}

#[test]
fn test_combinator_instances_do_not_share_state() {
    let mut g = no_spaces();
    let inner = zero_or_more(literal("x"));
    g.define("outer", seq([inner.clone(), literal("-"), inner, rule("tail")]));
    g.define("tail", zero_or_more(literal("y")));
    assert!(g.parse("outer", "xx-xxxyy").is_complete());
}

#[test]
fn test_rule_applied_in_two_grammars_resolves_in_each() {
    let mut first = no_spaces();
    first.define("x", literal("x"));
    let mut second = no_spaces();
    second.define("y", literal("y"));
    second.define("x", literal("z"));

    let x = rule("x");
    assert!(x.apply(&mut ParseState::new(&first, "x")));
    assert!(!x.apply(&mut ParseState::new(&second, "y")));
    assert!(x.apply(&mut ParseState::new(&second, "z")));
    assert!(x.apply(&mut ParseState::new(&first, "x")));
}

#[test]
fn test_custom_matcher_cursor_stays_on_char_boundary() {
    let mut g = no_spaces();
    // Advances a single byte, even into a multi-byte character.
    g.define("byte", Rule::custom(|state| {
        let more = !state.remaining().is_empty();
        state.advance(1);
        more
    }));
    let result = g.parse("byte", "éa");
    assert_eq!(result.cursor(), 2);
    assert_eq!(result.tree().unwrap().value(), "é");
}

#[test]
fn test_custom_matcher_sees_state() {
    let mut g = no_spaces();
    let upper = Rule::custom(|state| {
        let n = state
            .remaining()
            .bytes()
            .take_while(u8::is_ascii_uppercase)
            .count();
        state.advance(n);
        n > 0
    });
    g.define("shout", seq([upper.with_label("caps"), literal("!")]));
    let tree = g.parse("shout", "HEY!").into_result().unwrap();
    assert_eq!(tree.first_child().unwrap().value(), "HEY");
}

#[test]
fn test_grammar_is_shared_across_threads() {
    let g = sprig::arithmetic::grammar();
    let inputs = ["1+2", "3*4+5", "6+7*8", "9/3-1"];
    std::thread::scope(|scope| {
        for input in inputs {
            let g = &g;
            scope.spawn(move || {
                for _ in 0..50 {
                    assert!(g.parse("expression", input).is_complete(), "{input}");
                }
            });
        }
    });
}

#[test]
fn test_tree_serializes_to_json() {
    let mut g = no_spaces();
    g.define("kv", seq([regex("[a-z]+"), literal(":"), regex("[0-9]+")]));
    let tree = g.parse("kv", "a:1").into_result().unwrap();
    let json = serde_json::to_value(&tree).unwrap();
    assert_eq!(json["type"], "kv");
    assert_eq!(json["value"], "a:1");
    assert_eq!(json["span"]["end"], 3);
    assert_eq!(json["children"][1]["type"], "string");
    assert_eq!(json["children"].as_array().unwrap().len(), 3);
}
