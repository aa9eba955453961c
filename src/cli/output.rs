//! Handles all user-facing output for the CLI.
//!
//! This module is responsible for pretty-printing trees, colorizing output,
//! rendering diagnostics, and generating JSON. By centralizing output logic
//! here, we ensure a consistent user experience across all commands.

use std::io::{self, Write};

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::validation::ValidationReport;
use crate::{Grammar, SprigError, SyntaxTree};

// ============================================================================
// CORE OUTPUT FUNCTIONS
// ============================================================================

/// Colors only when the stream is a terminal.
fn color_choice(stream: atty::Stream) -> ColorChoice {
    if atty::is(stream) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

fn stdout_stream() -> StandardStream {
    StandardStream::stdout(color_choice(atty::Stream::Stdout))
}

fn stderr_stream() -> StandardStream {
    StandardStream::stderr(color_choice(atty::Stream::Stderr))
}

/// Prints a syntax tree, one `kind:"value"` line per node, indented by depth.
pub fn print_tree(tree: &SyntaxTree) -> io::Result<()> {
    write_tree(&mut stdout_stream(), tree)
}

/// Writes the tree in the same layout as [`SyntaxTree::pretty`], with color.
pub fn write_tree(out: &mut dyn WriteColor, tree: &SyntaxTree) -> io::Result<()> {
    let mut result = Ok(());
    tree.walk(&mut |node, depth| {
        if result.is_err() {
            return;
        }
        result = write_node(out, node, depth);
    });
    result
}

fn write_node(out: &mut dyn WriteColor, node: &SyntaxTree, depth: usize) -> io::Result<()> {
    write!(out, "{}", "  ".repeat(depth))?;
    out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
    write!(out, "{}", node.kind())?;
    out.reset()?;
    write!(out, ":")?;
    out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    write!(out, "\"{}\"", node.value())?;
    out.reset()?;
    writeln!(out)
}

/// Prints a syntax tree as pretty JSON.
pub fn print_json(tree: &SyntaxTree) -> io::Result<()> {
    let json = serde_json::to_string_pretty(tree)?;
    writeln!(io::stdout(), "{json}")
}

/// Prints every rule of `grammar` as `name = definition`.
pub fn print_rules(grammar: &Grammar) -> io::Result<()> {
    write_rules(&mut stdout_stream(), grammar)
}

pub fn write_rules(out: &mut dyn WriteColor, grammar: &Grammar) -> io::Result<()> {
    for (name, rule) in grammar.rules() {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
        write!(out, "{name}")?;
        out.reset()?;
        writeln!(out, " = {rule}")?;
    }
    Ok(())
}

/// Prints validation warnings and errors. Errors are rendered as diagnostics.
pub fn print_report(report: ValidationReport) {
    let valid = report.is_valid();
    for warning in &report.warnings {
        print_notice(&format!("warning: {warning}"));
    }
    for error in report.errors {
        print_error(error);
    }
    if valid {
        let mut stdout = stdout_stream();
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true));
        let _ = writeln!(stdout, "grammar is valid");
        let _ = stdout.reset();
    }
}

/// Prints a short yellow notice to stderr.
pub fn print_notice(message: &str) {
    let mut stderr = stderr_stream();
    let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)));
    let _ = writeln!(stderr, "{message}");
    let _ = stderr.reset();
}

/// Renders an error as a `miette` diagnostic on stderr.
pub fn print_error(error: SprigError) {
    let report = miette::Report::new(error);
    eprintln!("{report:?}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Span;
    use termcolor::NoColor;

    /// A writer whose reader has gone away.
    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failures_are_reported() {
        let tree = SyntaxTree::new("a", "a", Span::new(0, 1));
        let err = write_tree(&mut NoColor::new(ClosedPipe), &tree).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);

        let grammar = crate::arithmetic::grammar();
        let err = write_rules(&mut NoColor::new(ClosedPipe), &grammar).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn rules_are_listed_one_per_line() {
        let mut out = NoColor::new(Vec::new());
        write_rules(&mut out, &crate::arithmetic::grammar()).unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert_eq!(text.lines().count(), 6);
        assert!(text.contains("digit = ['0'-'9']\n"));
    }

    #[test]
    fn uncolored_output_matches_pretty() {
        let tree = SyntaxTree::with_children("pair", "ab", Span::new(0, 2), vec![
            SyntaxTree::new("a", "a", Span::new(0, 1)),
            SyntaxTree::new("b", "b", Span::new(1, 2)),
        ]);
        let mut out = NoColor::new(Vec::new());
        write_tree(&mut out, &tree).unwrap();
        assert_eq!(String::from_utf8(out.into_inner()).unwrap(), tree.pretty());
    }
}
