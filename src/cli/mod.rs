//! The Sprig Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and wires the
//! arithmetic demonstration grammar to the parser, printing trees and
//! diagnostics.

use crate::cli::args::{Command, SprigArgs};
use crate::{arithmetic, err_msg, ParseOutcome, ParserConfig, SprigError};
use clap::Parser;
use std::path::PathBuf;
use std::{fs, process};
use tracing_subscriber::EnvFilter;

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    let args = SprigArgs::parse();
    init_tracing(args.verbose);

    let result = build_config(&args).and_then(|config| match args.command {
        Command::Parse {
            input,
            file,
            rule,
            json,
            strict,
        } => handle_parse(config, input, file, &rule, json, strict),
        Command::Rules => output::print_rules(&arithmetic::grammar_with(config))
            .map_err(|e| SprigError::io("<stdout>", e)),
        Command::Validate => handle_validate(config),
    });

    if let Err(e) = result {
        output::print_error(e);
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "error",
        1 => "sprig=debug",
        _ => "sprig=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_config(args: &SprigArgs) -> Result<ParserConfig, SprigError> {
    let mut config = match &args.config {
        Some(path) => ParserConfig::load(path)?,
        None => ParserConfig::default(),
    };
    if args.no_skip_whitespace {
        config.skip_whitespace = false;
    }
    if let Some(depth) = args.max_depth {
        config.max_depth = depth;
    }
    Ok(config)
}

/// Handles the `parse` subcommand.
fn handle_parse(
    config: ParserConfig,
    input: Option<String>,
    file: Option<PathBuf>,
    rule: &str,
    json: bool,
    strict: bool,
) -> Result<(), SprigError> {
    let text = match (input, file) {
        (Some(text), _) => text,
        (None, Some(path)) => {
            fs::read_to_string(&path).map_err(|e| SprigError::io(path.display(), e))?
        }
        (None, None) => {
            return Err(SprigError::io(
                "<input>",
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "no input given"),
            ))
        }
    };

    let grammar = arithmetic::grammar_with(config);
    let result = grammar.parse(rule, &text);

    if strict || result.outcome() == ParseOutcome::Aborted {
        let tree = result.into_result()?;
        return emit(&tree, json);
    }

    let complete = result.is_complete();
    let (cursor, len) = (result.cursor(), text.len());
    match result.into_tree() {
        Some(tree) => {
            emit(&tree, json)?;
            if !complete {
                output::print_notice(&format!("note: stopped at byte {cursor} of {len}"));
            }
            Ok(())
        }
        None => {
            output::print_notice("no match");
            Ok(())
        }
    }
}

fn emit(tree: &crate::SyntaxTree, json: bool) -> Result<(), SprigError> {
    let written = if json {
        output::print_json(tree)
    } else {
        output::print_tree(tree)
    };
    written.map_err(|e| SprigError::io("<stdout>", e))
}

/// Handles the `validate` subcommand.
fn handle_validate(config: ParserConfig) -> Result<(), SprigError> {
    let report = arithmetic::grammar_with(config).validate();
    let problems = report.errors.len();
    output::print_report(report);
    if problems == 0 {
        Ok(())
    } else {
        Err(err_msg!(Validation, "{} problem(s) found in the grammar", problems))
    }
}
