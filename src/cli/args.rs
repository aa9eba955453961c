//! Defines the command-line arguments and subcommands for the Sprig CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::arithmetic;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "sprig",
    version,
    about = "Parse text with a runtime-assembled PEG grammar and print the syntax tree."
)]
pub struct SprigArgs {
    /// Increase log verbosity (-v for debug, -vv for trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Load parser settings from a YAML (or .json) file.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Do not skip ASCII spaces before each rule.
    #[arg(long, global = true)]
    pub no_skip_whitespace: bool,

    /// Abort the parse once more than this many rules are open at once.
    #[arg(long, global = true, value_name = "N")]
    pub max_depth: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse input with the arithmetic grammar and print the syntax tree.
    Parse {
        /// The text to parse.
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        input: Option<String>,
        /// Read the text to parse from a file instead.
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
        /// Name of the rule to start from.
        #[arg(long, default_value = arithmetic::ROOT)]
        rule: String,
        /// Print the tree as JSON.
        #[arg(long)]
        json: bool,
        /// Fail unless the root rule matches the whole input.
        #[arg(long)]
        strict: bool,
    },
    /// List the rules of the arithmetic grammar.
    Rules,
    /// Check the arithmetic grammar for undefined references and other mistakes.
    Validate,
}
