//! Unified, `miette`-based diagnostics for the Sprig engine.
//!
//! Two failure channels exist during a parse and they are kept apart:
//!
//! - **No-match** is not an error. Every rule reports it as `false` from
//!   [`Rule::apply`](crate::Rule::apply) and the enclosing rule backtracks.
//! - **Fatal** errors are [`SprigError`] values stored in the parse state. Once
//!   one is raised every later `apply` fails at entry and the parse unwinds.
//!
//! Everything outside of a parse (grammar validation, configuration loading,
//! the strict result conversion, I/O in the CLI) reports through the same
//! [`SprigError`] type.
//!
//! # Error Construction Macros
//!
//! - `err_msg!(Validation, "undefined rule '{}'", name)` for message-only errors.
//! - `err_ctx!(Syntax, "Syntax Error", src, span, help)` for errors that point
//!   into a source text.

use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use thiserror::Error;

use crate::Span;

pub type SourceArc = Arc<NamedSource<String>>;

/// Type-safe error classification that mirrors the `SprigError` variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// The sticky fatal error raised while matching (depth guard).
    Syntax,
    /// The root rule did not match, or matched without consuming all input.
    Incomplete,
    /// Grammar problems: undefined references, invalid patterns.
    Validation,
    /// Configuration could not be loaded or decoded.
    Config,
    /// Reading input or configuration from disk failed.
    Io,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Syntax => "Syntax",
            ErrorType::Incomplete => "Incomplete",
            ErrorType::Validation => "Validation",
            ErrorType::Config => "Config",
            ErrorType::Io => "Io",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Minimal, composable error context for diagnostics.
#[derive(Debug, Default, Clone)]
pub struct ErrorContext {
    /// The text the span points into (if any).
    pub source: Option<SourceArc>,
    /// Byte range of the error (if any).
    pub span: Option<Span>,
    /// An optional help message.
    pub help: Option<String>,
}

impl ErrorContext {
    /// Returns an empty error context (no source, span, or help).
    pub fn none() -> Self {
        Self::default()
    }

    /// Creates a context with both source and span.
    pub fn with_source_and_span(source: SourceArc, span: Span) -> Self {
        Self {
            source: Some(source),
            span: Some(span),
            help: None,
        }
    }

    /// Attaches a help message.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

/// Unified error type for all Sprig failure modes.
#[derive(Debug, Error)]
pub enum SprigError {
    #[error("{message}")]
    Syntax { message: String, ctx: ErrorContext },
    #[error("Incomplete parse: {message}")]
    Incomplete { message: String, ctx: ErrorContext },
    #[error("Validation error: {message}")]
    Validation { message: String, ctx: ErrorContext },
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("I/O error: {message}")]
    Io {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl SprigError {
    fn get_ctx(&self) -> &ErrorContext {
        match self {
            SprigError::Syntax { ctx, .. }
            | SprigError::Incomplete { ctx, .. }
            | SprigError::Validation { ctx, .. }
            | SprigError::Config { ctx, .. }
            | SprigError::Io { ctx, .. } => ctx,
        }
    }

    fn message(&self) -> &str {
        match self {
            SprigError::Syntax { message, .. }
            | SprigError::Incomplete { message, .. }
            | SprigError::Validation { message, .. }
            | SprigError::Config { message, .. }
            | SprigError::Io { message, .. } => message,
        }
    }

    /// Returns the type-safe error classification for this error.
    pub fn error_type(&self) -> ErrorType {
        match self {
            SprigError::Syntax { .. } => ErrorType::Syntax,
            SprigError::Incomplete { .. } => ErrorType::Incomplete,
            SprigError::Validation { .. } => ErrorType::Validation,
            SprigError::Config { .. } => ErrorType::Config,
            SprigError::Io { .. } => ErrorType::Io,
        }
    }

    /// Byte range the error points at, if it has one.
    pub fn span(&self) -> Option<Span> {
        self.get_ctx().span
    }

    /// Wraps an I/O failure on `path`.
    pub fn io(path: impl std::fmt::Display, err: std::io::Error) -> Self {
        SprigError::Io {
            message: format!("{path}: {err}"),
            ctx: ErrorContext::none(),
            source: Some(err),
        }
    }

    /// Wraps a configuration decoding failure on `path`.
    pub fn config<E>(path: impl std::fmt::Display, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SprigError::Config {
            message: format!("{path}: {err}"),
            ctx: ErrorContext::none(),
            source: Some(Box::new(err)),
        }
    }
}

impl Diagnostic for SprigError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let code = match self.error_type() {
            ErrorType::Syntax => "sprig::syntax",
            ErrorType::Incomplete => "sprig::incomplete",
            ErrorType::Validation => "sprig::validation",
            ErrorType::Config => "sprig::config",
            ErrorType::Io => "sprig::io",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.get_ctx()
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.get_ctx()
            .source
            .as_ref()
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let ctx = self.get_ctx();
        // A span without source text has nothing to point into.
        ctx.source.as_ref()?;
        let span = ctx.span?;
        let label = LabeledSpan::new(Some(self.message().to_string()), span.start, span.len());
        Some(Box::new(std::iter::once(label)))
    }
}

/// Converts a source string into an `Arc<NamedSource<String>>` for use in error contexts.
pub fn to_error_source<S: AsRef<str>>(name: &str, source: S) -> SourceArc {
    Arc::new(NamedSource::new(name, source.as_ref().to_string()))
}

/// Constructs a `SprigError` variant with a formatted message and no context.
#[macro_export]
macro_rules! err_msg {
    ($variant:ident, $msg:expr) => {
        $crate::SprigError::$variant {
            message: format!("{}", $msg),
            ctx: $crate::ErrorContext::none(),
        }
    };
    ($variant:ident, $fmt:expr, $($arg:expr),+ $(,)?) => {
        $crate::SprigError::$variant {
            message: format!($fmt, $($arg),+),
            ctx: $crate::ErrorContext::none(),
        }
    };
}

/// Constructs a `SprigError` variant pointing at `span` inside `src`, optionally with help.
#[macro_export]
macro_rules! err_ctx {
    ($variant:ident, $msg:expr, $src:expr, $span:expr, $help:expr) => {
        $crate::SprigError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext::with_source_and_span(
                $crate::diagnostics::SourceArc::clone($src),
                $span,
            )
            .help(format!("{}", $help)),
        }
    };
    ($variant:ident, $msg:expr, $src:expr, $span:expr) => {
        $crate::SprigError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext::with_source_and_span(
                $crate::diagnostics::SourceArc::clone($src),
                $span,
            ),
        }
    };
}
