//! Error types for CommonJS interop

use miette::Diagnostic;
use std::fmt;
use thiserror::Error;

/// 1-based position inside a module's source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Compute the line and column of a byte offset in `source`.
    ///
    /// Offsets past the end of the source clamp to the final position.
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let mut line = 1;
        let mut column = 1;

        for (i, ch) in source.char_indices() {
            if i >= offset {
                break;
            }
            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }

        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

fn format_location(location: &Option<SourceLocation>) -> String {
    match location {
        Some(location) => format!(" ({location})"),
        None => String::new(),
    }
}

/// Errors raised while classifying, rewriting or synthesizing modules.
///
/// Every variant carries owned strings so a failure cached in a shared
/// future (the entry set) can be handed to each observer.
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CommonJsError {
    /// Named exports were declared for a module that turned out not to be CommonJS
    #[error(
        "Custom named exports were specified for {id} but it does not appear to be a CommonJS module"
    )]
    #[diagnostic(
        code(fob::commonjs::named_exports_mismatch),
        help("Remove the namedExports entry for this module or point it at the package's CommonJS build")
    )]
    NamedExportsMismatch { id: String },

    /// A specifier could not be resolved by any strategy
    #[error("Failed to resolve '{specifier}': {message}")]
    #[diagnostic(code(fob::commonjs::resolution))]
    Resolution { specifier: String, message: String },

    /// Source text could not be parsed
    #[error("{message} in {id}{}", format_location(.location))]
    #[diagnostic(code(fob::commonjs::parse))]
    Parse {
        id: String,
        message: String,
        location: Option<SourceLocation>,
    },

    /// The rewrite engine failed on a CommonJS module
    #[error("Failed to rewrite CommonJS module {id}: {message}{}", format_location(.location))]
    #[diagnostic(code(fob::commonjs::rewrite))]
    Rewrite {
        id: String,
        message: String,
        location: Option<SourceLocation>,
    },

    /// An include/exclude glob did not compile
    #[error("Invalid {option} pattern '{pattern}': {message}")]
    #[diagnostic(
        code(fob::commonjs::invalid_pattern),
        help("Patterns use glob syntax, e.g. \"node_modules/**\"")
    )]
    InvalidPattern {
        option: &'static str,
        pattern: String,
        message: String,
    },

    /// The same module was registered twice within one build
    #[error("Module {id} was classified more than once in the same build")]
    #[diagnostic(code(fob::commonjs::duplicate_classification))]
    DuplicateClassification { id: String },

    /// A proxy was requested for a module that never finished classification
    #[error("Timed out after {timeout_ms}ms waiting for {id} to be classified")]
    #[diagnostic(
        code(fob::commonjs::classification_timeout),
        help("The module was never transformed before its proxy was loaded; check that it is reachable from an entry point")
    )]
    ClassificationTimeout { id: String, timeout_ms: u64 },

    /// A module was transformed before the build's entry points were known
    #[error("Entry points have not been configured for this build")]
    #[diagnostic(code(fob::commonjs::entries_not_configured))]
    EntriesNotConfigured,

    /// The working directory could not be determined
    #[error("Failed to determine working directory: {0}")]
    #[diagnostic(code(fob::commonjs::working_directory))]
    WorkingDirectory(String),
}

impl CommonJsError {
    /// Failure reported by a [`CommonJsRewriter`](crate::CommonJsRewriter)
    pub fn rewrite(
        id: impl Into<String>,
        message: impl Into<String>,
        location: Option<SourceLocation>,
    ) -> Self {
        Self::Rewrite {
            id: id.into(),
            message: message.into(),
            location,
        }
    }

    pub fn resolution(specifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolution {
            specifier: specifier.into(),
            message: message.into(),
        }
    }

    /// Source location attached to the failure, if any
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            Self::Parse { location, .. } | Self::Rewrite { location, .. } => *location,
            _ => None,
        }
    }
}

pub type Result<T, E = CommonJsError> = std::result::Result<T, E>;
