//! Error types for the CSS compiler.

use std::path::PathBuf;

/// Result type alias for compiler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while compiling a stylesheet.
///
/// Each compilation stage fails as a whole: a parse error means no stylesheet
/// is produced, a transform error leaves the stylesheet unchanged, and a
/// printer error produces no output. Recoverable diagnostics (lexical
/// warnings, skipped query clauses, best-effort downlevel fallbacks) are
/// reported through `tracing` and [`crate::tokenizer::TokenWarning`] instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed CSS syntax. Fatal to the parse call.
    #[error("CSS parse error at line {line}, column {column}: {message}")]
    Parse {
        message: String,
        line: u32,
        column: u32,
    },

    /// Invalid transform configuration.
    #[error("transform error: {0}")]
    Transform(String),

    /// Malformed scoped-name pattern in the CSS Modules configuration.
    #[error("invalid scoped-name pattern: {0}")]
    Pattern(String),

    /// A compatibility query with no resolvable clause.
    #[error("unresolvable target query: {0}")]
    TargetQuery(String),

    /// Internal invariant violation during serialization.
    ///
    /// This indicates a bug (a node the printer does not know how to
    /// render), never a user input problem.
    #[error("printer error: {0}")]
    Print(String),

    /// File I/O error.
    #[error("failed to read stylesheet '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a parse error.
    pub fn parse(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self::Parse {
            message: message.into(),
            line,
            column,
        }
    }

    /// Create a transform error.
    pub fn transform(message: impl Into<String>) -> Self {
        Self::Transform(message.into())
    }

    /// Create a pattern error.
    pub fn pattern(message: impl Into<String>) -> Self {
        Self::Pattern(message.into())
    }

    /// Create a target query error.
    pub fn target_query(message: impl Into<String>) -> Self {
        Self::TargetQuery(message.into())
    }

    /// Create a printer error.
    pub fn print(message: impl Into<String>) -> Self {
        Self::Print(message.into())
    }

    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<std::fmt::Error> for Error {
    fn from(_: std::fmt::Error) -> Self {
        Self::Print("formatting failed".into())
    }
}

/// Derive a 1-indexed line/column pair from a byte offset into `source`.
/// Columns count characters, not bytes.
pub(crate) fn line_col(source: &str, offset: usize) -> (u32, u32) {
    let offset = offset.min(source.len());
    let mut line = 1u32;
    let mut col = 1u32;
    for (index, c) in source.char_indices() {
        if index >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}
