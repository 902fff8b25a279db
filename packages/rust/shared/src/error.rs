//! Error types for econpub.
//!
//! Library crates use [`EconpubError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all econpub operations.
#[derive(Debug, thiserror::Error)]
pub enum EconpubError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while talking to the publication.
    #[error("network error: {0}")]
    Network(String),

    /// The edition lookup did not redirect, which means the session cookie
    /// was rejected or has expired.
    #[error(
        "edition lookup returned HTTP {status} instead of a redirect; \
         the session cookie is probably invalid or expired"
    )]
    SessionRejected { status: u16 },

    /// HTML or embedded JSON could not be parsed.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// An article body block had neither a known `type` nor a `textHtml` fragment.
    #[error("unrecognized content block {kind:?} in {article}")]
    UnrecognizedBlock { article: String, kind: Option<String> },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad edition id, missing input file, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// HTML-to-Markdown conversion error.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// The document compiler could not be started.
    #[error("failed to run {program}: {source}")]
    CompilerSpawn {
        program: String,
        source: std::io::Error,
    },

    /// The document compiler exited unsuccessfully.
    #[error("{program} exited with status {status}")]
    Compiler { program: String, status: i32 },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, EconpubError>;

impl EconpubError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
