//! Error types for the parser.
//!
//! `ParserError` is what the library returns. Only a root document that cannot
//! be opened or read surfaces as an `Err` from the entry points; everything
//! below the root is downgraded to a [`crate::diagnostics::Diagnostic`].

use std::path::PathBuf;

use thiserror::Error;

use crate::diagnostics::DiagnosticKind;

/// Main error type for the parser library.
#[derive(Debug, Error)]
pub enum ParserError {
    /// The document file does not exist.
    #[error("File {} was not found", .path.display())]
    NotFound { path: PathBuf },

    /// The document file exists but could not be opened or read.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The XML stream could not be tokenized.
    #[error("Malformed XML in {} at byte {position}: {source}", .path.display())]
    Xml {
        path: PathBuf,
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    /// The stream ended before the document's root element closed.
    #[error("Unexpected end of document {} inside '{open_path}'", .path.display())]
    UnexpectedEof { path: PathBuf, open_path: String },

    /// The file extension is neither `.kjb` nor `.ktr`.
    #[error("Cannot determine document kind of {}: expected a .kjb or .ktr file", .0.display())]
    UnknownDocumentKind(PathBuf),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ParserError {
    /// Diagnostic category used when this error is downgraded to a warning.
    #[must_use]
    pub fn diagnostic_kind(&self) -> DiagnosticKind {
        match self {
            Self::NotFound { .. } => DiagnosticKind::NotFound,
            Self::Io { .. } => DiagnosticKind::Io,
            Self::Xml { .. } | Self::UnexpectedEof { .. } => DiagnosticKind::MalformedStream,
            Self::UnknownDocumentKind(_) | Self::Config(_) => DiagnosticKind::UnexpectedState,
        }
    }
}

/// Result type alias for parser operations.
pub type Result<T> = std::result::Result<T, ParserError>;
