//! Diagnostic records collected while parsing.
//!
//! Parsers never print. Every non-fatal problem is recorded here and mirrored
//! to `tracing`, so callers decide how to present them.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ParserError;
use crate::types::Caller;

/// Category of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A referenced document does not exist.
    NotFound,
    /// A referenced document could not be read.
    Io,
    /// A document could not be tokenized; its metadata is partial.
    MalformedStream,
    /// The document violated an assumption of the parser; a field was left unset.
    UnexpectedState,
    /// An end tag arrived with no open element.
    PathUnderflow,
}

impl DiagnosticKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not-found",
            Self::Io => "io",
            Self::MalformedStream => "malformed-stream",
            Self::UnexpectedState => "unexpected-state",
            Self::PathUnderflow => "path-underflow",
        }
    }
}

/// One warning about one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Document the diagnostic is about.
    pub file: PathBuf,
    pub message: String,
    /// Referencing document and step, for failures of nested documents.
    pub caller: Option<Caller>,
}

impl Diagnostic {
    #[must_use]
    pub fn new(kind: DiagnosticKind, file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            kind,
            file: file.into(),
            message: message.into(),
            caller: None,
        }
    }

    /// Downgrade a parser error to a diagnostic.
    #[must_use]
    pub fn from_error(error: &ParserError, file: &Path) -> Self {
        Self::new(error.diagnostic_kind(), file, error.to_string())
    }

    #[must_use]
    pub fn unexpected_state(file: &Path, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::UnexpectedState, file, message)
    }

    #[must_use]
    pub fn path_underflow(file: &Path, element: &str) -> Self {
        Self::new(
            DiagnosticKind::PathUnderflow,
            file,
            format!("closing tag </{element}> without an open element"),
        )
    }

    #[must_use]
    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.as_str(), self.message)?;
        if let Some(caller) = &self.caller {
            if let Some(name) = &caller.name {
                write!(f, " (caller: {name}")?;
            } else {
                write!(f, " (caller file: {}", caller.file.display())?;
            }
            if let Some(step) = &caller.step {
                write!(f, ", step: {step}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// Collector passed down the whole traversal.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and emit it as a warning.
    pub fn record(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(
            kind = diagnostic.kind.as_str(),
            file = %diagnostic.file.display(),
            "{}",
            diagnostic
        );
        self.entries.push(diagnostic);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Diagnostics of one kind.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.kind == kind)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
