//! Configuration constants and traversal options for the parser.

use std::path::Path;

use crate::error::{ParserError, Result};
use crate::types::DocumentKind;

/// File extension of job documents.
pub const JOB_EXTENSION: &str = "kjb";

/// File extension of transformation documents.
pub const TRANSFORMATION_EXTENSION: &str = "ktr";

/// Step type whose `fields` block declares variables.
pub const SET_VARIABLE_STEP: &str = "SetVariable";

/// Job entry type referencing another job.
pub const ENTRY_TYPE_JOB: &str = "JOB";

/// Job entry type referencing a transformation.
pub const ENTRY_TYPE_TRANSFORMATION: &str = "TRANS";

/// Transformation step types that run another job.
pub const JOB_REFERENCE_STEP_TYPES: &[&str] = &["JobExecutor"];

/// Transformation step types that run another transformation.
pub const TRANSFORMATION_REFERENCE_STEP_TYPES: &[&str] =
    &["TransExecutor", "Mapping", "SimpleMapping", "MetaInject"];

/// Environment variable disabling reference following when set to `false` or `0`.
pub const ENV_FOLLOW_REFERENCES: &str = "PDI_FOLLOW_REFERENCES";

/// Environment variable holding the maximum expansion depth.
pub const ENV_MAX_DEPTH: &str = "PDI_MAX_DEPTH";

/// Fixed absolute paths of the document-level elements of one document kind.
///
/// Elements are matched by exact path equality, so a `description` inside a
/// step never lands on the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentPaths {
    pub name: &'static str,
    pub description: &'static str,
    pub extended_description: &'static str,
    pub transactional: Option<&'static str>,
    pub parameters: &'static str,
    pub connection: &'static str,
    /// Path of the element holding sub-process references: the `entries`
    /// container of a job, or each `step` of a transformation.
    pub container: &'static str,
}

/// Document-level paths of a job.
pub const JOB_PATHS: DocumentPaths = DocumentPaths {
    name: "/job/name",
    description: "/job/description",
    extended_description: "/job/extended_description",
    transactional: None,
    parameters: "/job/parameters",
    connection: "/job/connection",
    container: "/job/entries",
};

/// Document-level paths of a transformation.
pub const TRANSFORMATION_PATHS: DocumentPaths = DocumentPaths {
    name: "/transformation/info/name",
    description: "/transformation/info/description",
    extended_description: "/transformation/extended_description",
    transactional: Some("/transformation/info/unique_connections"),
    parameters: "/transformation/parameters",
    connection: "/transformation/connection",
    container: "/transformation/step",
};

/// Options controlling the cross-document traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Expand references to other documents into child metadata.
    pub follow_references: bool,
    /// Optional ceiling on the hop counter of expanded documents.
    pub max_depth: Option<u32>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            follow_references: true,
            max_depth: None,
        }
    }
}

impl ParseOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read options from `PDI_FOLLOW_REFERENCES` and `PDI_MAX_DEPTH`.
    pub fn from_env() -> Result<Self> {
        let follow_references = std::env::var(ENV_FOLLOW_REFERENCES)
            .ok()
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let max_depth = match std::env::var(ENV_MAX_DEPTH) {
            Ok(v) => Some(v.trim().parse().map_err(|_| {
                ParserError::Config(format!("{ENV_MAX_DEPTH} must be a number, got '{v}'"))
            })?),
            Err(_) => None,
        };

        Ok(Self {
            follow_references,
            max_depth,
        })
    }

    #[must_use]
    pub fn with_follow_references(mut self, follow_references: bool) -> Self {
        self.follow_references = follow_references;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<u32>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Options handed to a nested parser: following never propagates past one hop.
    #[must_use]
    pub fn single_hop(self) -> Self {
        Self {
            follow_references: false,
            ..self
        }
    }

    /// Whether a document at `depth` may be expanded.
    #[must_use]
    pub fn allows_depth(&self, depth: u32) -> bool {
        self.max_depth.is_none_or(|max| depth <= max)
    }
}

/// Determine the document kind from a file extension.
///
/// # Examples
/// ```
/// use pdi_parser::config::document_kind_for;
/// use pdi_parser::types::DocumentKind;
///
/// assert_eq!(document_kind_for("etl/load.ktr".as_ref()).unwrap(), DocumentKind::Transformation);
/// assert!(document_kind_for("etl/readme.md".as_ref()).is_err());
/// ```
pub fn document_kind_for(path: &Path) -> Result<DocumentKind> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some(JOB_EXTENSION) => Ok(DocumentKind::Job),
        Some(TRANSFORMATION_EXTENSION) => Ok(DocumentKind::Transformation),
        _ => Err(ParserError::UnknownDocumentKind(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert!(options.follow_references);
        assert_eq!(options.max_depth, None);
        assert!(options.allows_depth(u32::MAX));
    }

    #[test]
    fn test_single_hop_disables_following() {
        let options = ParseOptions::new().with_max_depth(Some(3)).single_hop();
        assert!(!options.follow_references);
        assert_eq!(options.max_depth, Some(3));
    }

    #[test]
    fn test_allows_depth() {
        let options = ParseOptions::new().with_max_depth(Some(1));
        assert!(options.allows_depth(1));
        assert!(!options.allows_depth(2));
    }

    #[test]
    fn test_document_kind_for() {
        assert_eq!(
            document_kind_for(Path::new("a/b/main.kjb")).unwrap(),
            DocumentKind::Job
        );
        assert_eq!(
            document_kind_for(Path::new("LOAD.KTR")).unwrap(),
            DocumentKind::Transformation
        );
        assert!(document_kind_for(Path::new("no_extension")).is_err());
    }

    #[test]
    fn test_paths_end_with_element_names() {
        assert!(JOB_PATHS.name.ends_with("/name"));
        assert!(TRANSFORMATION_PATHS.description.ends_with("/description"));
        assert_eq!(
            TRANSFORMATION_PATHS.transactional,
            Some("/transformation/info/unique_connections")
        );
        assert_eq!(JOB_PATHS.transactional, None);
    }
}
