//! Core data types for the parser.
//!
//! A [`ProcessMetadata`] is produced per document and exclusively owns its
//! steps, parameters, connections, variables and expanded children, so the
//! result of a traversal is a plain tree.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::{
    DocumentPaths, ENTRY_TYPE_JOB, ENTRY_TYPE_TRANSFORMATION, JOB_PATHS,
    JOB_REFERENCE_STEP_TYPES, SET_VARIABLE_STEP, TRANSFORMATION_PATHS,
    TRANSFORMATION_REFERENCE_STEP_TYPES,
};

/// The two kinds of PDI process documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// A job (`.kjb`), root tag `job`.
    Job,
    /// A transformation (`.ktr`), root tag `transformation`.
    Transformation,
}

impl DocumentKind {
    /// Root element name.
    #[must_use]
    pub fn root_tag(&self) -> &'static str {
        match self {
            Self::Job => "job",
            Self::Transformation => "transformation",
        }
    }

    /// Fixed document-level paths.
    #[must_use]
    pub fn paths(&self) -> &'static DocumentPaths {
        match self {
            Self::Job => &JOB_PATHS,
            Self::Transformation => &TRANSFORMATION_PATHS,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        self.root_tag()
    }
}

/// Kind of document a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Job,
    Transformation,
}

impl ReferenceKind {
    /// Classify a job entry `type` (`JOB` or `TRANS`).
    ///
    /// # Examples
    /// ```
    /// use pdi_parser::types::ReferenceKind;
    ///
    /// assert_eq!(ReferenceKind::from_entry_type("TRANS"), Some(ReferenceKind::Transformation));
    /// assert_eq!(ReferenceKind::from_entry_type("SPECIAL"), None);
    /// ```
    #[must_use]
    pub fn from_entry_type(entry_type: &str) -> Option<Self> {
        match entry_type {
            ENTRY_TYPE_JOB => Some(Self::Job),
            ENTRY_TYPE_TRANSFORMATION => Some(Self::Transformation),
            _ => None,
        }
    }

    /// Classify a transformation step type that runs another document.
    #[must_use]
    pub fn from_step_type(step_type: &str) -> Option<Self> {
        if JOB_REFERENCE_STEP_TYPES.contains(&step_type) {
            Some(Self::Job)
        } else if TRANSFORMATION_REFERENCE_STEP_TYPES.contains(&step_type) {
            Some(Self::Transformation)
        } else {
            None
        }
    }

    /// Document kind to parse the referenced file as.
    #[must_use]
    pub fn document_kind(&self) -> DocumentKind {
        match self {
            Self::Job => DocumentKind::Job,
            Self::Transformation => DocumentKind::Transformation,
        }
    }
}

/// Provenance of a nested parse: which document and step referenced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Name of the calling document, when it was known at the time of the call.
    pub name: Option<String>,
    /// File of the calling document.
    pub file: PathBuf,
    /// Name of the calling entry or step.
    pub step: Option<String>,
}

/// A named processing unit of a transformation, or an entry of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub name: String,
    pub step_type: Option<String>,
    pub description: Option<String>,
    /// Raw `filename` text of a reference-bearing step, before placeholder resolution.
    pub filename: Option<String>,
}

impl Step {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            step_type: None,
            description: None,
            filename: None,
        }
    }
}

/// Scope of a variable set by a `SetVariable` step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableScope {
    /// Valid in the whole Java virtual machine.
    Jvm,
    /// Valid in the root job.
    RootJob,
    /// Valid in the parent job.
    ParentJob,
    /// Valid in the grand-parent job.
    GrandParentJob,
    /// Anything else, kept verbatim on the [`Variable`].
    Other,
}

impl VariableScope {
    #[must_use]
    pub fn from_variable_type(variable_type: &str) -> Self {
        match variable_type {
            "JVM" => Self::Jvm,
            "ROOT_JOB" => Self::RootJob,
            "PARENT_JOB" => Self::ParentJob,
            "GP_JOB" | "GRAND_PARENT_JOB" => Self::GrandParentJob,
            _ => Self::Other,
        }
    }

    /// Whether the variable escapes the process that declares it.
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Jvm | Self::RootJob)
    }
}

/// A variable declared by a `SetVariable` step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub step_name: String,
    pub name: String,
    /// Raw `variable_type` text.
    pub scope: Option<String>,
}

impl Variable {
    #[must_use]
    pub fn scope_kind(&self) -> Option<VariableScope> {
        self.scope.as_deref().map(VariableScope::from_variable_type)
    }
}

/// A named document parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub default_value: Option<String>,
    pub description: Option<String>,
}

/// A data-source connection, kept as a flat record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Connection {
    pub name: String,
    /// Every other direct child of the connection block, verbatim.
    pub properties: BTreeMap<String, String>,
    /// `attributes/attribute` code/value pairs.
    pub attributes: BTreeMap<String, String>,
}

impl Connection {
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// A reference to another document found in a job entry or transformation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub kind: ReferenceKind,
    /// Name of the referencing entry or step.
    pub name: String,
    pub description: Option<String>,
    /// Raw file path, possibly holding `${Internal...}` placeholders.
    pub filename: String,
}

/// Metadata collected from one job or transformation document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessMetadata {
    pub kind: DocumentKind,
    pub file: PathBuf,
    /// Hops from the document the traversal started at.
    pub depth: u32,
    pub caller: Option<Caller>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub extended_description: Option<String>,
    /// Raw transactional flag (`unique_connections` of a transformation).
    pub transactional: Option<String>,
    pub steps: BTreeMap<String, Step>,
    pub parameters: BTreeMap<String, Parameter>,
    pub connections: BTreeMap<String, Connection>,
    pub variables: Vec<Variable>,
    /// Expanded sub-process documents, in order of first reference.
    pub children: Vec<ProcessMetadata>,
    /// Set once the root closing tag was observed.
    pub complete: bool,
}

impl ProcessMetadata {
    #[must_use]
    pub fn new(kind: DocumentKind, file: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            file: file.into(),
            depth: 0,
            caller: None,
            name: None,
            description: None,
            extended_description: None,
            transactional: None,
            steps: BTreeMap::new(),
            parameters: BTreeMap::new(),
            connections: BTreeMap::new(),
            variables: Vec::new(),
            children: Vec::new(),
            complete: false,
        }
    }

    /// Display name, falling back to the file name for unnamed documents.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.file
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
    }

    #[must_use]
    pub fn is_transactional(&self) -> bool {
        matches!(
            self.transactional.as_deref(),
            Some("Y" | "y" | "true" | "TRUE")
        )
    }

    /// Insert a step, replacing any earlier step of the same name.
    pub fn insert_step(&mut self, step: Step) {
        self.steps.insert(step.name.clone(), step);
    }

    /// Insert a parameter, replacing any earlier parameter of the same name.
    pub fn insert_parameter(&mut self, parameter: Parameter) {
        self.parameters.insert(parameter.name.clone(), parameter);
    }

    /// Insert a connection, replacing any earlier connection of the same name.
    pub fn insert_connection(&mut self, connection: Connection) {
        self.connections.insert(connection.name.clone(), connection);
    }

    /// Variables declared by one step.
    pub fn variables_of<'a>(&'a self, step_name: &'a str) -> impl Iterator<Item = &'a Variable> {
        self.variables
            .iter()
            .filter(move |v| v.step_name == step_name)
    }

    /// Total number of documents in this tree, including this one.
    #[must_use]
    pub fn document_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(ProcessMetadata::document_count)
            .sum::<usize>()
    }
}

/// Accumulates the fields of a step or job entry while its subtree streams.
///
/// Children may arrive in any order; the builder only becomes a [`Step`] once
/// a name is known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepBuilder {
    pub name: Option<String>,
    pub step_type: Option<String>,
    pub description: Option<String>,
    pub filename: Option<String>,
}

impl StepBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the step so far, if it is named.
    #[must_use]
    pub fn build(&self) -> Option<Step> {
        let name = self.name.clone()?;
        Some(Step {
            name,
            step_type: self.step_type.clone(),
            description: self.description.clone(),
            filename: self.filename.clone(),
        })
    }

    #[must_use]
    pub fn is_set_variable(&self) -> bool {
        self.step_type.as_deref() == Some(SET_VARIABLE_STEP)
    }

    /// The document reference this step carries, if its type is classified by
    /// `classify` and both a name and a filename are known.
    #[must_use]
    pub fn reference(&self, classify: fn(&str) -> Option<ReferenceKind>) -> Option<Reference> {
        let kind = classify(self.step_type.as_deref()?)?;
        Some(Reference {
            kind,
            name: self.name.clone()?,
            description: self.description.clone(),
            filename: self.filename.clone()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_kind_from_step_type() {
        assert_eq!(
            ReferenceKind::from_step_type("JobExecutor"),
            Some(ReferenceKind::Job)
        );
        assert_eq!(
            ReferenceKind::from_step_type("TransExecutor"),
            Some(ReferenceKind::Transformation)
        );
        assert_eq!(ReferenceKind::from_step_type("TableInput"), None);
    }

    #[test]
    fn test_variable_scope() {
        assert_eq!(
            VariableScope::from_variable_type("ROOT_JOB"),
            VariableScope::RootJob
        );
        assert!(VariableScope::Jvm.is_global());
        assert!(!VariableScope::ParentJob.is_global());
        assert_eq!(
            VariableScope::from_variable_type("something"),
            VariableScope::Other
        );
    }

    #[test]
    fn test_insert_step_last_write_wins() {
        let mut metadata = ProcessMetadata::new(DocumentKind::Transformation, "t.ktr");
        let mut first = Step::new("Lookup");
        first.step_type = Some("DBLookup".to_string());
        metadata.insert_step(first);

        let mut second = Step::new("Lookup");
        second.step_type = Some("StreamLookup".to_string());
        metadata.insert_step(second);

        assert_eq!(metadata.steps.len(), 1);
        assert_eq!(
            metadata.steps["Lookup"].step_type.as_deref(),
            Some("StreamLookup")
        );
    }

    #[test]
    fn test_display_name_falls_back_to_file() {
        let metadata = ProcessMetadata::new(DocumentKind::Job, "/etl/main.kjb");
        assert_eq!(metadata.display_name(), "main.kjb");
    }

    #[test]
    fn test_is_transactional() {
        let mut metadata = ProcessMetadata::new(DocumentKind::Transformation, "t.ktr");
        assert!(!metadata.is_transactional());
        metadata.transactional = Some("Y".to_string());
        assert!(metadata.is_transactional());
        metadata.transactional = Some("N".to_string());
        assert!(!metadata.is_transactional());
    }

    #[test]
    fn test_builder_without_name_builds_nothing() {
        let builder = StepBuilder {
            step_type: Some("TRANS".to_string()),
            filename: Some("x.ktr".to_string()),
            ..StepBuilder::default()
        };
        assert!(builder.build().is_none());
        assert!(builder.reference(ReferenceKind::from_entry_type).is_none());
    }

    #[test]
    fn test_builder_reference() {
        let builder = StepBuilder {
            name: Some("Load".to_string()),
            step_type: Some("TRANS".to_string()),
            description: None,
            filename: Some("${Internal.Job.Filename.Directory}/load.ktr".to_string()),
        };
        let reference = builder
            .reference(ReferenceKind::from_entry_type)
            .unwrap();
        assert_eq!(reference.kind, ReferenceKind::Transformation);
        assert_eq!(reference.name, "Load");
    }

    #[test]
    fn test_document_count() {
        let mut root = ProcessMetadata::new(DocumentKind::Job, "main.kjb");
        root.children
            .push(ProcessMetadata::new(DocumentKind::Transformation, "a.ktr"));
        root.children.push(ProcessMetadata::new(DocumentKind::Job, "b.kjb"));
        assert_eq!(root.document_count(), 3);
    }
}
