//! Streaming document parser for jobs and transformations.
//!
//! A document is read once, front to back. Document-level fields are picked
//! out by exact path equality; blocks holding nested data (steps, entries,
//! parameters, connections) are handed to the sub-element parsers in
//! [`elements`], which consume their whole subtree before returning.
//!
//! # Failure handling
//!
//! - A root document that cannot be opened or read is the only error returned.
//! - A nested document that cannot be opened or read becomes a `NotFound` or
//!   `Io` diagnostic and is skipped.
//! - A malformed document stops streaming; the metadata gathered so far is
//!   kept with `complete == false` and a `MalformedStream` diagnostic.

pub mod cursor;
pub mod elements;
pub mod resolver;

use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::config::{document_kind_for, ParseOptions};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{ParserError, Result};
use crate::path::PathTracker;
use crate::report::{NoopSink, ReportSink};
use crate::types::{Caller, DocumentKind, ProcessMetadata};
use crate::xml::{EventStream, XmlEvent};

use cursor::Cursor;
use resolver::Resolver;

/// Root metadata plus everything that went wrong below it.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub metadata: ProcessMetadata,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parser for one document of a known kind.
#[derive(Debug, Clone)]
pub struct DocumentParser {
    kind: DocumentKind,
    file: PathBuf,
    options: ParseOptions,
    depth: u32,
}

impl DocumentParser {
    pub fn new(kind: DocumentKind, file: impl Into<PathBuf>, options: ParseOptions) -> Self {
        Self {
            kind,
            file: file.into(),
            options,
            depth: 0,
        }
    }

    /// Set the hop counter recorded on the produced metadata.
    #[must_use]
    pub fn at_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// Parse the document file.
    pub fn parse(
        self,
        diagnostics: &mut Diagnostics,
        sink: &mut dyn ReportSink,
    ) -> Result<ProcessMetadata> {
        self.open_and_parse(None, diagnostics, sink)
    }

    /// Parse the document as the target of a reference made by `caller`.
    ///
    /// The caller is provenance only; it does not change what is extracted.
    pub fn parse_as_child(
        self,
        caller: Caller,
        diagnostics: &mut Diagnostics,
        sink: &mut dyn ReportSink,
    ) -> Result<ProcessMetadata> {
        self.open_and_parse(Some(caller), diagnostics, sink)
    }

    /// Parse a document from an already open reader.
    pub fn parse_reader<R: BufRead>(
        self,
        reader: R,
        diagnostics: &mut Diagnostics,
        sink: &mut dyn ReportSink,
    ) -> Result<ProcessMetadata> {
        let stream = EventStream::from_reader(reader, &self.file);
        Ok(self.parse_events(stream, None, diagnostics, sink)?.0)
    }

    fn open_and_parse(
        self,
        caller: Option<Caller>,
        diagnostics: &mut Diagnostics,
        sink: &mut dyn ReportSink,
    ) -> Result<ProcessMetadata> {
        let stream = EventStream::open(&self.file)?;
        Ok(self.parse_events(stream, caller, diagnostics, sink)?.0)
    }

    /// Stream the document and return its metadata with the final path state.
    ///
    /// A malformed document is downgraded to a diagnostic and partial
    /// metadata. A document that cannot be read is returned as an error.
    fn parse_events<R: BufRead>(
        &self,
        stream: EventStream<R>,
        caller: Option<Caller>,
        diagnostics: &mut Diagnostics,
        sink: &mut dyn ReportSink,
    ) -> Result<(ProcessMetadata, PathTracker)> {
        let mut metadata = ProcessMetadata::new(self.kind, &self.file);
        metadata.depth = self.depth;
        metadata.caller = caller;

        let mut cursor = Cursor::new(stream, diagnostics);
        if let Err(err) = self.stream_document(&mut cursor, &mut metadata, sink) {
            if matches!(err, ParserError::Io { .. }) {
                return Err(err);
            }
            let mut diagnostic = Diagnostic::from_error(&err, &self.file);
            if let Some(caller) = &metadata.caller {
                diagnostic = diagnostic.with_caller(caller.clone());
            }
            cursor.diagnostics().record(diagnostic);
            cursor.reset_path();
        }

        let path = cursor.path().clone();
        Ok((metadata, path))
    }

    fn stream_document<R: BufRead>(
        &self,
        cursor: &mut Cursor<'_, R>,
        metadata: &mut ProcessMetadata,
        sink: &mut dyn ReportSink,
    ) -> Result<()> {
        let root = self.kind.root_tag();

        loop {
            match cursor.next_boundary()? {
                XmlEvent::Start(name) => {
                    if cursor.path().depth() == 1 && name != root {
                        cursor.unexpected(format!(
                            "expected root element <{root}>, found <{name}>"
                        ));
                    }
                    self.dispatch(&name, cursor, metadata, sink)?;
                }
                XmlEvent::End(name) => {
                    if name == root && cursor.path().is_empty() {
                        metadata.complete = true;
                        tracing::debug!(
                            file = %self.file.display(),
                            steps = metadata.steps.len(),
                            children = metadata.children.len(),
                            "Finished document"
                        );
                        sink.report(metadata);
                        return Ok(());
                    }
                }
                XmlEvent::Eof => return Err(cursor.unexpected_eof()),
            }
        }
    }

    /// Handle a start tag; the element is already on the path.
    fn dispatch<R: BufRead>(
        &self,
        element: &str,
        cursor: &mut Cursor<'_, R>,
        metadata: &mut ProcessMetadata,
        sink: &mut dyn ReportSink,
    ) -> Result<()> {
        let paths = self.kind.paths();
        let path = cursor.path().current_path();

        match element {
            "name" if path == paths.name => {
                metadata.name = cursor.text()?;
                self.log_analyzing(metadata);
            }
            "description" if path == paths.description => {
                metadata.description = cursor.text()?;
            }
            "extended_description" if path == paths.extended_description => {
                metadata.extended_description = cursor.text()?;
            }
            _ if paths.transactional == Some(path.as_str()) => {
                metadata.transactional = cursor.text()?;
            }
            "parameters" if path == paths.parameters => {
                elements::parse_parameters(cursor, metadata)?;
            }
            "connection" if path == paths.connection => {
                if let Some(connection) = elements::parse_connection(cursor)? {
                    metadata.insert_connection(connection);
                }
            }
            _ if path == paths.container => {
                self.parse_container(cursor, metadata, sink)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn parse_container<R: BufRead>(
        &self,
        cursor: &mut Cursor<'_, R>,
        metadata: &mut ProcessMetadata,
        sink: &mut dyn ReportSink,
    ) -> Result<()> {
        let mut resolver = Resolver::new(&self.file, self.depth, self.options, sink);
        match self.kind {
            DocumentKind::Job => elements::parse_entries(cursor, metadata, &mut resolver),
            DocumentKind::Transformation => {
                if let Some(reference) = elements::parse_step(cursor, metadata)? {
                    if let Some(child) =
                        resolver.expand(&reference, metadata.name.as_deref(), cursor.diagnostics())
                    {
                        metadata.children.push(child);
                    }
                }
                Ok(())
            }
        }
    }

    fn log_analyzing(&self, metadata: &ProcessMetadata) {
        let caller = metadata.caller.as_ref();
        tracing::info!(
            kind = self.kind.as_str(),
            name = metadata.name.as_deref().unwrap_or_default(),
            file = %self.file.display(),
            depth = self.depth,
            caller = caller.and_then(|c| c.name.as_deref()).unwrap_or_default(),
            caller_step = caller.and_then(|c| c.step.as_deref()).unwrap_or_default(),
            "Analyzing document metadata"
        );
    }
}

/// Parse a document of a known kind.
pub fn parse_document(
    kind: DocumentKind,
    file: impl AsRef<Path>,
    options: ParseOptions,
    sink: &mut dyn ReportSink,
) -> Result<ParseOutcome> {
    let mut diagnostics = Diagnostics::new();
    let metadata =
        DocumentParser::new(kind, file.as_ref(), options).parse(&mut diagnostics, sink)?;
    Ok(ParseOutcome {
        metadata,
        diagnostics: diagnostics.into_vec(),
    })
}

/// Parse a job and, if enabled, the documents its entries reference.
///
/// # Examples
/// ```no_run
/// use pdi_parser::{parse_job, ParseOptions};
///
/// let outcome = parse_job("etl/main.kjb", ParseOptions::default())?;
/// for child in &outcome.metadata.children {
///     println!("{}", child.display_name());
/// }
/// # Ok::<(), pdi_parser::ParserError>(())
/// ```
pub fn parse_job(file: impl AsRef<Path>, options: ParseOptions) -> Result<ParseOutcome> {
    parse_document(DocumentKind::Job, file, options, &mut NoopSink)
}

/// Like [`parse_job`], handing each finished document to `sink`.
pub fn parse_job_with_sink(
    file: impl AsRef<Path>,
    options: ParseOptions,
    sink: &mut dyn ReportSink,
) -> Result<ParseOutcome> {
    parse_document(DocumentKind::Job, file, options, sink)
}

/// Parse a transformation, handing each finished document to `sink`.
pub fn parse_transformation(
    file: impl AsRef<Path>,
    options: ParseOptions,
    sink: &mut dyn ReportSink,
) -> Result<ParseOutcome> {
    parse_document(DocumentKind::Transformation, file, options, sink)
}

/// Parse a `.kjb` or `.ktr` file, choosing the kind from its extension.
pub fn parse_file(
    file: impl AsRef<Path>,
    options: ParseOptions,
    sink: &mut dyn ReportSink,
) -> Result<ParseOutcome> {
    let kind = document_kind_for(file.as_ref())?;
    parse_document(kind, file, options, sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use crate::report::CollectingSink;

    fn parse_str(
        kind: DocumentKind,
        xml: &str,
        diagnostics: &mut Diagnostics,
    ) -> (ProcessMetadata, PathTracker) {
        let parser = DocumentParser::new(kind, "/etl/test", ParseOptions::default());
        let stream = EventStream::from_reader(xml.as_bytes(), "/etl/test");
        parser
            .parse_events(stream, None, diagnostics, &mut NoopSink)
            .unwrap()
    }

    const TRANSFORMATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<transformation>
  <info>
    <name>load_customers</name>
    <description>Document description</description>
    <unique_connections>Y</unique_connections>
  </info>
  <extended_description>Longer text</extended_description>
  <connection><name>dwh</name><type>POSTGRESQL</type></connection>
  <step>
    <name>Table input</name>
    <type>TableInput</type>
    <description>Step description</description>
  </step>
  <order><hop><from>Table input</from><to>Out</to></hop></order>
</transformation>"#;

    #[test]
    fn test_document_and_step_descriptions_are_distinct() {
        let mut diagnostics = Diagnostics::new();
        let (metadata, path) =
            parse_str(DocumentKind::Transformation, TRANSFORMATION, &mut diagnostics);

        assert!(metadata.complete);
        assert!(path.is_empty());
        assert_eq!(metadata.name.as_deref(), Some("load_customers"));
        assert_eq!(metadata.description.as_deref(), Some("Document description"));
        assert_eq!(metadata.extended_description.as_deref(), Some("Longer text"));
        assert!(metadata.is_transactional());
        assert_eq!(
            metadata.steps["Table input"].description.as_deref(),
            Some("Step description")
        );
        assert!(metadata.connections.contains_key("dwh"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_step_name_never_becomes_document_name() {
        let xml = "<transformation><step><name>Only step</name><type>Dummy</type></step></transformation>";
        let mut diagnostics = Diagnostics::new();
        let (metadata, _) = parse_str(DocumentKind::Transformation, xml, &mut diagnostics);
        assert_eq!(metadata.name, None);
        assert!(metadata.steps.contains_key("Only step"));
    }

    #[test]
    fn test_malformed_keeps_partial_metadata_and_clears_path() {
        let xml = "<transformation><info><name>partial</name></info><step><name>S</name><type>Dummy</type></oops></transformation>";
        let mut diagnostics = Diagnostics::new();
        let (metadata, path) = parse_str(DocumentKind::Transformation, xml, &mut diagnostics);

        assert!(!metadata.complete);
        assert!(path.is_empty());
        assert_eq!(metadata.name.as_deref(), Some("partial"));
        assert_eq!(diagnostics.of_kind(DiagnosticKind::MalformedStream).count(), 1);
    }

    #[test]
    fn test_truncated_document() {
        let xml = "<job><name>cut</name><entries><entry><name>A</name>";
        let mut diagnostics = Diagnostics::new();
        let (metadata, path) = parse_str(DocumentKind::Job, xml, &mut diagnostics);

        assert!(!metadata.complete);
        assert!(path.is_empty());
        assert_eq!(metadata.name.as_deref(), Some("cut"));
        assert_eq!(diagnostics.of_kind(DiagnosticKind::MalformedStream).count(), 1);
    }

    #[test]
    fn test_wrong_root_is_reported() {
        let xml = "<transformation><info><name>t</name></info></transformation>";
        let mut diagnostics = Diagnostics::new();
        let (metadata, _) = parse_str(DocumentKind::Job, xml, &mut diagnostics);

        assert_eq!(metadata.name, None);
        assert!(diagnostics
            .of_kind(DiagnosticKind::UnexpectedState)
            .any(|d| d.message.contains("<job>")));
        assert_eq!(diagnostics.of_kind(DiagnosticKind::MalformedStream).count(), 1);
    }

    #[test]
    fn test_job_entries_without_following() {
        let xml = r#"<job>
          <name>main</name>
          <entries>
            <entry><name>START</name><type>SPECIAL</type></entry>
            <entry><name>Load</name><type>TRANS</type><filename>${Internal.Job.Filename.Directory}/missing.ktr</filename></entry>
          </entries>
        </job>"#;
        let parser = DocumentParser::new(
            DocumentKind::Job,
            "/etl/main.kjb",
            ParseOptions::default().with_follow_references(false),
        );
        let mut diagnostics = Diagnostics::new();
        let mut sink = CollectingSink::new();
        let metadata = parser
            .parse_reader(xml.as_bytes(), &mut diagnostics, &mut sink)
            .unwrap();

        assert_eq!(metadata.steps.len(), 2);
        assert_eq!(metadata.steps["Load"].step_type.as_deref(), Some("TRANS"));
        assert!(metadata.children.is_empty());
        assert!(diagnostics.is_empty());
        assert_eq!(sink.names(), vec!["main"]);
    }

    #[test]
    fn test_reparse_is_deterministic() {
        let mut first_diagnostics = Diagnostics::new();
        let mut second_diagnostics = Diagnostics::new();
        let (first, _) = parse_str(
            DocumentKind::Transformation,
            TRANSFORMATION,
            &mut first_diagnostics,
        );
        let (second, _) = parse_str(
            DocumentKind::Transformation,
            TRANSFORMATION,
            &mut second_diagnostics,
        );
        assert_eq!(first, second);
    }

    #[test]
    fn test_root_not_found() {
        let result = parse_job("/definitely/not/here.kjb", ParseOptions::default());
        assert!(matches!(
            result,
            Err(ParserError::NotFound { .. })
        ));
    }
}
