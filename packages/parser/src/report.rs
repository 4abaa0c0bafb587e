//! Hand-off of finished documents to a reporting sink.
//!
//! The parser calls [`ReportSink::report`] once per document, at the moment
//! its root element closes. Expanded children close before their parent, so a
//! sink sees them first.

use std::io::{self, Write};
use std::path::PathBuf;

use console::style;

use crate::types::{DocumentKind, ProcessMetadata};

/// Default wrap width for long descriptions.
pub const REPORT_WRAP_WIDTH: usize = 100;

/// Receives each document once its root element has closed.
pub trait ReportSink {
    fn report(&mut self, metadata: &ProcessMetadata);
}

/// Sink that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ReportSink for NoopSink {
    fn report(&mut self, _metadata: &ProcessMetadata) {}
}

/// Summary of one reported document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedDocument {
    pub kind: DocumentKind,
    pub name: Option<String>,
    pub file: PathBuf,
    pub depth: u32,
}

/// Sink remembering what was reported, in call order.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    pub reported: Vec<ReportedDocument>,
}

impl CollectingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reported names, in call order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.reported
            .iter()
            .map(|d| d.name.clone().unwrap_or_default())
            .collect()
    }
}

impl ReportSink for CollectingSink {
    fn report(&mut self, metadata: &ProcessMetadata) {
        self.reported.push(ReportedDocument {
            kind: metadata.kind,
            name: metadata.name.clone(),
            file: metadata.file.clone(),
            depth: metadata.depth,
        });
    }
}

/// Writes a human-readable block per document.
pub struct ConsoleReporter<W: Write> {
    out: W,
    width: usize,
    error: Option<io::Error>,
}

impl ConsoleReporter<io::Stdout> {
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            width: REPORT_WRAP_WIDTH,
            error: None,
        }
    }

    #[must_use]
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Return the writer, or the first write error hit while reporting.
    pub fn finish(self) -> io::Result<W> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.out),
        }
    }

    fn write_document(&mut self, metadata: &ProcessMetadata) -> io::Result<()> {
        let out = &mut self.out;
        let title = match metadata.kind {
            DocumentKind::Job => "Job",
            DocumentKind::Transformation => "Transformation",
        };

        writeln!(
            out,
            "{} {}",
            style(format!("{title}:")).bold(),
            style(metadata.display_name()).cyan()
        )?;
        writeln!(out, "| File: {}", metadata.file.display())?;
        if let Some(caller) = &metadata.caller {
            if let Some(name) = &caller.name {
                writeln!(out, "| Caller: {name}")?;
            }
            writeln!(out, "| Caller file: {}", caller.file.display())?;
            if let Some(step) = &caller.step {
                writeln!(out, "| Caller step: {step}")?;
            }
        }
        if let Some(description) = &metadata.description {
            writeln!(out, "| Description: {description}")?;
        }
        if let Some(extended) = &metadata.extended_description {
            writeln!(out, "| Extended description:")?;
            for line in textwrap::wrap(extended, self.width) {
                writeln!(out, "|   {line}")?;
            }
        }
        if metadata.transactional.is_some() {
            writeln!(out, "| Transactional: {}", metadata.is_transactional())?;
        }

        if !metadata.parameters.is_empty() {
            writeln!(out, "| Parameters: {}", metadata.parameters.len())?;
            for parameter in metadata.parameters.values() {
                writeln!(
                    out,
                    "| - {} (default: {}){}",
                    parameter.name,
                    parameter.default_value.as_deref().unwrap_or("-"),
                    parameter
                        .description
                        .as_deref()
                        .map(|d| format!(" {d}"))
                        .unwrap_or_default()
                )?;
            }
        }

        if !metadata.connections.is_empty() {
            writeln!(out, "| Connections: {}", metadata.connections.len())?;
            for connection in metadata.connections.values() {
                writeln!(
                    out,
                    "| - {} [{}] {}",
                    connection.name,
                    connection.property("type").unwrap_or("?"),
                    connection.property("server").unwrap_or("")
                )?;
            }
        }

        if !metadata.steps.is_empty() {
            writeln!(out, "| Steps: {}", metadata.steps.len())?;
            for step in metadata.steps.values() {
                writeln!(
                    out,
                    "| - {} ({})",
                    step.name,
                    step.step_type.as_deref().unwrap_or("?")
                )?;
            }
        }

        if !metadata.variables.is_empty() {
            writeln!(out, "| Variables: {}", metadata.variables.len())?;
            for variable in &metadata.variables {
                let global = variable.scope_kind().is_some_and(|s| s.is_global());
                writeln!(
                    out,
                    "| - {} set by '{}' scope {}{}",
                    variable.name,
                    variable.step_name,
                    variable.scope.as_deref().unwrap_or("?"),
                    if global { " (global)" } else { "" }
                )?;
            }
        }

        if !metadata.children.is_empty() {
            writeln!(out, "| Sub-processes: {}", metadata.children.len())?;
            for child in &metadata.children {
                writeln!(out, "| - {} {}", child.kind.as_str(), child.display_name())?;
            }
        }

        writeln!(out)?;
        Ok(())
    }
}

impl<W: Write> ReportSink for ConsoleReporter<W> {
    fn report(&mut self, metadata: &ProcessMetadata) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.write_document(metadata) {
            self.error = Some(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Parameter, Step, Variable};

    fn sample() -> ProcessMetadata {
        let mut metadata = ProcessMetadata::new(DocumentKind::Transformation, "/etl/load.ktr");
        metadata.name = Some("load".to_string());
        metadata.extended_description = Some("word ".repeat(40));
        metadata.insert_parameter(Parameter {
            name: "DATE".to_string(),
            default_value: Some("2016-11-24".to_string()),
            description: None,
        });
        let mut step = Step::new("Table input");
        step.step_type = Some("TableInput".to_string());
        metadata.insert_step(step);
        metadata
    }

    #[test]
    fn test_console_reporter_output() {
        let mut reporter = ConsoleReporter::new(Vec::new()).with_width(40);
        reporter.report(&sample());
        let out = String::from_utf8(reporter.finish().unwrap()).unwrap();

        assert!(out.contains("load"));
        assert!(out.contains("| File: /etl/load.ktr"));
        assert!(out.contains("| - DATE (default: 2016-11-24)"));
        assert!(out.contains("| - Table input (TableInput)"));
        assert!(out
            .lines()
            .filter(|l| l.starts_with("|   "))
            .all(|l| l.len() <= 44));
    }

    #[test]
    fn test_console_reporter_marks_global_variables() {
        let mut metadata = sample();
        for (name, scope) in [("BATCH_ID", "ROOT_JOB"), ("LOCAL", "PARENT_JOB")] {
            metadata.variables.push(Variable {
                step_name: "Set variables".to_string(),
                name: name.to_string(),
                scope: Some(scope.to_string()),
            });
        }
        let mut reporter = ConsoleReporter::new(Vec::new());
        reporter.report(&metadata);
        let out = String::from_utf8(reporter.finish().unwrap()).unwrap();

        assert!(out.contains("| - BATCH_ID set by 'Set variables' scope ROOT_JOB (global)\n"));
        assert!(out.contains("| - LOCAL set by 'Set variables' scope PARENT_JOB\n"));
    }

    #[test]
    fn test_collecting_sink() {
        let mut sink = CollectingSink::new();
        sink.report(&sample());
        assert_eq!(sink.names(), vec!["load"]);
        assert_eq!(sink.reported[0].kind, DocumentKind::Transformation);
    }
}
