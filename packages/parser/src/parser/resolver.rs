//! Recursive expansion of references to other documents.
//!
//! Expansion is exactly one hop deep: the nested parser always runs with
//! reference following disabled, so a document reached through a reference
//! lists its own entries but never expands them. This also keeps cyclic
//! document graphs finite; propagating the flag further would need a visited
//! set.

use std::path::Path;

use crate::config::ParseOptions;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::placeholders;
use crate::report::ReportSink;
use crate::types::{Caller, ProcessMetadata, Reference};

use super::DocumentParser;

/// Expands references found while one document streams.
pub struct Resolver<'a> {
    document: &'a Path,
    depth: u32,
    options: ParseOptions,
    sink: &'a mut dyn ReportSink,
}

impl<'a> Resolver<'a> {
    pub fn new(
        document: &'a Path,
        depth: u32,
        options: ParseOptions,
        sink: &'a mut dyn ReportSink,
    ) -> Self {
        Self {
            document,
            depth,
            options,
            sink,
        }
    }

    /// Resolve `reference` and, when following is enabled, parse the target.
    ///
    /// Returns the child metadata, partial if the target was malformed, or
    /// `None` when expansion is disabled or the target could not be opened.
    pub fn expand(
        &mut self,
        reference: &Reference,
        caller_name: Option<&str>,
        diagnostics: &mut Diagnostics,
    ) -> Option<ProcessMetadata> {
        let base_dir = self.document.parent().unwrap_or_else(|| Path::new(""));
        let target = placeholders::resolve(base_dir, &reference.filename);

        tracing::debug!(
            step = %reference.name,
            raw = %reference.filename,
            resolved = %target.display(),
            "Resolved document reference"
        );
        if placeholders::has_unresolved_placeholder(&reference.filename) {
            tracing::debug!(
                step = %reference.name,
                raw = %reference.filename,
                "Reference keeps a placeholder that cannot be resolved offline"
            );
        }

        if !self.options.follow_references {
            return None;
        }

        let child_depth = self.depth + 1;
        if !self.options.allows_depth(child_depth) {
            tracing::debug!(
                step = %reference.name,
                depth = child_depth,
                "Skipping reference beyond maximum depth"
            );
            return None;
        }

        let caller = Caller {
            name: caller_name.map(String::from),
            file: self.document.to_path_buf(),
            step: Some(reference.name.clone()),
        };

        let parser = DocumentParser::new(
            reference.kind.document_kind(),
            &target,
            self.options.single_hop(),
        )
        .at_depth(child_depth);

        match parser.parse_as_child(caller.clone(), diagnostics, &mut *self.sink) {
            Ok(child) => Some(child),
            Err(err) => {
                diagnostics.record(Diagnostic::from_error(&err, &target).with_caller(caller));
                None
            }
        }
    }
}
