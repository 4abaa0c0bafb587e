//! PDI Parser - Extract metadata from Pentaho Data Integration documents.
//!
//! This crate streams job (`.kjb`) and transformation (`.ktr`) documents once,
//! front to back, collecting names, descriptions, parameters, variables, steps
//! and connections. References from job entries and executor steps to other
//! documents are resolved and expanded one hop deep into child metadata.
//!
//! # Example
//!
//! ```
//! use pdi_parser::placeholders::resolve;
//! use std::path::{Path, PathBuf};
//!
//! let target = resolve(Path::new("/etl"), "${Internal.Job.Filename.Directory}/load.ktr");
//! assert_eq!(target, PathBuf::from("/etl/load.ktr"));
//! ```
//!
//! # Architecture
//!
//! The parser is organized into several modules:
//!
//! - [`config`]: Document paths, constants and traversal options
//! - [`types`]: Metadata model (ProcessMetadata, Step, Variable, etc.)
//! - [`error`]: Error types and Result alias
//! - [`diagnostics`]: Non-fatal problems collected during a traversal
//! - [`path`]: Element path tracking
//! - [`xml`]: Forward-only XML event stream
//! - [`placeholders`]: Internal directory variable substitution
//! - [`parser`]: Document parser, sub-element parsers and reference resolver
//! - [`report`]: Reporting sinks
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod parser;
pub mod path;
pub mod placeholders;
pub mod report;
pub mod types;
pub mod xml;

// Re-export main functions
pub use parser::{
    parse_document, parse_file, parse_job, parse_job_with_sink, parse_transformation,
    DocumentParser, ParseOutcome,
};

// Re-export commonly used items
pub use config::ParseOptions;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::{ParserError, Result};
pub use report::{CollectingSink, ConsoleReporter, NoopSink, ReportSink};
pub use types::{
    Caller, Connection, DocumentKind, Parameter, ProcessMetadata, Reference, ReferenceKind, Step,
    Variable,
};
