//! Command-line interface for the parser.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use console::style;

use crate::config::ParseOptions;
use crate::error::{ParserError, Result};
use crate::parser::{parse_document, ParseOutcome};
use crate::report::ConsoleReporter;
use crate::types::DocumentKind;

/// PDI Parser - Extract metadata from Pentaho jobs and transformations.
#[derive(Parser)]
#[command(name = "pdi-parser")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a job (.kjb) and the documents its entries run.
    Job {
        /// Path to the job file
        file: PathBuf,

        #[command(flatten)]
        traversal: TraversalArgs,
    },

    /// Analyze a transformation (.ktr) and the documents its executor steps run.
    Transformation {
        /// Path to the transformation file
        file: PathBuf,

        #[command(flatten)]
        traversal: TraversalArgs,
    },

    /// Analyze a .kjb or .ktr file, choosing the kind from its extension.
    Analyze {
        /// Path to the document
        file: PathBuf,

        #[command(flatten)]
        traversal: TraversalArgs,
    },
}

/// Options shared by all subcommands.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct TraversalArgs {
    /// Do not expand referenced documents
    #[arg(long)]
    pub no_follow: bool,

    /// Highest hop count to expand (default: unbounded)
    #[arg(long)]
    pub max_depth: Option<u32>,
}

impl TraversalArgs {
    /// Apply command-line flags on top of environment options.
    #[must_use]
    pub fn apply(&self, options: ParseOptions) -> ParseOptions {
        let options = if self.no_follow {
            options.with_follow_references(false)
        } else {
            options
        };
        match self.max_depth {
            Some(max_depth) => options.with_max_depth(Some(max_depth)),
            None => options,
        }
    }
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Job { file, traversal } => {
            analyze_command(&file, Some(DocumentKind::Job), traversal)
        }
        Commands::Transformation { file, traversal } => {
            analyze_command(&file, Some(DocumentKind::Transformation), traversal)
        }
        Commands::Analyze { file, traversal } => analyze_command(&file, None, traversal),
    }
}

/// Execute an analysis and print one block per document plus warnings.
fn analyze_command(
    file: &Path,
    kind: Option<DocumentKind>,
    traversal: TraversalArgs,
) -> Result<()> {
    let kind = match kind {
        Some(kind) => kind,
        None => crate::config::document_kind_for(file)?,
    };
    let options = traversal.apply(ParseOptions::from_env()?);

    println!(
        "{} {} {}",
        style("Analyzing").bold(),
        kind.as_str(),
        style(file.display()).cyan()
    );
    println!();

    let mut reporter = ConsoleReporter::stdout();
    let outcome = parse_document(kind, file, options, &mut reporter)?;
    reporter.finish().map_err(|source| ParserError::Io {
        path: PathBuf::from("<stdout>"),
        source,
    })?;

    print_summary(&outcome);
    Ok(())
}

fn print_summary(outcome: &ParseOutcome) {
    println!(
        "{} {} document(s)",
        style("Analyzed").green().bold(),
        outcome.metadata.document_count()
    );
    if !outcome.diagnostics.is_empty() {
        println!(
            "  Warnings: {}",
            style(outcome.diagnostics.len()).yellow().bold()
        );
        for diagnostic in &outcome.diagnostics {
            println!("  - {diagnostic}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_job() {
        let cli = Cli::parse_from(["pdi-parser", "job", "etl/main.kjb"]);

        let Commands::Job { file, traversal } = cli.command else {
            panic!("expected job command");
        };
        assert_eq!(file, PathBuf::from("etl/main.kjb"));
        assert!(!traversal.no_follow);
        assert!(traversal.max_depth.is_none());
    }

    #[test]
    fn test_cli_parse_transformation_flags() {
        let cli = Cli::parse_from([
            "pdi-parser",
            "transformation",
            "load.ktr",
            "--no-follow",
            "--max-depth",
            "2",
        ]);

        let Commands::Transformation { traversal, .. } = cli.command else {
            panic!("expected transformation command");
        };
        assert!(traversal.no_follow);
        assert_eq!(traversal.max_depth, Some(2));
    }

    #[test]
    fn test_traversal_args_apply() {
        let args = TraversalArgs {
            no_follow: true,
            max_depth: Some(1),
        };
        let options = args.apply(ParseOptions::default());
        assert!(!options.follow_references);
        assert_eq!(options.max_depth, Some(1));

        let untouched =
            TraversalArgs::default().apply(ParseOptions::default().with_max_depth(Some(4)));
        assert!(untouched.follow_references);
        assert_eq!(untouched.max_depth, Some(4));
    }
}
