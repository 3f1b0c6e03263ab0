use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use tracecov::{cli, ingest};

/// tracecov — LCOV tracefile ingestion with a validating coverage model.
#[derive(Parser)]
#[command(name = "tracecov", version, about)]
struct Cli {
    /// Path to the tracefile (default: ./lcov.info)
    #[arg(long, global = true, default_value = "lcov.info")]
    file: PathBuf,

    /// Optional report title carried into the model.
    #[arg(long, global = true)]
    title: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show whole-project coverage totals.
    Summary,

    /// List per-file coverage.
    Files {
        /// Sort by coverage rate ascending (show worst files first).
        #[arg(long)]
        sort_by_coverage: bool,

        /// Only show files whose overall coverage is below this percentage.
        #[arg(long)]
        below: Option<f64>,

        /// Only show files whose path matches this regex.
        #[arg(long)]
        filter: Option<String>,
    },

    /// Show line-level coverage for a source file.
    Lines {
        /// The source file path (as recorded in the tracefile).
        source_file: String,

        /// Show only uncovered lines, in compact range notation.
        #[arg(long)]
        uncovered: bool,
    },

    /// Show per-function coverage for a source file.
    Functions {
        /// The source file path.
        source_file: String,
    },

    /// Report structural problems (duplicate paths, summary divergence).
    Validate,

    /// Emit the parsed coverage model as JSON.
    Json,

    /// Fail (exit 1) when overall coverage is below a threshold.
    Check {
        /// Minimum acceptable overall coverage percentage.
        #[arg(long)]
        threshold: f64,
    },
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let model = ingest::parse_file(&args.file, args.title.as_deref())
        .with_context(|| format!("Failed to parse tracefile {}", args.file.display()))?;

    let output = match args.command {
        Commands::Summary => cli::cmd_summary(&model)?,
        Commands::Files {
            sort_by_coverage,
            below,
            filter,
        } => cli::cmd_files(&model, sort_by_coverage, below, filter.as_deref())?,
        Commands::Lines {
            source_file,
            uncovered,
        } => cli::cmd_lines(&model, &source_file, uncovered)?,
        Commands::Functions { source_file } => cli::cmd_functions(&model, &source_file)?,
        Commands::Validate => cli::cmd_validate(&model)?,
        Commands::Json => cli::cmd_json(&model)?,
        Commands::Check { threshold } => {
            let (output, passed) = cli::cmd_check(&model, threshold)?;
            print!("{output}");
            if !passed {
                std::process::exit(1);
            }
            return Ok(());
        }
    };

    print!("{output}");
    Ok(())
}
