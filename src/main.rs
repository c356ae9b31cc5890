//! borehole-combine - combine AGS-style group tables into depth intervals
//!
//! Reads group tables that an upstream parser has already exported as JSON,
//! runs the combine pipeline, and writes the combined table together with
//! the data-quality report as JSON.
//!
//! # Usage
//!
//! ```bash
//! # Combine every group, report to stdout
//! borehole-combine --input project.json
//!
//! # Only GEOL and CORE, merge breakpoints within 1 cm, fail on errors
//! borehole-combine --input project.json --groups GEOL,CORE --tolerance 0.01 --fail-on error
//! ```
//!
//! # Input
//!
//! Either `{"groups": [{"name", "headings", "rows"}, ...]}` for a single
//! project, or `{"sources": [{"name", "groups": [...]}, ...]}` for several
//! parsed files.
//!
//! # Environment Variables
//!
//! - `BOREHOLE_COMBINE_CONFIG`: Path to a combine config TOML
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use borehole_combine::{
    CellValue, Collector, CombineConfig, Combiner, GroupSet, Metrics, ProjectSource, QualitySummary,
    Severity, Warning,
};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "borehole-combine")]
#[command(about = "Combine borehole group tables into depth intervals with data-quality tracking")]
#[command(version)]
struct CliArgs {
    /// JSON file with the parsed group tables
    #[arg(short, long)]
    input: PathBuf,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Combine config TOML (overrides BOREHOLE_COMBINE_CONFIG and ./combine_config.toml)
    #[arg(short, long, env = "BOREHOLE_COMBINE_CONFIG")]
    config: Option<PathBuf>,

    /// Comma-separated groups to include (default: all groups in the input)
    #[arg(long, value_delimiter = ',')]
    groups: Option<Vec<String>>,

    /// Merge depth breakpoints closer than this
    #[arg(long)]
    tolerance: Option<f64>,

    /// Assemble boreholes in parallel
    #[arg(long)]
    parallel: bool,

    /// Exit with status 2 if anything at or above this severity was recorded
    #[arg(long, value_name = "INFO|WARNING|ERROR")]
    fail_on: Option<Severity>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,
}

// ============================================================================
// Input / Output documents
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InputDocument {
    Sources { sources: Vec<ProjectSource> },
    Groups { groups: GroupSet },
}

/// Flat rendering of the combined table.
#[derive(Debug, Serialize)]
struct TableReport {
    headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    generated_at: DateTime<Utc>,
    table: TableReport,
    warnings: &'a [Warning],
    metrics: Metrics,
    summary: QualitySummary,
}

fn load_config(args: &CliArgs) -> Result<CombineConfig> {
    let mut config = match &args.config {
        Some(path) => CombineConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => CombineConfig::load(),
    };
    if let Some(groups) = &args.groups {
        config.included_groups = Some(groups.clone());
    }
    if let Some(tolerance) = args.tolerance {
        config.depth_tolerance = tolerance;
    }
    config.parallel |= args.parallel;
    config.validate()?;
    Ok(config)
}

fn load_input(path: &Path) -> Result<InputDocument> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing group tables from {}", path.display()))
}

fn write_report(args: &CliArgs, report: &Report<'_>) -> Result<()> {
    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };
    if args.pretty {
        serde_json::to_writer_pretty(&mut out, report)?;
    } else {
        serde_json::to_writer(&mut out, report)?;
    }
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let config = load_config(&args)?;
    let input = load_input(&args.input)?;

    let combiner = Combiner::new(config);
    let (table, collector) = match input {
        InputDocument::Sources { sources } => combiner.combine_sources(&sources, Collector::new()),
        InputDocument::Groups { groups } => combiner.combine(&groups, Collector::new()),
    };

    let summary = collector.summary();
    info!(
        records = table.len(),
        boreholes = table.borehole_ids().len(),
        warnings = summary.warnings,
        errors = summary.errors,
        "Combined table ready"
    );

    let report = Report {
        generated_at: Utc::now(),
        table: TableReport {
            headers: table.headers(),
            rows: table.rows(),
        },
        warnings: collector.warnings(),
        metrics: collector.get_metrics(),
        summary,
    };
    write_report(&args, &report)?;

    if let Some(threshold) = args.fail_on {
        if collector.has_warnings(threshold) {
            warn!(%threshold, "Issues at or above threshold were recorded");
            eprint!("{}", report.summary);
            std::process::exit(2);
        }
    }
    Ok(())
}
