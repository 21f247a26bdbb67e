//! contribs — contribution catalog builder
//!
//! Reads a sources config listing descriptor URLs grouped by category,
//! fetches each descriptor, and emits one JSON file per accepted
//! contribution into the output directory.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::info;

use contribs_core::builder::CatalogBuilder;
use contribs_core::config::SourcesConfig;
use contribs_core::fetch::HttpTransport;
use contribs_core::filter::{IdLists, RevisionRange};
use contribs_core::listing;
use contribs_core::logging;

/// Config file read when no positionals are given.
const DEFAULT_CONFIG: &str = "sources.conf";

/// Output directory used when no positionals are given.
const DEFAULT_OUTPUT_DIR: &str = "../sources";

/// Run-wide minimum revision used when none is given.
const DEFAULT_MIN_REVISION: i32 = 228;

/// Oldest platform revision this tool supports.
const REVISION_FLOOR: i32 = 228;

const USAGE: &str = "Usage is [Input File] [Output Dir] [Min Revision] [Max Revision]";

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "contribs",
    about = "Builds the contribution catalog from a sources config",
    version
)]
struct Cli {
    /// Config file listing contributions by category
    config: Option<PathBuf>,

    /// Directory the per-contribution JSON files are written into
    output_dir: Option<PathBuf>,

    /// Lowest platform revision to include (0 = unbounded)
    min_revision: Option<i32>,

    /// Highest platform revision to include (0 = unbounded)
    max_revision: Option<i32>,

    /// File listing contribution ids pinned to maxRevision 228
    #[clap(long, default_value = "broken.conf")]
    broken: PathBuf,

    /// File listing contribution ids excluded before any fetch
    #[clap(long, default_value = "skipped.conf")]
    skipped: PathBuf,

    /// Append-only file every log line is mirrored to
    #[clap(long, default_value = "build.log")]
    log_file: PathBuf,

    /// Set log level
    #[clap(long, default_value = "info")]
    log_level: LogLevel,

    /// Also write the flat text listing of all accepted records to this path
    #[clap(long)]
    listing: Option<PathBuf>,
}

/// Resolved run parameters after the positional-shape check.
#[derive(Debug, PartialEq, Eq)]
struct RunOptions {
    config: PathBuf,
    output_dir: PathBuf,
    range: RevisionRange,
}

/// Validate the 0/2/4 positional contract and the revision floor.
fn resolve_positionals(
    config: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    min_revision: Option<i32>,
    max_revision: Option<i32>,
) -> Result<RunOptions> {
    let (config, output_dir, min, max) = match (config, output_dir, min_revision, max_revision) {
        (None, None, None, None) => (
            PathBuf::from(DEFAULT_CONFIG),
            PathBuf::from(DEFAULT_OUTPUT_DIR),
            DEFAULT_MIN_REVISION,
            0,
        ),
        (Some(config), Some(output_dir), None, None) => {
            (config, output_dir, DEFAULT_MIN_REVISION, 0)
        }
        (Some(config), Some(output_dir), Some(min), Some(max)) => (config, output_dir, min, max),
        _ => anyhow::bail!("{USAGE}"),
    };

    if max != 0 && max < REVISION_FLOOR {
        anyhow::bail!(
            "Incompatible max revision! This tool only supports revision {REVISION_FLOOR} and later."
        );
    }

    Ok(RunOptions {
        config,
        output_dir,
        range: RevisionRange::new(min, max),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let options = resolve_positionals(
        cli.config,
        cli.output_dir,
        cli.min_revision,
        cli.max_revision,
    )?;

    logging::init(&cli.log_file, cli.log_level.to_filter_directive())?;

    info!(
        "----- {} -----",
        chrono::Local::now().format("%a %d %b %Y %H:%M:%S")
    );

    let config = SourcesConfig::from_file(&options.config)?;
    let ids = IdLists::load(&cli.broken, &cli.skipped)?;

    let builder = CatalogBuilder::new(HttpTransport::new()?, options.range, ids);
    let set = builder.collect(&config).await;

    builder.write_all(&set, &options.output_dir)?;

    if let Some(listing_path) = &cli.listing {
        listing::write_listing(&set, listing_path)?;
    }

    Ok(())
}
