// pharmamap CLI - merge regulator and map pharmacy lists, keep zip-code statistics

mod exit_codes;
mod export;
mod latest;
mod merge;
mod stats;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pharmamap_io::IoError;
use pharmamap_recon::{PipelineConfig, ReconError};

use exit_codes::{io_exit_code, recon_exit_code, EXIT_CONFIG, EXIT_ERROR, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "pharmamap")]
#[command(about = "Merge regulator and OpenStreetMap pharmacy lists, track zip-code statistics")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// TOML config file (default paths, match threshold, stats options)
    #[arg(long, global = true, env = "PHARMAMAP_CONFIG")]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich regulator records with attributes of the nearby map record
    #[command(after_help = "\
Examples:
  pharmamap merge
  pharmamap merge --authoritative last-pharmacies_afmps.json --secondary last-pharmacies_osm.json
  pharmamap merge --max-distance 10 --output merged.json")]
    Merge {
        /// Regulator list, JSON array [default: paths.authoritative]
        #[arg(long, short = 'a')]
        authoritative: Option<PathBuf>,

        /// Map list, JSON array [default: paths.secondary]
        #[arg(long, short = 's')]
        secondary: Option<PathBuf>,

        /// Merged output [default: paths.merged]
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Match distance in meters, exclusive [default: matching.max_distance_meters]
        #[arg(long)]
        max_distance: Option<f64>,
    },

    /// Add one snapshot of per-zip and per-region counts to the stats store
    #[command(after_help = "\
Examples:
  pharmamap stats --input data_afmps/pharmacies-08-03-2022.json
  pharmamap stats --input last-pharmacies_afmps.json --key 08-03-2022
  pharmamap stats --input export.json --no-date-fallback")]
    Stats {
        /// Record file, JSON array [default: paths.authoritative]
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,

        /// Stats store, created if absent [default: paths.stats]
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Run key; overrides the date in the input file name
        #[arg(long)]
        key: Option<String>,

        /// Fail instead of using today's date when no key can be derived
        #[arg(long)]
        no_date_fallback: bool,
    },

    /// Export merged records as a GeoJSON FeatureCollection of points
    #[command(after_help = "\
Examples:
  pharmamap geojson
  pharmamap geojson --input last-pharmacies_enhancedVersion.json --output map.geojson")]
    Geojson {
        /// Merged record file [default: paths.merged]
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,

        /// Output file [default: pharmacies-<dd-mm-yyyy>.geojson]
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Copy the most recent dated regulator snapshot to the stable file name
    #[command(after_help = "\
Examples:
  pharmamap latest
  pharmamap latest --dir data_afmps --output last-pharmacies_afmps.json")]
    Latest {
        /// Snapshot directory [default: paths.snapshots]
        #[arg(long, short = 'd')]
        dir: Option<PathBuf>,

        /// Destination [default: paths.latest]
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  pharmamap-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  pharmamap-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Merge {
            authoritative,
            secondary,
            output,
            max_distance,
        } => merge::cmd_merge(&config, authoritative, secondary, output, max_distance),
        Commands::Stats {
            input,
            output,
            key,
            no_date_fallback,
        } => stats::cmd_stats(&config, input, output, key, no_date_fallback),
        Commands::Geojson { input, output } => export::cmd_geojson(&config, input, output),
        Commands::Latest { dir, output } => latest::cmd_latest(&config, dir, output),
    });

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

/// Defaults when no config file is given; otherwise parse and validate it.
fn load_config(path: Option<&Path>) -> Result<PipelineConfig, CliError> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let text = pharmamap_io::json::read_file_as_utf8(path)?;
    PipelineConfig::from_toml(&text).map_err(|e| {
        CliError::from(e).with_hint(format!("check {}", path.display()))
    })
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_CONFIG, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::UnresolvableRunKey(_) => {
                Some("pass --key, or name the input pharmacies-<key>.json".to_string())
            }
            ReconError::StoreCorrupt(_) => {
                Some("fix or move the stats file; it is never overwritten when corrupt".to_string())
            }
            _ => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }
}

impl From<IoError> for CliError {
    fn from(err: IoError) -> Self {
        match err {
            IoError::Recon(inner) => Self::from(inner),
            other => Self { code: io_exit_code(&other), message: other.to_string(), hint: None },
        }
    }
}

/// Path given on the command line, else the configured default.
pub(crate) fn path_or(arg: Option<PathBuf>, configured: &str) -> PathBuf {
    arg.unwrap_or_else(|| PathBuf::from(configured))
}
