//! `pharmamap stats`: upsert one run's counts into the stats store.

use std::path::PathBuf;

use chrono::Local;
use tracing::{info, warn};

use pharmamap_io::json::read_records;
use pharmamap_io::store::{load_store, save_store};
use pharmamap_recon::run_key::RunKeyPolicy;
use pharmamap_recon::stats::parse_stats_records;
use pharmamap_recon::{aggregate, PipelineConfig, RunContext};

use crate::{path_or, CliError};

pub fn cmd_stats(
    config: &PipelineConfig,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    key: Option<String>,
    no_date_fallback: bool,
) -> Result<(), CliError> {
    let input = path_or(input, &config.paths.authoritative);
    let output = path_or(output, &config.paths.stats);

    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let now = Local::now();
    let policy = RunKeyPolicy {
        explicit: key,
        date_fallback: config.stats.date_fallback && !no_date_fallback,
    };
    let records = parse_stats_records(read_records(&input)?)?;
    let key = policy.resolve(&file_name, now.date_naive())?;
    let store = load_store(&output)?;

    let run = RunContext {
        key,
        source_file: file_name,
        last_modification: now.naive_local(),
    };
    let outcome = aggregate(records, store, &run);
    save_store(&output, &outcome.store)?;

    if !outcome.unmapped_zip_codes.is_empty() {
        warn!(
            count = outcome.unmapped_zip_codes.len(),
            zip_codes = ?outcome.unmapped_zip_codes,
            "zip codes left out of region totals"
        );
    }
    info!(
        key = %outcome.key,
        replaced = outcome.replaced,
        snapshots = outcome.store.len(),
        output = %output.display(),
        "stats updated"
    );
    Ok(())
}
