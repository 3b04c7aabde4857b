//! `pharmamap merge`: regulator list enriched with map attributes.

use std::path::PathBuf;

use serde_json::Value;
use tracing::info;

use pharmamap_io::json::{read_records, write_json};
use pharmamap_recon::model::{parse_authoritative, parse_secondary};
use pharmamap_recon::{reconcile, MergedRecord, PipelineConfig, SpatialIndex};

use crate::{path_or, CliError};

pub fn cmd_merge(
    config: &PipelineConfig,
    authoritative: Option<PathBuf>,
    secondary: Option<PathBuf>,
    output: Option<PathBuf>,
    max_distance: Option<f64>,
) -> Result<(), CliError> {
    let mut config = config.clone();
    if let Some(d) = max_distance {
        config.matching.max_distance_meters = d;
        config
            .validate()
            .map_err(|e| CliError::config(e.to_string()).with_hint("--max-distance must be a positive number of meters"))?;
    }

    let authoritative = path_or(authoritative, &config.paths.authoritative);
    let secondary = path_or(secondary, &config.paths.secondary);
    let output = path_or(output, &config.paths.merged);

    let afmps = parse_authoritative(read_records(&authoritative)?)?;
    let osm = parse_secondary(read_records(&secondary)?)?;
    let index = SpatialIndex::build(osm);

    let result = reconcile(afmps, &index, &config.matching)?;
    let records: Vec<Value> = result
        .records
        .iter()
        .map(MergedRecord::to_json)
        .collect::<Result<_, _>>()
        .map_err(|e| CliError::general(format!("cannot serialize merged records: {e}")))?;
    write_json(&output, &records)?;

    let s = &result.summary;
    info!(
        authoritative = s.authoritative,
        secondary = s.secondary,
        matched = s.matched,
        unmatched = s.unmatched,
        unused_secondary = s.unused_secondary,
        output = %output.display(),
        "merge complete"
    );
    Ok(())
}
