//! `pharmamap geojson`: map layer from the merged list.

use std::path::PathBuf;

use chrono::Local;
use tracing::info;

use pharmamap_io::geojson::feature_collection;
use pharmamap_io::json::{read_records, write_json};
use pharmamap_recon::run_key::RUN_KEY_DATE_FORMAT;
use pharmamap_recon::{MergedRecord, PipelineConfig, ReconError, SourceKind};

use crate::{path_or, CliError};

pub fn cmd_geojson(
    config: &PipelineConfig,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let input = path_or(input, &config.paths.merged);
    let output = output.unwrap_or_else(default_output);

    let records = read_records(&input)?
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            serde_json::from_value::<MergedRecord>(value).map_err(|e| ReconError::MalformedRecord {
                source: SourceKind::Authoritative,
                record: format!("#{i}"),
                reason: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let collection = feature_collection(&records)?;
    write_json(&output, &collection)?;

    info!(
        features = collection.features.len(),
        output = %output.display(),
        "geojson written"
    );
    Ok(())
}

fn default_output() -> PathBuf {
    PathBuf::from(format!(
        "pharmacies-{}.geojson",
        Local::now().format(RUN_KEY_DATE_FORMAT)
    ))
}
