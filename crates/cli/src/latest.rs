//! `pharmamap latest`: promote the newest dated snapshot.

use std::path::PathBuf;

use pharmamap_io::snapshot::copy_latest;
use pharmamap_io::IoError;
use pharmamap_recon::PipelineConfig;

use crate::{path_or, CliError};

pub fn cmd_latest(
    config: &PipelineConfig,
    dir: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let dir = path_or(dir, &config.paths.snapshots);
    let output = path_or(output, &config.paths.latest);

    copy_latest(&dir, &output).map_err(|e| match e {
        IoError::NoSnapshot(_) => CliError::from(e).with_hint(format!(
            "expected files named pharmacies-<dd-mm-yyyy>.json in {}",
            dir.display()
        )),
        other => CliError::from(other),
    })?;
    Ok(())
}
