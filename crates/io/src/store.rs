// Stats store file

use std::path::Path;

use pharmamap_recon::StatsStore;

use crate::error::IoError;
use crate::json::{read_file_as_utf8, write_json};

/// Load the store at `path`; a missing file is a fresh, empty store.
pub fn load_store(path: &Path) -> Result<StatsStore, IoError> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "no stats store yet, starting empty");
        return Ok(StatsStore::new());
    }
    let text = read_file_as_utf8(path)?;
    Ok(StatsStore::from_json(&text)?)
}

pub fn save_store(path: &Path, store: &StatsStore) -> Result<(), IoError> {
    write_json(path, store)
}
