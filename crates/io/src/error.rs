use std::fmt;
use std::path::PathBuf;

use pharmamap_recon::ReconError;

#[derive(Debug)]
pub enum IoError {
    /// Input file does not exist.
    NotFound(PathBuf),
    /// File exists but could not be read.
    Read { path: PathBuf, message: String },
    /// File content is not the JSON shape expected.
    Parse { path: PathBuf, message: String },
    /// Output could not be written.
    Write { path: PathBuf, message: String },
    /// No dated snapshot file in the directory.
    NoSnapshot(PathBuf),
    /// Engine-level failure (malformed record, corrupt store, ...).
    Recon(ReconError),
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "{}: file not found", path.display()),
            Self::Read { path, message } => write!(f, "cannot read {}: {message}", path.display()),
            Self::Parse { path, message } => write!(f, "cannot parse {}: {message}", path.display()),
            Self::Write { path, message } => write!(f, "cannot write {}: {message}", path.display()),
            Self::NoSnapshot(dir) => write!(f, "no pharmacies-*.json snapshot in {}", dir.display()),
            Self::Recon(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Recon(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ReconError> for IoError {
    fn from(e: ReconError) -> Self {
        Self::Recon(e)
    }
}
