//! CLI Exit Code Registry
//!
//! Single source of truth for `pharmamap` exit codes. Scripts and schedulers
//! rely on them, so existing values never change meaning.
//!
//! | Code | Meaning                                          |
//! |------|--------------------------------------------------|
//! | 0    | Success                                          |
//! | 1    | General error (unspecified)                      |
//! | 2    | Usage error (bad arguments)                      |
//! | 3    | Input file or directory missing / unreadable     |
//! | 4    | Malformed record or unparseable input file       |
//! | 5    | Stats store exists but is corrupt                |
//! | 6    | No run key could be resolved                     |
//! | 7    | Invalid configuration                            |
//! | 8    | Output could not be written                      |

use pharmamap_io::IoError;
use pharmamap_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
/// Raised by clap's own argument parsing.
#[allow(dead_code)]
pub const EXIT_USAGE: u8 = 2;

/// Input file or snapshot directory is missing or cannot be read.
pub const EXIT_INPUT: u8 = 3;

/// A record (or the whole input file) does not have the expected shape.
pub const EXIT_MALFORMED: u8 = 4;

/// The persisted stats store does not parse.
pub const EXIT_STORE_CORRUPT: u8 = 5;

/// No explicit key, no key in the file name, and the date fallback is off.
pub const EXIT_RUN_KEY: u8 = 6;

/// Config file does not parse or fails validation.
pub const EXIT_CONFIG: u8 = 7;

/// Output file could not be written.
pub const EXIT_WRITE: u8 = 8;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::MalformedRecord { .. } => EXIT_MALFORMED,
        ReconError::UnresolvableRunKey(_) => EXIT_RUN_KEY,
        ReconError::StoreCorrupt(_) => EXIT_STORE_CORRUPT,
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_CONFIG,
    }
}

/// Map an adapter error to its exit code.
pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::NotFound(_) | IoError::Read { .. } | IoError::NoSnapshot(_) => EXIT_INPUT,
        IoError::Parse { .. } => EXIT_MALFORMED,
        IoError::Write { .. } => EXIT_WRITE,
        IoError::Recon(e) => recon_exit_code(e),
    }
}
