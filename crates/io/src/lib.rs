// File I/O around the engine: record files, stats store, GeoJSON, snapshots

pub mod error;
pub mod geojson;
pub mod json;
pub mod snapshot;
pub mod store;

pub use error::IoError;
