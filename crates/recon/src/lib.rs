//! `pharmamap-recon`: pharmacy record linkage and statistics engine.
//!
//! Pure engine crate: receives pre-parsed records, returns merged records and
//! statistics snapshots. No CLI or IO dependencies.

pub mod config;
pub mod error;
pub mod geo;
pub mod index;
pub mod matcher;
pub mod model;
pub mod region;
pub mod run_key;
pub mod stats;
pub mod strip;

pub use config::PipelineConfig;
pub use error::{ReconError, SourceKind};
pub use geo::Coordinates;
pub use index::SpatialIndex;
pub use matcher::{reconcile, MatchSummary, Reconciliation};
pub use model::{AuthoritativeRecord, MergedRecord, SecondaryRecord};
pub use region::Region;
pub use stats::{aggregate, AggregationOutcome, RunContext, StatsRecord, StatsStore};
