use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::model::GeoProvenance;

/// Default great-circle distance under which two records are the same pharmacy.
pub const DEFAULT_MAX_DISTANCE_METERS: f64 = 15.0;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Pipeline configuration, usually loaded from `pharmamap.toml`.
///
/// Every section is optional; an empty document yields the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub paths: PathsConfig,
    pub matching: MatchingConfig,
    pub stats: StatsConfig,
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// Default file locations used when the CLI is not given explicit paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Regulator list (JSON array).
    pub authoritative: String,
    /// Crowd-sourced list (JSON array).
    pub secondary: String,
    /// Merged output (JSON array).
    pub merged: String,
    /// Statistics store.
    pub stats: String,
    /// Directory holding dated `pharmacies-<dd-mm-yyyy>.json` snapshots.
    pub snapshots: String,
    /// Where `latest` copies the most recent snapshot.
    pub latest: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            authoritative: "last-pharmacies_afmps.json".into(),
            secondary: "last-pharmacies_osm.json".into(),
            merged: "last-pharmacies_enhancedVersion.json".into(),
            stats: "stats.json".into(),
            snapshots: "data_afmps".into(),
            latest: "last-pharmacies_afmps.json".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Strict upper bound on match distance, in meters.
    pub max_distance_meters: f64,
    /// Provenance stamped on geo references copied from the secondary source.
    pub secondary_geo: GeoProvenance,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            max_distance_meters: DEFAULT_MAX_DISTANCE_METERS,
            secondary_geo: GeoProvenance::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Use today's date as run key when the input file name carries none.
    pub date_fallback: bool,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self { date_fallback: true }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl PipelineConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: PipelineConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let d = self.matching.max_distance_meters;
        if !d.is_finite() || d <= 0.0 {
            return Err(ReconError::ConfigValidation(format!(
                "matching.max_distance_meters must be a positive number, got {d}"
            )));
        }

        let geo = &self.matching.secondary_geo;
        for (field, value) in [
            ("format", &geo.format),
            ("description", &geo.description),
            ("source", &geo.source),
        ] {
            if value.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "matching.secondary_geo.{field} must not be empty"
                )));
            }
        }

        let p = &self.paths;
        for (field, value) in [
            ("authoritative", &p.authoritative),
            ("secondary", &p.secondary),
            ("merged", &p.merged),
            ("stats", &p.stats),
            ("snapshots", &p.snapshots),
            ("latest", &p.latest),
        ] {
            if value.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "paths.{field} must not be empty"
                )));
            }
        }

        Ok(())
    }
}
