use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ReconError, SourceKind};
use crate::model::{identity_of, AuthoritativeRecord, MergedRecord, RecordId};
use crate::region::Region;

/// Format of the `lastModification` stamp (`08/03/2022 14:05:09`).
pub const LAST_MODIFICATION_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// The fields of a pharmacy record the aggregator needs. Anything else in
/// the source record is ignored, so regulator and merged files both work.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatsRecord {
    #[serde(rename = "zipCode")]
    pub zip_code: u32,
    pub authorization_id: RecordId,
    #[serde(default)]
    pub municipality: Option<String>,
    pub status: String,
}

impl StatsRecord {
    pub fn from_value(index: usize, value: Value) -> Result<Self, ReconError> {
        let identity = identity_of(&value, "authorization_id", index);
        serde_json::from_value(value)
            .map_err(|e| ReconError::malformed(SourceKind::Stats, identity, e.to_string()))
    }
}

impl From<&AuthoritativeRecord> for StatsRecord {
    fn from(r: &AuthoritativeRecord) -> Self {
        Self {
            zip_code: r.zip_code,
            authorization_id: r.authorization_id.clone(),
            municipality: r.municipality.clone(),
            status: r.status.clone(),
        }
    }
}

impl From<&MergedRecord> for StatsRecord {
    fn from(r: &MergedRecord) -> Self {
        Self::from(&r.base)
    }
}

pub fn parse_stats_records(values: Vec<Value>) -> Result<Vec<StatsRecord>, ReconError> {
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| StatsRecord::from_value(i, v))
        .collect()
}

/// Statuses counted in dedicated buckets; anything else only counts toward totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Active,
    TemporarilySuspended,
}

impl Status {
    pub fn classify(raw: &str) -> Option<Status> {
        if raw.eq_ignore_ascii_case("active") {
            Some(Status::Active)
        } else if raw.eq_ignore_ascii_case("temporarily_suspended") {
            Some(Status::TemporarilySuspended)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZipStatEntry {
    /// Display hint taken from the first record of the zip code.
    pub municipality: Option<String>,
    pub total_pharmacies: u64,
    pub active_pharmacies: u64,
    pub temporarily_suspended_pharmacies: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionStatEntry {
    pub total_pharmacies: u64,
    pub active_pharmacies: u64,
    pub temporarily_suspended_pharmacies: u64,
}

impl RegionStatEntry {
    fn add(&mut self, zip: &ZipStatEntry) {
        self.total_pharmacies += zip.total_pharmacies;
        self.active_pharmacies += zip.active_pharmacies;
        self.temporarily_suspended_pharmacies += zip.temporarily_suspended_pharmacies;
    }
}

/// Statistics of one run. Region totals sit next to the other fields as
/// top-level keys named after the region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    #[serde(rename = "sourceFile")]
    pub source_file: String,
    #[serde(rename = "lastModification")]
    pub last_modification: String,
    #[serde(rename = "statsByZipCode")]
    pub stats_by_zip_code: BTreeMap<u32, ZipStatEntry>,
    #[serde(flatten)]
    pub region_totals: BTreeMap<Region, RegionStatEntry>,
}

/// Persisted statistics: run key → snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatsStore {
    pub snapshots: BTreeMap<String, StatsSnapshot>,
}

impl StatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a persisted store. A shape mismatch is `StoreCorrupt`, never an empty store.
    pub fn from_json(input: &str) -> Result<Self, ReconError> {
        serde_json::from_str(input).map_err(|e| ReconError::StoreCorrupt(e.to_string()))
    }

    pub fn get(&self, key: &str) -> Option<&StatsSnapshot> {
        self.snapshots.get(key)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Insert or overwrite the snapshot under `key`. Returns true when a
    /// previous snapshot was replaced.
    pub fn upsert(&mut self, key: String, snapshot: StatsSnapshot) -> bool {
        self.snapshots.insert(key, snapshot).is_some()
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Identification of one aggregation run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub key: String,
    pub source_file: String,
    pub last_modification: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct AggregationOutcome {
    pub store: StatsStore,
    pub key: String,
    /// True when an existing snapshot under `key` was overwritten.
    pub replaced: bool,
    /// Zip codes outside every region; present in per-zip stats only.
    pub unmapped_zip_codes: Vec<u32>,
}

/// Per-zip counts. Records are stable-sorted by (zip code, authorization id)
/// and grouped by contiguous zip code.
pub fn stats_by_zip_code(mut records: Vec<StatsRecord>) -> BTreeMap<u32, ZipStatEntry> {
    records.sort_by(|a, b| {
        a.zip_code
            .cmp(&b.zip_code)
            .then_with(|| a.authorization_id.cmp(&b.authorization_id))
    });

    let mut out = BTreeMap::new();
    for group in records.chunk_by(|a, b| a.zip_code == b.zip_code) {
        let mut entry = ZipStatEntry {
            municipality: group[0].municipality.clone(),
            total_pharmacies: group.len() as u64,
            ..ZipStatEntry::default()
        };
        for record in group {
            match Status::classify(&record.status) {
                Some(Status::Active) => entry.active_pharmacies += 1,
                Some(Status::TemporarilySuspended) => entry.temporarily_suspended_pharmacies += 1,
                None => debug!(
                    authorization_id = %record.authorization_id,
                    status = %record.status,
                    "unrecognized status counted in total only"
                ),
            }
        }
        out.insert(group[0].zip_code, entry);
    }
    out
}

/// Fold per-zip counts into the fixed regions. Every region is present in
/// the result; zip codes outside every region are returned separately.
pub fn region_totals(
    by_zip: &BTreeMap<u32, ZipStatEntry>,
) -> (BTreeMap<Region, RegionStatEntry>, Vec<u32>) {
    let mut totals: BTreeMap<Region, RegionStatEntry> = Region::ALL
        .into_iter()
        .map(|r| (r, RegionStatEntry::default()))
        .collect();
    let mut unmapped = Vec::new();

    for (&zip, entry) in by_zip {
        match Region::classify(zip) {
            Some(region) => totals.entry(region).or_default().add(entry),
            None => {
                warn!(zip_code = zip, "zip code outside every region, left out of region totals");
                unmapped.push(zip);
            }
        }
    }

    (totals, unmapped)
}

/// Compute statistics for `records` and upsert them into `store` under `run.key`.
///
/// Other keys are untouched; re-running with the same key and input yields
/// the same snapshot (apart from the modification stamp).
pub fn aggregate(records: Vec<StatsRecord>, mut store: StatsStore, run: &RunContext) -> AggregationOutcome {
    let stats_by_zip_code = stats_by_zip_code(records);
    let (region_totals, unmapped_zip_codes) = region_totals(&stats_by_zip_code);

    let snapshot = StatsSnapshot {
        source_file: run.source_file.clone(),
        last_modification: run.last_modification.format(LAST_MODIFICATION_FORMAT).to_string(),
        stats_by_zip_code,
        region_totals,
    };
    let replaced = store.upsert(run.key.clone(), snapshot);

    AggregationOutcome {
        store,
        key: run.key.clone(),
        replaced,
        unmapped_zip_codes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn rec(zip: u32, id: &str, municipality: &str, status: &str) -> StatsRecord {
        StatsRecord {
            zip_code: zip,
            authorization_id: RecordId::Text(id.into()),
            municipality: Some(municipality.into()),
            status: status.into(),
        }
    }

    fn run(key: &str) -> RunContext {
        RunContext {
            key: key.into(),
            source_file: format!("pharmacies-{key}.json"),
            last_modification: NaiveDate::from_ymd_opt(2022, 3, 8)
                .unwrap()
                .and_hms_opt(14, 5, 9)
                .unwrap(),
        }
    }

    fn sample() -> Vec<StatsRecord> {
        vec![
            rec(1050, "B2", "Ixelles", "ACTIVE"),
            rec(9000, "G1", "Gent", "active"),
            rec(1050, "B1", "Elsene", "TEMPORARILY_SUSPENDED"),
            rec(6000, "C1", "Charleroi", "ACTIVE"),
            rec(1000, "A1", "Bruxelles", "ACTIVE"),
            rec(9000, "G2", "Gent", "CLOSED"),
        ]
    }

    #[test]
    fn groups_by_zip_code() {
        let by_zip = stats_by_zip_code(sample());
        assert_eq!(by_zip.len(), 4);

        let ixelles = &by_zip[&1050];
        assert_eq!(ixelles.total_pharmacies, 2);
        assert_eq!(ixelles.active_pharmacies, 1);
        assert_eq!(ixelles.temporarily_suspended_pharmacies, 1);
        // sorted by authorization id: B1 comes first
        assert_eq!(ixelles.municipality.as_deref(), Some("Elsene"));
    }

    #[test]
    fn unrecognized_status_counts_toward_total_only() {
        let by_zip = stats_by_zip_code(sample());
        let gent = &by_zip[&9000];
        assert_eq!(gent.total_pharmacies, 2);
        assert_eq!(gent.active_pharmacies, 1);
        assert_eq!(gent.temporarily_suspended_pharmacies, 0);
        for entry in by_zip.values() {
            assert!(entry.active_pharmacies + entry.temporarily_suspended_pharmacies <= entry.total_pharmacies);
        }
    }

    #[test]
    fn status_is_case_insensitive() {
        assert_eq!(Status::classify("Active"), Some(Status::Active));
        assert_eq!(Status::classify("temporarily_SUSPENDED"), Some(Status::TemporarilySuspended));
        assert_eq!(Status::classify("suspended"), None);
    }

    #[test]
    fn region_totals_sum_zip_totals() {
        let by_zip = stats_by_zip_code(sample());
        let (totals, unmapped) = region_totals(&by_zip);
        assert!(unmapped.is_empty());
        assert_eq!(totals.len(), 3);

        for region in Region::ALL {
            let expected: u64 = by_zip
                .iter()
                .filter(|(zip, _)| Region::classify(**zip) == Some(region))
                .map(|(_, e)| e.total_pharmacies)
                .sum();
            assert_eq!(totals[&region].total_pharmacies, expected, "{region}");
        }
        assert_eq!(totals[&Region::Brussels].total_pharmacies, 3);
        assert_eq!(totals[&Region::Brussels].active_pharmacies, 2);
        assert_eq!(totals[&Region::Flanders].total_pharmacies, 2);
        assert_eq!(totals[&Region::Wallonia].total_pharmacies, 1);
    }

    #[test]
    fn unmapped_zip_kept_per_zip_but_not_in_regions() {
        let mut records = sample();
        records.push(rec(10_500, "X1", "Nowhere", "ACTIVE"));
        let by_zip = stats_by_zip_code(records);
        let (totals, unmapped) = region_totals(&by_zip);
        assert_eq!(unmapped, vec![10_500]);
        assert_eq!(by_zip[&10_500].total_pharmacies, 1);
        let region_sum: u64 = totals.values().map(|e| e.total_pharmacies).sum();
        assert_eq!(region_sum, 6);
    }

    #[test]
    fn empty_input_gives_zeroed_regions() {
        let outcome = aggregate(Vec::new(), StatsStore::new(), &run("08-03-2022"));
        let snap = outcome.store.get("08-03-2022").unwrap();
        assert!(snap.stats_by_zip_code.is_empty());
        assert_eq!(snap.region_totals.len(), 3);
        assert!(snap.region_totals.values().all(|e| e.total_pharmacies == 0));
    }

    #[test]
    fn upsert_is_idempotent_and_keeps_other_keys() {
        let first = aggregate(sample(), StatsStore::new(), &run("01-03-2022"));
        let second = aggregate(sample(), first.store, &run("08-03-2022"));
        assert!(!second.replaced);
        let before = second.store.get("08-03-2022").cloned().unwrap();

        let third = aggregate(sample(), second.store, &run("08-03-2022"));
        assert!(third.replaced);
        assert_eq!(third.store.len(), 2);
        assert_eq!(third.store.get("08-03-2022"), Some(&before));
        assert!(third.store.get("01-03-2022").is_some());
    }

    #[test]
    fn snapshot_json_shape() {
        let outcome = aggregate(sample(), StatsStore::new(), &run("08-03-2022"));
        let json = serde_json::to_value(&outcome.store).unwrap();
        let snap = &json["08-03-2022"];
        assert_eq!(snap["sourceFile"], "pharmacies-08-03-2022.json");
        assert_eq!(snap["lastModification"], "08/03/2022 14:05:09");
        assert_eq!(snap["statsByZipCode"]["1050"]["total_pharmacies"], 2);
        assert_eq!(snap["Brussels"]["total_pharmacies"], 3);
        assert_eq!(snap["Wallonia"]["temporarily_suspended_pharmacies"], 0);
    }

    #[test]
    fn store_round_trips_through_json() {
        let outcome = aggregate(sample(), StatsStore::new(), &run("08-03-2022"));
        let text = serde_json::to_string(&outcome.store).unwrap();
        let back = StatsStore::from_json(&text).unwrap();
        assert_eq!(back, outcome.store);
    }

    #[test]
    fn reads_store_missing_some_regions() {
        let text = json!({
            "08-03-2022": {
                "sourceFile": "pharmacies-08-03-2022.json",
                "lastModification": "08/03/2022 14:05:09",
                "statsByZipCode": {
                    "1000": {"municipality": "Bruxelles", "total_pharmacies": 1, "active_pharmacies": 1, "temporarily_suspended_pharmacies": 0}
                },
                "Brussels": {"total_pharmacies": 1, "active_pharmacies": 1, "temporarily_suspended_pharmacies": 0}
            }
        })
        .to_string();
        let store = StatsStore::from_json(&text).unwrap();
        let snap = store.get("08-03-2022").unwrap();
        assert_eq!(snap.region_totals.len(), 1);
        assert_eq!(snap.stats_by_zip_code[&1000].total_pharmacies, 1);
    }

    #[test]
    fn corrupt_store_is_rejected() {
        for text in [
            "[1, 2, 3]",
            "{\"k\": {\"sourceFile\": 3}}",
            "{\"k\": {\"sourceFile\": \"f\", \"lastModification\": \"x\", \"statsByZipCode\": {}, \"Atlantis\": {}}}",
            "not json",
        ] {
            let err = StatsStore::from_json(text).unwrap_err();
            assert!(matches!(err, ReconError::StoreCorrupt(_)), "{text}: {err}");
        }
    }

    #[test]
    fn stats_record_ignores_extra_fields() {
        let rec = StatsRecord::from_value(
            0,
            json!({"authorization_id": "A1", "zipCode": 1000, "municipality": "Bruxelles",
                   "status": "ACTIVE", "geo": [], "brand": "Multipharma"}),
        )
        .unwrap();
        assert_eq!(rec.zip_code, 1000);
    }

    #[test]
    fn stats_record_requires_numeric_zip() {
        let err = StatsRecord::from_value(2, json!({"authorization_id": 77, "zipCode": "x", "status": "ACTIVE"}))
            .unwrap_err();
        match err {
            ReconError::MalformedRecord { source, record, .. } => {
                assert_eq!(source, SourceKind::Stats);
                assert_eq!(record, "77");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
