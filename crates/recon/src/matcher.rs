use serde::Serialize;
use tracing::{debug, trace};

use crate::config::MatchingConfig;
use crate::error::ReconError;
use crate::geo::Coordinates;
use crate::index::SpatialIndex;
use crate::model::{AuthoritativeRecord, MergedRecord};

/// Counts describing one reconcile run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub authoritative: usize,
    pub secondary: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub unused_secondary: usize,
}

#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// One entry per authoritative input, in input order.
    pub records: Vec<MergedRecord>,
    pub summary: MatchSummary,
}

/// Link each authoritative record to at most one secondary candidate.
///
/// Authoritative records are visited in input order. Each takes the first
/// unconsumed candidate, in sorted-coordinate order, lying strictly closer
/// than `matching.max_distance_meters`; a taken candidate is never offered
/// again. Records without a qualifying candidate pass through unchanged.
pub fn reconcile(
    authoritative: Vec<AuthoritativeRecord>,
    index: &SpatialIndex,
    matching: &MatchingConfig,
) -> Result<Reconciliation, ReconError> {
    let threshold = matching.max_distance_meters;
    let mut consumed = vec![false; index.len()];
    let mut records = Vec::with_capacity(authoritative.len());
    let mut matched = 0;

    for record in authoritative {
        let origin = record.position()?;

        let merged = match find_first_match(index, &consumed, origin, threshold) {
            Some(pos) => {
                consumed[pos] = true;
                matched += 1;
                let candidate = &index.candidates()[pos];
                debug!(
                    authorization_id = %record.authorization_id,
                    candidate = candidate.source_index,
                    distance_m = origin.distance_meters(&candidate.coordinates),
                    "matched"
                );
                MergedRecord::enriched(record, &candidate.record, &matching.secondary_geo)
            }
            None => {
                trace!(authorization_id = %record.authorization_id, "no candidate within threshold");
                MergedRecord::unmatched(record)
            }
        };
        records.push(merged);
    }

    let summary = MatchSummary {
        authoritative: records.len(),
        secondary: index.len(),
        matched,
        unmatched: records.len() - matched,
        unused_secondary: consumed.iter().filter(|c| !**c).count(),
    };

    Ok(Reconciliation { records, summary })
}

/// Sorted position of the first unconsumed candidate strictly within
/// `threshold` meters of `origin`.
///
/// Only the latitude window that can contain such a candidate is scanned;
/// everything before it is too far south and everything after too far north,
/// so the result equals that of a scan over the full sequence.
pub fn find_first_match(
    index: &SpatialIndex,
    consumed: &[bool],
    origin: Coordinates,
    threshold: f64,
) -> Option<usize> {
    let window = index.latitude_window(origin, threshold);
    index.candidates()[window.clone()]
        .iter()
        .zip(&consumed[window])
        .find(|(candidate, used)| !**used && origin.distance_meters(&candidate.coordinates) < threshold)
        .map(|(candidate, _)| candidate.position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GeoReference, Party, Position, RecordId, SecondaryRecord};

    fn afmps(id: &str, lat: f64, lon: f64) -> AuthoritativeRecord {
        AuthoritativeRecord {
            authorization_id: RecordId::Text(id.into()),
            name: Some(format!("Pharmacy {id}")),
            textual_address: None,
            zip_code: 1000,
            municipality: Some("Bruxelles".into()),
            geo: vec![GeoReference {
                format: Some("epsg:4326".into()),
                description: Some("WGS 84".into()),
                source: None,
                position: Position::Wgs84 { latitude: lat, longitude: lon },
            }],
            authorization_holder: Party::default(),
            operator: Party::default(),
            status: "ACTIVE".into(),
        }
    }

    fn osm(lat: f64, lon: f64, brand: &str) -> SecondaryRecord {
        SecondaryRecord {
            name: Vec::new(),
            geo: Coordinates::new(lat, lon),
            contact: None,
            brand: Some(brand.into()),
            osm_opening_hours: None,
            opening_hours: Vec::new(),
            addresses: Vec::new(),
        }
    }

    /// Latitude offset (degrees) moving a point `meters` due north.
    fn north(meters: f64) -> f64 {
        (meters / crate::geo::EARTH_RADIUS_METERS).to_degrees()
    }

    fn run(afmps: Vec<AuthoritativeRecord>, osm: Vec<SecondaryRecord>) -> Reconciliation {
        let index = SpatialIndex::build(osm);
        reconcile(afmps, &index, &MatchingConfig::default()).unwrap()
    }

    #[test]
    fn close_candidate_is_merged() {
        let out = run(
            vec![afmps("A1", 50.8503, 4.3517)],
            vec![osm(50.85031, 4.35171, "Multipharma")],
        );
        let merged = &out.records[0];
        assert_eq!(merged.brand.as_deref(), Some("Multipharma"));
        assert_eq!(merged.base.geo.len(), 2);
        assert_eq!(merged.base.geo[1].source.as_deref(), Some("https://www.openstreetmap.org/"));
        assert_eq!(merged.base.geo[1].wgs84(), Some(Coordinates::new(50.85031, 4.35171)));
        assert_eq!(out.summary.matched, 1);
        assert_eq!(out.summary.unused_secondary, 0);
    }

    #[test]
    fn distant_candidate_is_ignored() {
        let out = run(
            vec![afmps("A1", 50.8503, 4.3517)],
            vec![osm(50.8503 + north(50.0), 4.3517, "Multipharma")],
        );
        let json = out.records[0].to_json().unwrap();
        assert!(json.get("brand").is_none());
        assert_eq!(out.records[0].base.geo.len(), 1);
        assert_eq!(out.summary.unmatched, 1);
        assert_eq!(out.summary.unused_secondary, 1);
    }

    #[test]
    fn threshold_is_strict() {
        let a = afmps("A1", 50.0, 4.0);
        let origin = a.position().unwrap();
        let b = osm(50.0 + north(15.0001), 4.0, "far");
        let c = osm(50.0 + north(14.9), 4.0, "near");
        assert!(origin.distance_meters(&b.geo) >= 15.0);
        assert!(origin.distance_meters(&c.geo) < 15.0);

        let out = run(vec![a.clone()], vec![b]);
        assert!(!out.records[0].is_matched());
        let out = run(vec![a], vec![c]);
        assert!(out.records[0].is_matched());
    }

    #[test]
    fn distance_equal_to_threshold_does_not_match() {
        let a = afmps("A1", 50.0, 4.0);
        let b = osm(50.00005, 4.00007, "edge");
        let exact = a.position().unwrap().distance_meters(&b.geo);
        let index = SpatialIndex::build(vec![b]);
        let mut matching = MatchingConfig::default();
        matching.max_distance_meters = exact;
        let out = reconcile(vec![a.clone()], &index, &matching).unwrap();
        assert!(!out.records[0].is_matched());

        matching.max_distance_meters = exact * 1.000_001;
        let out = reconcile(vec![a], &index, &matching).unwrap();
        assert!(out.records[0].is_matched());
    }

    #[test]
    fn candidate_consumed_only_once() {
        // Two authoritative records sharing the same point, one candidate
        let out = run(
            vec![afmps("A1", 50.0, 4.0), afmps("A2", 50.0, 4.0)],
            vec![osm(50.0, 4.0, "only")],
        );
        assert!(out.records[0].is_matched());
        assert!(!out.records[1].is_matched());
    }

    #[test]
    fn first_fit_in_sorted_order_not_nearest() {
        // Both candidates lie within 15 m; the southern one sorts first even
        // though the northern one is closer.
        let out = run(
            vec![afmps("A1", 50.0, 4.0)],
            vec![
                osm(50.0 + north(1.0), 4.0, "closest"),
                osm(50.0 - north(10.0), 4.0, "first_sorted"),
            ],
        );
        assert_eq!(out.records[0].brand.as_deref(), Some("first_sorted"));
    }

    #[test]
    fn output_order_follows_authoritative_input() {
        let out = run(
            vec![
                afmps("north", 51.0, 4.0),
                afmps("south", 49.0, 4.0),
                afmps("middle", 50.0, 4.0),
            ],
            vec![osm(49.0, 4.0, "s"), osm(51.0, 4.0, "n")],
        );
        let ids: Vec<String> = out
            .records
            .iter()
            .map(|r| r.base.authorization_id.to_string())
            .collect();
        assert_eq!(ids, vec!["north", "south", "middle"]);
        assert_eq!(out.records[0].brand.as_deref(), Some("n"));
        assert_eq!(out.records[1].brand.as_deref(), Some("s"));
        assert!(!out.records[2].is_matched());
    }

    #[test]
    fn empty_inputs() {
        let out = run(Vec::new(), Vec::new());
        assert!(out.records.is_empty());
        let out = run(vec![afmps("A1", 50.0, 4.0)], Vec::new());
        assert_eq!(out.records.len(), 1);
        assert!(!out.records[0].is_matched());
    }

    #[test]
    fn malformed_coordinates_fail_fast() {
        let mut bad = afmps("BAD", 50.0, 4.0);
        bad.geo[0].position = Position::Wgs84 { latitude: f64::NAN, longitude: 4.0 };
        let index = SpatialIndex::build(vec![osm(50.0, 4.0, "x")]);
        let err = reconcile(vec![afmps("A1", 51.0, 4.0), bad], &index, &MatchingConfig::default())
            .unwrap_err();
        match err {
            ReconError::MalformedRecord { record, .. } => assert_eq!(record, "BAD"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn consumed_candidates_are_skipped_by_search() {
        let index = SpatialIndex::build(vec![osm(50.0, 4.0, "a"), osm(50.0, 4.00001, "b")]);
        let origin = Coordinates::new(50.0, 4.0);
        assert_eq!(find_first_match(&index, &[false, false], origin, 15.0), Some(0));
        assert_eq!(find_first_match(&index, &[true, false], origin, 15.0), Some(1));
        assert_eq!(find_first_match(&index, &[true, true], origin, 15.0), None);
    }
}
