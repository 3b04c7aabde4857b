use crate::geo::{latitude_span_degrees, Coordinates};
use crate::model::SecondaryRecord;

/// A secondary record prepared for matching.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    /// Position in the sorted candidate sequence.
    pub position: usize,
    /// Position in the original secondary input.
    pub source_index: usize,
    pub coordinates: Coordinates,
    pub record: SecondaryRecord,
}

/// Secondary records sorted by (latitude, longitude).
///
/// The index itself is immutable; consumption state lives with the caller
/// (see [`crate::matcher::reconcile`]) as a flag vector parallel to
/// [`SpatialIndex::candidates`].
#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    candidates: Vec<MatchCandidate>,
}

impl SpatialIndex {
    /// Stable-sort the records by coordinates and tag each with its sorted position.
    pub fn build(records: Vec<SecondaryRecord>) -> Self {
        let mut tagged: Vec<(usize, SecondaryRecord)> = records.into_iter().enumerate().collect();
        tagged.sort_by(|(_, a), (_, b)| a.geo.lexicographic_cmp(&b.geo));

        let candidates = tagged
            .into_iter()
            .enumerate()
            .map(|(position, (source_index, record))| MatchCandidate {
                position,
                source_index,
                coordinates: record.geo,
                record,
            })
            .collect();

        Self { candidates }
    }

    pub fn candidates(&self) -> &[MatchCandidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Sorted-position range of candidates whose latitude is close enough to
    /// `origin` that they could lie within `radius_meters` of it. Candidates
    /// outside the range are provably at or beyond the radius.
    pub fn latitude_window(&self, origin: Coordinates, radius_meters: f64) -> std::ops::Range<usize> {
        let span = latitude_span_degrees(radius_meters);
        let low = origin.latitude - span;
        let high = origin.latitude + span;
        let start = self.candidates.partition_point(|c| c.coordinates.latitude <= low);
        let end = self.candidates.partition_point(|c| c.coordinates.latitude < high);
        start..end.max(start)
    }
}
