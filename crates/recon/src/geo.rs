use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters (IUGG), the sphere used for great-circle distances.
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// A WGS 84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Reason the position is unusable for matching, if any.
    pub fn check(&self) -> Option<String> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Some(format!(
                "non-finite coordinates ({}, {})",
                self.latitude, self.longitude
            ));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Some(format!("latitude {} out of range", self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Some(format!("longitude {} out of range", self.longitude));
        }
        None
    }

    /// Lexicographic (latitude, longitude) order.
    pub fn lexicographic_cmp(&self, other: &Self) -> Ordering {
        self.latitude
            .total_cmp(&other.latitude)
            .then_with(|| self.longitude.total_cmp(&other.longitude))
    }

    /// Great-circle distance in meters (haversine formula).
    pub fn distance_meters(&self, other: &Self) -> f64 {
        haversine_meters(*self, *other)
    }
}

/// Haversine distance between two positions, in meters.
pub fn haversine_meters(a: Coordinates, b: Coordinates) -> f64 {
    let phi_a = a.latitude.to_radians();
    let phi_b = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi_a.cos() * phi_b.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

/// Latitude span (degrees) that alone already covers `meters` of great-circle distance.
///
/// Any two points whose latitudes differ by at least this much are at least
/// `meters` apart, since haversine distance is bounded below by `R * |dphi|`.
pub fn latitude_span_degrees(meters: f64) -> f64 {
    // Slightly widened so float rounding can never exclude a qualifying point.
    (meters / EARTH_RADIUS_METERS).to_degrees() * (1.0 + 1e-9) + 1e-12
}
