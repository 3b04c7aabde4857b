use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ReconError, SourceKind};
use crate::geo::Coordinates;
use crate::strip::strip_nulls;

// ---------------------------------------------------------------------------
// Shared pieces
// ---------------------------------------------------------------------------

/// Regulator authorization number, kept in whatever JSON type it arrived as.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Position carried by a geo reference: geographic or projected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Position {
    Wgs84 { latitude: f64, longitude: f64 },
    Projected { x: f64, y: f64 },
}

/// One entry of a record's `geo` list, with provenance metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoReference {
    pub format: Option<String>,
    pub description: Option<String>,
    pub source: Option<String>,
    #[serde(flatten)]
    pub position: Position,
}

impl GeoReference {
    pub fn wgs84(&self) -> Option<Coordinates> {
        match self.position {
            Position::Wgs84 { latitude, longitude } => Some(Coordinates::new(latitude, longitude)),
            Position::Projected { .. } => None,
        }
    }
}

/// Provenance stamped on geo references appended from the secondary source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoProvenance {
    pub format: String,
    pub description: String,
    pub source: String,
}

impl Default for GeoProvenance {
    fn default() -> Self {
        Self {
            format: "epsg:4326".into(),
            description: "WGS 84".into(),
            source: "https://www.openstreetmap.org/".into(),
        }
    }
}

impl GeoProvenance {
    pub fn stamp(&self, coordinates: Coordinates) -> GeoReference {
        GeoReference {
            format: Some(self.format.clone()),
            description: Some(self.description.clone()),
            source: Some(self.source.clone()),
            position: Position::Wgs84 {
                latitude: coordinates.latitude,
                longitude: coordinates.longitude,
            },
        }
    }
}

/// Company name plus enterprise number (KBO-BCE).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub name: Option<String>,
    pub entreprise_number: Option<String>,
}

/// A value tagged with an optional language code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Localized<T> {
    pub lang: Option<String>,
    pub value: T,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub fax: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostalAddress {
    pub lang: Option<String>,
    pub street: Option<String>,
    pub housenumber: Option<String>,
    pub unit: Option<String>,
    #[serde(rename = "zipCode")]
    pub zip_code: Option<String>,
    pub city: Option<String>,
}

// ---------------------------------------------------------------------------
// Authoritative source
// ---------------------------------------------------------------------------

/// A pharmacy as published by the regulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthoritativeRecord {
    pub authorization_id: RecordId,
    pub name: Option<String>,
    pub textual_address: Option<String>,
    #[serde(rename = "zipCode")]
    pub zip_code: u32,
    pub municipality: Option<String>,
    pub geo: Vec<GeoReference>,
    #[serde(default)]
    pub authorization_holder: Party,
    #[serde(default)]
    pub operator: Party,
    pub status: String,
}

impl AuthoritativeRecord {
    /// Parse one raw JSON record; `index` names it when it has no usable id.
    pub fn from_value(index: usize, value: Value) -> Result<Self, ReconError> {
        let identity = identity_of(&value, "authorization_id", index);
        let record: Self = serde_json::from_value(value)
            .map_err(|e| ReconError::malformed(SourceKind::Authoritative, &identity, e.to_string()))?;
        record.position()?;
        Ok(record)
    }

    /// Matching position: the first WGS 84 entry of `geo`.
    pub fn position(&self) -> Result<Coordinates, ReconError> {
        let coordinates = self
            .geo
            .iter()
            .find_map(GeoReference::wgs84)
            .ok_or_else(|| {
                ReconError::malformed(
                    SourceKind::Authoritative,
                    self.authorization_id.to_string(),
                    "no WGS 84 geo reference",
                )
            })?;
        match coordinates.check() {
            Some(reason) => Err(ReconError::malformed(
                SourceKind::Authoritative,
                self.authorization_id.to_string(),
                reason,
            )),
            None => Ok(coordinates),
        }
    }
}

/// Parse a whole authoritative collection, failing on the first bad record.
pub fn parse_authoritative(values: Vec<Value>) -> Result<Vec<AuthoritativeRecord>, ReconError> {
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| AuthoritativeRecord::from_value(i, v))
        .collect()
}

// ---------------------------------------------------------------------------
// Secondary source
// ---------------------------------------------------------------------------

/// A pharmacy as mapped by the crowd-sourced source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryRecord {
    #[serde(default)]
    pub name: Vec<Localized<String>>,
    pub geo: Coordinates,
    #[serde(default)]
    pub contact: Option<Contact>,
    pub brand: Option<String>,
    pub osm_opening_hours: Option<String>,
    #[serde(default)]
    pub opening_hours: Vec<Localized<Vec<String>>>,
    #[serde(default)]
    pub addresses: Vec<PostalAddress>,
}

impl SecondaryRecord {
    pub fn from_value(index: usize, value: Value) -> Result<Self, ReconError> {
        let identity = secondary_identity(index);
        let record: Self = serde_json::from_value(value)
            .map_err(|e| ReconError::malformed(SourceKind::Secondary, &identity, e.to_string()))?;
        if let Some(reason) = record.geo.check() {
            return Err(ReconError::malformed(SourceKind::Secondary, identity, reason));
        }
        Ok(record)
    }
}

pub fn parse_secondary(values: Vec<Value>) -> Result<Vec<SecondaryRecord>, ReconError> {
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| SecondaryRecord::from_value(i, v))
        .collect()
}

pub(crate) fn secondary_identity(index: usize) -> String {
    format!("secondary[{index}]")
}

// ---------------------------------------------------------------------------
// Merged output
// ---------------------------------------------------------------------------

/// Authoritative record enriched with the attributes of its matched secondary record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    #[serde(flatten)]
    pub base: AuthoritativeRecord,
    #[serde(default)]
    pub names: Option<Vec<Localized<String>>>,
    #[serde(default)]
    pub contact: Option<Contact>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub osm_opening_hours: Option<String>,
    #[serde(default)]
    pub opening_hours: Option<Vec<Localized<Vec<String>>>>,
    #[serde(default)]
    pub addresses: Option<Vec<PostalAddress>>,
}

impl MergedRecord {
    /// Record with no secondary match.
    pub fn unmatched(base: AuthoritativeRecord) -> Self {
        Self {
            base,
            names: None,
            contact: None,
            brand: None,
            osm_opening_hours: None,
            opening_hours: None,
            addresses: None,
        }
    }

    /// Copy the secondary attribute subset and append its position to `geo`.
    pub fn enriched(mut base: AuthoritativeRecord, secondary: &SecondaryRecord, provenance: &GeoProvenance) -> Self {
        base.geo.push(provenance.stamp(secondary.geo));
        Self {
            base,
            names: Some(secondary.name.clone()),
            contact: secondary.contact.clone(),
            brand: secondary.brand.clone(),
            osm_opening_hours: secondary.osm_opening_hours.clone(),
            opening_hours: Some(secondary.opening_hours.clone()),
            addresses: Some(secondary.addresses.clone()),
        }
    }

    pub fn is_matched(&self) -> bool {
        self.names.is_some()
    }

    /// Serialized form with every null removed at every depth.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self).map(strip_nulls)
    }
}

/// Identity used in error messages: the id field if present, else the position.
pub(crate) fn identity_of(value: &Value, field: &str, index: usize) -> String {
    match value.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("#{index}"),
    }
}
