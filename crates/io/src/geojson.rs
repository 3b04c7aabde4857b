// GeoJSON export of merged records

use serde::Serialize;

use pharmamap_recon::model::{Contact, MergedRecord, Party, RecordId};
use pharmamap_recon::ReconError;

#[derive(Debug, Clone, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub geometry: Point,
    pub properties: FeatureProperties,
}

#[derive(Debug, Clone, Serialize)]
pub struct Point {
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// GeoJSON order: longitude first.
    pub coordinates: [f64; 2],
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureProperties {
    pub name: Option<String>,
    pub status: String,
    pub contact: Option<Contact>,
    pub osm_opening_hours: Option<String>,
    pub authorization_id: RecordId,
    pub authorization_holder: Party,
    pub operator: Party,
    #[serde(rename = "zipCode")]
    pub zip_code: u32,
}

/// One Point feature per record, placed at its regulator WGS 84 position.
pub fn feature(record: &MergedRecord) -> Result<Feature, ReconError> {
    let position = record.base.position()?;
    Ok(Feature {
        kind: "Feature",
        geometry: Point {
            kind: "Point",
            coordinates: [position.longitude, position.latitude],
        },
        properties: FeatureProperties {
            name: record.base.name.clone(),
            status: record.base.status.clone(),
            contact: record.contact.clone(),
            osm_opening_hours: record.osm_opening_hours.clone(),
            authorization_id: record.base.authorization_id.clone(),
            authorization_holder: record.base.authorization_holder.clone(),
            operator: record.base.operator.clone(),
            zip_code: record.base.zip_code,
        },
    })
}

pub fn feature_collection(records: &[MergedRecord]) -> Result<FeatureCollection, ReconError> {
    Ok(FeatureCollection {
        kind: "FeatureCollection",
        features: records.iter().map(feature).collect::<Result<_, _>>()?,
    })
}
