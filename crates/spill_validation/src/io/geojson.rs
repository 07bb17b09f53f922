use std::path::Path;

use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, JsonValue};
use geo_types::{Geometry, MultiPolygon};
use serde_json::json;
use crate::{
    crs::Crs,
    error::{Result, ValidationError},
    types::{ContourBand, FeatureSet, ObservationRegion, OverlapRecord, SpillFeature},
    typed_geojson::{
        BandGeoJson, BandProperties, ObservationGeoJson, ObservationProperties, OverlapGeoJson,
        OverlapProperties, TypedFeature, TypedFeatureCollection,
    },
};

/// Property holding the contour threshold
pub const LEVEL_PROPERTY: &str = "level";
/// Property holding the case identifier
pub const CASE_PROPERTY: &str = "test-case";
pub const NAME_PROPERTY: &str = "name";
pub const TIME_PROPERTY: &str = "time";

impl FeatureSet {
    /// Decode a parsed collection. Coordinates are geographic unless the
    /// collection carries a legacy `crs` member naming an EPSG code.
    pub fn from_geojson(collection: &FeatureCollection) -> Result<Self> {
        let crs = match collection.foreign_members.as_ref().and_then(|members| members.get("crs")) {
            Some(member) => crs_from_member(member)?,
            None => Crs::Geographic,
        };

        let features = collection
            .features
            .iter()
            .enumerate()
            .map(|(index, feature)| decode_feature(index, feature))
            .collect::<Result<Vec<_>>>()?;

        Ok(FeatureSet::new(crs, features))
    }

    /// Load from a GeoJSON string, which must hold a `FeatureCollection`
    pub fn from_geojson_string(geojson_str: &str) -> Result<Self> {
        match geojson_str.parse::<GeoJson>()? {
            GeoJson::FeatureCollection(collection) => Self::from_geojson(&collection),
            GeoJson::Feature(_) => Err(ValidationError::SchemaViolation(
                "expected a FeatureCollection, found a Feature".to_string(),
            )),
            GeoJson::Geometry(_) => Err(ValidationError::SchemaViolation(
                "expected a FeatureCollection, found a bare Geometry".to_string(),
            )),
        }
    }

    /// Load from a GeoJSON file
    pub fn from_geojson_file(path: impl AsRef<Path>) -> Result<Self> {
        let geojson_str = std::fs::read_to_string(path)?;
        Self::from_geojson_string(&geojson_str)
    }
}

fn decode_feature(index: usize, feature: &Feature) -> Result<SpillFeature> {
    let value = feature
        .geometry
        .as_ref()
        .map(|geometry| geometry.value.clone())
        .ok_or_else(|| ValidationError::SchemaViolation(format!("feature {index} has no geometry")))?;
    let geometry = Geometry::<f64>::try_from(value)?;

    let mut decoded = SpillFeature::new(geometry);
    decoded.level = feature
        .property(LEVEL_PROPERTY)
        .map(|value| parse_level(index, value))
        .transpose()?;
    decoded.case = feature.property(CASE_PROPERTY).and_then(property_text);
    decoded.name = feature.property(NAME_PROPERTY).and_then(property_text);
    decoded.time = feature.property(TIME_PROPERTY).and_then(property_text);

    Ok(decoded)
}

fn parse_level(index: usize, value: &JsonValue) -> Result<f64> {
    let level = match value {
        JsonValue::Number(number) => number.as_f64(),
        JsonValue::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    level.ok_or_else(|| {
        ValidationError::SchemaViolation(format!("feature {index} has a non-numeric level: {value}"))
    })
}

/// Strings as-is, numbers and booleans formatted, anything else ignored
fn property_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(text) => Some(text.clone()),
        JsonValue::Number(number) => Some(number.to_string()),
        JsonValue::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn crs_from_member(member: &JsonValue) -> Result<Crs> {
    let name = member
        .get("properties")
        .and_then(|properties| properties.get("name"))
        .and_then(JsonValue::as_str)
        .ok_or_else(|| ValidationError::SchemaViolation(format!("unreadable crs member: {member}")))?;

    // OGC CRS84 ("urn:ogc:def:crs:OGC:1.3:CRS84", "OGC:CRS84") is longitude/latitude WGS 84
    let last = name.rsplit(':').next().unwrap_or(name).trim();
    if last.eq_ignore_ascii_case("CRS84") {
        return Ok(Crs::Geographic);
    }

    let code = last
        .parse::<i32>()
        .map_err(|_| ValidationError::SchemaViolation(format!("crs name '{name}' has no EPSG code")))?;
    Crs::from_epsg(code)
}

/// Legacy `crs` member naming `crs` by URN
pub fn crs_member(crs: Crs) -> JsonObject {
    let mut members = JsonObject::new();
    members.insert(
        "crs".to_string(),
        json!({ "type": "name", "properties": { "name": crs.urn() } }),
    );
    members
}

fn geometry(shape: &MultiPolygon<f64>) -> geojson::Geometry {
    geojson::Geometry::new(geojson::Value::from(shape))
}

/// Model bands with their cutout and full contour areas
pub fn bands_to_geojson(bands: &[ContourBand], crs: Crs) -> BandGeoJson {
    let features = bands
        .iter()
        .map(|band| {
            TypedFeature::new(
                Some(geometry(&band.geometry)),
                BandProperties {
                    level: band.level,
                    test_case: band.case.clone(),
                    time: band.time.clone(),
                    contour_cutout_area: band.cutout_area_km2,
                    area_full_contour: band.full_contour_area_km2,
                },
            )
        })
        .collect();

    TypedFeatureCollection::new(features, Some(crs_member(crs)))
}

/// Per-level overlap geometry with own and cumulative overlap areas
pub fn overlap_to_geojson(records: &[OverlapRecord], crs: Crs) -> OverlapGeoJson {
    let features = records
        .iter()
        .map(|record| {
            TypedFeature::new(
                Some(geometry(&record.geometry)),
                OverlapProperties {
                    level: record.level,
                    overlap_area: record.overlap_area_km2,
                    overlap_full_contour: record.overlap_full_contour_km2,
                },
            )
        })
        .collect();

    TypedFeatureCollection::new(features, Some(crs_member(crs)))
}

pub fn observation_to_geojson(observation: &ObservationRegion, crs: Crs) -> ObservationGeoJson {
    let feature = TypedFeature::new(
        Some(geometry(&observation.geometry)),
        ObservationProperties {
            test_case: observation.case.clone(),
            obs_area: observation.area_km2,
        },
    );

    TypedFeatureCollection::new(vec![feature], Some(crs_member(crs)))
}
