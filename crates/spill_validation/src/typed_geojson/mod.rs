use std::marker::PhantomData;
use serde::{Deserialize, Serialize};
use geojson::{FeatureCollection, Geometry, JsonObject};
use schemars::JsonSchema;

use crate::error::Result;

/// Properties written for each reconstructed model band
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
#[schemars(description = "Properties for model contour bands")]
pub struct BandProperties {
    #[schemars(description = "Contour threshold of the band")]
    pub level: f64,
    #[serde(rename = "test-case", default, skip_serializing_if = "Option::is_none")]
    pub test_case: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[schemars(description = "Area of the band alone in km²")]
    pub contour_cutout_area: f64,
    #[schemars(description = "Area enclosed by this level and every level above it in km²")]
    pub area_full_contour: f64,
}

/// Properties written for each per-level overlap
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
#[schemars(description = "Properties for model/observation overlap features")]
pub struct OverlapProperties {
    pub level: f64,
    #[schemars(description = "Overlap of this band alone in km²")]
    pub overlap_area: f64,
    #[schemars(description = "Overlap of the full contour at this level in km²")]
    pub overlap_full_contour: f64,
}

/// Properties written for the dissolved observation
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
#[schemars(description = "Properties for the dissolved observation")]
pub struct ObservationProperties {
    #[serde(rename = "test-case", default, skip_serializing_if = "Option::is_none")]
    pub test_case: Option<String>,
    #[schemars(description = "Observed area in km²")]
    pub obs_area: f64,
}

pub type BandGeoJson = TypedFeatureCollection<BandProperties>;
pub type OverlapGeoJson = TypedFeatureCollection<OverlapProperties>;
pub type ObservationGeoJson = TypedFeatureCollection<ObservationProperties>;

/// A typed GeoJSON Feature that is generic over its properties.
#[derive(Serialize, Deserialize, Debug)]
pub struct TypedFeature<P> {
    #[serde(flatten)]
    pub feature: geojson::Feature,
    #[serde(skip)]
    _properties: PhantomData<P>,
}

impl<P> TypedFeature<P>
where
    for<'de> P: Serialize + Deserialize<'de>,
{
    /// Creates a new TypedFeature.
    pub fn new(geometry: Option<Geometry>, properties: P) -> Self {
        let feature = geojson::Feature {
            bbox: None,
            geometry,
            id: None,
            properties: serde_json::to_value(properties).ok().and_then(|v| v.as_object().cloned()),
            foreign_members: None,
        };
        Self {
            feature,
            _properties: PhantomData,
        }
    }

    /// Tries to access the typed properties of the feature.
    pub fn properties(&self) -> Option<P> {
        self.feature.properties.as_ref().and_then(|p| {
            serde_json::from_value(serde_json::Value::Object(p.clone())).ok()
        })
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TypedFeatureCollection<P> {
    pub bbox: Option<Vec<f64>>,
    pub features: Vec<TypedFeature<P>>,
    pub foreign_members: Option<JsonObject>,
}

impl<P> TypedFeatureCollection<P> {
    pub fn new(features: Vec<TypedFeature<P>>, foreign_members: Option<JsonObject>) -> Self {
        Self {
            bbox: None,
            features,
            foreign_members,
        }
    }

    /// Get the number of features
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Check if the collection is empty
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Get features as a slice
    pub fn features(&self) -> &[TypedFeature<P>] {
        &self.features
    }

    /// Plain GeoJSON collection, consuming self
    pub fn into_feature_collection(self) -> FeatureCollection {
        FeatureCollection {
            bbox: self.bbox,
            features: self.features.into_iter().map(|typed| typed.feature).collect(),
            foreign_members: self.foreign_members,
        }
    }

    /// Serialize as a GeoJSON `FeatureCollection`
    pub fn to_geojson_string(self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.into_feature_collection())?)
    }

    /// Registry code written into the legacy `crs` member, if any
    pub fn crs_name(&self) -> Option<&str> {
        self.foreign_members
            .as_ref()?
            .get("crs")?
            .get("properties")?
            .get("name")?
            .as_str()
    }
}

impl<P> TypedFeatureCollection<P>
where
    for<'de> P: Serialize + Deserialize<'de>,
{
    /// Decoded properties of every feature that carries them
    pub fn properties(&self) -> Vec<P> {
        self.features.iter().filter_map(TypedFeature::properties).collect()
    }
}

impl BandGeoJson {
    /// Band levels in feature order
    pub fn levels(&self) -> Vec<f64> {
        self.properties().iter().map(|p| p.level).collect()
    }

    /// Full contour area at the lowest level
    pub fn total_area(&self) -> Option<f64> {
        self.properties()
            .into_iter()
            .min_by(|a, b| a.level.total_cmp(&b.level))
            .map(|p| p.area_full_contour)
    }
}
