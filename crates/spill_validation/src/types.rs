use geo::Area;
use geo_types::{Geometry, MultiPolygon};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};

use crate::crs::Crs;

/// Square metres per square kilometre
pub const M2_PER_KM2: f64 = 1.0e6;

/// Kind of model output being validated
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum ModelType {
    /// Single deterministic contour ("best estimate")
    #[serde(rename = "BE", alias = "best_estimate")]
    #[strum(to_string = "BE", serialize = "best_estimate")]
    BestEstimate,

    /// Ordered set of probability-banded contours
    #[serde(rename = "Prob", alias = "probabilistic")]
    #[strum(to_string = "Prob", serialize = "probabilistic")]
    Probabilistic,
}

/// Kind of observation the model is validated against
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum ValidationType {
    /// Satellite-detected oil polygons
    Satellite,
    /// Coastal reports as linestrings
    Coastal,
}

impl ValidationType {
    /// Human readable name of the geometry family this mode expects
    pub fn expected_family(&self) -> &'static str {
        match self {
            Self::Satellite => "Polygon/MultiPolygon",
            Self::Coastal => "LineString/MultiLineString",
        }
    }

    /// Whether a geometry belongs to the family this mode expects
    pub fn accepts(&self, geometry: &Geometry<f64>) -> bool {
        match self {
            Self::Satellite => matches!(geometry, Geometry::Polygon(_) | Geometry::MultiPolygon(_)),
            Self::Coastal => matches!(geometry, Geometry::LineString(_) | Geometry::MultiLineString(_)),
        }
    }
}

/// Which input collection a geometry set plays in a validation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum CollectionRole {
    Observation,
    Model,
    DetectionMask,
}

/// One decoded row of an input collection
#[derive(Debug, Clone, PartialEq)]
pub struct SpillFeature {
    pub geometry: Geometry<f64>,
    /// Contour threshold (thickness code or probability)
    pub level: Option<f64>,
    /// Case identifier used to dissolve rows (`test-case`)
    pub case: Option<String>,
    /// Optional feature name, preferred dissolve key for deterministic models
    pub name: Option<String>,
    /// Validity time as written by the producer
    pub time: Option<String>,
}

impl SpillFeature {
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            geometry: geometry.into(),
            level: None,
            case: None,
            name: None,
            time: None,
        }
    }

    pub fn with_level(mut self, level: f64) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_case(mut self, case: impl Into<String>) -> Self {
        self.case = Some(case.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }
}

/// A decoded geometry collection together with the CRS its coordinates use
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureSet {
    pub crs: Crs,
    pub features: Vec<SpillFeature>,
}

impl FeatureSet {
    pub fn new(crs: Crs, features: Vec<SpillFeature>) -> Self {
        Self { crs, features }
    }

    /// Collection in geographic WGS 84 coordinates, the GeoJSON default
    pub fn geographic(features: Vec<SpillFeature>) -> Self {
        Self::new(Crs::Geographic, features)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Distinct contour levels in ascending order
    pub fn levels(&self) -> Vec<f64> {
        let mut levels: Vec<f64> = self.features.iter().filter_map(|f| f.level).collect();
        levels.sort_by(f64::total_cmp);
        levels.dedup();
        levels
    }

    /// Case name of the first row, used to label results
    pub fn case_name(&self) -> Option<&str> {
        self.features.first().and_then(|f| f.case.as_deref())
    }

    /// Validity time of the first row, used to label results
    pub fn time(&self) -> Option<&str> {
        self.features.first().and_then(|f| f.time.as_deref())
    }
}

/// Name of a geometry's type, for error messages
pub fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// Planar area of a projected shape, in km²
pub fn square_km(geometry: &MultiPolygon<f64>) -> f64 {
    geometry.unsigned_area() / M2_PER_KM2
}

/// A dissolved model band: the region strictly between `level` and the next
/// level up, never overlapping the bands above it
#[derive(Debug, Clone, PartialEq)]
pub struct ContourBand {
    pub level: f64,
    pub case: Option<String>,
    pub time: Option<String>,
    pub geometry: MultiPolygon<f64>,
    /// Area of this band alone
    pub cutout_area_km2: f64,
    /// Area enclosed by this level and every level above it
    pub full_contour_area_km2: f64,
}

impl ContourBand {
    /// Build a band whose cutout area is measured from its geometry. The full
    /// contour area is filled in once the band sits in a level-sorted sequence.
    pub fn new(level: f64, geometry: MultiPolygon<f64>) -> Self {
        let cutout_area_km2 = square_km(&geometry);
        Self {
            level,
            case: None,
            time: None,
            geometry,
            cutout_area_km2,
            full_contour_area_km2: cutout_area_km2,
        }
    }

    pub fn with_case(mut self, case: Option<String>) -> Self {
        self.case = case;
        self
    }

    pub fn with_time(mut self, time: Option<String>) -> Self {
        self.time = time;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.geometry.0.is_empty()
    }
}

/// Dissolved observed extent of one case
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRegion {
    pub case: Option<String>,
    pub geometry: MultiPolygon<f64>,
    pub area_km2: f64,
}

impl ObservationRegion {
    pub fn new(case: Option<String>, geometry: MultiPolygon<f64>) -> Self {
        let area_km2 = square_km(&geometry);
        Self {
            case,
            geometry,
            area_km2,
        }
    }
}

/// Region where the absence of oil was positively confirmed
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionMask {
    pub case: Option<String>,
    pub geometry: MultiPolygon<f64>,
}

impl DetectionMask {
    pub fn new(case: Option<String>, geometry: MultiPolygon<f64>) -> Self {
        Self { case, geometry }
    }
}

/// Intersection of one model band with the observation
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapRecord {
    pub level: f64,
    pub geometry: MultiPolygon<f64>,
    pub overlap_area_km2: f64,
    /// Overlap of the full contour at this level (this band and all above)
    pub overlap_full_contour_km2: f64,
}
