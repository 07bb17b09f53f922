use schemars::JsonSchema;
use serde::Serialize;

use crate::{
    algorithms::metrics::CentroidSkill,
    error::Result,
    types::{ContourBand, ModelType, ValidationType},
};

/// A metric that was either computed or skipped because its inputs were degenerate
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScoreOutcome<T> {
    Scored { value: T },
    Degenerate { reason: String },
}

impl<T> ScoreOutcome<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Scored { value } => Some(value),
            Self::Degenerate { .. } => None,
        }
    }
}

/// 2D MOE at one contour level
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct MoePoint {
    pub level: f64,
    pub observed_area_km2: f64,
    /// Full contour area at this level
    pub predicted_area_km2: f64,
    /// Full contour overlap at this level
    pub overlap_area_km2: f64,
    pub x: f64,
    pub y: f64,
    pub false_negative_km2: f64,
    pub false_positive_km2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MoeOutcome {
    Computed { points: Vec<MoePoint> },
    NoOverlap,
}

impl MoeOutcome {
    pub fn points(&self) -> &[MoePoint] {
        match self {
            Self::Computed { points } => points,
            Self::NoOverlap => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct LevelArea {
    pub level: f64,
    pub cutout_area_km2: f64,
    pub full_contour_area_km2: f64,
}

impl From<&ContourBand> for LevelArea {
    fn from(band: &ContourBand) -> Self {
        Self {
            level: band.level,
            cutout_area_km2: band.cutout_area_km2,
            full_contour_area_km2: band.full_contour_area_km2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct CentroidReport {
    pub score: f64,
    pub observed_centroid: [f64; 2],
    pub model_centroid: [f64; 2],
    pub bounding_min: [f64; 2],
    pub bounding_max: [f64; 2],
    pub centroid_distance_km: f64,
    pub length_scale_km: f64,
}

impl From<CentroidSkill> for CentroidReport {
    fn from(skill: CentroidSkill) -> Self {
        Self {
            score: skill.score,
            observed_centroid: [skill.observed_centroid.x(), skill.observed_centroid.y()],
            model_centroid: [skill.model_centroid.x(), skill.model_centroid.y()],
            bounding_min: [skill.bounding_min.x(), skill.bounding_min.y()],
            bounding_max: [skill.bounding_max.x(), skill.bounding_max.y()],
            centroid_distance_km: skill.centroid_distance_km,
            length_scale_km: skill.length_scale_km,
        }
    }
}

/// Skill scores of a best-estimate model against satellite data
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct SkillScores {
    pub area: ScoreOutcome<f64>,
    pub centroid: ScoreOutcome<CentroidReport>,
}

/// Summary of one validation run
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ValidationReport {
    pub case_name: Option<String>,
    pub time: Option<String>,
    pub model_type: ModelType,
    pub validation_type: ValidationType,
    /// EPSG code areas were measured in
    pub crs: i32,
    pub levels: Vec<f64>,
    pub clipped_to_known_region: bool,
    pub observed_area_km2: f64,
    pub predicted_areas: Vec<LevelArea>,
    pub moe: MoeOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_scores: Option<SkillScores>,
}

impl ValidationReport {
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Get the JSON schema for the report
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ValidationReport)
    }
}
