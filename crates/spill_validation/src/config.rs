use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    crs::{Crs, DEFAULT_EPSG},
    error::Result,
    types::{ModelType, ValidationType},
};

/// Mode selection and target coordinate system for one validation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationConfig {
    /// Model output type: `BE` (best estimate) or `Prob` (probabilistic)
    pub model_type: ModelType,

    /// Observation type: `Satellite` or `Coastal`
    pub validation_type: ValidationType,

    /// EPSG code of the planar system all geometries are reprojected to
    #[serde(default = "default_crs")]
    #[schemars(description = "EPSG registry code, defaults to 3857 (pseudo-Mercator)")]
    pub crs: i32,
}

fn default_crs() -> i32 {
    DEFAULT_EPSG
}

impl ValidationConfig {
    pub fn new(model_type: ModelType, validation_type: ValidationType) -> Self {
        Self {
            model_type,
            validation_type,
            crs: DEFAULT_EPSG,
        }
    }

    pub fn with_crs(mut self, crs: i32) -> Self {
        self.crs = crs;
        self
    }

    /// Resolve the configured registry code
    pub fn target_crs(&self) -> Result<Crs> {
        Crs::from_epsg(self.crs)
    }

    /// Skill scores are only defined for deterministic output against satellite data
    pub fn computes_skill_scores(&self) -> bool {
        self.model_type == ModelType::BestEstimate && self.validation_type == ValidationType::Satellite
    }

    /// Get the JSON schema for the configuration
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ValidationConfig)
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self::new(ModelType::BestEstimate, ValidationType::Satellite)
    }
}
