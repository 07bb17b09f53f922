use tracing::warn;

use crate::{
    algorithms::{buffer::LineBuffer, dissolve::PolygonDissolver, normalize::GeometryNormalizer},
    config::ValidationConfig,
    error::Result,
    pipeline::ValidationPipeline,
    traits::AreaPreparer,
    types::{ModelType, ValidationType},
};

/// Builder for creating validation pipelines with a fluent API
pub struct PipelineBuilder {
    config: ValidationConfig,
    area_preparer: Option<Box<dyn AreaPreparer>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            config: ValidationConfig::default(),
            area_preparer: None,
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: ValidationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn model_type(mut self, model_type: ModelType) -> Self {
        self.config.model_type = model_type;
        self
    }

    pub fn validation_type(mut self, validation_type: ValidationType) -> Self {
        self.config.validation_type = validation_type;
        self
    }

    /// Target EPSG code
    pub fn crs(mut self, crs: i32) -> Self {
        self.config.crs = crs;
        self
    }

    /// Set the area preparer (replaces the mode default)
    pub fn set_area_preparer<P>(mut self, preparer: P) -> Self
    where
        P: AreaPreparer + 'static,
    {
        self.area_preparer = Some(Box::new(preparer));
        self
    }

    /// Build the pipeline, filling in the preparer for the validation mode
    /// if none was set
    pub fn build(self) -> Result<ValidationPipeline> {
        let target = self.config.target_crs()?;
        if !target.is_metric() {
            warn!(crs = %target, "Target CRS is not metric, areas will not be in km²");
        }

        let preparer: Box<dyn AreaPreparer> = match self.area_preparer {
            Some(preparer) => preparer,
            None => match self.config.validation_type {
                ValidationType::Satellite => Box::new(PolygonDissolver),
                ValidationType::Coastal => Box::new(LineBuffer::default()),
            },
        };

        let normalizer = GeometryNormalizer::new(target, self.config.validation_type);
        Ok(ValidationPipeline::new(self.config, normalizer, preparer))
    }

    /// Build a satellite pipeline in the default CRS
    pub fn build_satellite(model_type: ModelType) -> Result<ValidationPipeline> {
        Self::new()
            .model_type(model_type)
            .validation_type(ValidationType::Satellite)
            .build()
    }

    /// Build a coastal pipeline in the default CRS
    pub fn build_coastal(model_type: ModelType) -> Result<ValidationPipeline> {
        Self::new()
            .model_type(model_type)
            .validation_type(ValidationType::Coastal)
            .build()
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
