//! # Oil Spill Validation Library
//!
//! Scores predicted oil-spill extents against observed extents. Model
//! output is a set of disjoint cutout bands, one per contour level; the
//! observation is either satellite-detected polygons or coastal-report
//! lines.
//!
//! ## Core Features
//!
//! - **Normalization**: geometry-family checks and reprojection into a planar CRS
//! - **Band Reconstruction**: dissolve rows per case/level and rebuild full contour areas
//! - **Overlap**: optional clipping to the known observation region, per-level intersection
//! - **Metrics**: 2D MOE, Area Skill Score and Centroid Skill Score
//! - **GeoJSON Support**: decode input collections, export typed result collections
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spill_validation::{FeatureSet, ModelType, ValidationPipeline, ValidationType};
//!
//! let pipeline = ValidationPipeline::builder()
//!     .model_type(ModelType::Probabilistic)
//!     .validation_type(ValidationType::Satellite)
//!     .crs(3857)
//!     .build()?;
//!
//! let observation = FeatureSet::from_geojson_file("observation.geojson")?;
//! let model = FeatureSet::from_geojson_file("model.geojson")?;
//!
//! let output = pipeline.run(&observation, &model, None)?;
//! println!("{}", output.report.to_json_string()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod config;
pub mod traits;
pub mod crs;
pub mod algorithms;
pub mod pipeline;
pub mod report;
pub mod io;
pub mod typed_geojson;

// Re-exports for convenience
pub use error::{Result, ValidationError};
pub use types::{
    CollectionRole, ContourBand, DetectionMask, FeatureSet, ModelType, ObservationRegion,
    OverlapRecord, SpillFeature, ValidationType,
};
pub use config::ValidationConfig;
pub use crs::Crs;
pub use traits::*;
pub use algorithms::*;
pub use pipeline::{builder::PipelineBuilder, ValidationOutput, ValidationPipeline};
pub use report::{MoeOutcome, MoePoint, ScoreOutcome, SkillScores, ValidationReport};

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{polygon, Polygon};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        polygon![
            (x: x0, y: y0),
            (x: x1, y: y0),
            (x: x1, y: y1),
            (x: x0, y: y1),
            (x: x0, y: y0),
        ]
    }

    #[test]
    fn test_pipeline_basic() {
        let pipeline = ValidationPipeline::builder().build().expect("default pipeline");

        let observation = FeatureSet::new(
            Crs::WebMercator,
            vec![SpillFeature::new(rect(0.0, 0.0, 10_000.0, 10_000.0)).with_case("case")],
        );
        let model = FeatureSet::new(
            Crs::WebMercator,
            vec![SpillFeature::new(rect(1_000.0, 1_000.0, 9_000.0, 9_000.0)).with_case("case").with_level(1.0)],
        );

        let output = pipeline.run(&observation, &model, None).expect("should validate");
        let point = &output.report.moe.points()[0];
        assert_eq!((point.x, point.y), (0.64, 1.0));

        let scores = output.report.skill_scores.expect("BE satellite has skill scores");
        assert!((scores.area.value().copied().unwrap_or_default() - 0.64).abs() < 1e-9);
        let centroid = scores.centroid.value().expect("centroid score");
        assert!((centroid.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_geographic_input_is_reprojected() {
        let pipeline = PipelineBuilder::build_satellite(ModelType::BestEstimate).expect("pipeline");

        let observation = FeatureSet::geographic(vec![SpillFeature::new(rect(0.0, 0.0, 0.1, 0.1))]);
        let model = FeatureSet::geographic(vec![SpillFeature::new(rect(0.05, 0.01, 0.15, 0.11)).with_level(1.0)]);

        let output = pipeline.run(&observation, &model, None).expect("should validate");
        assert_eq!(output.report.crs, 3857);
        // 0.1° is about 11.13 km at the equator
        assert!(output.report.observed_area_km2 > 123.0 && output.report.observed_area_km2 < 125.0);

        let point = &output.report.moe.points()[0];
        assert!((point.x - 0.45).abs() < 2e-3);
    }

    #[test]
    fn test_schema_violation_aborts_run() {
        let pipeline = PipelineBuilder::build_coastal(ModelType::Probabilistic).expect("pipeline");
        let polygons = FeatureSet::new(
            Crs::WebMercator,
            vec![SpillFeature::new(rect(0.0, 0.0, 1.0, 1.0)).with_level(1.0)],
        );

        assert!(matches!(
            pipeline.run(&polygons, &polygons, None),
            Err(ValidationError::SchemaViolation(_))
        ));
    }
}
