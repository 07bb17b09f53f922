pub mod builder;

use tracing::{debug, info, warn};

use crate::{
    algorithms::{
        dissolve::{dissolve_mask, dissolve_observation},
        metrics::{compute_2d_moe, compute_area_skill_score, compute_centroid_skill_score},
        normalize::GeometryNormalizer,
        overlap::{OverlapEngine, OverlapOutcome, OverlapResult},
        reconstruct::BandReconstructor,
    },
    config::ValidationConfig,
    error::{Result, ValidationError},
    report::{LevelArea, MoeOutcome, MoePoint, ScoreOutcome, SkillScores, ValidationReport},
    traits::AreaPreparer,
    types::{CollectionRole, FeatureSet},
};

/// Everything a validation run produces
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutput {
    pub report: ValidationReport,
    pub overlap: OverlapResult,
}

/// Normalize, dissolve, overlap and score one observation/model pair
pub struct ValidationPipeline {
    config: ValidationConfig,
    normalizer: GeometryNormalizer,
    reconstructor: BandReconstructor,
    preparer: Box<dyn AreaPreparer>,
    engine: OverlapEngine,
}

impl ValidationPipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    pub fn new(
        config: ValidationConfig,
        normalizer: GeometryNormalizer,
        preparer: Box<dyn AreaPreparer>,
    ) -> Self {
        Self {
            reconstructor: BandReconstructor::new(config.model_type),
            config,
            normalizer,
            preparer,
            engine: OverlapEngine::new(),
        }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Run every stage. `mask` is the optional no-oil detection collection.
    pub fn run(
        &self,
        observation: &FeatureSet,
        model: &FeatureSet,
        mask: Option<&FeatureSet>,
    ) -> Result<ValidationOutput> {
        // Step 1: Validate and reproject every collection
        let observation = self.normalizer.normalize(observation, CollectionRole::Observation)?;
        let model = self.normalizer.normalize(model, CollectionRole::Model)?;
        let mask = mask
            .map(|mask| self.normalizer.normalize(mask, CollectionRole::DetectionMask))
            .transpose()?;

        let case_name = model.case_name().map(str::to_owned);
        let time = model.time().map(str::to_owned);
        info!(
            case = case_name.as_deref().unwrap_or("-"),
            time = time.as_deref().unwrap_or("-"),
            input_levels = ?model.levels(),
            "Validating {} model against {} observation",
            self.config.model_type,
            self.config.validation_type,
        );

        // Step 2: Dissolve rows into area-bearing regions
        let observed = dissolve_observation(&observation, self.preparer.as_ref())?;
        let bands = self.reconstructor.reconstruct(&model, self.preparer.as_ref())?;
        let mask = mask
            .map(|mask| dissolve_mask(&mask, self.preparer.as_ref()))
            .transpose()?;

        // Step 3: Clip to the known region and intersect
        let overlap = self.engine.compute_overlap(&bands, &observed, mask.as_ref());
        let levels: Vec<f64> = overlap.model_known.iter().map(|band| band.level).collect();
        info!(observed_area_km2 = overlap.observation.area_km2, levels = ?levels, "Observed area");
        for band in &overlap.model_known {
            info!(
                level = band.level,
                predicted_area_km2 = band.full_contour_area_km2,
                "Predicted area"
            );
        }

        // Step 4: 2D MOE per level
        let moe = match &overlap.outcome {
            OverlapOutcome::Overlapping { records } => {
                let mut points = Vec::with_capacity(records.len());
                for (band, record) in overlap.model_known.iter().zip(records) {
                    match compute_2d_moe(
                        overlap.observation.area_km2,
                        band.full_contour_area_km2,
                        record.overlap_full_contour_km2,
                    ) {
                        Ok(moe) => {
                            info!(level = band.level, x = moe.x, y = moe.y, "2D MOE");
                            points.push(MoePoint {
                                level: band.level,
                                observed_area_km2: overlap.observation.area_km2,
                                predicted_area_km2: band.full_contour_area_km2,
                                overlap_area_km2: record.overlap_full_contour_km2,
                                x: moe.x,
                                y: moe.y,
                                false_negative_km2: moe.false_negative_km2,
                                false_positive_km2: moe.false_positive_km2,
                            });
                        }
                        Err(ValidationError::DegenerateInput(reason)) => {
                            debug!(level = band.level, %reason, "Skipping MOE");
                        }
                        Err(e) => return Err(e),
                    }
                }
                MoeOutcome::Computed { points }
            }
            OverlapOutcome::NoOverlap => {
                warn!("No overlap between model and observation, MOE skipped");
                MoeOutcome::NoOverlap
            }
        };

        // Step 5: Skill scores for deterministic satellite runs
        let skill_scores = self
            .config
            .computes_skill_scores()
            .then(|| self.skill_scores(&overlap));

        let report = ValidationReport {
            case_name,
            time,
            model_type: self.config.model_type,
            validation_type: self.config.validation_type,
            crs: self.normalizer.target.epsg(),
            levels,
            clipped_to_known_region: overlap.known_region.is_clipped(),
            observed_area_km2: overlap.observation.area_km2,
            predicted_areas: overlap.model_known.iter().map(LevelArea::from).collect(),
            moe,
            skill_scores,
        };

        Ok(ValidationOutput { report, overlap })
    }

    fn skill_scores(&self, overlap: &OverlapResult) -> SkillScores {
        let observed = &overlap.observation;
        let Some(band) = overlap.model_known.first() else {
            let reason = "model has no band".to_string();
            return SkillScores {
                area: ScoreOutcome::Degenerate { reason: reason.clone() },
                centroid: ScoreOutcome::Degenerate { reason },
            };
        };

        let area = match compute_area_skill_score(observed.area_km2, band.full_contour_area_km2) {
            Ok(value) => {
                info!(area_skill_score = value, "Area skill score");
                ScoreOutcome::Scored { value }
            }
            Err(e) => {
                warn!(error = %e, "Area skill score not computed");
                ScoreOutcome::Degenerate { reason: e.to_string() }
            }
        };

        let centroid = match compute_centroid_skill_score(&observed.geometry, &band.geometry) {
            Ok(skill) => {
                info!(
                    centroid_skill_score = skill.score,
                    centroid_distance_km = skill.centroid_distance_km,
                    length_scale_km = skill.length_scale_km,
                    "Centroid skill score"
                );
                ScoreOutcome::Scored { value: skill.into() }
            }
            Err(e) => {
                warn!(error = %e, "Centroid skill score not computed");
                ScoreOutcome::Degenerate { reason: e.to_string() }
            }
        };

        SkillScores { area, centroid }
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        format!(
            "ValidationPipeline: {} model, {} observation, {} preparer, target {}",
            self.config.model_type,
            self.config.validation_type,
            self.preparer.name(),
            self.normalizer.target,
        )
    }
}
