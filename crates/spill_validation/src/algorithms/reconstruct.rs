use tracing::debug;

use crate::{
    algorithms::dissolve::{dissolve, DissolveBy},
    error::{Result, ValidationError},
    traits::AreaPreparer,
    types::{square_km, ContourBand, FeatureSet, ModelType},
};

/// Reverse running sum: entry `i` is the total of `areas[i..]`
pub fn full_contour_areas(areas: &[f64]) -> Vec<f64> {
    let mut totals = vec![0.0; areas.len()];
    let mut running = 0.0;
    for (total, area) in totals.iter_mut().zip(areas).rev() {
        running += area;
        *total = running;
    }
    totals
}

/// Sort bands by level, re-measure each cutout and recompute the full
/// contour areas from scratch
pub fn accumulate(mut bands: Vec<ContourBand>) -> Vec<ContourBand> {
    bands.sort_by(|a, b| a.level.total_cmp(&b.level));

    for band in &mut bands {
        band.cutout_area_km2 = square_km(&band.geometry);
    }

    let cutouts: Vec<f64> = bands.iter().map(|band| band.cutout_area_km2).collect();
    for (band, full) in bands.iter_mut().zip(full_contour_areas(&cutouts)) {
        band.full_contour_area_km2 = full;
    }

    bands
}

/// Turns a normalized model collection into level-sorted cutout bands
#[derive(Debug, Clone, Copy)]
pub struct BandReconstructor {
    pub model_type: ModelType,
}

impl BandReconstructor {
    pub fn new(model_type: ModelType) -> Self {
        Self { model_type }
    }

    pub fn dissolve_key(&self) -> DissolveBy {
        match self.model_type {
            ModelType::BestEstimate => DissolveBy::NameOrCase,
            ModelType::Probabilistic => DissolveBy::CaseAndLevel,
        }
    }

    pub fn reconstruct(&self, model: &FeatureSet, preparer: &dyn AreaPreparer) -> Result<Vec<ContourBand>> {
        let groups = dissolve(&model.features, self.dissolve_key());

        if self.model_type == ModelType::BestEstimate && groups.len() != 1 {
            return Err(ValidationError::SchemaViolation(format!(
                "best estimate model must dissolve into a single band, found {}",
                groups.len()
            )));
        }

        let mut bands = Vec::with_capacity(groups.len());
        for group in groups {
            let level = group.level.ok_or_else(|| {
                ValidationError::SchemaViolation(format!("model group '{}' has no level", group.key))
            })?;

            let geometry = preparer.prepare(&group.members)?;
            bands.push(
                ContourBand::new(level, geometry)
                    .with_case(group.case)
                    .with_time(group.time),
            );
        }

        let bands = accumulate(bands);
        if let Some(pair) = bands.windows(2).find(|pair| pair[0].level == pair[1].level) {
            return Err(ValidationError::SchemaViolation(format!(
                "level {} appears in more than one case",
                pair[0].level
            )));
        }

        for band in &bands {
            debug!(
                level = band.level,
                cutout_km2 = band.cutout_area_km2,
                full_contour_km2 = band.full_contour_area_km2,
                "Reconstructed band"
            );
        }

        Ok(bands)
    }
}
