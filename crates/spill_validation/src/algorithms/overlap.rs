use geo::BooleanOps;
use geo_types::MultiPolygon;
use tracing::{debug, info};

use crate::{
    algorithms::{dissolve::union_all, reconstruct::{accumulate, full_contour_areas}},
    types::{square_km, ContourBand, DetectionMask, ObservationRegion, OverlapRecord},
};

/// Region in which model bands are scored
#[derive(Debug, Clone, PartialEq)]
pub enum KnownRegion {
    /// No detection mask was supplied: bands pass through unchanged
    Unclipped,
    /// Bands were clipped to the union of the observation and the mask
    Clipped { region: MultiPolygon<f64> },
}

impl KnownRegion {
    pub fn is_clipped(&self) -> bool {
        matches!(self, Self::Clipped { .. })
    }
}

/// Whether any band intersects the observation
#[derive(Debug, Clone, PartialEq)]
pub enum OverlapOutcome {
    Overlapping { records: Vec<OverlapRecord> },
    NoOverlap,
}

impl OverlapOutcome {
    pub fn records(&self) -> &[OverlapRecord] {
        match self {
            Self::Overlapping { records } => records,
            Self::NoOverlap => &[],
        }
    }

    pub fn is_overlapping(&self) -> bool {
        matches!(self, Self::Overlapping { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlapResult {
    pub observation: ObservationRegion,
    /// Model bands inside the known region, re-accumulated
    pub model_known: Vec<ContourBand>,
    pub known_region: KnownRegion,
    pub outcome: OverlapOutcome,
}

/// Union of the observed oil and the confirmed oil-free area
pub fn known_observation_region(observation: &ObservationRegion, mask: &DetectionMask) -> MultiPolygon<f64> {
    union_all(vec![observation.geometry.clone(), mask.geometry.clone()])
}

/// Clip every band to `region` and recompute the running sums. Bands that
/// fall outside the region are kept with zero area.
pub fn clip_bands(bands: &[ContourBand], region: &MultiPolygon<f64>) -> Vec<ContourBand> {
    let clipped = bands
        .iter()
        .map(|band| {
            let geometry = if region.0.is_empty() || band.is_empty() {
                MultiPolygon::new(Vec::new())
            } else {
                band.geometry.intersection(region)
            };
            ContourBand {
                geometry,
                ..band.clone()
            }
        })
        .collect();

    accumulate(clipped)
}

/// Intersect each band with the observation, one record per level
pub fn intersect_bands(bands: &[ContourBand], observation: &MultiPolygon<f64>) -> Vec<OverlapRecord> {
    let pieces: Vec<(f64, MultiPolygon<f64>)> = bands
        .iter()
        .map(|band| {
            let geometry = if band.is_empty() || observation.0.is_empty() {
                MultiPolygon::new(Vec::new())
            } else {
                band.geometry.intersection(observation)
            };
            (band.level, geometry)
        })
        .collect();

    let areas: Vec<f64> = pieces.iter().map(|(_, geometry)| square_km(geometry)).collect();
    let full = full_contour_areas(&areas);

    pieces
        .into_iter()
        .zip(areas)
        .zip(full)
        .map(|(((level, geometry), overlap_area_km2), overlap_full_contour_km2)| OverlapRecord {
            level,
            geometry,
            overlap_area_km2,
            overlap_full_contour_km2,
        })
        .collect()
}

/// Intersects reconstructed bands with the observed region
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapEngine;

impl OverlapEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn compute_overlap(
        &self,
        model: &[ContourBand],
        observation: &ObservationRegion,
        mask: Option<&DetectionMask>,
    ) -> OverlapResult {
        let (model_known, known_region) = match mask {
            Some(mask) => {
                let region = known_observation_region(observation, mask);
                debug!(known_area_km2 = square_km(&region), "Clipping model to known region");
                (clip_bands(model, &region), KnownRegion::Clipped { region })
            }
            None => (accumulate(model.to_vec()), KnownRegion::Unclipped),
        };

        let records = intersect_bands(&model_known, &observation.geometry);
        let outcome = if records.iter().any(|record| record.overlap_area_km2 > 0.0) {
            OverlapOutcome::Overlapping { records }
        } else {
            info!("Model and observation do not overlap at any level");
            OverlapOutcome::NoOverlap
        };

        OverlapResult {
            observation: observation.clone(),
            model_known,
            known_region,
            outcome,
        }
    }
}
