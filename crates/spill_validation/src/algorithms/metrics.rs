use geo::{BoundingRect, Centroid, EuclideanDistance};
use geo_types::{MultiPolygon, Point};
use tracing::debug;

use crate::{
    error::{Result, ValidationError},
    types::M2_PER_KM2,
};

/// Area index at or above which the area skill score is zero
pub const AREA_THRESHOLD: f64 = 1.0;

/// Centroid index at or above which the centroid skill score is zero
pub const CENTROID_THRESHOLD: f64 = 1.0;

/// Decimal places kept for MOE components
pub const MOE_DECIMALS: i32 = 4;

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// One point of the two-dimensional measure of effectiveness
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moe {
    /// Fraction of the observed area recovered by the model
    pub x: f64,
    /// Fraction of the predicted area that is correct
    pub y: f64,
    pub false_negative_km2: f64,
    pub false_positive_km2: f64,
}

pub fn compute_2d_moe(observed_km2: f64, predicted_km2: f64, overlap_km2: f64) -> Result<Moe> {
    if !(observed_km2 > 0.0) {
        return Err(ValidationError::DegenerateInput(format!(
            "observed area must be positive, got {observed_km2}"
        )));
    }
    if !(predicted_km2 > 0.0) {
        return Err(ValidationError::DegenerateInput(format!(
            "predicted area must be positive, got {predicted_km2}"
        )));
    }

    let x = overlap_km2 / observed_km2;
    let y = overlap_km2 / predicted_km2;

    let moe = Moe {
        x: round_to(x, MOE_DECIMALS),
        y: round_to(y, MOE_DECIMALS),
        false_negative_km2: (1.0 - x) * observed_km2,
        false_positive_km2: (1.0 - y) * predicted_km2,
    };

    debug!(
        x = moe.x,
        y = moe.y,
        false_negative_km2 = moe.false_negative_km2,
        false_positive_km2 = moe.false_positive_km2,
        "2D MOE"
    );
    Ok(moe)
}

fn skill(index: f64, threshold: f64) -> f64 {
    if index < threshold {
        1.0 - index / threshold
    } else {
        0.0
    }
}

pub fn compute_area_skill_score(observed_km2: f64, predicted_km2: f64) -> Result<f64> {
    if !(observed_km2 > 0.0) {
        return Err(ValidationError::DegenerateInput(format!(
            "area skill score needs a positive observed area, got {observed_km2}"
        )));
    }

    let index = (predicted_km2 - observed_km2).abs() / observed_km2;
    let score = skill(index, AREA_THRESHOLD);

    debug!(area_index = index, score, "Area skill score");
    Ok(score)
}

/// Centroid skill score with the geometry it was derived from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CentroidSkill {
    pub score: f64,
    pub observed_centroid: Point<f64>,
    pub model_centroid: Point<f64>,
    /// Lower-left corner of the observation's bounding box
    pub bounding_min: Point<f64>,
    /// Upper-right corner of the observation's bounding box
    pub bounding_max: Point<f64>,
    pub centroid_distance_km: f64,
    pub length_scale_km: f64,
}

pub fn compute_centroid_skill_score(
    observation: &MultiPolygon<f64>,
    model: &MultiPolygon<f64>,
) -> Result<CentroidSkill> {
    let observed_centroid = observation
        .centroid()
        .ok_or_else(|| ValidationError::DegenerateInput("observation has no centroid".into()))?;
    let model_centroid = model
        .centroid()
        .ok_or_else(|| ValidationError::DegenerateInput("model has no centroid".into()))?;
    let bounds = observation
        .bounding_rect()
        .ok_or_else(|| ValidationError::DegenerateInput("observation has no extent".into()))?;

    let bounding_min = Point::from(bounds.min());
    let bounding_max = Point::from(bounds.max());

    let distance = observed_centroid.euclidean_distance(&model_centroid);
    let length_scale = bounding_min.euclidean_distance(&bounding_max);
    if !(length_scale > 0.0) {
        return Err(ValidationError::DegenerateInput(
            "observed length scale is zero".into(),
        ));
    }

    let index = distance / length_scale;
    let score = skill(index, CENTROID_THRESHOLD);

    let result = CentroidSkill {
        score,
        observed_centroid,
        model_centroid,
        bounding_min,
        bounding_max,
        centroid_distance_km: distance / M2_PER_KM2.sqrt(),
        length_scale_km: length_scale / M2_PER_KM2.sqrt(),
    };

    debug!(
        centroid_distance_km = result.centroid_distance_km,
        length_scale_km = result.length_scale_km,
        score,
        "Centroid skill score"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo_types::{polygon, Polygon};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        let polygon: Polygon<f64> = polygon![
            (x: x0, y: y0),
            (x: x1, y: y0),
            (x: x1, y: y1),
            (x: x0, y: y1),
            (x: x0, y: y0),
        ];
        MultiPolygon::new(vec![polygon])
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round_to(2.0 / 3.0, 4), 0.6667);
        assert_eq!(round_to(0.12344, 4), 0.1234);
        assert_eq!(round_to(1.0, 4), 1.0);
    }

    #[test]
    fn test_perfect_match() {
        let moe = compute_2d_moe(100.0, 100.0, 100.0).unwrap();
        assert_eq!((moe.x, moe.y), (1.0, 1.0));
        assert_eq!(moe.false_negative_km2, 0.0);
        assert_eq!(moe.false_positive_km2, 0.0);

        assert_eq!(compute_area_skill_score(100.0, 100.0).unwrap(), 1.0);

        let square = rect(0.0, 0.0, 1000.0, 1000.0);
        let css = compute_centroid_skill_score(&square, &square).unwrap();
        assert_eq!(css.score, 1.0);
        assert_eq!(css.centroid_distance_km, 0.0);
    }

    #[test]
    fn test_moe_components() {
        let moe = compute_2d_moe(3.0, 2.0, 2.0).unwrap();
        assert_eq!(moe.x, 0.6667);
        assert_eq!(moe.y, 1.0);
        assert_relative_eq!(moe.false_negative_km2, 1.0, max_relative = 1e-12);
        assert_relative_eq!(moe.false_positive_km2, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_moe_stays_in_unit_range() {
        for (obs, pred, ov) in [(100.0, 50.0, 50.0), (10.0, 400.0, 7.5), (1.0, 1.0, 0.0), (3.3, 2.2, 1.1)] {
            let moe = compute_2d_moe(obs, pred, ov).unwrap();
            assert!((0.0..=1.0).contains(&moe.x));
            assert!((0.0..=1.0).contains(&moe.y));
        }
    }

    #[test]
    fn test_moe_degenerate_areas() {
        assert!(matches!(compute_2d_moe(0.0, 10.0, 0.0), Err(ValidationError::DegenerateInput(_))));
        assert!(matches!(compute_2d_moe(10.0, 0.0, 0.0), Err(ValidationError::DegenerateInput(_))));
        assert!(compute_2d_moe(f64::NAN, 10.0, 0.0).is_err());
    }

    #[test]
    fn test_area_skill_score_boundary() {
        assert_eq!(compute_area_skill_score(100.0, 200.0).unwrap(), 0.0);
        assert_eq!(compute_area_skill_score(100.0, 150.0).unwrap(), 0.5);
        assert_eq!(compute_area_skill_score(100.0, 50.0).unwrap(), 0.5);
        assert_eq!(compute_area_skill_score(100.0, 900.0).unwrap(), 0.0);
        assert!(matches!(compute_area_skill_score(0.0, 10.0), Err(ValidationError::DegenerateInput(_))));
    }

    #[test]
    fn test_centroid_skill_score() {
        let observation = rect(0.0, 0.0, 10_000.0, 10_000.0);
        let model = rect(5_000.0, 1_000.0, 15_000.0, 11_000.0);

        let css = compute_centroid_skill_score(&observation, &model).unwrap();
        assert_relative_eq!(css.observed_centroid.x(), 5_000.0, max_relative = 1e-9);
        assert_relative_eq!(css.model_centroid.y(), 6_000.0, max_relative = 1e-9);
        assert_eq!(css.bounding_min, Point::new(0.0, 0.0));
        assert_eq!(css.bounding_max, Point::new(10_000.0, 10_000.0));
        assert_relative_eq!(css.centroid_distance_km, 26f64.sqrt(), max_relative = 1e-9);
        assert_relative_eq!(css.length_scale_km, 200f64.sqrt(), max_relative = 1e-9);
        assert_relative_eq!(css.score, 1.0 - (26.0f64 / 200.0).sqrt(), max_relative = 1e-9);
    }

    #[test]
    fn test_centroid_far_away_scores_zero() {
        let observation = rect(0.0, 0.0, 1_000.0, 1_000.0);
        let model = rect(50_000.0, 50_000.0, 51_000.0, 51_000.0);
        assert_eq!(compute_centroid_skill_score(&observation, &model).unwrap().score, 0.0);
    }

    #[test]
    fn test_centroid_degenerate_inputs() {
        let empty = MultiPolygon::new(Vec::new());
        let square = rect(0.0, 0.0, 1_000.0, 1_000.0);

        assert!(matches!(
            compute_centroid_skill_score(&square, &empty),
            Err(ValidationError::DegenerateInput(_))
        ));
        assert!(matches!(
            compute_centroid_skill_score(&empty, &square),
            Err(ValidationError::DegenerateInput(_))
        ));
    }
}
