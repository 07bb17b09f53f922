use geo::MapCoords;
use geo_types::{Coord, Geometry};
use tracing::debug;

use crate::{
    crs::Crs,
    error::{Result, ValidationError},
    traits::Projection,
    types::{geometry_kind, CollectionRole, FeatureSet, SpillFeature, ValidationType},
};

/// Maximum number of distinct levels in a model collection (thickness-code convention)
pub const MAX_BANDS: usize = 5;

/// Validates geometry families and reprojects collections into the target CRS
#[derive(Debug, Clone, Copy)]
pub struct GeometryNormalizer {
    pub target: Crs,
    pub validation_type: ValidationType,
}

impl GeometryNormalizer {
    pub fn new(target: Crs, validation_type: ValidationType) -> Self {
        Self {
            target,
            validation_type,
        }
    }

    /// Validate `set` for its role, then return a reprojected copy
    pub fn normalize(&self, set: &FeatureSet, role: CollectionRole) -> Result<FeatureSet> {
        self.validate(set, role)?;
        let normalized = reproject(set, self.target)?;

        debug!(
            role = %role,
            features = normalized.len(),
            from = %set.crs,
            to = %self.target,
            "Normalized collection"
        );
        Ok(normalized)
    }

    pub fn validate(&self, set: &FeatureSet, role: CollectionRole) -> Result<()> {
        if set.is_empty() {
            return Err(ValidationError::SchemaViolation(format!("{role} collection is empty")));
        }

        for (index, feature) in set.features.iter().enumerate() {
            if !self.validation_type.accepts(&feature.geometry) {
                return Err(ValidationError::SchemaViolation(format!(
                    "{role} feature {index} is a {}, expected {} for {} validation",
                    geometry_kind(&feature.geometry),
                    self.validation_type.expected_family(),
                    self.validation_type,
                )));
            }
        }

        if role == CollectionRole::Model {
            validate_levels(set)?;
        }

        Ok(())
    }
}

fn validate_levels(model: &FeatureSet) -> Result<()> {
    for (index, feature) in model.features.iter().enumerate() {
        match feature.level {
            Some(level) if level.is_finite() => {}
            Some(level) => {
                return Err(ValidationError::SchemaViolation(format!(
                    "model feature {index} has a non-finite level ({level})"
                )))
            }
            None => {
                return Err(ValidationError::SchemaViolation(format!(
                    "model feature {index} has no level"
                )))
            }
        }
    }

    let levels = model.levels();
    if levels.len() > MAX_BANDS {
        return Err(ValidationError::SchemaViolation(format!(
            "model collection contains {} levels, at most {MAX_BANDS} are supported",
            levels.len()
        )));
    }

    Ok(())
}

/// Reproject every geometry of `set` into `target`. The input is left untouched.
pub fn reproject(set: &FeatureSet, target: Crs) -> Result<FeatureSet> {
    if set.crs == target {
        return Ok(set.clone());
    }

    let source = set.crs.projection()?;
    let destination = target.projection()?;

    let features = set
        .features
        .iter()
        .map(|feature| {
            Ok(SpillFeature {
                geometry: reproject_geometry(&feature.geometry, source.as_ref(), destination.as_ref())?,
                level: feature.level,
                case: feature.case.clone(),
                name: feature.name.clone(),
                time: feature.time.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(FeatureSet::new(target, features))
}

fn reproject_geometry(
    geometry: &Geometry<f64>,
    source: &dyn Projection,
    destination: &dyn Projection,
) -> Result<Geometry<f64>> {
    geometry.try_map_coords(|coord: Coord<f64>| {
        source
            .unproject(coord)
            .and_then(|lonlat| destination.project(lonlat))
            .ok_or_else(|| {
                ValidationError::Projection(format!(
                    "coordinate ({}, {}) cannot be transformed",
                    coord.x, coord.y
                ))
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use geo::BoundingRect;
    use geo_types::{line_string, polygon};

    fn square(level: f64) -> SpillFeature {
        SpillFeature::new(polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ])
        .with_level(level)
        .with_case("case")
    }

    fn line() -> SpillFeature {
        SpillFeature::new(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)]).with_level(1.0)
    }

    #[test]
    fn test_reprojects_to_pseudo_mercator() {
        let normalizer = GeometryNormalizer::new(Crs::WebMercator, ValidationType::Satellite);
        let set = FeatureSet::geographic(vec![square(1.0)]);

        let normalized = normalizer.normalize(&set, CollectionRole::Model).unwrap();
        assert_eq!(normalized.crs, Crs::WebMercator);
        assert_eq!(set.crs, Crs::Geographic, "input must not be modified");

        let bounds = normalized.features[0].geometry.bounding_rect().unwrap();
        assert_abs_diff_eq!(bounds.min().x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(bounds.max().x, 111_319.490_793_273_6, epsilon = 1e-3);
        assert!(bounds.max().y > 111_000.0 && bounds.max().y < 111_400.0);
    }

    #[test]
    fn test_same_crs_is_passed_through() {
        let normalizer = GeometryNormalizer::new(Crs::WebMercator, ValidationType::Satellite);
        let set = FeatureSet::new(Crs::WebMercator, vec![square(1.0)]);

        let normalized = normalizer.normalize(&set, CollectionRole::Observation).unwrap();
        assert_eq!(normalized, set);
    }

    #[test]
    fn test_wrong_family_is_schema_violation() {
        let satellite = GeometryNormalizer::new(Crs::WebMercator, ValidationType::Satellite);
        let lines = FeatureSet::geographic(vec![line()]);
        let err = satellite.normalize(&lines, CollectionRole::Observation).unwrap_err();
        assert!(matches!(err, ValidationError::SchemaViolation(_)));
        assert!(err.to_string().contains("LineString"));

        let coastal = GeometryNormalizer::new(Crs::WebMercator, ValidationType::Coastal);
        let polygons = FeatureSet::geographic(vec![square(1.0)]);
        assert!(matches!(
            coastal.normalize(&polygons, CollectionRole::DetectionMask),
            Err(ValidationError::SchemaViolation(_))
        ));
    }

    #[test]
    fn test_every_row_is_checked() {
        let coastal = GeometryNormalizer::new(Crs::WebMercator, ValidationType::Coastal);
        let mixed = FeatureSet::geographic(vec![line(), square(2.0)]);

        let err = coastal.validate(&mixed, CollectionRole::Model).unwrap_err();
        assert!(err.to_string().contains("feature 1"));
    }

    #[test]
    fn test_model_level_rules() {
        let normalizer = GeometryNormalizer::new(Crs::WebMercator, ValidationType::Satellite);

        let five = FeatureSet::geographic((1..=5).map(|l| square(l as f64)).collect());
        assert!(normalizer.validate(&five, CollectionRole::Model).is_ok());

        let six = FeatureSet::geographic((1..=6).map(|l| square(l as f64)).collect());
        assert!(matches!(
            normalizer.validate(&six, CollectionRole::Model),
            Err(ValidationError::SchemaViolation(_))
        ));

        // Repeated levels count once
        let repeated = FeatureSet::geographic((0..8).map(|l| square((l % 3) as f64)).collect());
        assert!(normalizer.validate(&repeated, CollectionRole::Model).is_ok());

        let unlevelled = FeatureSet::geographic(vec![SpillFeature::new(polygon![
            (x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 0.0),
        ])]);
        assert!(normalizer.validate(&unlevelled, CollectionRole::Model).is_err());
        assert!(normalizer.validate(&unlevelled, CollectionRole::Observation).is_ok());
    }

    #[test]
    fn test_empty_collection_rejected() {
        let normalizer = GeometryNormalizer::new(Crs::WebMercator, ValidationType::Satellite);
        let err = normalizer
            .normalize(&FeatureSet::default(), CollectionRole::Observation)
            .unwrap_err();
        assert!(err.to_string().contains("observation collection is empty"));
    }

    #[test]
    fn test_unprojectable_coordinate_fails() {
        let set = FeatureSet::geographic(vec![SpillFeature::new(polygon![
            (x: 0.0, y: 89.0), (x: 1.0, y: 90.0), (x: 1.0, y: 89.0), (x: 0.0, y: 89.0),
        ])]);

        assert!(matches!(
            reproject(&set, Crs::WebMercator),
            Err(ValidationError::Projection(_))
        ));
    }
}
