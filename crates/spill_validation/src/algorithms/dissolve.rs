use std::collections::BTreeMap;

use geo::BooleanOps;
use geo_types::{Geometry, MultiPolygon};
use tracing::debug;

use crate::{
    error::{Result, ValidationError},
    traits::AreaPreparer,
    types::{geometry_kind, DetectionMask, FeatureSet, ObservationRegion, SpillFeature},
};

/// Grouping rule used to merge rows into one multi-part shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DissolveBy {
    /// One group per case key
    Case,
    /// One group per (case, level) pair
    CaseAndLevel,
    /// One group per feature name, falling back to the case key
    NameOrCase,
}

/// Rows that share a dissolve key
#[derive(Debug, Clone, PartialEq)]
pub struct DissolveGroup {
    pub key: String,
    pub case: Option<String>,
    /// Lowest level among the members
    pub level: Option<f64>,
    pub time: Option<String>,
    pub members: Vec<Geometry<f64>>,
}

type GroupKey = (String, Option<u64>);

/// Group rows by `by`. Rows without a key share the empty key.
pub fn dissolve(features: &[SpillFeature], by: DissolveBy) -> Vec<DissolveGroup> {
    let mut groups: BTreeMap<GroupKey, DissolveGroup> = BTreeMap::new();

    for feature in features {
        let key = match by {
            DissolveBy::Case | DissolveBy::CaseAndLevel => feature.case.clone(),
            DissolveBy::NameOrCase => feature.name.clone().or_else(|| feature.case.clone()),
        }
        .unwrap_or_default();

        let level_key = match by {
            DissolveBy::CaseAndLevel => feature.level.map(f64::to_bits),
            DissolveBy::Case | DissolveBy::NameOrCase => None,
        };

        let group = groups
            .entry((key.clone(), level_key))
            .or_insert_with(|| DissolveGroup {
                key,
                case: feature.case.clone(),
                level: feature.level,
                time: feature.time.clone(),
                members: Vec::new(),
            });

        group.level = lowest_level(group.level, feature.level);
        if group.time.is_none() {
            group.time = feature.time.clone();
        }
        group.members.push(feature.geometry.clone());
    }

    groups.into_values().collect()
}

fn lowest_level(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Union a set of shapes, pairing neighbours so each pass halves the count
pub fn union_all(mut parts: Vec<MultiPolygon<f64>>) -> MultiPolygon<f64> {
    parts.retain(|part| !part.0.is_empty());

    while parts.len() > 1 {
        let mut merged = Vec::with_capacity(parts.len().div_ceil(2));
        let mut iter = parts.into_iter();
        while let Some(first) = iter.next() {
            match iter.next() {
                Some(second) => merged.push(first.union(&second)),
                None => merged.push(first),
            }
        }
        parts = merged;
    }

    parts.pop().unwrap_or_else(|| MultiPolygon::new(Vec::new()))
}

/// Area preparer for satellite mode: unions polygon rows into one region
#[derive(Debug, Clone, Copy, Default)]
pub struct PolygonDissolver;

impl AreaPreparer for PolygonDissolver {
    fn prepare(&self, members: &[Geometry<f64>]) -> Result<MultiPolygon<f64>> {
        let parts = members
            .iter()
            .map(|member| match member {
                Geometry::Polygon(polygon) => Ok(MultiPolygon::new(vec![polygon.clone()])),
                Geometry::MultiPolygon(multi) => Ok(multi.clone()),
                other => Err(ValidationError::SchemaViolation(format!(
                    "cannot dissolve a {} into a polygon region",
                    geometry_kind(other)
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(union_all(parts))
    }

    fn name(&self) -> &'static str {
        "polygon dissolve"
    }
}

/// Dissolve an observation collection into the single region of its case
pub fn dissolve_observation(
    observation: &FeatureSet,
    preparer: &dyn AreaPreparer,
) -> Result<ObservationRegion> {
    let mut groups = dissolve(&observation.features, DissolveBy::Case);
    if groups.len() != 1 {
        return Err(ValidationError::SchemaViolation(format!(
            "observation collection must describe exactly one case, found {}",
            groups.len()
        )));
    }

    let group = groups.remove(0);
    let geometry = preparer.prepare(&group.members)?;
    let region = ObservationRegion::new(group.case, geometry);

    debug!(
        rows = group.members.len(),
        area_km2 = region.area_km2,
        "Dissolved observation"
    );
    Ok(region)
}

/// Dissolve a detection mask collection into one region
pub fn dissolve_mask(mask: &FeatureSet, preparer: &dyn AreaPreparer) -> Result<DetectionMask> {
    let groups = dissolve(&mask.features, DissolveBy::Case);
    let case = groups.first().and_then(|group| group.case.clone());

    let parts = groups
        .iter()
        .map(|group| preparer.prepare(&group.members))
        .collect::<Result<Vec<_>>>()?;

    debug!(groups = parts.len(), "Dissolved detection mask");
    Ok(DetectionMask::new(case, union_all(parts)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::Area;
    use geo_types::{line_string, polygon, Polygon};
    use crate::{crs::Crs, types::square_km};

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
    fn test_groups_by_case() {
        let features = vec![
            SpillFeature::new(rect(0.0, 0.0, 1.0, 1.0)).with_case("a"),
            SpillFeature::new(rect(2.0, 0.0, 3.0, 1.0)).with_case("b"),
            SpillFeature::new(rect(4.0, 0.0, 5.0, 1.0)).with_case("a"),
        ];

        let groups = dissolve(&features, DissolveBy::Case);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "a");
        assert_eq!(groups[0].members.len(), 2);
        assert_eq!(groups[1].key, "b");
    }

    #[test]
    fn test_groups_by_case_and_level() {
        let features = vec![
            SpillFeature::new(rect(0.0, 0.0, 1.0, 1.0)).with_case("a").with_level(0.1),
            SpillFeature::new(rect(2.0, 0.0, 3.0, 1.0)).with_case("a").with_level(0.5),
            SpillFeature::new(rect(4.0, 0.0, 5.0, 1.0)).with_case("a").with_level(0.1),
        ];

        let groups = dissolve(&features, DissolveBy::CaseAndLevel);
        assert_eq!(groups.len(), 2);
        let low = groups.iter().find(|g| g.level == Some(0.1)).unwrap();
        assert_eq!(low.members.len(), 2);
    }

    #[test]
    fn test_name_takes_precedence_and_lowest_level_wins() {
        let features = vec![
            SpillFeature::new(rect(0.0, 0.0, 1.0, 1.0)).with_case("a").with_name("slick").with_level(3.0),
            SpillFeature::new(rect(2.0, 0.0, 3.0, 1.0)).with_case("b").with_name("slick").with_level(1.0).with_time("t0"),
        ];

        let groups = dissolve(&features, DissolveBy::NameOrCase);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "slick");
        assert_eq!(groups[0].level, Some(1.0));
        assert_eq!(groups[0].time.as_deref(), Some("t0"));
    }

    #[test]
    fn test_rows_without_keys_share_a_group() {
        let features = vec![
            SpillFeature::new(rect(0.0, 0.0, 1.0, 1.0)),
            SpillFeature::new(rect(2.0, 0.0, 3.0, 1.0)),
        ];

        let groups = dissolve(&features, DissolveBy::NameOrCase);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "");
    }

    #[test]
    fn test_union_all_merges_overlaps() {
        let parts = vec![
            MultiPolygon::new(vec![rect(0.0, 0.0, 2.0, 2.0)]),
            MultiPolygon::new(vec![rect(1.0, 1.0, 3.0, 3.0)]),
            MultiPolygon::new(vec![rect(10.0, 10.0, 11.0, 11.0)]),
            MultiPolygon::new(Vec::new()),
        ];

        let union = union_all(parts);
        assert_relative_eq!(union.unsigned_area(), 8.0, max_relative = 1e-9);
        assert_eq!(union.0.len(), 2);

        assert!(union_all(Vec::new()).0.is_empty());
    }

    #[test]
    fn test_polygon_dissolver_rejects_lines() {
        let line: Geometry<f64> = geo_types::line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)].into();
        assert!(matches!(
            PolygonDissolver.prepare(&[line]),
            Err(ValidationError::SchemaViolation(_))
        ));
    }

    #[test]
    fn test_observation_must_be_single_case() {
        let set = FeatureSet::new(
            Crs::WebMercator,
            vec![
                SpillFeature::new(rect(0.0, 0.0, 1000.0, 1000.0)).with_case("a"),
                SpillFeature::new(rect(2000.0, 0.0, 3000.0, 1000.0)).with_case("a"),
            ],
        );
        let region = dissolve_observation(&set, &PolygonDissolver).unwrap();
        assert_relative_eq!(region.area_km2, 2.0, max_relative = 1e-9);
        assert_eq!(region.case.as_deref(), Some("a"));

        let two_cases = FeatureSet::new(
            Crs::WebMercator,
            vec![
                SpillFeature::new(rect(0.0, 0.0, 1000.0, 1000.0)).with_case("a"),
                SpillFeature::new(rect(2000.0, 0.0, 3000.0, 1000.0)).with_case("b"),
            ],
        );
        assert!(matches!(
            dissolve_observation(&two_cases, &PolygonDissolver),
            Err(ValidationError::SchemaViolation(_))
        ));
    }

    #[test]
    fn test_mask_unions_every_case() {
        let set = FeatureSet::new(
            Crs::WebMercator,
            vec![
                SpillFeature::new(rect(0.0, 0.0, 1000.0, 1000.0)).with_case("a"),
                SpillFeature::new(rect(2000.0, 0.0, 3000.0, 1000.0)).with_case("b"),
            ],
        );
        let mask = dissolve_mask(&set, &PolygonDissolver).unwrap();
        assert_relative_eq!(square_km(&mask.geometry), 2.0, max_relative = 1e-9);
    }
}
