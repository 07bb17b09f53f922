use std::f64::consts::TAU;

use geo::Simplify;
use geo_types::{Coord, Geometry, LineString, MultiPolygon, Polygon};

use crate::{
    algorithms::dissolve::union_all,
    error::{Result, ValidationError},
    traits::AreaPreparer,
    types::geometry_kind,
};

/// Margin applied around coastal report lines, in metres
pub const COASTAL_BUFFER_METRES: f64 = 5.0;

/// Vertices used to approximate each round join and end cap
pub const DEFAULT_ARC_SEGMENTS: usize = 32;

/// Collinear vertices closer than this to the simplified line are dropped
/// before stroking
const SIMPLIFY_TOLERANCE: f64 = 1.0e-3;

/// Area preparer for coastal mode: strokes lines into thin polygons with
/// round joins and round end caps, then unions the strokes.
///
/// The stroke of a polyline is the union of one disc per vertex and one
/// rectangle per segment, both `distance` wide on each side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineBuffer {
    pub distance: f64,
    pub arc_segments: usize,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new(COASTAL_BUFFER_METRES)
    }
}

impl LineBuffer {
    pub fn new(distance: f64) -> Self {
        Self {
            distance,
            arc_segments: DEFAULT_ARC_SEGMENTS,
        }
    }

    pub fn with_arc_segments(mut self, arc_segments: usize) -> Self {
        self.arc_segments = arc_segments.max(4);
        self
    }

    /// Stroke a single polyline
    pub fn buffer_line(&self, line: &LineString<f64>) -> MultiPolygon<f64> {
        let line = line.simplify(&SIMPLIFY_TOLERANCE);
        let mut coords: Vec<Coord<f64>> = line.coords().copied().collect();
        coords.dedup();

        let mut parts: Vec<MultiPolygon<f64>> = coords
            .iter()
            .map(|&center| MultiPolygon::new(vec![self.disc(center)]))
            .collect();

        parts.extend(
            coords
                .windows(2)
                .filter_map(|pair| self.segment(pair[0], pair[1]))
                .map(|rect| MultiPolygon::new(vec![rect])),
        );

        union_all(parts)
    }

    fn disc(&self, center: Coord<f64>) -> Polygon<f64> {
        let n = self.arc_segments;
        // Offset by half a step so no vertex lands on a segment rectangle edge
        let ring: Vec<Coord<f64>> = (0..n)
            .map(|i| {
                let angle = (i as f64 + 0.5) * TAU / n as f64;
                Coord {
                    x: center.x + self.distance * angle.cos(),
                    y: center.y + self.distance * angle.sin(),
                }
            })
            .collect();

        Polygon::new(LineString::new(ring), Vec::new())
    }

    fn segment(&self, start: Coord<f64>, end: Coord<f64>) -> Option<Polygon<f64>> {
        let dx = end.x - start.x;
        let dy = end.y - start.y;
        let length = dx.hypot(dy);
        if length <= f64::EPSILON {
            return None;
        }

        let normal = Coord {
            x: -dy / length * self.distance,
            y: dx / length * self.distance,
        };

        Some(Polygon::new(
            LineString::new(vec![
                start - normal,
                end - normal,
                end + normal,
                start + normal,
            ]),
            Vec::new(),
        ))
    }
}

impl AreaPreparer for LineBuffer {
    fn prepare(&self, members: &[Geometry<f64>]) -> Result<MultiPolygon<f64>> {
        if !(self.distance > 0.0 && self.distance.is_finite()) {
            return Err(ValidationError::DegenerateInput(format!(
                "buffer distance must be positive, got {}",
                self.distance
            )));
        }

        let mut parts = Vec::new();
        for member in members {
            match member {
                Geometry::LineString(line) => parts.push(self.buffer_line(line)),
                Geometry::MultiLineString(lines) => {
                    parts.extend(lines.iter().map(|line| self.buffer_line(line)))
                }
                other => {
                    return Err(ValidationError::SchemaViolation(format!(
                        "cannot buffer a {}, expected a line",
                        geometry_kind(other)
                    )))
                }
            }
        }

        Ok(union_all(parts))
    }

    fn name(&self) -> &'static str {
        "line buffer"
    }
}
