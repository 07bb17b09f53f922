use geo_types::{Coord, Geometry, MultiPolygon};
use crate::error::Result;

/// Trait for map projections between geographic and planar coordinates
pub trait Projection {
    /// Project a geographic coordinate (`x` = longitude, `y` = latitude, degrees)
    fn project(&self, lonlat: Coord<f64>) -> Option<Coord<f64>>;

    /// Inverse of [`Projection::project`]
    fn unproject(&self, xy: Coord<f64>) -> Option<Coord<f64>>;
}

/// Trait for turning the source geometries of one dissolved group into a
/// single area-bearing shape
pub trait AreaPreparer: Send + Sync {
    fn prepare(&self, members: &[Geometry<f64>]) -> Result<MultiPolygon<f64>>;

    /// Short name used in pipeline descriptions
    fn name(&self) -> &'static str;
}
