use geo_types::Coord;
use geodesy::prelude::*;
use crate::{
    error::{Result, ValidationError},
    traits::Projection,
};

/// UTM zone projection evaluated through `geodesy`
pub struct UtmProjection {
    context: Minimal,
    op: OpHandle,
}

impl UtmProjection {
    pub fn new(zone: u8, south: bool) -> Result<Self> {
        let definition = if south {
            format!("utm zone={zone} south")
        } else {
            format!("utm zone={zone}")
        };

        let mut context = Minimal::new();
        let op = context
            .op(&definition)
            .map_err(|e| ValidationError::Projection(format!("'{definition}': {e}")))?;

        Ok(Self { context, op })
    }
}

impl Projection for UtmProjection {
    fn project(&self, lonlat: Coord<f64>) -> Option<Coord<f64>> {
        let mut data = [Coor2D::geo(lonlat.y, lonlat.x)];
        self.context.apply(self.op, Fwd, &mut data).ok()?;

        let [x, y] = data[0].0;
        if !x.is_finite() || !y.is_finite() {
            return None;
        }

        Some(Coord { x, y })
    }

    fn unproject(&self, xy: Coord<f64>) -> Option<Coord<f64>> {
        let mut data = [Coor2D([xy.x, xy.y])];
        self.context.apply(self.op, Inv, &mut data).ok()?;

        let [lon, lat] = data[0].0;
        if !lon.is_finite() || !lat.is_finite() {
            return None;
        }

        Some(Coord {
            x: lon.to_degrees(),
            y: lat.to_degrees(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_central_meridian_on_equator() {
        // Zone 32 is centred on 9°E; the false easting is 500 km
        let projection = UtmProjection::new(32, false).unwrap();
        let projected = projection.project(Coord { x: 9.0, y: 0.0 }).unwrap();

        assert_abs_diff_eq!(projected.x, 500_000.0, epsilon = 1e-3);
        assert_abs_diff_eq!(projected.y, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_round_trip_south() {
        let projection = UtmProjection::new(33, true).unwrap();
        let lonlat = Coord { x: 16.25, y: -34.5 };

        let projected = projection.project(lonlat).unwrap();
        assert!(projected.y > 0.0, "southern hemisphere uses a false northing");

        let back = projection.unproject(projected).unwrap();
        assert_abs_diff_eq!(back.x, lonlat.x, epsilon = 1e-7);
        assert_abs_diff_eq!(back.y, lonlat.y, epsilon = 1e-7);
    }
}
