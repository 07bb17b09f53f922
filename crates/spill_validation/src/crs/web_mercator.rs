use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use geo_types::Coord;
use crate::traits::Projection;

/// Semi-major axis of the WGS 84 ellipsoid, in metres
pub const WGS84_SEMIMAJOR: f64 = 6_378_137.0;

/// Spherical Web Mercator (EPSG:3857)
#[derive(Debug, Clone, Copy)]
pub struct WebMercator {
    radius: f64,
}

impl WebMercator {
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }
}

impl Default for WebMercator {
    fn default() -> Self {
        Self::new(WGS84_SEMIMAJOR)
    }
}

impl Projection for WebMercator {
    fn project(&self, lonlat: Coord<f64>) -> Option<Coord<f64>> {
        if lonlat.y.abs() >= 90.0 {
            return None;
        }

        let x = self.radius * lonlat.x.to_radians();
        let y = self.radius * (FRAC_PI_4 + lonlat.y.to_radians() / 2.0).tan().ln();

        if x.is_finite() && y.is_finite() {
            Some(Coord { x, y })
        } else {
            None
        }
    }

    fn unproject(&self, xy: Coord<f64>) -> Option<Coord<f64>> {
        let lat = 2.0 * (xy.y / self.radius).exp().atan() - FRAC_PI_2;
        let lon = xy.x / self.radius;

        Some(Coord {
            x: lon.to_degrees(),
            y: lat.to_degrees(),
        })
    }
}
