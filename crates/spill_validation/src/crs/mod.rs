//! Coordinate reference systems addressed by EPSG registry code.

mod utm;
mod web_mercator;

pub use utm::UtmProjection;
pub use web_mercator::{WebMercator, WGS84_SEMIMAJOR};

use std::fmt;

use geo_types::Coord;
use crate::{
    error::{Result, ValidationError},
    traits::Projection,
};

/// Registry code used when no target system is configured (pseudo-Mercator)
pub const DEFAULT_EPSG: i32 = 3857;

/// A supported coordinate reference system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Crs {
    /// Geographic longitude/latitude on WGS 84 (EPSG:4326)
    #[default]
    Geographic,
    /// Spherical Web Mercator (EPSG:3857, legacy alias EPSG:900913)
    WebMercator,
    /// Universal Transverse Mercator on WGS 84 (EPSG:326zz north, EPSG:327zz south)
    Utm { zone: u8, south: bool },
}

impl Crs {
    /// Resolve an EPSG registry code
    pub fn from_epsg(code: i32) -> Result<Self> {
        match code {
            4326 => Ok(Crs::Geographic),
            3857 | 900913 => Ok(Crs::WebMercator),
            32601..=32660 => Ok(Crs::Utm { zone: (code - 32600) as u8, south: false }),
            32701..=32760 => Ok(Crs::Utm { zone: (code - 32700) as u8, south: true }),
            _ => Err(ValidationError::InvalidCrs { code }),
        }
    }

    /// The canonical EPSG registry code
    pub fn epsg(&self) -> i32 {
        match self {
            Crs::Geographic => 4326,
            Crs::WebMercator => 3857,
            Crs::Utm { zone, south: false } => 32600 + i32::from(*zone),
            Crs::Utm { zone, south: true } => 32700 + i32::from(*zone),
        }
    }

    /// Whether coordinates are planar metres (areas in m² are meaningful)
    pub fn is_metric(&self) -> bool {
        !matches!(self, Crs::Geographic)
    }

    /// OGC URN, as written into the legacy GeoJSON `crs` member
    pub fn urn(&self) -> String {
        format!("urn:ogc:def:crs:EPSG::{}", self.epsg())
    }

    /// Get the projection from geographic coordinates into this system
    pub fn projection(&self) -> Result<Box<dyn Projection>> {
        match *self {
            Crs::Geographic => Ok(Box::new(IdentityProjection)),
            Crs::WebMercator => Ok(Box::new(WebMercator::default())),
            Crs::Utm { zone, south } => Ok(Box::new(UtmProjection::new(zone, south)?)),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

impl TryFrom<i32> for Crs {
    type Error = ValidationError;

    fn try_from(code: i32) -> Result<Self> {
        Crs::from_epsg(code)
    }
}

/// Pass-through projection for geographic coordinates
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityProjection;

impl Projection for IdentityProjection {
    fn project(&self, lonlat: Coord<f64>) -> Option<Coord<f64>> {
        Some(lonlat)
    }

    fn unproject(&self, xy: Coord<f64>) -> Option<Coord<f64>> {
        Some(xy)
    }
}
