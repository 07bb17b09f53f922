pub mod geojson;

pub use self::geojson::{bands_to_geojson, crs_member, observation_to_geojson, overlap_to_geojson};
