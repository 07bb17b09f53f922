pub mod normalize;
pub mod dissolve;
pub mod buffer;
pub mod reconstruct;
pub mod overlap;
pub mod metrics;

pub use normalize::{GeometryNormalizer, MAX_BANDS};
pub use dissolve::{dissolve, union_all, DissolveBy, DissolveGroup, PolygonDissolver};
pub use buffer::{LineBuffer, COASTAL_BUFFER_METRES};
pub use reconstruct::{accumulate, full_contour_areas, BandReconstructor};
pub use overlap::{KnownRegion, OverlapEngine, OverlapOutcome, OverlapResult};
pub use metrics::{
    compute_2d_moe, compute_area_skill_score, compute_centroid_skill_score, CentroidSkill, Moe,
};
