pub mod normalize;
pub mod transform;

pub use normalize::{ColorScaling, IntensityScaling};
pub use transform::{spherical_to_cartesian, PoseTransform};
