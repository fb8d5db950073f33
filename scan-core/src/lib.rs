pub mod batch;
pub mod point;
pub mod pose;
pub mod scan;
pub mod stats;

pub use batch::{capacity_for_scan, CoordChannels, PointBatch, FALLBACK_BATCH_CAPACITY};
pub use point::{Color, PointRecord};
pub use pose::{Pose, Quaternion, Translation};
pub use scan::{
    AttributeRange, CartesianBounds, ColorLimits, CoordLayout, FieldSet, LayoutError, ScanMeta,
};
pub use stats::ConversionStats;
