use thiserror::Error;

use crate::pose::Pose;

/// Per-attribute presence flags declared by a scan header.
///
/// A scan streams either cartesian or spherical coordinates, never both;
/// `coordinate_layout` enforces that the chosen triad is complete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldSet {
    pub cartesian_x: bool,
    pub cartesian_y: bool,
    pub cartesian_z: bool,
    pub spherical_range: bool,
    pub spherical_azimuth: bool,
    pub spherical_elevation: bool,
    pub invalid_state: bool,
    pub intensity: bool,
    pub color_red: bool,
    pub color_green: bool,
    pub color_blue: bool,
    pub return_index: bool,
    pub return_count: bool,
    pub time_stamp: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordLayout {
    Cartesian,
    Spherical,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LayoutError {
    #[error("no cartesian {0} coordinates")]
    MissingCartesian(&'static str),
    #[error("no spherical {0} coordinates")]
    MissingSpherical(&'static str),
    #[error("neither cartesian nor spherical coordinates")]
    NoCoordinates,
}

impl FieldSet {
    /// Cartesian fields take precedence: if any of x/y/z is declared the
    /// scan is cartesian and all three are required.
    pub fn coordinate_layout(&self) -> Result<CoordLayout, LayoutError> {
        if self.cartesian_x || self.cartesian_y || self.cartesian_z {
            if !self.cartesian_x {
                return Err(LayoutError::MissingCartesian("x"));
            }
            if !self.cartesian_y {
                return Err(LayoutError::MissingCartesian("y"));
            }
            if !self.cartesian_z {
                return Err(LayoutError::MissingCartesian("z"));
            }
            Ok(CoordLayout::Cartesian)
        } else if self.spherical_range || self.spherical_azimuth || self.spherical_elevation {
            if !self.spherical_range {
                return Err(LayoutError::MissingSpherical("range"));
            }
            if !self.spherical_azimuth {
                return Err(LayoutError::MissingSpherical("azimuth"));
            }
            if !self.spherical_elevation {
                return Err(LayoutError::MissingSpherical("elevation"));
            }
            Ok(CoordLayout::Spherical)
        } else {
            Err(LayoutError::NoCoordinates)
        }
    }

    /// Color is only processed when the full RGB triple is present.
    pub fn has_color(&self) -> bool {
        self.color_red && self.color_green && self.color_blue
    }
}

/// Declared empirical [min, max] bounds of an attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributeRange {
    pub min: f64,
    pub max: f64,
}

impl AttributeRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorLimits {
    pub red: AttributeRange,
    pub green: AttributeRange,
    pub blue: AttributeRange,
}

/// Declared cartesian bounds; a missing side means "unknown".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CartesianBounds {
    pub x_min: Option<f64>,
    pub x_max: Option<f64>,
    pub y_min: Option<f64>,
    pub y_max: Option<f64>,
    pub z_min: Option<f64>,
    pub z_max: Option<f64>,
}

/// Scan header as obtained from the source container. Read-only once
/// built; the pipeline never mutates it.
#[derive(Debug, Clone, Default)]
pub struct ScanMeta {
    /// 0-based index within the source container.
    pub index: usize,
    pub fields: FieldSet,
    pub pose: Pose,
    pub cartesian_bounds: Option<CartesianBounds>,
    pub intensity_limits: Option<AttributeRange>,
    pub color_limits: Option<ColorLimits>,
    /// Grid dimensions for structured scans, 0 if unstructured.
    pub rows: u64,
    pub columns: u64,
    pub point_count: u64,
    /// Acquisition start in GPS seconds, if recorded.
    pub acquisition_gps_time: Option<f64>,
    /// Free-text provenance pairs carried into the output header.
    pub provenance: Vec<(String, String)>,
}
