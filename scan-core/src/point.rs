#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u16,
    pub g: u16,
    pub b: u16,
}

/// One finished point, ready for the output sink. Coordinates are in the
/// common reference frame; intensity and color already rescaled into
/// their 16-bit slots.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointRecord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub intensity: u16,
    pub color: Option<Color>,
    /// 3-bit return fields, already 1-based.
    pub return_number: u8,
    pub number_of_returns: u8,
    pub gps_time: Option<f64>,
    /// 1-based scan index the point came from.
    pub point_source_id: u16,
}
