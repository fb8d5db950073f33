use crate::scan::{CoordLayout, FieldSet, ScanMeta};

/// Batch capacity for unstructured scans.
pub const FALLBACK_BATCH_CAPACITY: usize = 1024;

/// Batch capacity for one scan: the grid row length when the scan is
/// structured, else the fallback size.
pub fn capacity_for_scan(meta: &ScanMeta) -> usize {
    if meta.rows > 0 {
        meta.rows as usize
    } else {
        FALLBACK_BATCH_CAPACITY
    }
}

/// Coordinate channel buffers; a scan streams exactly one representation.
#[derive(Debug)]
pub enum CoordChannels {
    Cartesian {
        x: Vec<f64>,
        y: Vec<f64>,
        z: Vec<f64>,
    },
    Spherical {
        range: Vec<f64>,
        azimuth: Vec<f64>,
        elevation: Vec<f64>,
    },
}

/// Fixed-capacity parallel channel buffers for one scan.
///
/// Buffers exist only for channels the scan declares; each `read_batch`
/// overwrites the prefix of every buffer and reports how many slots were
/// filled. Allocated once per scan and dropped when the scan is drained.
#[derive(Debug)]
pub struct PointBatch {
    pub capacity: usize,
    pub coords: CoordChannels,
    pub invalid: Option<Vec<u8>>,
    pub intensity: Option<Vec<f64>>,
    pub red: Option<Vec<f64>>,
    pub green: Option<Vec<f64>>,
    pub blue: Option<Vec<f64>>,
    pub return_index: Option<Vec<u8>>,
    pub return_count: Option<Vec<u8>>,
    pub gps_time: Option<Vec<f64>>,
}

impl PointBatch {
    pub fn for_scan(fields: &FieldSet, layout: CoordLayout, capacity: usize) -> Self {
        let coords = match layout {
            CoordLayout::Cartesian => CoordChannels::Cartesian {
                x: vec![0.0; capacity],
                y: vec![0.0; capacity],
                z: vec![0.0; capacity],
            },
            CoordLayout::Spherical => CoordChannels::Spherical {
                range: vec![0.0; capacity],
                azimuth: vec![0.0; capacity],
                elevation: vec![0.0; capacity],
            },
        };
        let has_color = fields.has_color();
        Self {
            capacity,
            coords,
            invalid: fields.invalid_state.then(|| vec![0; capacity]),
            intensity: fields.intensity.then(|| vec![0.0; capacity]),
            red: has_color.then(|| vec![0.0; capacity]),
            green: has_color.then(|| vec![0.0; capacity]),
            blue: has_color.then(|| vec![0.0; capacity]),
            return_index: fields.return_index.then(|| vec![0; capacity]),
            return_count: fields.return_count.then(|| vec![0; capacity]),
            gps_time: fields.time_stamp.then(|| vec![0.0; capacity]),
        }
    }

    /// Whether the source flagged slot `i` as not trustworthy.
    pub fn is_invalid(&self, i: usize) -> bool {
        self.invalid.as_ref().is_some_and(|flags| flags[i] != 0)
    }
}
