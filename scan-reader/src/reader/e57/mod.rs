use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use e57::{
    E57Reader, PointCloud, PointCloudReaderRaw, RawValues, Record, RecordDataType, RecordName,
    RecordValue,
};

use scan_core::batch::{CoordChannels, PointBatch};
use scan_core::pose::{Pose, Quaternion, Translation};
use scan_core::scan::{AttributeRange, CartesianBounds, ColorLimits, FieldSet, ScanMeta};

use super::{BatchReader, ScanReader, SourceError};

/// E57 scan container backed by the `e57` crate. Scan headers are cached
/// on open; point data is streamed per scan through the raw record reader.
pub struct E57ScanReader {
    reader: E57Reader<BufReader<File>>,
    pointclouds: Vec<PointCloud>,
}

impl E57ScanReader {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let reader = E57Reader::from_file(path).map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let pointclouds = reader.pointclouds();
        log::debug!(
            "opened '{}' containing {} scan(s)",
            path.display(),
            pointclouds.len()
        );
        Ok(Self {
            reader,
            pointclouds,
        })
    }
}

impl ScanReader for E57ScanReader {
    fn scan_count(&self) -> usize {
        self.pointclouds.len()
    }

    fn scan_meta(&self, index: usize) -> Result<ScanMeta, SourceError> {
        let pc = self
            .pointclouds
            .get(index)
            .ok_or(SourceError::ScanIndex(index))?;
        Ok(convert_meta(index, pc))
    }

    fn open_stream<'a>(
        &'a mut self,
        index: usize,
    ) -> Result<Box<dyn BatchReader + 'a>, SourceError> {
        let pc = self
            .pointclouds
            .get(index)
            .ok_or(SourceError::ScanIndex(index))?
            .clone();
        let channels = ChannelMap::new(&pc.prototype);
        let iter = self
            .reader
            .pointcloud_raw(&pc)
            .map_err(SourceError::Read)?;
        Ok(Box::new(E57BatchReader { iter, channels }))
    }
}

fn convert_meta(index: usize, pc: &PointCloud) -> ScanMeta {
    let fields = field_set(&pc.prototype);

    let pose = pc
        .transform
        .as_ref()
        .map(|t| Pose {
            rotation: Quaternion::new(t.rotation.w, t.rotation.x, t.rotation.y, t.rotation.z),
            translation: Translation::new(t.translation.x, t.translation.y, t.translation.z),
        })
        .unwrap_or_default();

    let cartesian_bounds = pc.cartesian_bounds.as_ref().map(|b| CartesianBounds {
        x_min: b.x_min,
        x_max: b.x_max,
        y_min: b.y_min,
        y_max: b.y_max,
        z_min: b.z_min,
        z_max: b.z_max,
    });

    let intensity_limits = pc.intensity_limits.as_ref().and_then(|l| {
        let data_type = prototype_type(&pc.prototype, RecordName::Intensity);
        attribute_range(&l.intensity_min, &l.intensity_max, data_type)
    });

    let color_limits = pc.color_limits.as_ref().and_then(|l| {
        let red = attribute_range(
            &l.red_min,
            &l.red_max,
            prototype_type(&pc.prototype, RecordName::ColorRed),
        )?;
        let green = attribute_range(
            &l.green_min,
            &l.green_max,
            prototype_type(&pc.prototype, RecordName::ColorGreen),
        )?;
        let blue = attribute_range(
            &l.blue_min,
            &l.blue_max,
            prototype_type(&pc.prototype, RecordName::ColorBlue),
        )?;
        Some(ColorLimits { red, green, blue })
    });

    let (rows, columns) = pc
        .index_bounds
        .as_ref()
        .map(|b| (index_extent(b.row_min, b.row_max), index_extent(b.column_min, b.column_max)))
        .unwrap_or((0, 0));

    let mut provenance = Vec::new();
    let mut add = |key: &str, value: &Option<String>| {
        if let Some(text) = value {
            if !text.is_empty() {
                provenance.push((key.to_string(), text.clone()));
            }
        }
    };
    add("name", &pc.name);
    add("guid", &pc.guid);
    add("description", &pc.description);
    add("sensorVendor", &pc.sensor_vendor);
    add("sensorModel", &pc.sensor_model);
    add("sensorSerialNo", &pc.sensor_serial);
    add("sensorHwVersion", &pc.sensor_hw_version);
    add("sensorSwVersion", &pc.sensor_sw_version);
    add("sensorFwVersion", &pc.sensor_fw_version);

    ScanMeta {
        index,
        fields,
        pose,
        cartesian_bounds,
        intensity_limits,
        color_limits,
        rows,
        columns,
        point_count: pc.records,
        acquisition_gps_time: pc.acquisition_start.as_ref().map(|d| d.gps_time),
        provenance,
    }
}

fn field_set(prototype: &[Record]) -> FieldSet {
    let mut fields = FieldSet::default();
    for record in prototype {
        match record.name {
            RecordName::CartesianX => fields.cartesian_x = true,
            RecordName::CartesianY => fields.cartesian_y = true,
            RecordName::CartesianZ => fields.cartesian_z = true,
            RecordName::SphericalRange => fields.spherical_range = true,
            RecordName::SphericalAzimuth => fields.spherical_azimuth = true,
            RecordName::SphericalElevation => fields.spherical_elevation = true,
            RecordName::CartesianInvalidState | RecordName::SphericalInvalidState => {
                fields.invalid_state = true
            }
            RecordName::Intensity => fields.intensity = true,
            RecordName::ColorRed => fields.color_red = true,
            RecordName::ColorGreen => fields.color_green = true,
            RecordName::ColorBlue => fields.color_blue = true,
            RecordName::ReturnIndex => fields.return_index = true,
            RecordName::ReturnCount => fields.return_count = true,
            RecordName::TimeStamp => fields.time_stamp = true,
            _ => {}
        }
    }
    fields
}

fn prototype_position(prototype: &[Record], name: RecordName) -> Option<usize> {
    prototype.iter().position(|r| r.name == name)
}

fn prototype_type(prototype: &[Record], name: RecordName) -> Option<RecordDataType> {
    prototype
        .iter()
        .find(|r| r.name == name)
        .map(|r| r.data_type.clone())
}

fn index_extent(min: Option<i64>, max: Option<i64>) -> u64 {
    match (min, max) {
        (Some(lo), Some(hi)) if hi >= lo => (hi - lo + 1) as u64,
        _ => 0,
    }
}

fn attribute_range(
    min: &Option<RecordValue>,
    max: &Option<RecordValue>,
    data_type: Option<RecordDataType>,
) -> Option<AttributeRange> {
    match (min, max) {
        (Some(lo), Some(hi)) => Some(AttributeRange::new(
            value_to_f64(lo, data_type.as_ref()),
            value_to_f64(hi, data_type.as_ref()),
        )),
        _ => None,
    }
}

fn value_to_f64(value: &RecordValue, data_type: Option<&RecordDataType>) -> f64 {
    match value {
        RecordValue::Single(v) => *v as f64,
        RecordValue::Double(v) => *v,
        RecordValue::Integer(v) => *v as f64,
        RecordValue::ScaledInteger(v) => {
            let scale = match data_type {
                Some(RecordDataType::ScaledInteger { scale, .. }) => *scale,
                _ => 1.0,
            };
            *v as f64 * scale
        }
    }
}

/// Prototype slot positions for each channel the pipeline consumes,
/// resolved once per scan so the per-point scatter is index lookups only.
struct ChannelMap {
    types: Vec<RecordDataType>,
    cartesian: Option<[usize; 3]>,
    spherical: Option<[usize; 3]>,
    invalid: Option<usize>,
    intensity: Option<usize>,
    color: Option<[usize; 3]>,
    return_index: Option<usize>,
    return_count: Option<usize>,
    time: Option<usize>,
}

impl ChannelMap {
    fn new(prototype: &[Record]) -> Self {
        let pos = |name| prototype_position(prototype, name);
        let triple = |a, b, c| match (pos(a), pos(b), pos(c)) {
            (Some(a), Some(b), Some(c)) => Some([a, b, c]),
            _ => None,
        };
        Self {
            types: prototype.iter().map(|r| r.data_type.clone()).collect(),
            cartesian: triple(
                RecordName::CartesianX,
                RecordName::CartesianY,
                RecordName::CartesianZ,
            ),
            spherical: triple(
                RecordName::SphericalRange,
                RecordName::SphericalAzimuth,
                RecordName::SphericalElevation,
            ),
            invalid: pos(RecordName::CartesianInvalidState)
                .or_else(|| pos(RecordName::SphericalInvalidState)),
            intensity: pos(RecordName::Intensity),
            color: triple(
                RecordName::ColorRed,
                RecordName::ColorGreen,
                RecordName::ColorBlue,
            ),
            return_index: pos(RecordName::ReturnIndex),
            return_count: pos(RecordName::ReturnCount),
            time: pos(RecordName::TimeStamp),
        }
    }

    fn float_at(&self, values: &RawValues, position: usize) -> f64 {
        value_to_f64(&values[position], self.types.get(position))
    }

    fn scatter(&self, values: &RawValues, batch: &mut PointBatch, slot: usize) {
        match &mut batch.coords {
            CoordChannels::Cartesian { x, y, z } => {
                if let Some([ix, iy, iz]) = self.cartesian {
                    x[slot] = self.float_at(values, ix);
                    y[slot] = self.float_at(values, iy);
                    z[slot] = self.float_at(values, iz);
                }
            }
            CoordChannels::Spherical {
                range,
                azimuth,
                elevation,
            } => {
                if let Some([ir, ia, ie]) = self.spherical {
                    range[slot] = self.float_at(values, ir);
                    azimuth[slot] = self.float_at(values, ia);
                    elevation[slot] = self.float_at(values, ie);
                }
            }
        }
        if let (Some(buffer), Some(i)) = (batch.invalid.as_mut(), self.invalid) {
            buffer[slot] = self.float_at(values, i) as u8;
        }
        if let (Some(buffer), Some(i)) = (batch.intensity.as_mut(), self.intensity) {
            buffer[slot] = self.float_at(values, i);
        }
        if let (Some([ir, ig, ib]), Some(red)) = (self.color, batch.red.as_mut()) {
            red[slot] = self.float_at(values, ir);
            if let Some(green) = batch.green.as_mut() {
                green[slot] = self.float_at(values, ig);
            }
            if let Some(blue) = batch.blue.as_mut() {
                blue[slot] = self.float_at(values, ib);
            }
        }
        if let (Some(buffer), Some(i)) = (batch.return_index.as_mut(), self.return_index) {
            buffer[slot] = self.float_at(values, i) as u8;
        }
        if let (Some(buffer), Some(i)) = (batch.return_count.as_mut(), self.return_count) {
            buffer[slot] = self.float_at(values, i) as u8;
        }
        if let (Some(buffer), Some(i)) = (batch.gps_time.as_mut(), self.time) {
            buffer[slot] = self.float_at(values, i);
        }
    }
}

struct E57BatchReader<'a> {
    iter: PointCloudReaderRaw<'a, BufReader<File>>,
    channels: ChannelMap,
}

impl BatchReader for E57BatchReader<'_> {
    fn read_batch(&mut self, batch: &mut PointBatch) -> Result<usize, SourceError> {
        let mut filled = 0;
        while filled < batch.capacity {
            match self.iter.next() {
                Some(Ok(values)) => {
                    self.channels.scatter(&values, batch, filled);
                    filled += 1;
                }
                Some(Err(e)) => return Err(SourceError::Read(e)),
                None => break,
            }
        }
        Ok(filled)
    }
}
