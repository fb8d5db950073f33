use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use las::{Color as LasColor, Point as LasPoint, Writer};

use scan_core::point::PointRecord;

use crate::error::ExportError;
use crate::header::HeaderSpec;
use crate::naming::numbered_file_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputPolicy {
    /// All scans into a single output file.
    Merge,
    /// One output file per scan, numbered by scan index.
    Split,
}

#[derive(Debug)]
pub struct FileSummary {
    pub path: PathBuf,
    pub points: u64,
}

struct PendingFile {
    path: PathBuf,
    spec: HeaderSpec,
}

struct OpenFile {
    writer: Writer<BufWriter<File>>,
    path: PathBuf,
    has_gps_time: bool,
    has_color: bool,
    points: u64,
    min: [f64; 3],
    max: [f64; 3],
}

/// Owns the output file lifecycle. Files open lazily on the first written
/// point, so scans yielding nothing leave no file behind; each opened
/// file is finalized exactly once, on rollover or at end of stream.
pub struct LasSink {
    base: PathBuf,
    policy: OutputPolicy,
    pending: Option<PendingFile>,
    current: Option<OpenFile>,
}

impl LasSink {
    pub fn new(base: PathBuf, policy: OutputPolicy) -> Self {
        Self {
            base,
            policy,
            pending: None,
            current: None,
        }
    }

    /// Scan-boundary transition. Under split policy any open file is
    /// finalized and the next file name is derived from the scan index;
    /// under merge policy the header spec is only staged until the group's
    /// first point arrives.
    pub fn begin_scan(&mut self, scan_index: usize, spec: HeaderSpec) -> Result<(), ExportError> {
        match self.policy {
            OutputPolicy::Split => {
                self.finish_current()?;
                self.pending = Some(PendingFile {
                    path: numbered_file_name(&self.base, scan_index),
                    spec,
                });
            }
            OutputPolicy::Merge => {
                if self.current.is_none() {
                    self.pending = Some(PendingFile {
                        path: self.base.clone(),
                        spec,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn write_point(&mut self, record: &PointRecord) -> Result<(), ExportError> {
        if self.current.is_none() {
            let pending = self.pending.take().ok_or(ExportError::NoActiveScan)?;
            self.open(pending)?;
        }
        let Some(file) = self.current.as_mut() else {
            return Err(ExportError::NoActiveScan);
        };
        let point = to_las_point(record, file.has_gps_time, file.has_color);
        file.writer.write_point(point).map_err(ExportError::Write)?;
        file.points += 1;
        for (axis, value) in [record.x, record.y, record.z].into_iter().enumerate() {
            file.min[axis] = file.min[axis].min(value);
            file.max[axis] = file.max[axis].max(value);
        }
        Ok(())
    }

    /// End-of-scan transition: split policy finalizes the scan's file.
    pub fn finish_scan(&mut self) -> Result<Option<FileSummary>, ExportError> {
        match self.policy {
            OutputPolicy::Split => self.finish_current(),
            OutputPolicy::Merge => Ok(None),
        }
    }

    /// End-of-stream: finalize whatever is still open.
    pub fn finish(&mut self) -> Result<Option<FileSummary>, ExportError> {
        self.pending = None;
        self.finish_current()
    }

    fn open(&mut self, pending: PendingFile) -> Result<(), ExportError> {
        let PendingFile { path, spec } = pending;
        let has_gps_time = spec.has_gps_time;
        let has_color = spec.has_color;
        match resolution_label(&spec.scale) {
            Some(label) => {
                log::debug!("writing with {} resolution to '{}'", label, path.display())
            }
            None => log::debug!(
                "writing with resolution {} {} {} to '{}'",
                spec.scale[0],
                spec.scale[1],
                spec.scale[2],
                path.display()
            ),
        }
        let header = spec.into_header().map_err(ExportError::Header)?;
        let writer = Writer::from_path(&path, header).map_err(|source| ExportError::Open {
            path: path.clone(),
            source,
        })?;
        self.current = Some(OpenFile {
            writer,
            path,
            has_gps_time,
            has_color,
            points: 0,
            min: [f64::MAX; 3],
            max: [f64::MIN; 3],
        });
        Ok(())
    }

    fn finish_current(&mut self) -> Result<Option<FileSummary>, ExportError> {
        let Some(mut file) = self.current.take() else {
            return Ok(None);
        };
        file.writer.close().map_err(ExportError::Close)?;
        if file.points > 0 {
            log::debug!(
                "closed '{}' with {} points, bounds ({:.3} {:.3} {:.3}) - ({:.3} {:.3} {:.3})",
                file.path.display(),
                file.points,
                file.min[0],
                file.min[1],
                file.min[2],
                file.max[0],
                file.max[1],
                file.max[2],
            );
        } else {
            log::debug!("closed '{}' with 0 points", file.path.display());
        }
        Ok(Some(FileSummary {
            path: file.path,
            points: file.points,
        }))
    }
}

/// Coerce a record to the open file's point format: channels the format
/// lacks are dropped, channels it requires but the record lacks are
/// filled with neutral values.
fn to_las_point(record: &PointRecord, has_gps_time: bool, has_color: bool) -> LasPoint {
    LasPoint {
        x: record.x,
        y: record.y,
        z: record.z,
        intensity: record.intensity,
        return_number: record.return_number,
        number_of_returns: record.number_of_returns,
        point_source_id: record.point_source_id,
        gps_time: has_gps_time.then(|| record.gps_time.unwrap_or(0.0)),
        color: has_color.then(|| {
            let c = record.color.unwrap_or_default();
            LasColor {
                red: c.r,
                green: c.g,
                blue: c.b,
            }
        }),
        ..Default::default()
    }
}

fn resolution_label(scale: &[f64; 3]) -> Option<&'static str> {
    if scale.iter().any(|&s| s != scale[0]) {
        return None;
    }
    match scale[0] {
        s if s == 0.1 => Some("decimeter"),
        s if s == 0.01 => Some("centimeter"),
        s if s == 0.001 => Some("millimeter"),
        s if s == 0.0001 => Some("0.1 mm"),
        s if s == 0.00001 => Some("0.01 mm"),
        s if s == 0.000001 => Some("0.001 mm"),
        _ => None,
    }
}
