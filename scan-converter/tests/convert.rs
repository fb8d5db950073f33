use std::path::Path;

use scan_converter::{convert, ConvertError, ConvertOptions};
use scan_core::batch::{CoordChannels, PointBatch};
use scan_core::pose::{Pose, Quaternion, Translation};
use scan_core::scan::{AttributeRange, FieldSet, ScanMeta};
use scan_reader::{BatchReader, ScanReader, SourceError};

#[derive(Default)]
struct MockScan {
    meta: ScanMeta,
    coords: Vec<[f64; 3]>,
    invalid: Vec<u8>,
    intensity: Vec<f64>,
    gps_time: Vec<f64>,
    /// Fail the stream after this many points were delivered.
    fail_after: Option<usize>,
}

struct MockReader {
    scans: Vec<MockScan>,
}

struct MockStream<'a> {
    scan: &'a MockScan,
    cursor: usize,
}

impl ScanReader for MockReader {
    fn scan_count(&self) -> usize {
        self.scans.len()
    }

    fn scan_meta(&self, index: usize) -> Result<ScanMeta, SourceError> {
        self.scans
            .get(index)
            .map(|s| s.meta.clone())
            .ok_or(SourceError::ScanIndex(index))
    }

    fn open_stream<'a>(
        &'a mut self,
        index: usize,
    ) -> Result<Box<dyn BatchReader + 'a>, SourceError> {
        let scan = self.scans.get(index).ok_or(SourceError::ScanIndex(index))?;
        Ok(Box::new(MockStream { scan, cursor: 0 }))
    }
}

impl BatchReader for MockStream<'_> {
    fn read_batch(&mut self, batch: &mut PointBatch) -> Result<usize, SourceError> {
        if let Some(limit) = self.scan.fail_after {
            if self.cursor >= limit {
                return Err(SourceError::Other("stream interrupted".to_string()));
            }
        }
        let remaining = self.scan.coords.len() - self.cursor;
        let filled = remaining.min(batch.capacity);
        for i in 0..filled {
            let p = self.scan.coords[self.cursor + i];
            match &mut batch.coords {
                CoordChannels::Cartesian { x, y, z } => {
                    x[i] = p[0];
                    y[i] = p[1];
                    z[i] = p[2];
                }
                CoordChannels::Spherical {
                    range,
                    azimuth,
                    elevation,
                } => {
                    range[i] = p[0];
                    azimuth[i] = p[1];
                    elevation[i] = p[2];
                }
            }
            if let Some(flags) = batch.invalid.as_mut() {
                flags[i] = self.scan.invalid[self.cursor + i];
            }
            if let Some(samples) = batch.intensity.as_mut() {
                samples[i] = self.scan.intensity[self.cursor + i];
            }
            if let Some(samples) = batch.gps_time.as_mut() {
                samples[i] = self.scan.gps_time[self.cursor + i];
            }
        }
        self.cursor += filled;
        Ok(filled)
    }
}

fn cartesian_fields() -> FieldSet {
    FieldSet {
        cartesian_x: true,
        cartesian_y: true,
        cartesian_z: true,
        ..Default::default()
    }
}

fn cartesian_scan(coords: Vec<[f64; 3]>) -> MockScan {
    MockScan {
        meta: ScanMeta {
            fields: cartesian_fields(),
            point_count: coords.len() as u64,
            ..Default::default()
        },
        coords,
        ..Default::default()
    }
}

fn read_points(path: &Path) -> Vec<las::Point> {
    let mut reader = las::Reader::from_path(path).unwrap();
    reader.points().map(|p| p.unwrap()).collect()
}

#[test]
fn merge_policy_sums_points_into_one_file() {
    let mut reader = MockReader {
        scans: vec![
            cartesian_scan(vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]),
            cartesian_scan(vec![[10.0, 11.0, 12.0], [13.0, 14.0, 15.0]]),
        ],
    };
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("merged.las");
    let stats = convert(&mut reader, &ConvertOptions::new(output.clone())).unwrap();

    assert_eq!(stats.points_written, 5);
    assert_eq!(stats.scans_converted, 2);

    let points = read_points(&output);
    assert_eq!(points.len(), 5);
    let source_ids: Vec<u16> = points.iter().map(|p| p.point_source_id).collect();
    assert_eq!(source_ids, vec![1, 1, 1, 2, 2]);
    assert!((points[3].x - 10.0).abs() < 1e-6);
}

#[test]
fn split_policy_writes_numbered_files_per_scan() {
    let mut reader = MockReader {
        scans: vec![
            cartesian_scan(vec![[1.0, 1.0, 1.0]]),
            cartesian_scan(vec![[2.0, 2.0, 2.0], [3.0, 3.0, 3.0]]),
        ],
    };
    let dir = tempfile::tempdir().unwrap();
    let mut options = ConvertOptions::new(dir.path().join("scan.las"));
    options.split_scans = true;
    let stats = convert(&mut reader, &options).unwrap();

    assert_eq!(stats.points_written, 3);
    assert_eq!(read_points(&dir.path().join("scan00000.las")).len(), 1);
    assert_eq!(read_points(&dir.path().join("scan00001.las")).len(), 2);
    assert!(!dir.path().join("scan.las").exists());
}

#[test]
fn scan_filter_processes_only_requested_numbers() {
    let scans = (0..5)
        .map(|i| cartesian_scan(vec![[i as f64, 0.0, 0.0]]))
        .collect();
    let mut reader = MockReader { scans };
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("filtered.las");
    let mut options = ConvertOptions::new(output.clone());
    options.scans = vec![3, 5, 9];
    let stats = convert(&mut reader, &options).unwrap();

    assert_eq!(stats.points_written, 2);
    let points = read_points(&output);
    let source_ids: Vec<u16> = points.iter().map(|p| p.point_source_id).collect();
    assert_eq!(source_ids, vec![3, 5]);
}

#[test]
fn filter_matching_no_scan_aborts_the_run() {
    let mut reader = MockReader {
        scans: vec![cartesian_scan(vec![[0.0, 0.0, 0.0]])],
    };
    let dir = tempfile::tempdir().unwrap();
    let mut options = ConvertOptions::new(dir.path().join("out.las"));
    options.scans = vec![4];
    assert!(matches!(
        convert(&mut reader, &options),
        Err(ConvertError::NoMatchingScans)
    ));
}

#[test]
fn invalid_points_are_counted_and_omitted_by_default() {
    let mut scan = cartesian_scan(vec![[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [3.0, 0.0, 0.0]]);
    scan.meta.fields.invalid_state = true;
    scan.invalid = vec![0, 1, 0];
    let mut reader = MockReader { scans: vec![scan] };
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("valid.las");
    let stats = convert(&mut reader, &ConvertOptions::new(output.clone())).unwrap();

    assert_eq!(stats.points_written, 2);
    assert_eq!(stats.invalid_points, 1);
    assert_eq!(stats.invalid_omitted, 1);
    assert_eq!(read_points(&output).len(), 2);
}

#[test]
fn invalid_points_can_be_included() {
    let mut scan = cartesian_scan(vec![[1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
    scan.meta.fields.invalid_state = true;
    scan.invalid = vec![1, 1];
    let mut reader = MockReader { scans: vec![scan] };
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("all.las");
    let mut options = ConvertOptions::new(output.clone());
    options.include_invalid = true;
    let stats = convert(&mut reader, &options).unwrap();

    assert_eq!(stats.points_written, 2);
    assert_eq!(stats.invalid_included, 2);
    assert_eq!(read_points(&output).len(), 2);
}

#[test]
fn partial_coordinate_set_skips_scan_but_not_run() {
    let mut broken = cartesian_scan(vec![[9.0, 9.0, 9.0]]);
    broken.meta.fields.cartesian_y = false;
    let mut reader = MockReader {
        scans: vec![broken, cartesian_scan(vec![[1.0, 2.0, 3.0]])],
    };
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.las");
    let stats = convert(&mut reader, &ConvertOptions::new(output.clone())).unwrap();

    assert_eq!(stats.scans_skipped, 1);
    assert_eq!(stats.scans_converted, 1);
    let points = read_points(&output);
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].point_source_id, 2);
}

#[test]
fn spherical_scan_is_converted_and_pose_applied() {
    let mut scan = MockScan {
        meta: ScanMeta {
            fields: FieldSet {
                spherical_range: true,
                spherical_azimuth: true,
                spherical_elevation: true,
                ..Default::default()
            },
            pose: Pose {
                rotation: Quaternion::identity(),
                translation: Translation::new(100.0, 0.0, 0.0),
            },
            ..Default::default()
        },
        coords: vec![[10.0, 0.0, 0.0], [10.0, std::f64::consts::FRAC_PI_2, 0.0]],
        ..Default::default()
    };
    scan.meta.point_count = 2;
    let mut reader = MockReader { scans: vec![scan] };
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("spherical.las");
    let stats = convert(&mut reader, &ConvertOptions::new(output.clone())).unwrap();

    assert_eq!(stats.points_written, 2);
    let points = read_points(&output);
    assert!((points[0].x - 110.0).abs() < 1e-6);
    assert!((points[0].y).abs() < 1e-6);
    assert!((points[1].x - 100.0).abs() < 1e-6);
    assert!((points[1].y - 10.0).abs() < 1e-6);
}

#[test]
fn pose_gates_disable_translation() {
    let mut scan = cartesian_scan(vec![[1.0, 0.0, 0.0]]);
    scan.meta.pose.translation = Translation::new(1000.0, 0.0, 0.0);
    let mut reader = MockReader { scans: vec![scan] };
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("untranslated.las");
    let mut options = ConvertOptions::new(output.clone());
    options.apply_translation = false;
    convert(&mut reader, &options).unwrap();

    let points = read_points(&output);
    assert!((points[0].x - 1.0).abs() < 1e-6);
}

#[test]
fn native_intensity_survives_the_round_trip() {
    let mut scan = cartesian_scan(vec![[0.0, 0.0, 0.0], [0.0, 0.0, 0.0]]);
    scan.meta.fields.intensity = true;
    scan.meta.intensity_limits = Some(AttributeRange::new(0.0, 255.0));
    scan.intensity = vec![37.0, 255.0];
    let mut reader = MockReader { scans: vec![scan] };
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("intensity.las");
    convert(&mut reader, &ConvertOptions::new(output.clone())).unwrap();

    let points = read_points(&output);
    assert_eq!(points[0].intensity, 37);
    assert_eq!(points[1].intensity, 255);
}

#[test]
fn gps_times_are_carried_into_the_output() {
    let mut scan = cartesian_scan(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
    scan.meta.fields.time_stamp = true;
    scan.gps_time = vec![100.5, 101.5];
    let mut reader = MockReader { scans: vec![scan] };
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("timed.las");
    convert(&mut reader, &ConvertOptions::new(output.clone())).unwrap();

    let points = read_points(&output);
    assert_eq!(points[0].gps_time, Some(100.5));
    assert_eq!(points[1].gps_time, Some(101.5));
}

#[test]
fn mid_stream_failure_abandons_scan_and_continues() {
    let mut failing = cartesian_scan(vec![[1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
    failing.fail_after = Some(0);
    let mut reader = MockReader {
        scans: vec![failing, cartesian_scan(vec![[5.0, 5.0, 5.0]])],
    };
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("resilient.las");
    let stats = convert(&mut reader, &ConvertOptions::new(output.clone())).unwrap();

    assert_eq!(stats.scans_converted, 2);
    let points = read_points(&output);
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].point_source_id, 2);
}
