use std::path::PathBuf;

use las_exporter::{HeaderSpec, LasSink, OutputPolicy};
use scan_core::batch::{capacity_for_scan, CoordChannels, PointBatch};
use scan_core::point::{Color, PointRecord};
use scan_core::scan::CoordLayout;
use scan_core::stats::ConversionStats;
use scan_reader::ScanReader;
use scan_transformer::{spherical_to_cartesian, ColorScaling, IntensityScaling, PoseTransform};

use crate::error::ConvertError;

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub output: PathBuf,
    pub split_scans: bool,
    pub scale: [f64; 3],
    pub apply_rotation: bool,
    pub apply_translation: bool,
    pub include_invalid: bool,
    /// 1-based scan numbers to convert; empty means all scans.
    pub scans: Vec<u32>,
}

impl ConvertOptions {
    pub fn new(output: PathBuf) -> Self {
        Self {
            output,
            split_scans: false,
            scale: [0.001; 3],
            apply_rotation: true,
            apply_translation: true,
            include_invalid: false,
            scans: Vec::new(),
        }
    }
}

/// Drive the full conversion: enumerate scans, stream each one through
/// the transform chain into the output sink, and accumulate statistics.
pub fn convert<R: ScanReader>(
    reader: &mut R,
    options: &ConvertOptions,
) -> Result<ConversionStats, ConvertError> {
    let count = reader.scan_count();
    let mut stats = ConversionStats::default();
    if count == 0 {
        log::warn!("source contains no scans");
        if !options.scans.is_empty() {
            return Err(ConvertError::NoMatchingScans);
        }
        return Ok(stats);
    }

    let (first, last) = scan_range(count, &options.scans)?;
    let policy = if options.split_scans {
        OutputPolicy::Split
    } else {
        OutputPolicy::Merge
    };
    if count > 1 {
        log::debug!(
            "source contains {} scans. {} ...",
            count,
            if options.split_scans {
                "splitting"
            } else {
                "merging"
            }
        );
    }

    let mut sink = LasSink::new(options.output.clone(), policy);
    for index in first..=last {
        if !options.scans.is_empty() && !options.scans.contains(&(index as u32 + 1)) {
            continue;
        }
        convert_scan(reader, &mut sink, index, options, &mut stats)?;
    }
    sink.finish()?;

    Ok(stats)
}

/// Process one scan end to end. Source-side problems skip the scan and
/// leave the run alive; only sink failures propagate.
fn convert_scan<R: ScanReader>(
    reader: &mut R,
    sink: &mut LasSink,
    index: usize,
    options: &ConvertOptions,
    stats: &mut ConversionStats,
) -> Result<(), ConvertError> {
    let meta = match reader.scan_meta(index) {
        Ok(meta) => meta,
        Err(e) => {
            log::error!("cannot read header of scan {}: {}. skipping ...", index + 1, e);
            stats.record_skip();
            return Ok(());
        }
    };

    let layout = match meta.fields.coordinate_layout() {
        Ok(layout) => layout,
        Err(e) => {
            log::warn!("{} for scan {}. skipping ...", e, index + 1);
            stats.record_skip();
            return Ok(());
        }
    };

    let kind = match layout {
        CoordLayout::Cartesian => "cartesian",
        CoordLayout::Spherical => "spherical",
    };
    log::debug!("processing scan {}", index + 1);
    if meta.rows > 0 && meta.columns > 0 {
        log::debug!(
            "  contains grid of {} by {} equaling {} {} points",
            meta.columns,
            meta.rows,
            meta.columns * meta.rows,
            kind
        );
    } else {
        log::debug!("  contains {} {} points", meta.point_count, kind);
    }

    let transform = PoseTransform::new(&meta.pose, options.apply_rotation, options.apply_translation);
    if meta.pose.has_rotation() {
        let q = meta.pose.rotation;
        log::debug!(
            "  has quaternion ({}, {}, {}, {}) which is {}applied",
            q.w,
            q.x,
            q.y,
            q.z,
            if transform.rotation().is_some() { "" } else { "not " }
        );
    }
    if meta.pose.has_translation() {
        let t = meta.pose.translation;
        log::debug!(
            "  has translation ({}, {}, {}) which is {}applied",
            t.x,
            t.y,
            t.z,
            if transform.translation().is_some() { "" } else { "not " }
        );
    }

    let intensity = meta
        .fields
        .intensity
        .then(|| IntensityScaling::new(meta.intensity_limits));
    if let Some(limits) = meta.intensity_limits.filter(|_| meta.fields.intensity) {
        log::debug!("  contains intensities ({}-{})", limits.min, limits.max);
    }
    let color = meta
        .fields
        .has_color()
        .then(|| ColorScaling::new(meta.color_limits));
    if color.is_some() {
        log::debug!("  contains RGB colors");
    }
    if meta.fields.return_index {
        log::debug!("  contains return indices");
    }
    if meta.fields.return_count {
        log::debug!("  contains return counts");
    }
    if meta.fields.time_stamp {
        log::debug!("  contains time stamps");
    }

    let capacity = capacity_for_scan(&meta);
    let mut batch = PointBatch::for_scan(&meta.fields, layout, capacity);
    let translation_applied = meta.pose.has_translation() && options.apply_translation;
    sink.begin_scan(
        index,
        HeaderSpec::for_scan(&meta, options.scale, translation_applied),
    )?;

    let mut stream = match reader.open_stream(index) {
        Ok(stream) => stream,
        Err(e) => {
            log::error!(
                "cannot open point stream of scan {}: {}. skipping ...",
                index + 1,
                e
            );
            stats.record_skip();
            return Ok(());
        }
    };

    let source_id = (index + 1) as u16;
    let mut written = 0u64;
    let mut invalid = 0u64;
    loop {
        let filled = match stream.read_batch(&mut batch) {
            Ok(0) => break,
            Ok(filled) => filled,
            Err(e) => {
                log::error!(
                    "read failure in scan {}: {}. abandoning scan ...",
                    index + 1,
                    e
                );
                break;
            }
        };
        for i in 0..filled {
            if batch.is_invalid(i) {
                invalid += 1;
                if !options.include_invalid {
                    continue;
                }
            }

            let mut v = match &batch.coords {
                CoordChannels::Cartesian { x, y, z } => [x[i], y[i], z[i]],
                CoordChannels::Spherical {
                    range,
                    azimuth,
                    elevation,
                } => {
                    let (x, y, z) = spherical_to_cartesian(range[i], azimuth[i], elevation[i]);
                    [x, y, z]
                }
            };
            transform.apply(&mut v);

            let record = PointRecord {
                x: v[0],
                y: v[1],
                z: v[2],
                intensity: intensity
                    .as_ref()
                    .zip(batch.intensity.as_ref())
                    .map_or(0, |(scaling, samples)| scaling.apply(samples[i])),
                color: match (&color, &batch.red, &batch.green, &batch.blue) {
                    (Some(scaling), Some(red), Some(green), Some(blue)) => {
                        let (r, g, b) = scaling.apply(red[i], green[i], blue[i]);
                        Some(Color { r, g, b })
                    }
                    _ => None,
                },
                return_number: batch
                    .return_index
                    .as_ref()
                    .map_or(0, |samples| samples[i].wrapping_add(1) & 7),
                number_of_returns: batch
                    .return_count
                    .as_ref()
                    .map_or(0, |samples| samples[i].wrapping_add(1) & 7),
                gps_time: batch.gps_time.as_ref().map(|samples| samples[i]),
                point_source_id: source_id,
            };
            sink.write_point(&record)?;
            written += 1;
        }
    }
    drop(stream);

    if invalid > 0 {
        log::debug!(
            "  {} invalid points were {}",
            invalid,
            if options.include_invalid {
                "included"
            } else {
                "omitted"
            }
        );
    }
    sink.finish_scan()?;
    stats.record_scan(written, invalid, options.include_invalid);
    Ok(())
}

/// Resolve the processed index range from the requested 1-based scan
/// numbers. Numbers beyond the available count are warned about and
/// ignored; if nothing remains the run is aborted.
fn scan_range(count: usize, requested: &[u32]) -> Result<(usize, usize), ConvertError> {
    if requested.is_empty() {
        return Ok((0, count - 1));
    }
    let mut first = count;
    let mut last = 0;
    let mut any = false;
    for &number in requested {
        let number = number as usize;
        if number > count {
            log::warn!(
                "scan number [{}] is bigger than number of scans {} in file and will be ignored",
                number,
                count
            );
        } else if number >= 1 {
            first = first.min(number - 1);
            last = last.max(number - 1);
            any = true;
        }
    }
    if !any {
        return Err(ConvertError::NoMatchingScans);
    }
    Ok((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_range_without_filter() {
        assert!(matches!(scan_range(10, &[]), Ok((0, 9))));
    }

    #[test]
    fn range_spans_min_to_max_requested() {
        assert!(matches!(scan_range(10, &[5, 3]), Ok((2, 4))));
    }

    #[test]
    fn out_of_range_numbers_are_ignored() {
        assert!(matches!(scan_range(10, &[3, 42]), Ok((2, 2))));
    }

    #[test]
    fn filter_matching_nothing_is_fatal() {
        assert!(matches!(
            scan_range(2, &[9]),
            Err(ConvertError::NoMatchingScans)
        ));
    }
}
