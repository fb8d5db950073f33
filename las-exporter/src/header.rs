use chrono::NaiveDate;
use las::{Builder, Header, Transform, Vector, Vlr};

use scan_core::scan::ScanMeta;

/// Record id used for the free-text provenance VLRs.
const PROVENANCE_RECORD_ID: u16 = 4711;

/// Everything needed to populate one output header, resolved from a scan
/// before any point is written.
#[derive(Debug, Clone)]
pub struct HeaderSpec {
    pub scale: [f64; 3],
    pub offset: [f64; 3],
    pub has_gps_time: bool,
    pub has_color: bool,
    pub date: Option<NaiveDate>,
    pub provenance: Vec<(String, String)>,
}

impl HeaderSpec {
    pub fn for_scan(meta: &ScanMeta, scale: [f64; 3], translation_applied: bool) -> Self {
        Self {
            scale,
            offset: derive_offset(meta, translation_applied),
            has_gps_time: meta.fields.time_stamp,
            has_color: meta.fields.has_color(),
            date: meta.acquisition_gps_time.and_then(gps_to_date),
            provenance: meta.provenance.clone(),
        }
    }

    /// The point record format widens with the optional channels: +1 for
    /// timestamps, +2 for RGB.
    pub fn format_number(&self) -> u8 {
        let mut number = 0;
        if self.has_gps_time {
            number += 1;
        }
        if self.has_color {
            number += 2;
        }
        number
    }

    pub fn into_header(self) -> Result<Header, las::Error> {
        let mut builder = Builder::from((1, 2));
        builder.point_format = las::point::Format::new(self.format_number())?;
        builder.system_identifier = "scan2las".to_string();
        builder.generating_software = format!("scan2las (version {})", env!("CARGO_PKG_VERSION"));
        builder.date = self.date;
        builder.transforms = Vector {
            x: Transform {
                scale: self.scale[0],
                offset: self.offset[0],
            },
            y: Transform {
                scale: self.scale[1],
                offset: self.offset[1],
            },
            z: Transform {
                scale: self.scale[2],
                offset: self.offset[2],
            },
        };
        for (key, value) in self.provenance {
            builder.vlrs.push(Vlr {
                user_id: key,
                record_id: PROVENANCE_RECORD_ID,
                description: String::new(),
                data: value.into_bytes(),
            });
        }
        builder.into_header()
    }
}

/// Header offset per axis: the applied translation truncated to the next
/// lower multiple of 10,000 units, else the midpoint of the declared
/// bounds truncated the same way, else 0 when the bounds are unknown.
pub fn derive_offset(meta: &ScanMeta, translation_applied: bool) -> [f64; 3] {
    if translation_applied {
        let t = meta.pose.translation;
        [trunc_10k(t.x), trunc_10k(t.y), trunc_10k(t.z)]
    } else {
        match meta.cartesian_bounds {
            Some(b) => [
                axis_offset(b.x_min, b.x_max),
                axis_offset(b.y_min, b.y_max),
                axis_offset(b.z_min, b.z_max),
            ],
            None => [0.0; 3],
        }
    }
}

fn trunc_10k(v: f64) -> f64 {
    ((v / 10_000.0) as i64 * 10_000) as f64
}

fn axis_offset(min: Option<f64>, max: Option<f64>) -> f64 {
    match (min, max) {
        (Some(lo), Some(hi)) if lo.is_finite() && hi.is_finite() => {
            (((lo + hi) / 20_000.0) as i64 * 10_000) as f64
        }
        _ => 0.0,
    }
}

/// Calendar date of a GPS timestamp (seconds since 1980-01-06), ignoring
/// leap seconds. Returns None for absent or degenerate timestamps.
fn gps_to_date(gps_seconds: f64) -> Option<NaiveDate> {
    if !gps_seconds.is_finite() || gps_seconds <= 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1980, 1, 6)?.and_hms_opt(0, 0, 0)?;
    let moment = epoch.checked_add_signed(chrono::Duration::seconds(gps_seconds as i64))?;
    Some(moment.date())
}
