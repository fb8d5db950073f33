use scan_core::scan::{AttributeRange, ColorLimits};

/// Remaps intensity samples from the scan's declared empirical range into
/// the 16-bit intensity slot of the output record.
///
/// A declared range of exactly 255 or 65535 means the source already used
/// a native 8- or 16-bit encoding; those samples pass through with only
/// the minimum subtracted, preserving exact round-trips. Anything else is
/// rescaled to 8 bits with round-half-up and stored in the high byte.
#[derive(Debug, Clone, Copy)]
pub struct IntensityScaling {
    offset: f64,
    range: f64,
    native: bool,
}

impl IntensityScaling {
    pub fn new(limits: Option<AttributeRange>) -> Self {
        let offset = limits.map_or(0.0, |l| l.min);
        let range = limits.map_or(0.0, |l| l.span());
        // A degenerate range cannot be rescaled; pass it through like a
        // native encoding instead of dividing by zero.
        let native = range == 255.0 || range == 65535.0 || range <= 0.0;
        Self {
            offset,
            range,
            native,
        }
    }

    pub fn apply(&self, sample: f64) -> u16 {
        if self.native {
            (sample - self.offset) as i64 as u16
        } else {
            let scaled = (0.5 + (sample - self.offset) * 255.0 / self.range) as i64;
            (scaled << 8) as u16
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ChannelScaling {
    offset: f64,
    range: f64,
}

impl ChannelScaling {
    fn new(limits: Option<AttributeRange>) -> Self {
        let offset = limits.map_or(0.0, |l| l.min);
        let span = limits.map_or(1.0, |l| l.span());
        let range = if span > 0.0 { span } else { 1.0 };
        Self { offset, range }
    }

    fn apply(&self, sample: f64) -> u16 {
        let scaled = (0.5 + (sample - self.offset) * 255.0 / self.range) as i64;
        (scaled << 8) as u16
    }
}

/// Rescales each color channel independently against its own declared
/// range, upper-byte convention as for intensity.
#[derive(Debug, Clone, Copy)]
pub struct ColorScaling {
    red: ChannelScaling,
    green: ChannelScaling,
    blue: ChannelScaling,
}

impl ColorScaling {
    pub fn new(limits: Option<ColorLimits>) -> Self {
        Self {
            red: ChannelScaling::new(limits.map(|l| l.red)),
            green: ChannelScaling::new(limits.map(|l| l.green)),
            blue: ChannelScaling::new(limits.map(|l| l.blue)),
        }
    }

    pub fn apply(&self, red: f64, green: f64, blue: f64) -> (u16, u16, u16) {
        (
            self.red.apply(red),
            self.green.apply(green),
            self.blue.apply(blue),
        )
    }
}
