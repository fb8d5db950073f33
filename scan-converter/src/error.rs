use thiserror::Error;

use las_exporter::ExportError;

/// Run-level failures; everything else is handled per scan or per point
/// and only surfaces as counters and log lines.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("given scan numbers do not match any available scans")]
    NoMatchingScans,
    #[error(transparent)]
    Export(#[from] ExportError),
}
