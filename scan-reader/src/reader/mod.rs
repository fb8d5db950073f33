use std::path::PathBuf;

use thiserror::Error;

use scan_core::batch::PointBatch;
use scan_core::scan::ScanMeta;

pub mod e57;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("opening '{path}' failed: {source}")]
    Open {
        path: PathBuf,
        source: ::e57::Error,
    },
    #[error("reading point data failed: {0}")]
    Read(::e57::Error),
    #[error("scan index {0} is out of range")]
    ScanIndex(usize),
    #[error("{0}")]
    Other(String),
}

/// A scan container that can enumerate scans and stream their points.
pub trait ScanReader {
    fn scan_count(&self) -> usize;

    fn scan_meta(&self, index: usize) -> Result<ScanMeta, SourceError>;

    /// Open a chunked point stream for one scan. The stream borrows the
    /// reader until dropped; dropping it releases the source-side cursor.
    fn open_stream<'a>(&'a mut self, index: usize)
        -> Result<Box<dyn BatchReader + 'a>, SourceError>;
}

/// Chunked read protocol: each call overwrites the batch buffers with the
/// next chunk and returns the number of filled slots, 0 on exhaustion.
pub trait BatchReader {
    fn read_batch(&mut self, batch: &mut PointBatch) -> Result<usize, SourceError>;
}
