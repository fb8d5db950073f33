use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("creating '{path}' failed: {source}")]
    Open { path: PathBuf, source: las::Error },
    #[error("building output header failed: {0}")]
    Header(las::Error),
    #[error("writing point failed: {0}")]
    Write(las::Error),
    #[error("finalizing output failed: {0}")]
    Close(las::Error),
    #[error("no scan is active for the output stream")]
    NoActiveScan,
}
