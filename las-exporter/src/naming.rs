use std::path::{Path, PathBuf};

/// Derive the output name for one scan under split policy: the 0-based
/// scan index, zero-padded to five digits, inserted before the extension.
///
/// `scan.laz` with index 7 becomes `scan00007.laz`.
pub fn numbered_file_name(base: &Path, scan_index: usize) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match base.extension() {
        Some(ext) => format!("{}{:05}.{}", stem, scan_index, ext.to_string_lossy()),
        None => format!("{}{:05}", stem, scan_index),
    };
    base.with_file_name(name)
}
