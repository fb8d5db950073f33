pub mod reader;

pub use reader::e57::E57ScanReader;
pub use reader::{BatchReader, ScanReader, SourceError};
