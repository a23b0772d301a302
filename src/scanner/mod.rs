//! Startup indexing of the media tree.

pub mod file_scanner;

pub use file_scanner::{FileScanner, MediaIndex, ScanConfig, ScanSummary};
