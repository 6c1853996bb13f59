// src/process/mod.rs
//! Parsers for the flat daily files: the compressed closing listing, the
//! off-market CSV, investor-flow CSVs and the two XLS workbooks.
pub mod archive;
pub mod flows;
pub mod market_summary;
pub mod omts;
pub mod workbook;

use std::path::Path;

/// File stem as an owned string, empty when the path has none.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}
