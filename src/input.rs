//! Reading report files from disk. This is the only place the library
//! touches the filesystem; the parser itself works on strings.

use std::io::ErrorKind;
use std::path::Path;

use crate::error::{ReporterError, Result};
use crate::lcov;
use crate::model::CoverageReport;

/// Read and parse the current report. A missing or empty file is an error.
pub fn read_report(path: &Path) -> Result<CoverageReport> {
    let text = std::fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => ReporterError::ReportNotFound(path.to_path_buf()),
        _ => ReporterError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    if text.trim().is_empty() {
        return Err(ReporterError::EmptyReport(path.to_path_buf()));
    }

    Ok(lcov::parse(&text))
}

/// Read and parse the base report. Any failure degrades to "no base" with a
/// warning, so the diff still runs.
pub fn read_base(path: &Path) -> Option<CoverageReport> {
    match read_report(path) {
        Ok(report) => Some(report),
        Err(e) => {
            eprintln!("Warning: {e}, ignoring base report");
            None
        }
    }
}
