//! Compare a current coverage report against an optional base report.
//!
//! Files are joined by normalized path. The output keeps the current report's
//! order, followed by files that only exist in the base, in base order. When
//! several files of one report normalize to the same path, the first one wins.
use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::model::{CoverageReport, FileCoverage, LineRange, Ratios, Summary};
use crate::options::Options;
use crate::path::normalize;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// How a file relates to the base report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// No base counterpart (or no base report at all).
    Added,
    /// Only present in the base report.
    Removed,
    Changed,
    Unchanged,
}

/// Per-file comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileDiff {
    /// Normalized path.
    pub path: String,
    pub status: FileStatus,
    pub current: Option<Summary>,
    pub base: Option<Summary>,
    /// `current - base` in percentage points; only when both sides exist.
    pub delta: Option<Ratios>,
    /// Uncovered lines of the current file.
    pub uncovered: Vec<LineRange>,
}

/// Project-wide comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectDiff {
    pub current: Summary,
    pub base: Option<Summary>,
    pub delta: Option<Ratios>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffResult {
    pub files: Vec<FileDiff>,
    pub total: ProjectDiff,
}

impl DiffResult {
    /// Normalized paths of files with the given status, in output order.
    pub fn paths_with_status(&self, status: FileStatus) -> impl Iterator<Item = &str> {
        self.files
            .iter()
            .filter(move |f| f.status == status)
            .map(|f| f.path.as_str())
    }
}

// ---------------------------------------------------------------------------
// Diffing
// ---------------------------------------------------------------------------

/// Index a report by normalized path. On collisions the first file wins.
fn index<'a>(report: &'a CoverageReport, prefix: &str) -> HashMap<&'a str, &'a FileCoverage> {
    let mut map = HashMap::with_capacity(report.files.len());
    for file in &report.files {
        map.entry(normalize(&file.path, prefix)).or_insert(file);
    }
    map
}

fn compare(path: &str, current: &FileCoverage, base: &FileCoverage) -> FileDiff {
    let current_summary = current.summary();
    let base_summary = base.summary();
    let current_ratios = current_summary.ratios();
    let base_ratios = base_summary.ratios();

    let status = if current_ratios == base_ratios {
        FileStatus::Unchanged
    } else {
        FileStatus::Changed
    };

    FileDiff {
        path: path.to_string(),
        status,
        current: Some(current_summary),
        base: Some(base_summary),
        delta: Some(current_ratios.delta(&base_ratios)),
        uncovered: current.uncovered_ranges(),
    }
}

/// Diff `current` against `base`. Without a base, every file is `Added` and
/// the project delta is absent.
pub fn diff(current: &CoverageReport, base: Option<&CoverageReport>, options: &Options) -> DiffResult {
    let prefix = options.prefix.as_str();
    let base_index = base.map(|b| index(b, prefix)).unwrap_or_default();

    let mut files = Vec::with_capacity(current.files.len());
    let mut seen: HashSet<&str> = HashSet::with_capacity(current.files.len());

    for file in &current.files {
        let path = normalize(&file.path, prefix);
        // Distinct raw paths can collapse to one normalized path; the first wins.
        if !seen.insert(path) {
            continue;
        }

        let entry = match base_index.get(path) {
            Some(base_file) => compare(path, file, base_file),
            None => FileDiff {
                path: path.to_string(),
                status: FileStatus::Added,
                current: Some(file.summary()),
                base: None,
                delta: None,
                uncovered: file.uncovered_ranges(),
            },
        };
        files.push(entry);
    }

    if let Some(base) = base {
        for file in &base.files {
            let path = normalize(&file.path, prefix);
            if seen.contains(path) {
                continue;
            }
            files.push(FileDiff {
                path: path.to_string(),
                status: FileStatus::Removed,
                current: None,
                base: Some(file.summary()),
                delta: None,
                uncovered: Vec::new(),
            });
        }
    }

    let current_total = current.summary();
    let base_total = base.map(CoverageReport::summary);
    let delta = base_total.map(|b| current_total.ratios().delta(&b.ratios()));

    DiffResult {
        files,
        total: ProjectDiff {
            current: current_total,
            base: base_total,
            delta,
        },
    }
}
