//! In-memory representation of an LCOV report. The parser produces a
//! `CoverageReport`; everything downstream only reads it.

use std::collections::BTreeMap;
use std::ops::{Add, AddAssign};

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Coverage percentage, treating an empty denominator as fully covered.
#[must_use]
pub fn percent(hit: u64, found: u64) -> f64 {
    if found == 0 {
        100.0
    } else {
        hit as f64 / found as f64 * 100.0
    }
}

/// Found/hit pair for one metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub found: u64,
    pub hit: u64,
}

impl Counts {
    #[must_use]
    pub fn new(found: u64, hit: u64) -> Self {
        Self { found, hit }
    }

    #[must_use]
    pub fn percent(&self) -> f64 {
        percent(self.hit, self.found)
    }
}

impl Add for Counts {
    type Output = Counts;

    fn add(self, rhs: Counts) -> Counts {
        // Declared totals come straight from the input and may be huge.
        Counts {
            found: self.found.saturating_add(rhs.found),
            hit: self.hit.saturating_add(rhs.hit),
        }
    }
}

impl AddAssign for Counts {
    fn add_assign(&mut self, rhs: Counts) {
        *self = *self + rhs;
    }
}

impl Serialize for Counts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Counts", 3)?;
        state.serialize_field("found", &self.found)?;
        state.serialize_field("hit", &self.hit)?;
        state.serialize_field("percent", &self.percent())?;
        state.end()
    }
}

/// Line, function and branch counts for a file or a whole project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub lines: Counts,
    pub functions: Counts,
    pub branches: Counts,
}

impl Summary {
    #[must_use]
    pub fn ratios(&self) -> Ratios {
        Ratios {
            lines: self.lines.percent(),
            functions: self.functions.percent(),
            branches: self.branches.percent(),
        }
    }
}

impl AddAssign for Summary {
    fn add_assign(&mut self, rhs: Summary) {
        self.lines += rhs.lines;
        self.functions += rhs.functions;
        self.branches += rhs.branches;
    }
}

/// Percentages per metric. Also used for deltas, in percentage points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ratios {
    pub lines: f64,
    pub functions: f64,
    pub branches: f64,
}

impl Ratios {
    #[must_use]
    pub fn delta(&self, base: &Ratios) -> Ratios {
        Ratios {
            lines: self.lines - base.lines,
            functions: self.functions - base.functions,
            branches: self.branches - base.branches,
        }
    }
}

/// A function declared with `FN` and (optionally) counted with `FNDA`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCoverage {
    pub name: String,
    pub line_number: u32,
    pub hit_count: u64,
}

/// A single branch arm from a `BRDA` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchCoverage {
    pub line_number: u32,
    pub block: String,
    pub branch: String,
    pub hit_count: u64,
}

/// Totals a producer wrote explicitly (`FNF`/`FNH`, `BRF`/`BRH`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeclaredTotals {
    pub found: Option<u64>,
    pub hit: Option<u64>,
}

impl DeclaredTotals {
    /// Override `derived` with whatever was declared. `hit` never exceeds `found`.
    fn apply(&self, derived: Counts) -> Counts {
        let found = self.found.unwrap_or(derived.found);
        let hit = self.hit.unwrap_or(derived.hit).min(found);
        Counts { found, hit }
    }
}

/// Coverage data for a single source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileCoverage {
    pub path: String,
    /// Line number to hit count.
    pub lines: BTreeMap<u32, u64>,
    pub functions: Vec<FunctionCoverage>,
    pub branches: Vec<BranchCoverage>,
    pub declared_functions: DeclaredTotals,
    pub declared_branches: DeclaredTotals,
}

impl FileCoverage {
    pub fn new(path: String) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn line_counts(&self) -> Counts {
        let hit = self.lines.values().filter(|&&hits| hits > 0).count();
        Counts::new(self.lines.len() as u64, hit as u64)
    }

    #[must_use]
    pub fn function_counts(&self) -> Counts {
        let hit = self.functions.iter().filter(|f| f.hit_count > 0).count();
        let derived = Counts::new(self.functions.len() as u64, hit as u64);
        self.declared_functions.apply(derived)
    }

    #[must_use]
    pub fn branch_counts(&self) -> Counts {
        let hit = self.branches.iter().filter(|b| b.hit_count > 0).count();
        let derived = Counts::new(self.branches.len() as u64, hit as u64);
        self.declared_branches.apply(derived)
    }

    #[must_use]
    pub fn summary(&self) -> Summary {
        Summary {
            lines: self.line_counts(),
            functions: self.function_counts(),
            branches: self.branch_counts(),
        }
    }

    /// Line numbers with a zero hit count, ascending.
    #[must_use]
    pub fn uncovered_lines(&self) -> Vec<u32> {
        self.lines
            .iter()
            .filter(|&(_, &hits)| hits == 0)
            .map(|(&line, _)| line)
            .collect()
    }

    /// Uncovered lines coalesced into ranges for display.
    #[must_use]
    pub fn uncovered_ranges(&self) -> Vec<LineRange> {
        let instrumented: Vec<u32> = self.lines.keys().copied().collect();
        coalesce_ranges(&self.uncovered_lines(), &instrumented)
    }
}

/// The complete result of parsing one LCOV document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageReport {
    pub files: Vec<FileCoverage>,
}

impl CoverageReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Totals across every file in the report.
    #[must_use]
    pub fn summary(&self) -> Summary {
        let mut total = Summary::default();
        for file in &self.files {
            total += file.summary();
        }
        total
    }
}

/// Inclusive range of line numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

/// Maximum number of consecutive non-instrumented lines that can be bridged
/// when coalescing uncovered ranges.
const MAX_BRIDGE_GAP: u32 = 2;

/// Coalesce sorted line numbers into ranges, bridging small gaps where every
/// line in the gap is absent from `instrumented`.
///
/// Both slices must be sorted and deduplicated.
#[must_use]
pub fn coalesce_ranges(lines: &[u32], instrumented: &[u32]) -> Vec<LineRange> {
    let Some((&first, rest)) = lines.split_first() else {
        return Vec::new();
    };

    debug_assert!(
        lines.windows(2).all(|w| w[0] < w[1]),
        "coalesce_ranges requires sorted, deduplicated input"
    );

    let mut ranges = Vec::new();
    let mut current = LineRange {
        start: first,
        end: first,
    };

    for &line in rest {
        let gap = line - current.end - 1;
        if gap <= MAX_BRIDGE_GAP
            && (current.end + 1..line).all(|l| instrumented.binary_search(&l).is_err())
        {
            current.end = line;
        } else {
            ranges.push(current);
            current = LineRange {
                start: line,
                end: line,
            };
        }
    }

    ranges.push(current);
    ranges
}
