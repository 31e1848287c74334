//! Output formatting for coverage diff results.
//!
//! Formatting is pure: the same `DiffResult` and options always produce the
//! same string, which lets the comment layer detect unchanged bodies.

use std::fmt::Write;

use crate::diff::{DiffResult, FileDiff, FileStatus};
use crate::model::{LineRange, Ratios, Summary};
use crate::options::{Grade, RenderOptions};

pub const TITLE: &str = "Coverage Report";

/// Trait for formatting coverage diff results.
pub trait ReportFormatter {
    /// Format the result to a string.
    fn format(&self, result: &DiffResult, options: &RenderOptions) -> String;
}

/// Render the markdown comment body.
#[must_use]
pub fn render(result: &DiffResult, options: &RenderOptions) -> String {
    MarkdownFormatter.format(result, options)
}

/// Percentage with two decimals, dropping a `.00` tail: `50%`, `33.33%`.
#[must_use]
pub fn format_percent(value: f64) -> String {
    let fixed = format!("{value:.2}");
    let trimmed = fixed.strip_suffix(".00").unwrap_or(&fixed);
    format!("{trimmed}%")
}

/// Delta indicator such as `▴ +25%` or `▾ -3.5%`; empty when the change
/// rounds to zero.
#[must_use]
pub fn format_delta(delta: f64) -> String {
    let magnitude = format_percent(delta.abs());
    if magnitude == "0%" {
        return String::new();
    }
    if delta > 0.0 {
        format!("▴ +{magnitude}")
    } else {
        format!("▾ -{magnitude}")
    }
}

fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

fn grade_marker(grade: Grade) -> &'static str {
    match grade {
        Grade::Good => "🟢",
        Grade::Acceptable => "🟡",
        Grade::Poor => "🔴",
    }
}

fn status_glyph(status: FileStatus) -> &'static str {
    match status {
        FileStatus::Added => "🆕",
        FileStatus::Removed => "🗑️",
        FileStatus::Changed | FileStatus::Unchanged => "",
    }
}

/// Pipes would end the table cell.
fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|")
}

/// Percent-encode each segment of a repository path for use in a link target.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

/// Markdown formatter.
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    fn percent_cell(value: f64, options: &RenderOptions) -> String {
        let text = format_percent(value);
        if value < options.thresholds.target {
            format!("**{text}**")
        } else {
            text
        }
    }

    fn summary_cell(value: f64, delta: Option<f64>, options: &RenderOptions) -> String {
        let cell = Self::percent_cell(value, options);
        match delta.map(format_delta) {
            Some(d) if !d.is_empty() => format!("{cell} {d}"),
            _ => cell,
        }
    }

    fn path_cell(file: &FileDiff, options: &RenderOptions) -> String {
        let path = escape_cell(&file.path);
        match (&options.repository_link_base, file.status) {
            (Some(base), status) if status != FileStatus::Removed => {
                format!("[{path}]({base}/{})", encode_path(&file.path))
            }
            _ => format!("`{path}`"),
        }
    }

    fn uncovered_cell(file: &FileDiff, options: &RenderOptions) -> String {
        let link_base = options
            .repository_link_base
            .as_deref()
            .filter(|_| file.status != FileStatus::Removed);
        match link_base {
            Some(base) => format_line_ranges_linked(&file.uncovered, base, &file.path),
            None => format_line_ranges(&file.uncovered),
        }
    }

    fn write_heading(md: &mut String, options: &RenderOptions) {
        writeln!(md, "## {TITLE}\n").unwrap();
        match (&options.head, &options.base) {
            (Some(head), Some(base)) => {
                writeln!(md, "Coverage after merging **{head}** into **{base}**\n").unwrap();
            }
            _ => match &options.commit {
                Some(sha) => {
                    writeln!(md, "Coverage for this commit (`{}`)\n", short_sha(sha)).unwrap();
                }
                None => md.push_str("Coverage for this commit\n\n"),
            },
        }
    }

    fn write_summary(md: &mut String, result: &DiffResult, options: &RenderOptions) {
        let ratios = result.total.current.ratios();
        let delta = result.total.delta;
        let pick = |f: fn(&Ratios) -> f64| delta.as_ref().map(f);

        md.push_str("| Lines | Functions | Branches |\n");
        md.push_str("|------:|----------:|---------:|\n");
        writeln!(
            md,
            "| {} | {} | {} |",
            Self::summary_cell(ratios.lines, pick(|r| r.lines), options),
            Self::summary_cell(ratios.functions, pick(|r| r.functions), options),
            Self::summary_cell(ratios.branches, pick(|r| r.branches), options),
        )
        .unwrap();
    }

    fn write_files(md: &mut String, result: &DiffResult, options: &RenderOptions) {
        if options.show_details {
            md.push_str("| | File | Lines | Δ | Functions | Branches | Uncovered Lines | |\n");
            md.push_str("|:-:|:-----|------:|--:|----------:|---------:|:----------------|:-:|\n");
        } else {
            md.push_str("| | File | Lines | Δ | |\n");
            md.push_str("|:-:|:-----|------:|--:|:-:|\n");
        }

        for file in &result.files {
            let (marker, lines, functions, branches) = match &file.current {
                Some(summary) => Self::measured_cells(summary, options),
                None => ("", "—".to_string(), "—".to_string(), "—".to_string()),
            };
            let delta = file.delta.map(|d| format_delta(d.lines)).unwrap_or_default();
            let path = Self::path_cell(file, options);
            let glyph = status_glyph(file.status);

            if options.show_details {
                let uncovered = Self::uncovered_cell(file, options);
                writeln!(
                    md,
                    "| {marker} | {path} | {lines} | {delta} | {functions} | {branches} | {uncovered} | {glyph} |"
                )
                .unwrap();
            } else {
                writeln!(md, "| {marker} | {path} | {lines} | {delta} | {glyph} |").unwrap();
            }
        }
    }

    fn measured_cells(
        summary: &Summary,
        options: &RenderOptions,
    ) -> (&'static str, String, String, String) {
        let ratios = summary.ratios();
        (
            grade_marker(options.thresholds.grade(ratios.lines)),
            Self::percent_cell(ratios.lines, options),
            Self::percent_cell(ratios.functions, options),
            Self::percent_cell(ratios.branches, options),
        )
    }
}

impl ReportFormatter for MarkdownFormatter {
    fn format(&self, result: &DiffResult, options: &RenderOptions) -> String {
        let mut md = String::new();

        Self::write_heading(&mut md, options);
        Self::write_summary(&mut md, result, options);

        if result.files.is_empty() {
            md.push_str("\nNo files in the coverage report.\n");
            return md;
        }

        md.push_str("\n<details>\n<summary>Files</summary>\n\n");
        Self::write_files(&mut md, result, options);
        md.push_str("\n</details>\n");

        md
    }
}

/// Plain text formatter, for terminals.
pub struct TextFormatter;

impl TextFormatter {
    fn metric_line(out: &mut String, label: &str, current: f64, delta: Option<f64>) {
        write!(out, "{label:<11} {:>8}", format_percent(current)).unwrap();
        if let Some(d) = delta {
            write!(out, " ({d:+.2})").unwrap();
        }
        out.push('\n');
    }
}

impl ReportFormatter for TextFormatter {
    fn format(&self, result: &DiffResult, _options: &RenderOptions) -> String {
        let mut out = String::new();
        let total = &result.total;
        let ratios = total.current.ratios();

        Self::metric_line(&mut out, "Lines:", ratios.lines, total.delta.map(|d| d.lines));
        Self::metric_line(
            &mut out,
            "Functions:",
            ratios.functions,
            total.delta.map(|d| d.functions),
        );
        Self::metric_line(
            &mut out,
            "Branches:",
            ratios.branches,
            total.delta.map(|d| d.branches),
        );

        if result.files.is_empty() {
            return out;
        }

        out.push('\n');
        writeln!(out, "{:<60} {:>8} {:>8} {:<10}", "FILE", "LINES", "DELTA", "STATUS").unwrap();
        writeln!(out, "{}", "-".repeat(89)).unwrap();

        for file in &result.files {
            let lines = file
                .current
                .map(|s| format_percent(s.ratios().lines))
                .unwrap_or_else(|| "-".to_string());
            let delta = file
                .delta
                .map(|d| format!("{:+.2}", d.lines))
                .unwrap_or_default();
            let status = match file.status {
                FileStatus::Added => "added",
                FileStatus::Removed => "removed",
                FileStatus::Changed => "changed",
                FileStatus::Unchanged => "unchanged",
            };
            writeln!(out, "{:<60} {:>8} {:>8} {:<10}", file.path, lines, delta, status).unwrap();
        }

        out
    }
}

/// Format ranges into compact notation, e.g. "1, 3-5, 8".
#[must_use]
pub fn format_line_ranges(ranges: &[LineRange]) -> String {
    ranges
        .iter()
        .map(|r| {
            if r.start == r.end {
                r.start.to_string()
            } else {
                format!("{}-{}", r.start, r.end)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Format ranges as markdown links into the source file.
///
/// Each range becomes `[N]({base}/{path}#LN)` or
/// `[3-5]({base}/{path}#L3-L5)`.
#[must_use]
pub fn format_line_ranges_linked(ranges: &[LineRange], base: &str, path: &str) -> String {
    let path = encode_path(path);
    ranges
        .iter()
        .map(|r| {
            if r.start == r.end {
                format!("[{}]({base}/{path}#L{})", r.start, r.start)
            } else {
                format!(
                    "[{}-{}]({base}/{path}#L{}-L{})",
                    r.start, r.end, r.start, r.end
                )
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
