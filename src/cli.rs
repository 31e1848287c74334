//! Command handler functions for the lcov-reporter CLI.
//!
//! Each `cmd_*` function returns its output as a `String`, making them easy
//! to test without capturing stdout.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::ValueEnum;

use crate::diff::{diff, DiffResult};
use crate::github;
use crate::input;
use crate::model::{Counts, CoverageReport};
use crate::options::{Options, RenderOptions};
use crate::report::{self, ReportFormatter, TextFormatter};

/// Output style for the `report` command.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum Style {
    #[default]
    Markdown,
    Text,
    Json,
}

/// Report files for one invocation.
#[derive(Debug, Clone)]
pub struct Inputs {
    pub lcov_file: PathBuf,
    pub lcov_base: Option<PathBuf>,
}

impl Inputs {
    /// Read the current report (required) and the base report (optional).
    pub fn load(&self) -> Result<(CoverageReport, Option<CoverageReport>)> {
        let current = input::read_report(&self.lcov_file)?;
        let base = self.lcov_base.as_deref().and_then(input::read_base);
        Ok((current, base))
    }

    /// Load both reports and diff them.
    pub fn diff(&self, options: &Options) -> Result<DiffResult> {
        let (current, base) = self.load()?;
        Ok(diff(&current, base.as_ref(), options))
    }
}

pub fn cmd_report(
    inputs: &Inputs,
    options: &Options,
    render: &RenderOptions,
    style: Style,
) -> Result<String> {
    let result = inputs.diff(options)?;

    let out = match style {
        Style::Markdown => report::render(&result, render),
        Style::Text => TextFormatter.format(&result, render),
        Style::Json => {
            let mut json =
                serde_json::to_string_pretty(&result).context("Failed to serialize diff")?;
            json.push('\n');
            json
        }
    };
    Ok(out)
}

/// Render the markdown body and post it through the GitHub context.
pub fn cmd_comment(
    ctx: &github::Context,
    inputs: &Inputs,
    render: &RenderOptions,
    overwrite_existing: bool,
) -> Result<String> {
    let result = inputs.diff(&ctx.options)?;
    let body = report::render(&result, render);
    let status = ctx
        .post_comment(&body, overwrite_existing)
        .context("Failed to post coverage comment")?;
    Ok(format!("{status}\n"))
}

fn write_counts(out: &mut String, label: &str, counts: Counts) {
    writeln!(
        out,
        "{label:<11} {}/{} ({:.1}%)",
        counts.hit,
        counts.found,
        counts.percent()
    )
    .unwrap();
}

pub fn cmd_summary(lcov_file: &Path) -> Result<String> {
    let report = input::read_report(lcov_file)?;
    let summary = report.summary();

    let mut out = String::new();
    writeln!(out, "Files:      {}", report.files.len()).unwrap();
    write_counts(&mut out, "Lines:", summary.lines);
    if summary.functions.found > 0 {
        write_counts(&mut out, "Functions:", summary.functions);
    }
    if summary.branches.found > 0 {
        write_counts(&mut out, "Branches:", summary.branches);
    }
    Ok(out)
}
