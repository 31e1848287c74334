/// Parser and writer for the LCOV `.info` format.
///
/// Reference: https://ltp.sourceforge.net/coverage/lcov/geninfo.1.php
///
/// Key records:
///   TN:<test name>
///   SF:<absolute path to source file>
///   FN:<line>,<function name>
///   FNDA:<execution count>,<function name>
///   FNF:<number of functions found>
///   FNH:<number of functions hit>
///   DA:<line number>,<execution count>[,<checksum>]
///   BRDA:<line>,<block>,<branch>,<taken>   ("-" means 0)
///   BRF:<branches found>
///   BRH:<branches hit>
///   LF:<lines found>
///   LH:<lines hit>
///   end_of_record
///
/// Parsing never fails: a line that is not a well-formed record is skipped.
use std::collections::HashMap;
use std::fmt::Write;

use crate::model::{BranchCoverage, CoverageReport, FileCoverage, FunctionCoverage};

/// One tokenized LCOV line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive<'a> {
    TestName(&'a str),
    SourceFile(&'a str),
    Line {
        line_number: u32,
        hit_count: u64,
    },
    Function {
        line_number: u32,
        name: &'a str,
    },
    FunctionHits {
        hit_count: u64,
        name: &'a str,
    },
    FunctionsFound(u64),
    FunctionsHit(u64),
    Branch {
        line_number: u32,
        block: &'a str,
        branch: &'a str,
        hit_count: u64,
    },
    BranchesFound(u64),
    BranchesHit(u64),
    LinesFound(u64),
    LinesHit(u64),
    EndOfRecord,
    /// Blank, unrecognized, or malformed line.
    Unknown,
}

impl<'a> Directive<'a> {
    /// Tokenize a single line. Surrounding whitespace is ignored.
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line == "end_of_record" {
            return Directive::EndOfRecord;
        }

        // Split on first ':'
        match line.split_once(':') {
            Some((tag, value)) => Self::from_fields(tag, value).unwrap_or(Directive::Unknown),
            None => Directive::Unknown,
        }
    }

    fn from_fields(tag: &str, value: &'a str) -> Option<Self> {
        let directive = match tag {
            "TN" => Directive::TestName(value),
            "SF" if !value.is_empty() => Directive::SourceFile(value),
            "DA" => {
                // DA:<line_number>,<execution_count>[,<checksum>]
                // Negative counts mark non-instrumentable lines in some
                // instrumenters; they fail the u64 parse and are skipped.
                let mut fields = value.splitn(3, ',');
                let line_number = parse_line_number(fields.next()?)?;
                let hit_count = parse_count(fields.next()?)?;
                Directive::Line {
                    line_number,
                    hit_count,
                }
            }
            "FN" => {
                // FN:<line>,<name> or, from newer producers, FN:<line>,<end>,<name>
                let (line_str, rest) = value.split_once(',')?;
                let line_number = parse_line_number(line_str)?;
                let name = match rest.split_once(',') {
                    Some((end, name)) if end.trim().parse::<u32>().is_ok() => name,
                    _ => rest,
                };
                if name.is_empty() {
                    return None;
                }
                Directive::Function { line_number, name }
            }
            "FNDA" => {
                let (count_str, name) = value.split_once(',')?;
                if name.is_empty() {
                    return None;
                }
                Directive::FunctionHits {
                    hit_count: parse_count(count_str)?,
                    name,
                }
            }
            "BRDA" => {
                let mut fields = value.splitn(4, ',');
                let line_number = parse_line_number(fields.next()?)?;
                let block = fields.next()?.trim();
                let branch = fields.next()?.trim();
                let taken = fields.next()?.trim();
                let hit_count = if taken == "-" { 0 } else { parse_count(taken)? };
                Directive::Branch {
                    line_number,
                    block,
                    branch,
                    hit_count,
                }
            }
            "FNF" => Directive::FunctionsFound(parse_count(value)?),
            "FNH" => Directive::FunctionsHit(parse_count(value)?),
            "BRF" => Directive::BranchesFound(parse_count(value)?),
            "BRH" => Directive::BranchesHit(parse_count(value)?),
            "LF" => Directive::LinesFound(parse_count(value)?),
            "LH" => Directive::LinesHit(parse_count(value)?),
            _ => return None,
        };
        Some(directive)
    }
}

fn parse_line_number(s: &str) -> Option<u32> {
    s.trim().parse::<u32>().ok().filter(|&n| n > 0)
}

fn parse_count(s: &str) -> Option<u64> {
    s.trim().parse::<u64>().ok()
}

/// Folds directives into a report, one open file at a time.
#[derive(Default)]
struct Accumulator {
    report: CoverageReport,
    /// Raw `SF` path to its position in `report.files`.
    index: HashMap<String, usize>,
    current: Option<usize>,
}

impl Accumulator {
    fn apply(&mut self, directive: Directive<'_>) {
        match directive {
            Directive::SourceFile(path) => {
                let idx = match self.index.get(path) {
                    Some(&idx) => idx,
                    None => {
                        let idx = self.report.files.len();
                        self.report.files.push(FileCoverage::new(path.to_string()));
                        self.index.insert(path.to_string(), idx);
                        idx
                    }
                };
                self.current = Some(idx);
            }
            Directive::EndOfRecord => self.current = None,
            // Line totals are always derived from DA records.
            Directive::TestName(_)
            | Directive::LinesFound(_)
            | Directive::LinesHit(_)
            | Directive::Unknown => {}
            record => {
                if let Some(idx) = self.current {
                    apply_record(&mut self.report.files[idx], record);
                }
            }
        }
    }

    fn finish(self) -> CoverageReport {
        self.report
    }
}

fn apply_record(file: &mut FileCoverage, directive: Directive<'_>) {
    match directive {
        Directive::Line {
            line_number,
            hit_count,
        } => {
            file.lines.insert(line_number, hit_count);
        }
        Directive::Function { line_number, name } => {
            match file.functions.iter_mut().find(|f| f.name == name) {
                Some(existing) => existing.line_number = line_number,
                None => file.functions.push(FunctionCoverage {
                    name: name.to_string(),
                    line_number,
                    hit_count: 0,
                }),
            }
        }
        Directive::FunctionHits { hit_count, name } => {
            // FNDA for a function never declared with FN is dropped.
            if let Some(function) = file.functions.iter_mut().find(|f| f.name == name) {
                function.hit_count = hit_count;
            }
        }
        Directive::Branch {
            line_number,
            block,
            branch,
            hit_count,
        } => file.branches.push(BranchCoverage {
            line_number,
            block: block.to_string(),
            branch: branch.to_string(),
            hit_count,
        }),
        Directive::FunctionsFound(n) => file.declared_functions.found = Some(n),
        Directive::FunctionsHit(n) => file.declared_functions.hit = Some(n),
        Directive::BranchesFound(n) => file.declared_branches.found = Some(n),
        Directive::BranchesHit(n) => file.declared_branches.hit = Some(n),
        Directive::TestName(_)
        | Directive::SourceFile(_)
        | Directive::LinesFound(_)
        | Directive::LinesHit(_)
        | Directive::EndOfRecord
        | Directive::Unknown => {}
    }
}

/// Parse LCOV text into a report. Files appear in order of their first `SF`.
pub fn parse(input: &str) -> CoverageReport {
    let mut acc = Accumulator::default();
    for line in input.lines() {
        acc.apply(Directive::parse(line));
    }
    acc.finish()
}

/// Render a report back to LCOV text.
///
/// Function and branch totals are written as their effective values, so
/// parsing the output yields the same summaries as the input report.
#[must_use]
pub fn to_string(report: &CoverageReport) -> String {
    let mut out = String::new();

    for file in &report.files {
        writeln!(out, "SF:{}", file.path).unwrap();

        for f in &file.functions {
            writeln!(out, "FN:{},{}", f.line_number, f.name).unwrap();
        }
        for f in &file.functions {
            writeln!(out, "FNDA:{},{}", f.hit_count, f.name).unwrap();
        }
        let functions = file.function_counts();
        writeln!(out, "FNF:{}", functions.found).unwrap();
        writeln!(out, "FNH:{}", functions.hit).unwrap();

        for b in &file.branches {
            writeln!(
                out,
                "BRDA:{},{},{},{}",
                b.line_number, b.block, b.branch, b.hit_count
            )
            .unwrap();
        }
        let branches = file.branch_counts();
        writeln!(out, "BRF:{}", branches.found).unwrap();
        writeln!(out, "BRH:{}", branches.hit).unwrap();

        for (line, hits) in &file.lines {
            writeln!(out, "DA:{line},{hits}").unwrap();
        }
        let lines = file.line_counts();
        writeln!(out, "LF:{}", lines.found).unwrap();
        writeln!(out, "LH:{}", lines.hit).unwrap();

        out.push_str("end_of_record\n");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Counts;

    #[test]
    fn test_tokenize_records() {
        assert_eq!(Directive::parse("SF:/src/lib.rs"), Directive::SourceFile("/src/lib.rs"));
        assert_eq!(
            Directive::parse("DA:3,7,abcdef"),
            Directive::Line {
                line_number: 3,
                hit_count: 7
            }
        );
        assert_eq!(
            Directive::parse("FN:10,main"),
            Directive::Function {
                line_number: 10,
                name: "main"
            }
        );
        assert_eq!(
            Directive::parse("FN:10,20,main"),
            Directive::Function {
                line_number: 10,
                name: "main"
            }
        );
        assert_eq!(
            Directive::parse("BRDA:10,0,1,-"),
            Directive::Branch {
                line_number: 10,
                block: "0",
                branch: "1",
                hit_count: 0
            }
        );
        assert_eq!(Directive::parse("end_of_record  "), Directive::EndOfRecord);
    }

    #[test]
    fn test_tokenize_malformed_is_unknown() {
        for line in [
            "",
            "   ",
            "garbage",
            "XX:1,2",
            "DA:",
            "DA:1",
            "DA:x,1",
            "DA:0,1",
            "DA:2,-1",
            "FN:1,",
            "FNDA:abc,main",
            "BRDA:1,0,0",
            "BRDA:1,0,0,lots",
            "FNF:many",
            "SF:",
        ] {
            assert_eq!(Directive::parse(line), Directive::Unknown, "line: {line:?}");
        }
    }

    #[test]
    fn test_parse_lcov() {
        let input = include_str!("../tests/fixtures/sample.lcov");
        let report = parse(input);

        assert_eq!(report.files.len(), 2);

        let lib = &report.files[0];
        assert_eq!(lib.path, "/src/lib.rs");
        assert_eq!(lib.lines.len(), 5);
        assert_eq!(lib.lines[&1], 5);
        assert_eq!(lib.lines[&3], 0);

        assert_eq!(lib.branches.len(), 2);
        assert_eq!(lib.branches[0].line_number, 2);
        assert_eq!(lib.branches[0].hit_count, 5);
        assert_eq!(lib.branches[1].hit_count, 0);

        assert_eq!(lib.functions.len(), 2);
        assert_eq!(lib.functions[0].name, "main");
        assert_eq!(lib.functions[0].hit_count, 5);
        assert_eq!(lib.functions[0].line_number, 1);
        assert_eq!(lib.functions[1].name, "helper");
        assert_eq!(lib.functions[1].hit_count, 0);

        let util = &report.files[1];
        assert_eq!(util.path, "/src/util.rs");
        assert_eq!(util.lines.len(), 2);
        assert!(util.branches.is_empty());
        assert!(util.functions.is_empty());
    }

    #[test]
    fn test_parse_lcov_no_end_of_record() {
        let input = include_str!("../tests/fixtures/lcov_no_end_of_record.lcov");
        let report = parse(input);
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files[0].lines.len(), 2);
    }

    #[test]
    fn test_parse_lcov_negative_counts() {
        let input = include_str!("../tests/fixtures/lcov_negative_counts.lcov");
        let report = parse(input);

        assert_eq!(report.files.len(), 1);
        let file = &report.files[0];
        // Line 2 has count=-1 and is skipped. Lines 1, 3, 4 remain.
        assert_eq!(file.lines.keys().copied().collect::<Vec<_>>(), vec![1, 3, 4]);
        assert_eq!(file.lines[&4], 3);
    }

    #[test]
    fn test_parse_lcov_empty() {
        let input = include_str!("../tests/fixtures/empty.lcov");
        assert!(parse(input).files.is_empty());
    }

    #[test]
    fn test_repeated_source_file_merges() {
        let input = "SF:a.js\nDA:1,1\nFN:1,f\nend_of_record\n\
                     SF:b.js\nDA:1,0\nend_of_record\n\
                     SF:a.js\nDA:2,0\nDA:1,0\nFNDA:3,f\nend_of_record\n";
        let report = parse(input);

        assert_eq!(report.files.len(), 2);
        let a = &report.files[0];
        assert_eq!(a.path, "a.js");
        // Last write wins for line 1.
        assert_eq!(a.lines[&1], 0);
        assert_eq!(a.lines[&2], 0);
        assert_eq!(a.functions.len(), 1);
        assert_eq!(a.functions[0].hit_count, 3);
        assert_eq!(report.files[1].path, "b.js");
    }

    #[test]
    fn test_function_without_fnda_defaults_to_zero() {
        let report = parse("SF:a.c\nFN:3,lonely\nFNDA:4,ghost\nend_of_record\n");
        let file = &report.files[0];
        assert_eq!(file.functions.len(), 1);
        assert_eq!(file.functions[0].name, "lonely");
        assert_eq!(file.functions[0].hit_count, 0);
        assert_eq!(file.function_counts(), Counts::new(1, 0));
    }

    #[test]
    fn test_declared_totals_trusted() {
        let report = parse("SF:a.c\nFN:1,f\nFNDA:1,f\nFNF:3\nFNH:2\nBRF:4\nBRH:1\nend_of_record\n");
        let file = &report.files[0];
        assert_eq!(file.function_counts(), Counts::new(3, 2));
        assert_eq!(file.branch_counts(), Counts::new(4, 1));
    }

    #[test]
    fn test_records_outside_file_are_ignored() {
        let report = parse("DA:1,1\nend_of_record\nend_of_record\nSF:a.c\nDA:2,1\n");
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files[0].lines.len(), 1);
    }

    #[test]
    fn test_branch_dash_counts_found_not_hit() {
        let report = parse("SF:a.c\nBRDA:10,0,0,-\nBRDA:10,0,1,2\nend_of_record\n");
        let file = &report.files[0];
        assert_eq!(file.branches[0].hit_count, 0);
        assert_eq!(file.branch_counts(), Counts::new(2, 1));
        // Branch records never touch line data.
        assert!(file.lines.is_empty());
    }

    #[test]
    fn test_tolerates_crlf_and_trailing_whitespace() {
        let report = parse("SF:a.js  \r\nDA:1,1 \r\n\r\nDA:2,0\r\nend_of_record\r\n");
        assert_eq!(report.files[0].path, "a.js");
        assert_eq!(report.files[0].line_counts(), Counts::new(2, 1));
    }

    #[test]
    fn test_to_string_reparses_to_same_summary() {
        let input = include_str!("../tests/fixtures/sample.lcov");
        let report = parse(input);
        let written = to_string(&report);
        let reparsed = parse(&written);

        assert_eq!(reparsed.files.len(), report.files.len());
        for (a, b) in report.files.iter().zip(&reparsed.files) {
            assert_eq!(a.path, b.path);
            assert_eq!(a.lines, b.lines);
            assert_eq!(a.summary(), b.summary());
        }
    }
}
