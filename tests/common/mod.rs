#![allow(dead_code)]

use lcov_reporter::lcov;
use lcov_reporter::model::CoverageReport;
use lcov_reporter::options::Options;

/// Build root that the fixture reports were generated under.
pub const PREFIX: &str = "/workspace/";

pub fn options() -> Options {
    Options {
        repository: "acme/app".to_string(),
        prefix: PREFIX.to_string(),
        commit: "0123456789abcdef".to_string(),
        head: Some("feature".to_string()),
        base: Some("main".to_string()),
        ..Default::default()
    }
}

/// Parse `tests/fixtures/current.lcov` and `tests/fixtures/base.lcov`.
pub fn fixture_reports() -> (CoverageReport, CoverageReport) {
    let current = lcov::parse(include_str!("../fixtures/current.lcov"));
    let base = lcov::parse(include_str!("../fixtures/base.lcov"));
    (current, base)
}
