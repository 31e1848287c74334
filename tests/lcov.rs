mod common;

use lcov_reporter::lcov;
use lcov_reporter::model::Counts;

#[test]
fn single_file_half_covered() {
    let report = lcov::parse("SF:a.js\nDA:1,1\nDA:2,0\nend_of_record");

    assert_eq!(report.files.len(), 1);
    let file = &report.files[0];
    assert_eq!(file.path, "a.js");
    assert_eq!(file.line_counts(), Counts::new(2, 1));
    assert_eq!(file.summary().ratios().lines, 50.0);
}

#[test]
fn fixture_current_report() {
    let (current, _) = common::fixture_reports();

    let paths: Vec<_> = current.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "/workspace/src/a.js",
            "/workspace/src/same.js",
            "/workspace/src/new.js"
        ]
    );

    let a = current.files[0].summary();
    assert_eq!(a.lines, Counts::new(4, 3));
    assert_eq!(a.functions, Counts::new(1, 1));
    // BRDA with "-" is found but not hit.
    assert_eq!(a.branches, Counts::new(2, 1));
}

#[test]
fn split_records_merge_into_one_file() {
    let input = "\
TN:unit
SF:src/lib.rs
FN:1,run
DA:1,1
DA:2,0
end_of_record
TN:integration
SF:src/lib.rs
FNDA:4,run
DA:3,1
BRDA:2,0,0,1
end_of_record
";
    let report = lcov::parse(input);

    assert_eq!(report.files.len(), 1);
    let summary = report.files[0].summary();
    assert_eq!(summary.lines, Counts::new(3, 2));
    assert_eq!(summary.functions, Counts::new(1, 1));
    assert_eq!(summary.branches, Counts::new(1, 1));
}

#[test]
fn garbage_is_skipped() {
    let input = "\
this is not lcov
SF:a.js
DA:1,1
DA:oops
BRDA:1,0,0
FNDA:1,undeclared
XYZ:1

DA:2,0
end_of_record
";
    let report = lcov::parse(input);

    assert_eq!(report.files.len(), 1);
    let summary = report.files[0].summary();
    assert_eq!(summary.lines, Counts::new(2, 1));
    assert_eq!(summary.functions, Counts::new(0, 0));
    assert_eq!(summary.branches, Counts::new(0, 0));
}

#[test]
fn writer_output_reparses() {
    let (current, _) = common::fixture_reports();
    let reparsed = lcov::parse(&lcov::to_string(&current));

    assert_eq!(reparsed.summary(), current.summary());
    for (a, b) in current.files.iter().zip(&reparsed.files) {
        assert_eq!(a.path, b.path);
        assert_eq!(a.lines, b.lines);
        assert_eq!(a.functions, b.functions);
        assert_eq!(a.branches, b.branches);
    }
}
