#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Parser must not panic on any input, and its output must survive a
    // write/parse cycle with the same totals.
    if let Ok(s) = std::str::from_utf8(data) {
        let report = lcov_reporter::lcov::parse(s);
        let reparsed = lcov_reporter::lcov::parse(&lcov_reporter::lcov::to_string(&report));
        assert_eq!(report.summary(), reparsed.summary());
    }
});
