#![no_main]
use libfuzzer_sys::fuzz_target;

use lcov_reporter::options::{Options, RenderOptions};

fuzz_target!(|data: &[u8]| {
    // Split the input into a current and a base report; the whole
    // parse → diff → render pipeline must not panic.
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let (current, base) = s.split_once("\0").unwrap_or((s, ""));
    let current = lcov_reporter::lcov::parse(current);
    let base = lcov_reporter::lcov::parse(base);
    let options = Options::default();
    let result = lcov_reporter::diff::diff(&current, Some(&base), &options);
    let render = RenderOptions {
        show_details: true,
        ..RenderOptions::from_options(&options)
    };
    let _ = lcov_reporter::report::render(&result, &render);
});
