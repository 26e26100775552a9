#![no_main]
use libfuzzer_sys::fuzz_target;
use sunlog::LogParser;

fuzz_target!(|data: &[u8]| {
    // Arbitrary text must parse or fail with an error, never panic.
    let s = String::from_utf8_lossy(data);
    let _ = LogParser::new().parse(&s);
    let _ = LogParser::new().require_closed(true).array_indicator("[*]").parse(&s);
});
