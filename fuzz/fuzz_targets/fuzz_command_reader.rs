//! Fuzz target: `CommandReader::feed`
//!
//! Drives arbitrary byte sequences into the host-link line assembler and
//! asserts that it never panics, yields at most one result per newline,
//! and recovers cleanly after a reset.
//!
//! cargo fuzz run fuzz_command_reader

#![no_main]

use hygrostat::protocol::CommandReader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut reader = CommandReader::new();

    let mut results = 0usize;
    reader.feed(data, |_| results += 1);
    let newlines = data.iter().filter(|&&b| b == b'\n').count();
    assert!(results <= newlines, "more results than lines");

    // After a reset a well-formed command must parse again.
    reader.reset();
    let mut parsed = None;
    reader.feed(b"^s@\n", |r| parsed = Some(r));
    assert!(matches!(parsed, Some(Ok(_))), "reader did not recover");
});
