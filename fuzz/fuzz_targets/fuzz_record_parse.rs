//! Fuzz target: `Record::parse_bytes`
//!
//! Arbitrary bytes as one queue line.  Parsing must never panic, and any
//! line it accepts must re-parse to the same record from its stored text.
//!
//! cargo fuzz run fuzz_record_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use tagreader::Record;

fuzz_target!(|data: &[u8]| {
    let Ok(record) = Record::parse_bytes(data) else {
        return;
    };

    assert!(!record.line().contains('\n'));
    assert!(record.tag_id().len() <= 10);

    let again = Record::parse(record.line()).expect("accepted line must re-parse");
    assert_eq!(again, record);

    // Canonical form carries the same event.
    let canonical = Record::new(record.event().clone());
    assert_eq!(canonical.event(), record.event());
});
