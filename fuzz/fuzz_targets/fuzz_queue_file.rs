//! Fuzz target: `DurableQueue` over an arbitrary existing file
//!
//! Treats the input as whatever a power cut or a bad flash left in the
//! outbox.  Opening, peeking and draining must never panic, must never
//! yield a record that was not a complete line, and must terminate.
//!
//! cargo fuzz run fuzz_queue_file

#![no_main]

use libfuzzer_sys::fuzz_target;
use tagreader::adapters::fs::MemFs;
use tagreader::queue::DurableQueue;

const PATH: &str = "/outbox.txt";

fuzz_target!(|data: &[u8]| {
    let mut fs = MemFs::new();
    fs.put(PATH, data);
    let mut queue = DurableQueue::open(fs, PATH);

    let total = queue.len().unwrap();
    let mut drained = 0;
    while let Some(head) = queue.peek().unwrap() {
        let lf = format!("{}\n", head.line());
        let crlf = format!("{}\r\n", head.line());
        let found = |n: &str| data.windows(n.len()).any(|w| w == n.as_bytes());
        assert!(found(&lf) || found(&crlf), "record must come from a complete line");
        queue.dequeue(&head).unwrap();
        drained += 1;
        assert!(drained <= total);
    }
    assert_eq!(drained, total);
    assert!(queue.is_empty().unwrap());
});
