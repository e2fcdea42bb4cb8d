//! Tag reader firmware library.
//!
//! A contactless tag reader with a durable outbox of scan records and an
//! LED ring + buzzer for feedback.  Everything above the port traits in
//! [`app::ports`] is plain Rust and runs on the host; ESP-IDF specifics are
//! guarded by `#[cfg(target_os = "espidf")]` inside each module.

#![deny(unused_must_use)]

pub mod access;
pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod feedback;
pub mod pins;
pub mod queue;
pub mod scanner;
pub mod scheduler;

pub use error::{Error, QueueError, RecordError};
pub use queue::DurableQueue;
pub use queue::record::{ReadEvent, Record, TagId};
