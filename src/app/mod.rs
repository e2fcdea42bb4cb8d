//! Application boundary: the port traits the domain is written against and
//! the events it emits.
//!
//! The domain itself lives in [`crate::queue`], [`crate::scanner`] and
//! [`crate::feedback`].  All interaction with hardware happens through the
//! **port traits** defined in [`ports`], keeping those modules fully
//! testable without real peripherals.

pub mod events;
pub mod ports;
