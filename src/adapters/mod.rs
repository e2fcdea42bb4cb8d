//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements  | Connects to                      |
//! |------------|-------------|----------------------------------|
//! | `fs`       | FileSystem  | SPIFFS via VFS / in-memory store |
//! | `log_sink` | EventSink   | Serial log output                |
//! | `reader`   | ReaderPort  | Absent reader (placeholder)      |
//! | `time`     | Clock       | ESP32 system timer               |
//!
//! `LightPort` and `AudioPort` live with their peripherals in `drivers`.

pub mod fs;
pub mod log_sink;
pub mod reader;
pub mod time;
