//! Core-pinned thread spawning for the ESP32-S3.
//!
//! `esp_pthread_set_cfg()` applies to the *next* `pthread_create()` from the
//! calling thread, so configure-then-spawn must not interleave with other
//! thread creation on the same thread.  Off target the core and priority
//! are ignored.

use std::io;
use std::thread::{self, JoinHandle};

/// CPU cores of the ESP32-S3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU): scan loop, SPI reader, flash writes.
    Pro = 0,
    /// Core 1 (APP_CPU): LED ring render and buzzer.
    App = 1,
}

/// Spawn `f` on `core` with the given FreeRTOS priority and stack.
///
/// `name` must be NUL-terminated (e.g. `"render\0"`).
#[cfg(target_os = "espidf")]
pub fn spawn_on_core(
    core: Core,
    priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    // SAFETY: `name` is 'static and NUL-terminated; the config is consumed
    // by the spawn below on this same thread.
    let rc = unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = core as i32;
        cfg.prio = priority as i32;
        cfg.stack_size = (stack_kb * 1024) as i32;
        cfg.thread_name = name.as_ptr() as *const _;
        esp_idf_sys::esp_pthread_set_cfg(&cfg)
    };
    if rc != esp_idf_sys::ESP_OK as i32 {
        return Err(io::Error::other(format!("esp_pthread_set_cfg failed: {rc}")));
    }

    let display_name = name.trim_end_matches('\0');
    log::info!(
        "Spawning '{}' on {:?} (pri={}, stack={}KB)",
        display_name,
        core,
        priority,
        stack_kb
    );
    thread::Builder::new().name(display_name.into()).spawn(f)
}

#[cfg(not(target_os = "espidf"))]
pub fn spawn_on_core(
    _core: Core,
    _priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    let display_name = name.trim_end_matches('\0');
    log::info!("Spawning '{}' (sim, stack={}KB)", display_name, stack_kb);
    thread::Builder::new()
        .name(display_name.into())
        .stack_size(stack_kb * 1024)
        .spawn(f)
}
