//! Output drivers, hardware initialisation, and thread helpers.

pub mod buzzer;
pub mod hw_init;
pub mod pixel_ring;
pub mod task_pin;
