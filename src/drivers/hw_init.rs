//! One-shot hardware peripheral initialization.
//!
//! Configures the buzzer LEDC timer/channel and mounts the flash
//! filesystem using raw ESP-IDF sys calls.  Called once from `main()`
//! before the task loops start.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    LedcInitFailed(i32),
    FsMountFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::LedcInitFailed(rc) => write!(f, "LEDC timer/channel config failed (rc={})", rc),
            Self::FsMountFailed(rc) => write!(f, "SPIFFS mount failed (rc={})", rc),
        }
    }
}

impl From<HwInitError> for crate::error::Error {
    fn from(e: HwInitError) -> Self {
        match e {
            HwInitError::LedcInitFailed(_) => Self::Init("LEDC"),
            HwInitError::FsMountFailed(_) => Self::Init("filesystem"),
        }
    }
}

// ── LEDC (buzzer) ────────────────────────────────────────────

#[cfg(target_os = "espidf")]
const BUZZER_TIMER: ledc_timer_t = ledc_timer_t_LEDC_TIMER_0;
#[cfg(target_os = "espidf")]
const BUZZER_CHANNEL: ledc_channel_t = ledc_channel_t_LEDC_CHANNEL_0;

#[cfg(target_os = "espidf")]
pub fn init_buzzer() -> Result<(), HwInitError> {
    let timer = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: BUZZER_TIMER,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
        freq_hz: pins::BUZZER_IDLE_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    // SAFETY: Called once from main() before the render thread exists.
    let rc = unsafe { ledc_timer_config(&timer) };
    if rc != ESP_OK {
        return Err(HwInitError::LedcInitFailed(rc));
    }

    let channel = ledc_channel_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        channel: BUZZER_CHANNEL,
        timer_sel: BUZZER_TIMER,
        gpio_num: pins::BUZZER_GPIO,
        duty: 0,
        hpoint: 0,
        ..Default::default()
    };
    let rc = unsafe { ledc_channel_config(&channel) };
    if rc != ESP_OK {
        return Err(HwInitError::LedcInitFailed(rc));
    }

    info!("hw_init: buzzer on GPIO{} (LEDC CH0)", pins::BUZZER_GPIO);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_buzzer() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): buzzer init skipped");
    Ok(())
}

/// Retune and set duty.  `frequency_hz == 0` only sets the duty.
#[cfg(target_os = "espidf")]
pub fn buzzer_set(frequency_hz: u32, duty: u32) {
    // SAFETY: LEDC was configured in init_buzzer(); only the render thread
    // drives the buzzer.
    unsafe {
        if frequency_hz > 0 {
            ledc_set_freq(ledc_mode_t_LEDC_LOW_SPEED_MODE, BUZZER_TIMER, frequency_hz);
        }
        ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, BUZZER_CHANNEL, duty);
        ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, BUZZER_CHANNEL);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn buzzer_set(_frequency_hz: u32, _duty: u32) {}

// ── Flash filesystem ─────────────────────────────────────────

/// VFS mount point of the data partition.
pub const FS_BASE_PATH: &str = "/spiffs";

#[cfg(target_os = "espidf")]
pub fn mount_filesystem() -> Result<(), HwInitError> {
    let conf = esp_vfs_spiffs_conf_t {
        base_path: c"/spiffs".as_ptr(),
        partition_label: core::ptr::null(),
        max_files: 4,
        format_if_mount_failed: true,
    };
    // SAFETY: `conf` points at static strings; the VFS copies the base path.
    let rc = unsafe { esp_vfs_spiffs_register(&conf) };
    if rc != ESP_OK {
        return Err(HwInitError::FsMountFailed(rc));
    }
    info!("hw_init: SPIFFS mounted at {}", FS_BASE_PATH);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn mount_filesystem() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): using host directory for {}", FS_BASE_PATH);
    Ok(())
}
