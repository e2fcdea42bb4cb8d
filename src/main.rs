//! Tag reader firmware: main entry point.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                     │
//! │                                                               │
//! │  NullReader      FlashFs        MonotonicClock  LogEventSink  │
//! │  (ReaderPort)    (FileSystem)   (Clock)         (EventSink)   │
//! │  PixelRing       Buzzer                                       │
//! │  (LightPort)     (AudioPort)                                  │
//! │                                                               │
//! │  ──────────────── Port Trait Boundary ──────────────────      │
//! │                                                               │
//! │  Core 0 (main)                     Core 1 ("render")          │
//! │  ┌──────────────────────┐          ┌──────────────────────┐   │
//! │  │ TagScanner           │  static  │ FeedbackController   │   │
//! │  │  └ DurableQueue      │─Handle──▶│  render + melody     │   │
//! │  │  └ Whitelist         │          │                      │   │
//! │  └──────────────────────┘          └──────────────────────┘   │
//! └───────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::peripherals::Peripherals;
use log::{error, info, warn};

use tagreader::access::Whitelist;
use tagreader::adapters::fs::FlashFs;
use tagreader::adapters::log_sink::LogEventSink;
use tagreader::adapters::reader::NullReader;
use tagreader::adapters::time::MonotonicClock;
use tagreader::config::{CONFIG_PATH, ReaderConfig};
use tagreader::drivers::buzzer::Buzzer;
use tagreader::drivers::hw_init::{self, FS_BASE_PATH};
use tagreader::drivers::pixel_ring;
use tagreader::drivers::task_pin::{Core, spawn_on_core};
use tagreader::feedback::{FeedbackController, FeedbackHandle};
use tagreader::queue::DurableQueue;
use tagreader::scanner::{ScannerConfig, TagScanner};
use tagreader::scheduler::{self, Ticker};

/// Scanner → render thread command slot.
static FEEDBACK: FeedbackHandle = FeedbackHandle::new();

/// How often the outbox depth is logged.
const OUTBOX_REPORT_INTERVAL: Duration = Duration::from_secs(60);

type Outbox = Arc<Mutex<DurableQueue<FlashFs>>>;

async fn report_outbox(outbox: Outbox) {
    let mut ticker = Ticker::every(OUTBOX_REPORT_INTERVAL);
    loop {
        ticker.next().await;
        let depth = match outbox.lock() {
            Ok(queue) => queue.len(),
            Err(_) => continue,
        };
        match depth {
            Ok(n) => info!("Outbox: {} record(s) pending", n),
            Err(e) => warn!("Outbox: unreadable: {}", e),
        }
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  TagReader v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;

    // ── 2. Flash filesystem + config ──────────────────────────
    if let Err(e) = hw_init::mount_filesystem() {
        error!("{}, scans will not be stored", e);
    }
    let mut fs = FlashFs::new(FS_BASE_PATH);
    let config = ReaderConfig::load_or_default(&mut fs, CONFIG_PATH);

    // ── 3. Feedback thread (Core 1) ───────────────────────────
    if let Err(e) = hw_init::init_buzzer() {
        warn!("{}, running without sound", e);
    }
    let render_config = config.clone();
    let rmt_channel = peripherals.rmt.channel0;
    let led_pin = peripherals.pins.gpio34;
    spawn_on_core(Core::App, 10, 8, "render\0", move || {
        let ring = match pixel_ring::open_rmt_ring(rmt_channel, led_pin, render_config.ring_len) {
            Ok(ring) => ring,
            Err(e) => {
                error!("{}, render thread halted", e);
                return;
            }
        };
        let mut controller = FeedbackController::new(ring, Buzzer::new(), &render_config);
        let interval = Duration::from_millis(u64::from(render_config.frame_interval_ms));

        let executor: edge_executor::LocalExecutor<'_, 8> = edge_executor::LocalExecutor::new();
        executor
            .spawn(scheduler::run_render_loop(&mut controller, &FEEDBACK, interval))
            .detach();
        futures_lite::future::block_on(executor.run(core::future::pending::<()>()));
    })?;

    // ── 4. Scanner (Core 0, this thread) ──────────────────────
    let outbox: Outbox = Arc::new(Mutex::new(DurableQueue::open(
        FlashFs::new(FS_BASE_PATH),
        &config.queue_path,
    )));
    let whitelist = Whitelist::from_entries(&config.whitelist, config.enforce_whitelist);
    info!(
        "Access: {} whitelisted tag(s), enforcement {}",
        whitelist.len(),
        if whitelist.is_enforced() { "on" } else { "off" }
    );

    let mut scanner = TagScanner::new(
        NullReader,
        outbox.clone(),
        whitelist,
        ScannerConfig::from(&config),
    );
    let mut delay = FreeRtos;
    let clock = MonotonicClock::new();
    let mut sink = LogEventSink::new();
    let scan_interval = Duration::from_millis(u64::from(config.scan_interval_ms));

    info!("System ready.");

    let executor: edge_executor::LocalExecutor<'_, 8> = edge_executor::LocalExecutor::new();
    executor
        .spawn(scheduler::run_scan_loop(
            &mut scanner,
            &mut delay,
            &clock,
            &FEEDBACK,
            &mut sink,
            scan_interval,
        ))
        .detach();
    executor.spawn(report_outbox(outbox)).detach();
    futures_lite::future::block_on(executor.run(core::future::pending::<()>()));

    Ok(())
}
