//! TrueTouch Firmware: Main Entry Point
//!
//! Hexagonal architecture with a single cooperative service loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  BleUartAdapter    GpioPinDriver   LogEventSink   Esp32Time    │
//! │  (ByteStream)      (PinDriver)     (EventSink)    (Clock)      │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │          ControllerService (pure logic)                │    │
//! │  │  FrameDecoder · PulseScheduler · ActuatorBanks         │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use log::{error, info};

use truetouch::adapters::ble_uart::{self, BleUartAdapter, NUS_RX};
use truetouch::adapters::hardware::GpioPinDriver;
use truetouch::adapters::log_sink::LogEventSink;
use truetouch::adapters::time::Esp32TimeAdapter;
use truetouch::app::service::ControllerService;
use truetouch::config::ControllerConfig;
use truetouch::drivers::hw_init;
use truetouch::drivers::watchdog::Watchdog;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  TrueTouch v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration + hardware peripherals ───────────────
    let config = ControllerConfig::default();
    let channels = match hw_init::bring_up(&config) {
        Ok(ch) => ch,
        Err(e) => {
            // Actuators in an unknown state are worse than no glove:
            // stop here and let the bootloader retry on next power cycle.
            error!("Bring-up failed: {}, halting", e);
            return Err(e.into());
        }
    };
    let watchdog = Watchdog::new();

    // ── 3. Construct adapters ─────────────────────────────────
    let mut pins = GpioPinDriver::new(channels);
    let clock = Esp32TimeAdapter::new();
    let mut log_sink = LogEventSink::new();

    let mut ble = BleUartAdapter::new(ble_uart::advertised_name(), &NUS_RX);
    ble.start();
    let mut stream = ble.stream();

    // ── 4. Construct controller service ───────────────────────
    let mut controller = ControllerService::new(&config);
    controller.init(&mut pins, &mut log_sink);

    info!(
        "System ready. Entering service loop ({} ms poll).",
        config.poll_interval_ms
    );

    // ── 5. Service loop ───────────────────────────────────────
    let poll = std::time::Duration::from_millis(u64::from(config.poll_interval_ms));
    loop {
        controller.service(&mut stream, &mut pins, &clock, &mut log_sink);

        // Feed watchdog on every iteration.
        watchdog.feed();

        // Yield to the Bluedroid and idle tasks.
        std::thread::sleep(poll);
    }
}
