//! Hygrostat Firmware: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter      LogEventSink   NvsAdapter   SerialLink   │
//! │  (Sht3x · Emc2301 ·   (EventSink)    (Storage)    (HostLink)   │
//! │   SerLcd · GPIO)                                               │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              Chamber (pure logic)                      │    │
//! │  │  Acquisition · PID · Fan set-point · Screen FSM        │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Keypad scanner · MonotonicClock                               │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use core::cell::RefCell;

use anyhow::{Context, Result};
use embedded_hal_bus::i2c::RefCellDevice;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::AnyIOPin;
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::uart::{config::Config as UartConfig, UartDriver};
use esp_idf_svc::hal::units::Hertz;
use log::{info, warn};

use hygrostat::adapters::hardware::{Actuators, HardwareAdapter};
use hygrostat::adapters::log_sink::LogEventSink;
use hygrostat::adapters::nvs::NvsAdapter;
use hygrostat::adapters::serial::SerialLink;
use hygrostat::adapters::time::MonotonicClock;
use hygrostat::app::service::Chamber;
use hygrostat::config::SystemConfig;
use hygrostat::drivers::{hw_init, keypad::Keypad, lcd::SerLcd};
use hygrostat::error::Error;
use hygrostat::pins;
use hygrostat::sensors::{emc2301::Emc2301, sht3x::Sht3x};

/// How long the splash screen stays up.
const SPLASH_MS: u32 = 2000;
/// Main-loop pacing; keeps the keypad scan well inside its debounce window.
const LOOP_DELAY_MS: u32 = 5;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Hygrostat v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    hw_init::init_peripherals().map_err(Error::from)?;

    // ── 2. Configuration ──────────────────────────────────────
    let config = SystemConfig::default();
    match serde_json::to_string(&config) {
        Ok(json) => info!("Config: {}", json),
        Err(e) => warn!("Config: could not serialise for logging: {}", e),
    }

    // ── 3. Buses ──────────────────────────────────────────────
    let peripherals = Peripherals::take().context("peripherals already taken")?;

    let i2c_config = I2cConfig::new().baudrate(Hertz(pins::I2C_BAUD_HZ));
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio14,
        peripherals.pins.gpio15,
        &i2c_config,
    )
    .context("I2cDriver::new")?;
    let bus = RefCell::new(i2c);
    info!(
        "I2C ready (SDA=GPIO{}, SCL=GPIO{}, {} Hz)",
        pins::I2C_SDA_GPIO,
        pins::I2C_SCL_GPIO,
        pins::I2C_BAUD_HZ
    );

    let uart_config = UartConfig::new().baudrate(Hertz(pins::UART_BAUD));
    let uart = UartDriver::new(
        peripherals.uart1,
        peripherals.pins.gpio17,
        peripherals.pins.gpio18,
        None::<AnyIOPin>,
        None::<AnyIOPin>,
        &uart_config,
    )
    .context("UartDriver::new")?;
    let mut serial = SerialLink::new(uart);
    info!("UART ready ({} bps)", pins::UART_BAUD);

    // ── 4. Adapters ───────────────────────────────────────────
    let storage = NvsAdapter::new().map_err(Error::from).context("NVS init")?;
    let sensor = Sht3x::new(RefCellDevice::new(&bus), storage);
    let fan = Emc2301::new(RefCellDevice::new(&bus));
    let display = SerLcd::new(RefCellDevice::new(&bus));
    let mut hw = HardwareAdapter::new(sensor, fan, display, Actuators::new());

    let mut keypad = Keypad::new(config.key_hold_event_ms);
    let mut sink = LogEventSink::new();
    let clock = MonotonicClock::new();

    // ── 5. Bring-up ───────────────────────────────────────────
    let mut chamber = Chamber::new(config).map_err(Error::from)?;
    chamber.init(clock.uptime_ms(), &mut hw, &mut sink);
    FreeRtos::delay_ms(SPLASH_MS);

    // ── 6. Main loop ──────────────────────────────────────────
    info!("Entering main loop");
    loop {
        let now = clock.uptime_ms();

        if let Some(event) = keypad.poll(now) {
            chamber.handle_key(event, now, &mut hw, &mut sink);
        }
        if let Some(cmd) = serial.poll_command() {
            chamber.handle_command(cmd, &mut serial, &mut sink);
        }

        chamber.run(now, &mut hw, &mut serial, &mut sink);

        FreeRtos::delay_ms(LOOP_DELAY_MS);
    }
}
