//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Chamber (domain)
//! ```
//!
//! Driven adapters (humidity sensor, fan controller, display, actuators,
//! host link, event sinks, storage) implement these traits.  The
//! [`Chamber`](super::service::Chamber) consumes them via generics, so the
//! domain core never touches a bus or a pin directly.
//!
//! Every device operation reports success or a [`DeviceError`]; the core
//! wraps each call in [`retry`](crate::retry::retry) and never sees a
//! distinguished timeout class.

use serde::{Deserialize, Serialize};

use crate::error::DeviceError;

// ───────────────────────────────────────────────────────────────
// Humidity sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Measurement repeatability requested on trigger.  Higher repeatability
/// means a longer conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeatability {
    Low,
    Medium,
    High,
}

/// One completed humidity measurement, calibration already applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// Relative humidity (%RH).
    pub humidity: f32,
    /// Chamber temperature (°C).
    pub temperature: f32,
}

/// Selects one of the two stored calibration points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationPointId {
    One,
    Two,
}

impl CalibrationPointId {
    /// Operator-facing number ('1' or '2' on the keypad).
    pub fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

/// A calibration pair: what the reference instrument read, and what the
/// sensor read (uncalibrated) at the same moment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    pub reference: f32,
    pub raw: f32,
}

/// Two-phase humidity sensor: a measurement is triggered, then fetched
/// once the conversion has finished.
pub trait HumiditySensorPort {
    /// Start a single-shot conversion.
    fn trigger_measurement(&mut self, repeatability: Repeatability) -> Result<(), DeviceError>;

    /// Read back the conversion started by the last trigger.
    fn fetch_measurement(&mut self) -> Result<Measurement, DeviceError>;

    /// Uncalibrated humidity of the last successful fetch (%RH).
    fn raw_humidity(&self) -> f32;

    /// Stored calibration point, if one has been saved.
    fn saved_calibration(&self, id: CalibrationPointId) -> Option<CalibrationPoint>;

    /// Persist a calibration point and apply it immediately.
    fn save_calibration(&mut self, id: CalibrationPointId, point: CalibrationPoint) -> Result<(), DeviceError>;

    /// Forget both calibration points and revert to raw readings.
    fn reset_calibration(&mut self) -> Result<(), DeviceError>;
}

// ───────────────────────────────────────────────────────────────
// Fan controller port
// ───────────────────────────────────────────────────────────────

/// One-time closed-loop setup of the fan controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FanSetup {
    /// Slowest speed the controller will regulate to (RPM).
    pub abs_min_rpm: f32,
    /// Drive applied while spinning up from rest (%).
    pub spin_up_drive_percent: u8,
    /// Drive floor while the loop runs (%).
    pub min_drive_percent: f32,
}

/// Closed-loop fan controller with a tachometer.
pub trait FanControllerPort {
    /// Apply the closed-loop configuration.  Called once at init.
    fn configure(&mut self, setup: &FanSetup) -> Result<(), DeviceError>;

    /// Current fan speed (RPM).
    fn fetch_speed(&mut self) -> Result<f32, DeviceError>;

    /// New speed target (RPM).  Zero stops the controller's own loop.
    fn set_speed_target(&mut self, rpm: f32) -> Result<(), DeviceError>;
}

// ───────────────────────────────────────────────────────────────
// Display port
// ───────────────────────────────────────────────────────────────

/// Character display.  Positions are (column, row), zero based.
pub trait DisplayPort {
    fn clear(&mut self) -> Result<(), DeviceError>;

    fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), DeviceError>;

    /// Print text at the cursor; the cursor advances.
    fn write_str(&mut self, text: &str) -> Result<(), DeviceError>;

    /// Blinking block cursor on or off.
    fn set_blink(&mut self, on: bool) -> Result<(), DeviceError>;

    /// Backlight colour, 0xRRGGBB.
    fn set_backlight(&mut self, rgb: u32) -> Result<(), DeviceError>;

    fn set_contrast(&mut self, contrast: u8) -> Result<(), DeviceError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Solenoid valve selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Valve {
    /// Routes pump air through the desiccant.
    Dry,
    /// Routes pump air through the bubbler.
    Wet,
}

/// Status LED selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Humidity,
    Fan,
}

/// Write-side port for the GPIO actuators.  GPIO writes cannot fail.
pub trait ActuatorPort {
    /// Pump duty (0–255).
    fn set_pump_duty(&mut self, duty: u8);

    fn set_valve(&mut self, valve: Valve, open: bool);

    /// Release (true) or drain (false) the fan controller's PWM output.
    fn set_fan_enabled(&mut self, enabled: bool);

    fn set_indicator(&mut self, indicator: Indicator, on: bool);

    /// Pump off, valves closed, fan drained, LEDs off.
    fn all_off(&mut self) {
        self.set_pump_duty(0);
        self.set_valve(Valve::Dry, false);
        self.set_valve(Valve::Wet, false);
        self.set_fan_enabled(false);
        self.set_indicator(Indicator::Humidity, false);
        self.set_indicator(Indicator::Fan, false);
    }
}

/// Everything the chamber core drives, bundled.
pub trait Hardware: HumiditySensorPort + FanControllerPort + DisplayPort + ActuatorPort {}

impl<T: HumiditySensorPort + FanControllerPort + DisplayPort + ActuatorPort> Hardware for T {}

// ───────────────────────────────────────────────────────────────
// Host link port (domain → serial)
// ───────────────────────────────────────────────────────────────

/// Outbound half of the host serial link.  Inbound bytes are assembled
/// by [`CommandReader`](crate::protocol::CommandReader) in the adapter.
pub trait HostLink {
    /// Send one already-framed line.
    fn send(&mut self, line: &str) -> Result<(), DeviceError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage (calibration points).
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - Write operations MUST be atomic; no partial writes on power loss.
///   The ESP-IDF NVS API guarantees this natively; in-memory simulation
///   achieves it trivially.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Configuration rejected at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
    /// Stored blob could not be decoded.
    Corrupted,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
            Self::Corrupted => write!(f, "stored value corrupted"),
        }
    }
}
