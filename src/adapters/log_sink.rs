//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production).  Telemetry arrives
//! once per acquisition period and goes out at debug level.

use log::{debug, info, warn};

use crate::app::events::{AppEvent, TelemetryData};
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

struct Reading(Option<f32>, usize);

impl core::fmt::Display for Reading {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{:.*}", self.1, v),
            None => f.write_str("--"),
        }
    }
}

fn log_telemetry(t: &TelemetryData) {
    debug!(
        "TELEM | RH={}% (target {}) | T={}\u{00b0}C | fan={} RPM (target {})",
        Reading(t.humidity, 1),
        Reading(t.humidity_target, 1),
        Reading(t.temperature, 1),
        Reading(t.fan_speed, 0),
        Reading(t.fan_speed_target, 0),
    );
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => log_telemetry(t),
            AppEvent::Started => info!("START | acquisition primed"),
            AppEvent::ControlStarted(control) => info!("CONTROL | {:?} on", control),
            AppEvent::ControlStopped(control) => info!("CONTROL | {:?} off", control),
            AppEvent::ControlStartFailed(control) => warn!("CONTROL | {:?} failed to start", control),
            AppEvent::SensorFault(kind) => warn!("SENSOR | {:?} fault", kind),
            AppEvent::SensorOnline(kind) => info!("SENSOR | {:?} online", kind),
            AppEvent::TargetChanged { control, value } => {
                info!("TARGET | {:?} -> {:.1}", control, value);
            }
            AppEvent::InputRejected { control, value } => {
                info!("TARGET | {:?} rejected {:.1} (out of range)", control, value);
            }
            AppEvent::CalibrationSaved(id) => info!("CAL | point {} saved", id.number()),
            AppEvent::CalibrationCleared => info!("CAL | cleared"),
            AppEvent::StreamingChanged(on) => {
                info!("HOST | streaming {}", if *on { "on" } else { "off" });
            }
        }
    }
}
