//! Outbound application events.
//!
//! The [`Chamber`](super::service::Chamber) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, forward to the host, etc.

use super::ports::CalibrationPointId;

/// One of the two closed loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlLoop {
    Humidity,
    FanSpeed,
}

/// Sensor whose health changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Humidity,
    FanSpeed,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// `init` finished; acquisition is primed.
    Started,

    /// A control loop was switched on.
    ControlStarted(ControlLoop),

    /// A control loop was switched off.
    ControlStopped(ControlLoop),

    /// Switching a loop on failed (device did not accept the set-point).
    ControlStartFailed(ControlLoop),

    /// A fetch failed after all retries.
    SensorFault(SensorKind),

    /// A sensor delivered a good reading after a fault.
    SensorOnline(SensorKind),

    /// A new target was committed from the keypad.
    TargetChanged { control: ControlLoop, value: f32 },

    /// A keypad entry was outside the allowed range and discarded.
    InputRejected { control: ControlLoop, value: f32 },

    /// A calibration point was stored.
    CalibrationSaved(CalibrationPointId),

    /// Both calibration points were cleared.
    CalibrationCleared,

    /// Host data streaming toggled.
    StreamingChanged(bool),

    /// Snapshot taken after every acquisition fetch.
    Telemetry(TelemetryData),
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
///
/// `None` readings failed to fetch; `None` targets belong to inactive loops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryData {
    pub humidity: Option<f32>,
    pub temperature: Option<f32>,
    pub fan_speed: Option<f32>,
    pub humidity_target: Option<f32>,
    pub fan_speed_target: Option<f32>,
}
