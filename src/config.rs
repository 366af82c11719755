//! System configuration parameters
//!
//! All tunable parameters for the chamber controller.  Values are fixed at
//! build time; [`SystemConfig::validate`] runs once at boot before the
//! controller is constructed.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Immutable control bounds.  Set at construction, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlLimits {
    /// Lowest humidity target the operator may enter (%RH).
    pub humidity_min: f32,
    /// Highest humidity target the operator may enter (%RH).
    pub humidity_max: f32,
    /// PID output magnitude below which the pump stays off (0-255).
    pub pump_duty_min: u8,
    /// PID output magnitude at which the pump saturates to full duty (0-255).
    pub pump_duty_max: u8,
    /// Lowest fan speed target the operator may enter (RPM).
    pub fan_speed_min: f32,
    /// Highest fan speed target the operator may enter (RPM).
    pub fan_speed_max: f32,
    /// Lowest speed the fan controller treats as a valid tachometer reading (RPM).
    pub fan_abs_min: f32,
    /// Minimum drive the fan controller may apply while its loop runs (%).
    pub fan_min_drive: f32,
}

impl Default for ControlLimits {
    fn default() -> Self {
        Self {
            humidity_min: 10.0,
            humidity_max: 95.0,
            pump_duty_min: 50,
            pump_duty_max: 200,
            fan_speed_min: 1500.0,
            fan_speed_max: 9800.0,
            fan_abs_min: 1000.0,
            fan_min_drive: 10.0,
        }
    }
}

impl ControlLimits {
    /// Clamp a humidity target into the operator range.
    pub fn clamp_humidity(&self, value: f32) -> f32 {
        value.clamp(self.humidity_min, self.humidity_max)
    }

    /// Clamp a fan speed target into the operator range.
    pub fn clamp_fan_speed(&self, value: f32) -> f32 {
        value.clamp(self.fan_speed_min, self.fan_speed_max)
    }
}

/// PID gains for the humidity loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Control ---
    pub limits: ControlLimits,
    pub humidity_pid: PidGains,

    // --- Acquisition ---
    /// Period between humidity fetches (milliseconds).
    pub acquisition_period_ms: u32,
    /// Time the humidity sensor needs between trigger and fetch (milliseconds).
    pub conversion_latency_ms: u32,

    // --- Fan controller setup ---
    /// Drive applied while spinning the fan up from rest (%).
    pub fan_spin_up_drive_percent: u8,

    // --- Keypad ---
    /// How long a control key must be held to stop its loop (milliseconds).
    pub key_hold_duration_ms: u32,
    /// Time a key must stay down before the scanner reports a hold (milliseconds).
    pub key_hold_event_ms: u32,

    // --- Display ---
    /// Backlight colour, 0xRRGGBB.
    pub backlight_rgb: u32,
    /// LCD contrast (0 = darkest setting supported by the panel).
    pub contrast: u8,
    /// Show chamber temperature on the readings page instead of a divider.
    pub show_temperature: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            limits: ControlLimits::default(),
            humidity_pid: PidGains {
                kp: 40.0,
                ki: 2.0,
                kd: 10.0,
            },

            acquisition_period_ms: 1000,
            // SHT3x high-repeatability conversion (15 ms) plus bus margin
            conversion_latency_ms: 315,

            fan_spin_up_drive_percent: 30,

            key_hold_duration_ms: 3000,
            key_hold_event_ms: 1000,

            backlight_rgb: 0x00FF_FFFF,
            contrast: 0,
            show_temperature: false,
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let l = &self.limits;
        if !(0.0..=100.0).contains(&l.humidity_min)
            || !(0.0..=100.0).contains(&l.humidity_max)
            || l.humidity_min >= l.humidity_max
        {
            return Err(ConfigError::ValidationFailed(
                "humidity limits must satisfy 0 <= min < max <= 100",
            ));
        }
        if l.pump_duty_min == 0 || l.pump_duty_min > l.pump_duty_max {
            return Err(ConfigError::ValidationFailed(
                "pump duty limits must satisfy 0 < min <= max",
            ));
        }
        if l.fan_abs_min <= 0.0 || l.fan_speed_min < l.fan_abs_min || l.fan_speed_min >= l.fan_speed_max {
            return Err(ConfigError::ValidationFailed(
                "fan limits must satisfy 0 < abs_min <= min < max",
            ));
        }
        if !(0.0..=100.0).contains(&l.fan_min_drive) {
            return Err(ConfigError::ValidationFailed("fan_min_drive must be 0-100"));
        }
        if self.fan_spin_up_drive_percent > 100 {
            return Err(ConfigError::ValidationFailed(
                "fan_spin_up_drive_percent must be 0-100",
            ));
        }
        if self.conversion_latency_ms >= self.acquisition_period_ms {
            return Err(ConfigError::ValidationFailed(
                "conversion_latency_ms must be shorter than acquisition_period_ms",
            ));
        }
        if self.key_hold_duration_ms < 1000 {
            return Err(ConfigError::ValidationFailed(
                "key_hold_duration_ms must be at least one second",
            ));
        }
        if self.backlight_rgb > 0x00FF_FFFF {
            return Err(ConfigError::ValidationFailed("backlight_rgb must be 0xRRGGBB"));
        }
        Ok(())
    }

    /// Humidity target applied at boot: middle of the operator range.
    pub fn initial_humidity_target(&self) -> f32 {
        self.limits.humidity_min + (self.limits.humidity_max - self.limits.humidity_min) / 2.0
    }

    /// Fan speed target applied at boot.
    pub fn initial_fan_speed_target(&self) -> f32 {
        self.limits.fan_speed_max
    }
}
