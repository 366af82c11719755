//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the three bus devices and the GPIO actuators, exposing them
//! through [`HumiditySensorPort`], [`FanControllerPort`], [`DisplayPort`]
//! and [`ActuatorPort`].  The bus devices are generic so the same adapter
//! wraps the I2C drivers on the board and test doubles on the host.

use crate::app::ports::{
    ActuatorPort, CalibrationPoint, CalibrationPointId, DisplayPort, FanControllerPort, FanSetup, HumiditySensorPort,
    Indicator, Measurement, Repeatability, Valve,
};
use crate::drivers::pump::PumpDriver;
use crate::drivers::switch::{Polarity, SwitchedOutput};
use crate::error::DeviceError;
use crate::pins;

/// Pump, valves, fan gate and status LEDs.
pub struct Actuators {
    pump: PumpDriver,
    valve_dry: SwitchedOutput,
    valve_wet: SwitchedOutput,
    /// On = fan controller drives the fan; off = its PWM is drained.
    fan_gate: SwitchedOutput,
    led_humidity: SwitchedOutput,
    led_fan: SwitchedOutput,
}

impl Default for Actuators {
    fn default() -> Self {
        Self::new()
    }
}

impl Actuators {
    /// Claim the actuator pins; everything starts off.
    pub fn new() -> Self {
        Self {
            pump: PumpDriver::new(),
            valve_dry: SwitchedOutput::new(pins::VALVE_DRY_GPIO, Polarity::ActiveHigh),
            valve_wet: SwitchedOutput::new(pins::VALVE_WET_GPIO, Polarity::ActiveHigh),
            fan_gate: SwitchedOutput::new(pins::FAN_PWM_DRAIN_GPIO, Polarity::ActiveLow),
            led_humidity: SwitchedOutput::new(pins::LED_HUMIDITY_GPIO, Polarity::ActiveHigh),
            led_fan: SwitchedOutput::new(pins::LED_FAN_GPIO, Polarity::ActiveHigh),
        }
    }

    pub fn pump_duty(&self) -> u8 {
        self.pump.current_duty()
    }

    pub fn is_valve_open(&self, valve: Valve) -> bool {
        match valve {
            Valve::Dry => self.valve_dry.is_on(),
            Valve::Wet => self.valve_wet.is_on(),
        }
    }

    pub fn is_fan_enabled(&self) -> bool {
        self.fan_gate.is_on()
    }
}

impl ActuatorPort for Actuators {
    fn set_pump_duty(&mut self, duty: u8) {
        self.pump.set_duty(duty);
    }

    fn set_valve(&mut self, valve: Valve, open: bool) {
        match valve {
            Valve::Dry => self.valve_dry.set(open),
            Valve::Wet => self.valve_wet.set(open),
        }
    }

    fn set_fan_enabled(&mut self, enabled: bool) {
        self.fan_gate.set(enabled);
    }

    fn set_indicator(&mut self, indicator: Indicator, on: bool) {
        match indicator {
            Indicator::Humidity => self.led_humidity.set(on),
            Indicator::Fan => self.led_fan.set(on),
        }
    }
}

/// Concrete adapter that combines all hardware behind the port traits.
pub struct HardwareAdapter<S, F, D> {
    sensor: S,
    fan: F,
    display: D,
    actuators: Actuators,
}

impl<S, F, D> HardwareAdapter<S, F, D> {
    pub fn new(sensor: S, fan: F, display: D, actuators: Actuators) -> Self {
        Self {
            sensor,
            fan,
            display,
            actuators,
        }
    }

    pub fn actuators(&self) -> &Actuators {
        &self.actuators
    }
}

// ── HumiditySensorPort implementation ─────────────────────────

impl<S: HumiditySensorPort, F, D> HumiditySensorPort for HardwareAdapter<S, F, D> {
    fn trigger_measurement(&mut self, repeatability: Repeatability) -> Result<(), DeviceError> {
        self.sensor.trigger_measurement(repeatability)
    }

    fn fetch_measurement(&mut self) -> Result<Measurement, DeviceError> {
        self.sensor.fetch_measurement()
    }

    fn raw_humidity(&self) -> f32 {
        self.sensor.raw_humidity()
    }

    fn saved_calibration(&self, id: CalibrationPointId) -> Option<CalibrationPoint> {
        self.sensor.saved_calibration(id)
    }

    fn save_calibration(&mut self, id: CalibrationPointId, point: CalibrationPoint) -> Result<(), DeviceError> {
        self.sensor.save_calibration(id, point)
    }

    fn reset_calibration(&mut self) -> Result<(), DeviceError> {
        self.sensor.reset_calibration()
    }
}

// ── FanControllerPort implementation ──────────────────────────

impl<S, F: FanControllerPort, D> FanControllerPort for HardwareAdapter<S, F, D> {
    fn configure(&mut self, setup: &FanSetup) -> Result<(), DeviceError> {
        self.fan.configure(setup)
    }

    fn fetch_speed(&mut self) -> Result<f32, DeviceError> {
        self.fan.fetch_speed()
    }

    fn set_speed_target(&mut self, rpm: f32) -> Result<(), DeviceError> {
        self.fan.set_speed_target(rpm)
    }
}

// ── DisplayPort implementation ────────────────────────────────

impl<S, F, D: DisplayPort> DisplayPort for HardwareAdapter<S, F, D> {
    fn clear(&mut self) -> Result<(), DeviceError> {
        self.display.clear()
    }

    fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), DeviceError> {
        self.display.set_cursor(col, row)
    }

    fn write_str(&mut self, text: &str) -> Result<(), DeviceError> {
        self.display.write_str(text)
    }

    fn set_blink(&mut self, on: bool) -> Result<(), DeviceError> {
        self.display.set_blink(on)
    }

    fn set_backlight(&mut self, rgb: u32) -> Result<(), DeviceError> {
        self.display.set_backlight(rgb)
    }

    fn set_contrast(&mut self, contrast: u8) -> Result<(), DeviceError> {
        self.display.set_contrast(contrast)
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<S, F, D> ActuatorPort for HardwareAdapter<S, F, D> {
    fn set_pump_duty(&mut self, duty: u8) {
        self.actuators.set_pump_duty(duty);
    }

    fn set_valve(&mut self, valve: Valve, open: bool) {
        self.actuators.set_valve(valve, open);
    }

    fn set_fan_enabled(&mut self, enabled: bool) {
        self.actuators.set_fan_enabled(enabled);
    }

    fn set_indicator(&mut self, indicator: Indicator, on: bool) {
        self.actuators.set_indicator(indicator, on);
    }
}
