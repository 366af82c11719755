//! Humidity loop: PID over the latest accepted reading, mapped onto the
//! pump duty and the wet / dry valve pair.
//!
//! A positive output humidifies (air through the bubbler), a negative
//! output dries (air through the desiccant).  Outputs inside the dead-band
//! `(-duty_min, duty_min)` leave everything off.

use log::{info, warn};

use super::ControlState;
use super::pid::PidController;
use crate::acquisition::SensorReading;
use crate::app::ports::{ActuatorPort, Indicator, Valve};
use crate::config::{ControlLimits, PidGains};

/// Physical actuation for one PID output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actuation {
    pub pump_duty: u8,
    pub wet_open: bool,
    pub dry_open: bool,
}

impl Actuation {
    pub const OFF: Self = Self {
        pump_duty: 0,
        wet_open: false,
        dry_open: false,
    };
}

/// Map a PID output onto pump duty and valve selection.
///
/// Magnitudes at or above `duty_max` saturate the pump to 255.
pub fn actuation_for(output: f32, duty_min: u8, duty_max: u8) -> Actuation {
    let magnitude = output.abs();
    if magnitude < f32::from(duty_min) {
        return Actuation::OFF;
    }
    let pump_duty = if magnitude >= f32::from(duty_max) {
        u8::MAX
    } else {
        magnitude.min(255.0) as u8
    };
    Actuation {
        pump_duty,
        wet_open: output > 0.0,
        dry_open: output < 0.0,
    }
}

pub struct HumidityControl {
    pub state: ControlState,
    pid: PidController,
    limits: ControlLimits,
}

impl HumidityControl {
    pub fn new(gains: PidGains, limits: ControlLimits, target: f32) -> Self {
        let target = limits.clamp_humidity(target);
        let mut pid = PidController::new(gains.kp, gains.ki, gains.kd, target);
        pid.set_limits(-255.0, 255.0);
        Self {
            state: ControlState::with_target(target),
            pid,
            limits,
        }
    }

    /// Energize the indicator and arm the loop with a fresh PID.  The
    /// next fresh reading actuates straight away.
    pub fn start(&mut self, hw: &mut impl ActuatorPort) {
        hw.set_indicator(Indicator::Humidity, true);
        self.state.active = true;
        self.pid.reset();
        info!("humidity control: started (target {:.1}%)", self.state.target);
    }

    /// Pump off, valves closed, indicator off.
    pub fn stop(&mut self, hw: &mut impl ActuatorPort) {
        hw.set_indicator(Indicator::Humidity, false);
        self.state.active = false;
        Self::apply(hw, Actuation::OFF);
        info!("humidity control: stopped");
    }

    /// Clamp and apply a new set-point.
    pub fn set_target(&mut self, target: f32) {
        self.state.target = self.limits.clamp_humidity(target);
        self.pid.set_target(self.state.target);
    }

    /// One control step.  Acts only on a fresh reading; a failed reading
    /// de-energizes the actuators once and latches error handling.
    pub fn regulate(&mut self, reading: &mut SensorReading, hw: &mut impl ActuatorPort, now_ms: u32) {
        if !self.state.active {
            return;
        }

        if reading.is_ok() {
            if !reading.take_for_control() {
                return;
            }
            if self.state.error_handling {
                // First good reading after an outage: resync the PID time
                // base instead of actuating on a stale derivative.
                self.state.error_handling = false;
                self.pid.reset();
                self.pid.seed(reading.value(), now_ms);
                info!("humidity control: sensor recovered, PID resynchronised");
                return;
            }
            self.state.output = self.pid.compute(reading.value(), now_ms);
            let actuation = actuation_for(
                self.state.output,
                self.limits.pump_duty_min,
                self.limits.pump_duty_max,
            );
            Self::apply(hw, actuation);
        } else if !self.state.error_handling {
            self.state.error_handling = true;
            Self::apply(hw, Actuation::OFF);
            warn!("humidity control: reading failed, actuators off");
        }
    }

    fn apply(hw: &mut impl ActuatorPort, a: Actuation) {
        hw.set_valve(Valve::Wet, a.wet_open);
        hw.set_valve(Valve::Dry, a.dry_open);
        hw.set_pump_duty(a.pump_duty);
    }
}
