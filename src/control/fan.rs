//! Fan speed loop.  The fan controller closes the loop itself; the core
//! only pushes set-points and gates the PWM output.

use log::{info, warn};

use super::ControlState;
use crate::app::ports::{ActuatorPort, FanControllerPort, Indicator};
use crate::config::ControlLimits;
use crate::error::DeviceError;
use crate::retry::retry_with;

pub struct FanControl {
    pub state: ControlState,
    limits: ControlLimits,
}

impl FanControl {
    pub fn new(limits: ControlLimits, target: f32) -> Self {
        Self {
            state: ControlState::with_target(limits.clamp_fan_speed(target)),
            limits,
        }
    }

    /// Push the target; on success release the PWM gate and light the
    /// indicator.  Nothing changes if the controller rejects the target.
    pub fn start<H>(&mut self, hw: &mut H) -> Result<(), DeviceError>
    where
        H: FanControllerPort + ActuatorPort,
    {
        if let Err(e) = retry_with(self.state.target, |rpm| hw.set_speed_target(rpm)) {
            warn!("fan control: start failed: {}", e);
            return Err(e);
        }
        hw.set_fan_enabled(true);
        hw.set_indicator(Indicator::Fan, true);
        self.state.active = true;
        info!("fan control: started (target {:.0} RPM)", self.state.target);
        Ok(())
    }

    /// Push a zero set-point, then drain the PWM output and go inactive.
    ///
    /// The gate always closes and the loop is always inactive afterwards.
    /// An `Err` only reports that the controller kept its old set-point; the
    /// fan is not running.
    pub fn stop<H>(&mut self, hw: &mut H) -> Result<(), DeviceError>
    where
        H: FanControllerPort + ActuatorPort,
    {
        let result = retry_with(0.0, |rpm| hw.set_speed_target(rpm));
        if let Err(e) = result {
            warn!("fan control: zero set-point rejected: {}", e);
        }
        hw.set_fan_enabled(false);
        hw.set_indicator(Indicator::Fan, false);
        self.state.active = false;
        info!("fan control: stopped");
        result
    }

    /// Clamp and store a new target.  While active it is pushed at once;
    /// while inactive it takes effect at the next start.
    pub fn set_target(&mut self, target: f32, hw: &mut impl FanControllerPort) -> Result<(), DeviceError> {
        self.state.target = self.limits.clamp_fan_speed(target);
        if !self.state.active {
            return Ok(());
        }
        retry_with(self.state.target, |rpm| hw.set_speed_target(rpm))
    }
}
