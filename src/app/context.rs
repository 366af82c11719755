//! Shared mutable context threaded through every page handler.
//!
//! `ChamberContext` is the single struct the screen pages and the
//! scheduler read from and write to: configuration, the acquisition
//! readings, both control loops, the input editor, and the streaming flag.
//! Think of it as the "blackboard" in a blackboard architecture.

use log::warn;

use super::events::{AppEvent, ControlLoop, TelemetryData};
use super::ports::{ActuatorPort, EventSink, FanControllerPort};
use crate::acquisition::Acquisition;
use crate::config::SystemConfig;
use crate::control::ControlState;
use crate::control::fan::FanControl;
use crate::control::humidity::HumidityControl;
use crate::ui::input::InputBuffer;

pub struct ChamberContext {
    pub config: SystemConfig,
    pub acquisition: Acquisition,
    pub humidity: HumidityControl,
    pub fan: FanControl,
    pub input: InputBuffer,
    /// Host data frames enabled.
    pub streaming: bool,
}

impl ChamberContext {
    /// Build the context with the boot targets: humidity mid-range, fan
    /// speed at its maximum.
    pub fn new(config: SystemConfig) -> Self {
        let humidity = HumidityControl::new(
            config.humidity_pid,
            config.limits,
            config.initial_humidity_target(),
        );
        let fan = FanControl::new(config.limits, config.initial_fan_speed_target());
        let acquisition = Acquisition::new(config.acquisition_period_ms, config.conversion_latency_ms);
        Self {
            config,
            acquisition,
            humidity,
            fan,
            input: InputBuffer::new(),
            streaming: false,
        }
    }

    pub fn control_state(&self, control: ControlLoop) -> &ControlState {
        match control {
            ControlLoop::Humidity => &self.humidity.state,
            ControlLoop::FanSpeed => &self.fan.state,
        }
    }

    pub fn control_state_mut(&mut self, control: ControlLoop) -> &mut ControlState {
        match control {
            ControlLoop::Humidity => &mut self.humidity.state,
            ControlLoop::FanSpeed => &mut self.fan.state,
        }
    }

    /// Switch a loop on and report the outcome.
    pub fn start_control<H>(&mut self, control: ControlLoop, hw: &mut H, sink: &mut dyn EventSink)
    where
        H: FanControllerPort + ActuatorPort,
    {
        let started = match control {
            ControlLoop::Humidity => {
                self.humidity.start(hw);
                true
            }
            ControlLoop::FanSpeed => self.fan.start(hw).is_ok(),
        };
        if started {
            sink.emit(&AppEvent::ControlStarted(control));
        } else {
            sink.emit(&AppEvent::ControlStartFailed(control));
        }
    }

    /// Switch a loop off.  The loop is inactive afterwards even if the
    /// fan controller rejected its zero set-point.
    pub fn stop_control<H>(&mut self, control: ControlLoop, hw: &mut H, sink: &mut dyn EventSink)
    where
        H: FanControllerPort + ActuatorPort,
    {
        match control {
            ControlLoop::Humidity => self.humidity.stop(hw),
            ControlLoop::FanSpeed => {
                if let Err(e) = self.fan.stop(hw) {
                    warn!("fan control: stop reported {}", e);
                }
            }
        }
        sink.emit(&AppEvent::ControlStopped(control));
    }

    /// Store a validated target.  A fan target is pushed to the
    /// controller at once when its loop is running.
    pub fn commit_target<H>(&mut self, control: ControlLoop, value: f32, hw: &mut H, sink: &mut dyn EventSink)
    where
        H: FanControllerPort,
    {
        match control {
            ControlLoop::Humidity => self.humidity.set_target(value),
            ControlLoop::FanSpeed => {
                if let Err(e) = self.fan.set_target(value, hw) {
                    warn!("fan control: target push failed: {}", e);
                }
            }
        }
        let value = self.control_state(control).target;
        sink.emit(&AppEvent::TargetChanged { control, value });
    }

    /// Inclusive operator range for a loop's target.
    pub fn target_range(&self, control: ControlLoop) -> (f32, f32) {
        let l = &self.config.limits;
        match control {
            ControlLoop::Humidity => (l.humidity_min, l.humidity_max),
            ControlLoop::FanSpeed => (l.fan_speed_min, l.fan_speed_max),
        }
    }

    /// Snapshot for the host data frame and the event log.
    pub fn telemetry(&self) -> TelemetryData {
        let acq = &self.acquisition;
        TelemetryData {
            humidity: acq.humidity.get(),
            temperature: acq.temperature.get(),
            fan_speed: acq.fan_speed.get(),
            humidity_target: self.humidity.state.active_target(),
            fan_speed_target: self.fan.state.active_target(),
        }
    }
}
