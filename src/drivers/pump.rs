//! Misting pump driver (low-side MOSFET on LEDC PWM).
//!
//! Duty is the full 8-bit LEDC range, 0 – 255, so the humidity loop's
//! output maps onto it without rescaling.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives real PWM via hw_init helpers.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    Stopped,
    Running { duty: u8 },
}

pub struct PumpDriver {
    state: PumpState,
}

impl Default for PumpDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl PumpDriver {
    pub fn new() -> Self {
        Self {
            state: PumpState::Stopped,
        }
    }

    pub fn set_duty(&mut self, duty: u8) {
        if duty == 0 {
            self.stop();
            return;
        }
        hw_init::ledc_set(hw_init::LEDC_CH_PUMP, duty);
        self.state = PumpState::Running { duty };
    }

    pub fn stop(&mut self) {
        hw_init::ledc_set(hw_init::LEDC_CH_PUMP, 0);
        self.state = PumpState::Stopped;
    }

    pub fn state(&self) -> PumpState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        !matches!(self.state, PumpState::Stopped)
    }

    pub fn current_duty(&self) -> u8 {
        match self.state {
            PumpState::Stopped => 0,
            PumpState::Running { duty } => duty,
        }
    }
}
