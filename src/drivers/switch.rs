//! Single-pin digital outputs: solenoid valves, the fan PWM-drain gate
//! and the two status LEDs.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the GPIO via hw_init.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;

/// Electrical polarity of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

pub struct SwitchedOutput {
    gpio: i32,
    polarity: Polarity,
    on: bool,
}

impl SwitchedOutput {
    /// Create the output in its "off" state.  The pin level is written
    /// immediately so the driver and the pin agree from the start.
    pub fn new(gpio: i32, polarity: Polarity) -> Self {
        let mut out = Self {
            gpio,
            polarity,
            on: false,
        };
        out.set(false);
        out
    }

    pub fn set(&mut self, on: bool) {
        hw_init::gpio_write(self.gpio, Self::level(self.polarity, on));
        self.on = on;
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    /// Pin level for a logical state.
    fn level(polarity: Polarity, on: bool) -> bool {
        match polarity {
            Polarity::ActiveHigh => on,
            Polarity::ActiveLow => !on,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_off() {
        let out = SwitchedOutput::new(4, Polarity::ActiveLow);
        assert!(!out.is_on());
    }

    #[test]
    fn active_low_inverts_level() {
        assert!(!SwitchedOutput::level(Polarity::ActiveLow, true));
        assert!(SwitchedOutput::level(Polarity::ActiveLow, false));
        assert!(SwitchedOutput::level(Polarity::ActiveHigh, true));
    }
}
