//! Actuator and operator-interface drivers, plus hardware initialisation.

pub mod hw_init;
pub mod keypad;
pub mod lcd;
pub mod pump;
pub mod switch;
