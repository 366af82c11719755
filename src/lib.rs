//! Hygrostat firmware library.
//!
//! Humidity chamber controller: a two-phase humidity sensor, a closed-loop
//! fan controller, a pump with two valves, a 4×4 keypad, a 20×4 character
//! display and a line-framed host serial link.
//!
//! Everything above the drivers is pure logic behind port traits, so the
//! library builds and tests on the host.  ESP-IDF-specific code is guarded
//! by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod acquisition;
pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod protocol;
pub mod retry;
pub mod ui;

pub mod adapters;
pub mod drivers;
pub mod pins;
pub mod sensors;
