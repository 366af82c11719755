//! Application core: pure domain logic, zero I/O.
//!
//! This module holds the chamber's business rules: acquisition timing,
//! the two control loops, and the keypad menu.  All interaction with
//! hardware happens through **port traits** defined in [`ports`], keeping
//! this layer fully testable without real peripherals.

pub mod commands;
pub mod context;
pub mod events;
pub mod ports;
pub mod service;
