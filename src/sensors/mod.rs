//! Bus-attached device drivers behind the sensing ports.
//!
//! Both drivers are generic over `embedded_hal::i2c::I2c`, so they run
//! unchanged on the ESP-IDF I2C driver (shared through
//! `embedded-hal-bus`) and on host test doubles.

pub mod emc2301;
pub mod sht3x;

#[cfg(test)]
pub(crate) mod testing;
