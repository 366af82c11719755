//! Unified error types for the hygrostat firmware.
//!
//! Device adapters report [`DeviceError`]; everything that can fail at
//! boot or configuration time funnels into [`Error`].  All variants are
//! `Copy` so they pass through the retry wrapper and the control loops
//! without allocation.

use core::fmt;

use crate::app::ports::{ConfigError, StorageError};
use crate::drivers::hw_init::HwInitError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible boot-time operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A bus device could not be driven.
    Device(DeviceError),
    /// Configuration failed validation.
    Config(&'static str),
    /// Peripheral initialisation failed.
    Init(HwInitError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device(e) => write!(f, "device: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Init(e) => write!(f, "init: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Device errors
// ---------------------------------------------------------------------------

/// Failure of a single device operation (one bus transaction or GPIO write).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    /// The bus transaction failed (arbitration, timeout, driver error).
    Bus,
    /// The addressed device did not acknowledge.
    Nack,
    /// Payload checksum mismatch.
    Crc,
    /// A fetch was issued before the device finished converting.
    NotReady,
    /// The device answered with data outside its documented range.
    InvalidData,
    /// Calibration storage could not be read or written.
    Storage,
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus => write!(f, "bus transaction failed"),
            Self::Nack => write!(f, "no acknowledge"),
            Self::Crc => write!(f, "checksum mismatch"),
            Self::NotReady => write!(f, "measurement not ready"),
            Self::InvalidData => write!(f, "invalid data"),
            Self::Storage => write!(f, "storage failure"),
        }
    }
}

impl core::error::Error for DeviceError {}

impl From<DeviceError> for Error {
    fn from(e: DeviceError) -> Self {
        Self::Device(e)
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        Self::Init(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Device(e.into())
    }
}

impl From<StorageError> for DeviceError {
    fn from(_: StorageError) -> Self {
        Self::Storage
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
        }
    }
}

/// Map an `embedded-hal` I2C error onto the firmware's device error.
pub fn from_i2c<E: embedded_hal::i2c::Error>(e: &E) -> DeviceError {
    match e.kind() {
        embedded_hal::i2c::ErrorKind::NoAcknowledge(_) => DeviceError::Nack,
        _ => DeviceError::Bus,
    }
}
