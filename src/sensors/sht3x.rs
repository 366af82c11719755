//! Sensirion SHT3x humidity / temperature sensor (single-shot mode).
//!
//! The conversion is split in two bus transactions so the caller never
//! waits on the sensor:
//!
//! ```text
//! trigger:  W [addr] [cmd MSB] [cmd LSB]
//!           ... conversion (≤ 15.5 ms at high repeatability) ...
//! fetch:    R [addr] → [T MSB][T LSB][CRC][RH MSB][RH LSB][CRC]
//! ```
//!
//! Reading before the conversion finishes is NACKed by the sensor; that
//! surfaces as [`DeviceError::NotReady`].
//!
//! ## Calibration
//!
//! Up to two (reference, raw) points correct the humidity reading:
//! two points give a straight line through both, one point a constant
//! offset, none the raw value.  Points persist through a [`StoragePort`]
//! as postcard blobs.

use embedded_hal::i2c::I2c;
use log::{info, warn};

use crate::app::ports::{
    CalibrationPoint, CalibrationPointId, HumiditySensorPort, Measurement, Repeatability, StorageError, StoragePort,
};
use crate::error::{DeviceError, from_i2c};

/// Default address (ADDR pin low).
pub const ADDRESS: u8 = 0x44;

const CMD_SINGLE_SHOT_HIGH: u16 = 0x2400;
const CMD_SINGLE_SHOT_MEDIUM: u16 = 0x240B;
const CMD_SINGLE_SHOT_LOW: u16 = 0x2416;

const CRC_POLY: u8 = 0x31;
const CRC_INIT: u8 = 0xFF;

const STORAGE_NAMESPACE: &str = "sht3x";
const BLOB_MAX: usize = 16;

/// CRC-8 over one data word, as appended by the sensor.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = CRC_INIT;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 { (crc << 1) ^ CRC_POLY } else { crc << 1 };
        }
    }
    crc
}

/// Convert a raw humidity word to %RH.
pub fn humidity_from_raw(raw: u16) -> f32 {
    100.0 * f32::from(raw) / 65535.0
}

/// Convert a raw temperature word to °C.
pub fn temperature_from_raw(raw: u16) -> f32 {
    -45.0 + 175.0 * f32::from(raw) / 65535.0
}

fn storage_key(id: CalibrationPointId) -> &'static str {
    match id {
        CalibrationPointId::One => "cal1",
        CalibrationPointId::Two => "cal2",
    }
}

// ---------------------------------------------------------------------------
// Calibration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Calibration {
    points: [Option<CalibrationPoint>; 2],
}

impl Calibration {
    fn slot(id: CalibrationPointId) -> usize {
        usize::from(id.number() - 1)
    }

    pub fn point(&self, id: CalibrationPointId) -> Option<CalibrationPoint> {
        self.points[Self::slot(id)]
    }

    pub fn set(&mut self, id: CalibrationPointId, point: CalibrationPoint) {
        self.points[Self::slot(id)] = Some(point);
    }

    pub fn clear(&mut self) {
        self.points = [None, None];
    }

    /// Corrected humidity for a raw reading.
    pub fn apply(&self, raw: f32) -> f32 {
        match self.points {
            [Some(a), Some(b)] if (b.raw - a.raw).abs() > f32::EPSILON => {
                a.reference + (raw - a.raw) * (b.reference - a.reference) / (b.raw - a.raw)
            }
            // Coincident raw values cannot define a slope; fall back to
            // the offset of the first point.
            [Some(p), _] | [None, Some(p)] => raw + (p.reference - p.raw),
            [None, None] => raw,
        }
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

pub struct Sht3x<I2C, S> {
    i2c: I2C,
    address: u8,
    storage: S,
    calibration: Calibration,
    raw_humidity: f32,
}

impl<I2C: I2c, S: StoragePort> Sht3x<I2C, S> {
    /// Wrap the bus device and load any stored calibration.
    pub fn new(i2c: I2C, storage: S) -> Self {
        let mut sensor = Self {
            i2c,
            address: ADDRESS,
            storage,
            calibration: Calibration::default(),
            raw_humidity: 0.0,
        };
        for id in [CalibrationPointId::One, CalibrationPointId::Two] {
            if let Some(point) = sensor.load_point(id) {
                info!(
                    "sht3x: calibration point {} loaded (ref {:.1}, raw {:.1})",
                    id.number(),
                    point.reference,
                    point.raw
                );
                sensor.calibration.set(id, point);
            }
        }
        sensor
    }

    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    fn load_point(&self, id: CalibrationPointId) -> Option<CalibrationPoint> {
        let mut buf = [0u8; BLOB_MAX];
        match self.storage.read(STORAGE_NAMESPACE, storage_key(id), &mut buf) {
            Ok(len) => match postcard::from_bytes(&buf[..len]) {
                Ok(point) => Some(point),
                Err(_) => {
                    warn!("sht3x: calibration point {} is corrupt, ignored", id.number());
                    None
                }
            },
            Err(StorageError::NotFound) => None,
            Err(e) => {
                warn!("sht3x: calibration point {} unreadable: {}", id.number(), e);
                None
            }
        }
    }

    fn command(&mut self, cmd: u16) -> Result<(), DeviceError> {
        self.i2c.write(self.address, &cmd.to_be_bytes()).map_err(|e| from_i2c(&e))
    }
}

impl<I2C: I2c, S: StoragePort> HumiditySensorPort for Sht3x<I2C, S> {
    fn trigger_measurement(&mut self, repeatability: Repeatability) -> Result<(), DeviceError> {
        let cmd = match repeatability {
            Repeatability::High => CMD_SINGLE_SHOT_HIGH,
            Repeatability::Medium => CMD_SINGLE_SHOT_MEDIUM,
            Repeatability::Low => CMD_SINGLE_SHOT_LOW,
        };
        self.command(cmd)
    }

    fn fetch_measurement(&mut self) -> Result<Measurement, DeviceError> {
        let mut buf = [0u8; 6];
        self.i2c.read(self.address, &mut buf).map_err(|e| match from_i2c(&e) {
            DeviceError::Nack => DeviceError::NotReady,
            other => other,
        })?;

        if crc8(&buf[0..2]) != buf[2] || crc8(&buf[3..5]) != buf[5] {
            return Err(DeviceError::Crc);
        }
        let raw_t = u16::from_be_bytes([buf[0], buf[1]]);
        let raw_rh = u16::from_be_bytes([buf[3], buf[4]]);

        self.raw_humidity = humidity_from_raw(raw_rh);
        Ok(Measurement {
            humidity: self.calibration.apply(self.raw_humidity).clamp(0.0, 100.0),
            temperature: temperature_from_raw(raw_t),
        })
    }

    fn raw_humidity(&self) -> f32 {
        self.raw_humidity
    }

    fn saved_calibration(&self, id: CalibrationPointId) -> Option<CalibrationPoint> {
        self.calibration.point(id)
    }

    fn save_calibration(&mut self, id: CalibrationPointId, point: CalibrationPoint) -> Result<(), DeviceError> {
        let mut buf = [0u8; BLOB_MAX];
        let blob = postcard::to_slice(&point, &mut buf).map_err(|_| DeviceError::Storage)?;
        self.storage.write(STORAGE_NAMESPACE, storage_key(id), blob)?;
        self.calibration.set(id, point);
        info!(
            "sht3x: calibration point {} saved (ref {:.1}, raw {:.1})",
            id.number(),
            point.reference,
            point.raw
        );
        Ok(())
    }

    fn reset_calibration(&mut self) -> Result<(), DeviceError> {
        for id in [CalibrationPointId::One, CalibrationPointId::Two] {
            self.storage.delete(STORAGE_NAMESPACE, storage_key(id))?;
        }
        self.calibration.clear();
        info!("sht3x: calibration cleared");
        Ok(())
    }
}
