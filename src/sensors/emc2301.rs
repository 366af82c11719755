//! Microchip EMC2301 single-channel fan controller (RPM-based closed loop).
//!
//! The controller runs its own speed loop: the firmware writes a TACH
//! target count and reads back the measured TACH count.  Counts and RPM
//! are reciprocal:
//!
//! ```text
//! count = TACH_FACTOR / rpm        (13-bit, 0x1FFF = stopped / too slow)
//! ```
//!
//! 13-bit counts are split over two registers: the high register holds
//! bits 12..5, the low register bits 4..0 left-aligned in bits 7..3.

use embedded_hal::i2c::I2c;
use log::debug;

use crate::app::ports::{FanControllerPort, FanSetup};
use crate::error::{DeviceError, from_i2c};

/// Fixed SMBus address of the EMC2301.
pub const ADDRESS: u8 = 0x2F;

mod reg {
    pub const CONFIG1: u8 = 0x32;
    pub const SPIN_UP_CONFIG: u8 = 0x36;
    pub const MIN_DRIVE: u8 = 0x38;
    pub const VALID_TACH_COUNT: u8 = 0x39;
    pub const TACH_TARGET_LOW: u8 = 0x3C;
    pub const TACH_TARGET_HIGH: u8 = 0x3D;
    pub const TACH_READING_HIGH: u8 = 0x3E;
    pub const TACH_READING_LOW: u8 = 0x3F;
}

/// Closed-loop algorithm on, 1000 RPM range (m = 2), 5 edges (2-pole fan),
/// 400 ms update time.
const CONFIG1_VALUE: u8 = 0xAB;

/// 3_932_160 × m with the range multiplier m = 2.
const TACH_FACTOR: f32 = 7_864_320.0;
pub const TACH_MAX: u16 = 0x1FFF;

/// Spin-up drive levels start at 30 % in 5 % steps.
const SPIN_UP_LEVEL_MIN: u8 = 30;
const SPIN_UP_LEVEL_STEP: u8 = 5;
const SPIN_UP_LEVEL_MAX: u8 = 65;
/// Spin-up time field: 500 ms.
const SPIN_UP_TIME_500MS: u8 = 0b01;

/// TACH count for a speed.  Zero (or below the measurable range) maps to
/// the stop count.
pub fn rpm_to_count(rpm: f32) -> u16 {
    if rpm <= 0.0 {
        return TACH_MAX;
    }
    let count = (TACH_FACTOR / rpm).round();
    if count >= f32::from(TACH_MAX) { TACH_MAX } else { count.max(1.0) as u16 }
}

/// Speed for a TACH count.  The stop count reads as 0 RPM.
pub fn count_to_rpm(count: u16) -> f32 {
    if count == 0 || count >= TACH_MAX {
        0.0
    } else {
        TACH_FACTOR / f32::from(count)
    }
}

/// Split a 13-bit count into (low, high) register values.
pub fn split_count(count: u16) -> (u8, u8) {
    let count = count.min(TACH_MAX);
    (((count & 0x1F) << 3) as u8, (count >> 5) as u8)
}

pub fn join_count(low: u8, high: u8) -> u16 {
    (u16::from(high) << 5) | u16::from(low >> 3)
}

fn spin_up_register(drive_percent: u8) -> u8 {
    let level = (drive_percent.clamp(SPIN_UP_LEVEL_MIN, SPIN_UP_LEVEL_MAX) - SPIN_UP_LEVEL_MIN) / SPIN_UP_LEVEL_STEP;
    (level << 2) | SPIN_UP_TIME_500MS
}

pub struct Emc2301<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Emc2301<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c, address: ADDRESS }
    }

    fn write_reg(&mut self, register: u8, value: u8) -> Result<(), DeviceError> {
        self.i2c.write(self.address, &[register, value]).map_err(|e| from_i2c(&e))
    }

    fn read_reg(&mut self, register: u8) -> Result<u8, DeviceError> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[register], &mut buf)
            .map_err(|e| from_i2c(&e))?;
        Ok(buf[0])
    }
}

impl<I2C: I2c> FanControllerPort for Emc2301<I2C> {
    fn configure(&mut self, setup: &FanSetup) -> Result<(), DeviceError> {
        self.write_reg(reg::CONFIG1, CONFIG1_VALUE)?;
        self.write_reg(reg::SPIN_UP_CONFIG, spin_up_register(setup.spin_up_drive_percent))?;

        let min_drive = (setup.min_drive_percent.clamp(0.0, 100.0) / 100.0 * 255.0).round() as u8;
        self.write_reg(reg::MIN_DRIVE, min_drive)?;

        // Counts above this are treated as a stalled fan.
        let valid = (rpm_to_count(setup.abs_min_rpm) >> 5).min(0xFF) as u8;
        self.write_reg(reg::VALID_TACH_COUNT, valid)?;
        debug!("emc2301: configured (min drive {}, valid tach 0x{:02X})", min_drive, valid);
        Ok(())
    }

    fn fetch_speed(&mut self) -> Result<f32, DeviceError> {
        // High byte first latches the low byte.
        let high = self.read_reg(reg::TACH_READING_HIGH)?;
        let low = self.read_reg(reg::TACH_READING_LOW)?;
        Ok(count_to_rpm(join_count(low, high)))
    }

    fn set_speed_target(&mut self, rpm: f32) -> Result<(), DeviceError> {
        let (low, high) = split_count(rpm_to_count(rpm));
        // The target takes effect when the high byte is written.
        self.write_reg(reg::TACH_TARGET_LOW, low)?;
        self.write_reg(reg::TACH_TARGET_HIGH, high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::testing::MockI2c;

    #[test]
    fn count_conversion() {
        assert_eq!(rpm_to_count(0.0), TACH_MAX);
        assert_eq!(rpm_to_count(3000.0), 2621);
        assert_eq!(count_to_rpm(TACH_MAX), 0.0);
        assert!((count_to_rpm(2621) - 3000.5).abs() < 1.0);
    }

    #[test]
    fn count_register_split() {
        assert_eq!(split_count(2621), (0b1110_1000, 81));
        assert_eq!(join_count(0b1110_1000, 81), 2621);
        assert_eq!(split_count(TACH_MAX), (0xF8, 0xFF));
    }

    #[test]
    fn spin_up_levels() {
        assert_eq!(spin_up_register(30), 0b0000_0001);
        assert_eq!(spin_up_register(45), 0b0000_1101);
        assert_eq!(spin_up_register(90), 0b0001_1101);
    }

    #[test]
    fn target_writes_low_then_high() {
        let mut fan = Emc2301::new(MockI2c::default());
        fan.set_speed_target(3000.0).unwrap();
        assert_eq!(
            fan.i2c.writes,
            vec![
                (ADDRESS, vec![reg::TACH_TARGET_LOW, 0b1110_1000]),
                (ADDRESS, vec![reg::TACH_TARGET_HIGH, 81]),
            ]
        );
    }

    #[test]
    fn zero_target_stops_the_fan() {
        let mut fan = Emc2301::new(MockI2c::default());
        fan.set_speed_target(0.0).unwrap();
        assert_eq!(fan.i2c.registers[reg::TACH_TARGET_HIGH as usize], 0xFF);
        assert_eq!(fan.i2c.registers[reg::TACH_TARGET_LOW as usize], 0xF8);
    }

    #[test]
    fn reads_speed_from_tach_registers() {
        let mut i2c = MockI2c::default();
        i2c.registers[reg::TACH_READING_HIGH as usize] = 81;
        i2c.registers[reg::TACH_READING_LOW as usize] = 0b1110_1000;
        let mut fan = Emc2301::new(i2c);
        let rpm = fan.fetch_speed().unwrap();
        assert!((rpm - 3000.0).abs() < 2.0);
    }

    #[test]
    fn stalled_reading_is_zero_rpm() {
        let mut i2c = MockI2c::default();
        i2c.registers[reg::TACH_READING_HIGH as usize] = 0xFF;
        i2c.registers[reg::TACH_READING_LOW as usize] = 0xF8;
        let mut fan = Emc2301::new(i2c);
        assert_eq!(fan.fetch_speed().unwrap(), 0.0);
    }

    #[test]
    fn configure_programs_closed_loop() {
        let mut fan = Emc2301::new(MockI2c::default());
        let setup = FanSetup {
            abs_min_rpm: 1000.0,
            spin_up_drive_percent: 30,
            min_drive_percent: 10.0,
        };
        fan.configure(&setup).unwrap();
        let regs = &fan.i2c.registers;
        assert_eq!(regs[reg::CONFIG1 as usize], 0xAB);
        assert_eq!(regs[reg::MIN_DRIVE as usize], 26);
        // 7864 counts >> 5
        assert_eq!(regs[reg::VALID_TACH_COUNT as usize], 245);
    }
}
