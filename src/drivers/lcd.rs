//! SparkFun SerLCD 20×4 character display over I2C.
//!
//! The SerLCD's own microcontroller takes plain text plus two escape
//! prefixes: `0xFE` passes an HD44780 command through, `0x7C` ('|')
//! selects a SerLCD setting.

use embedded_hal::i2c::I2c;

use crate::app::ports::DisplayPort;
use crate::error::{DeviceError, from_i2c};

/// Default 7-bit address.
pub const ADDRESS: u8 = 0x72;

const SPECIAL_COMMAND: u8 = 0xFE;
const SETTING_COMMAND: u8 = 0x7C;

const CLEAR: u8 = 0x2D;
const SET_RGB: u8 = 0x2B;
const SET_CONTRAST: u8 = 0x18;

const SET_DDRAM_ADDR: u8 = 0x80;
const DISPLAY_CONTROL: u8 = 0x08;
const DISPLAY_ON: u8 = 0x04;
const BLINK_ON: u8 = 0x01;

/// DDRAM start of each row on a 20×4 panel.
const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];
const ROWS: u8 = 4;
const COLUMNS: u8 = 20;

pub struct SerLcd<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> SerLcd<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c, address: ADDRESS }
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), DeviceError> {
        self.i2c.write(self.address, bytes).map_err(|e| from_i2c(&e))
    }
}

impl<I2C: I2c> DisplayPort for SerLcd<I2C> {
    fn clear(&mut self) -> Result<(), DeviceError> {
        self.send(&[SETTING_COMMAND, CLEAR])
    }

    fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), DeviceError> {
        let row = row.min(ROWS - 1);
        let col = col.min(COLUMNS - 1);
        self.send(&[SPECIAL_COMMAND, SET_DDRAM_ADDR | (col + ROW_OFFSETS[row as usize])])
    }

    fn write_str(&mut self, text: &str) -> Result<(), DeviceError> {
        if text.is_empty() {
            return Ok(());
        }
        // The escape bytes would be taken as commands.
        if text.bytes().any(|b| b == SPECIAL_COMMAND || b == SETTING_COMMAND) {
            return Err(DeviceError::InvalidData);
        }
        self.send(text.as_bytes())
    }

    fn set_blink(&mut self, on: bool) -> Result<(), DeviceError> {
        let blink = if on { BLINK_ON } else { 0 };
        self.send(&[SPECIAL_COMMAND, DISPLAY_CONTROL | DISPLAY_ON | blink])
    }

    fn set_backlight(&mut self, rgb: u32) -> Result<(), DeviceError> {
        let [_, r, g, b] = rgb.to_be_bytes();
        self.send(&[SETTING_COMMAND, SET_RGB, r, g, b])
    }

    fn set_contrast(&mut self, contrast: u8) -> Result<(), DeviceError> {
        self.send(&[SETTING_COMMAND, SET_CONTRAST, contrast])
    }
}
