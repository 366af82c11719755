//! Bounded fixed-point numeric entry from the keypad.
//!
//! The value is held as an integer mantissa plus a count of decimal digits,
//! so entry and deletion are exact: typing `1 2 . 5` then deleting twice
//! walks back through `12.5`, `12.` and `12` without float drift.
//!
//! Invariant: `total_chars == int_chars + decimal_chars + decimal_used as u8`.

use core::fmt::Write;

use super::render::{COLUMNS, Lcd, ROWS};
use crate::app::ports::DisplayPort;

/// Width and precision of one editable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldFormat {
    pub max_chars: u8,
    pub max_decimals: u8,
}

/// Humidity target and calibration reference: `100.0` does not fit, `95.5` does.
pub const HUMIDITY_FIELD: FieldFormat = FieldFormat { max_chars: 4, max_decimals: 1 };
/// Fan speed target: whole RPM only.
pub const FAN_SPEED_FIELD: FieldFormat = FieldFormat { max_chars: 4, max_decimals: 0 };

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputBuffer {
    mantissa: u32,
    total_chars: u8,
    int_chars: u8,
    decimal_chars: u8,
    decimal_used: bool,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.total_chars == 0
    }

    pub fn value(&self) -> f32 {
        self.mantissa as f32 / 10u32.pow(u32::from(self.decimal_chars)) as f32
    }

    pub fn total_chars(&self) -> u8 {
        self.total_chars
    }

    pub fn int_chars(&self) -> u8 {
        self.int_chars
    }

    pub fn decimal_chars(&self) -> u8 {
        self.decimal_chars
    }

    pub fn decimal_used(&self) -> bool {
        self.decimal_used
    }

    /// Append a digit.  Returns false (and changes nothing) when the field
    /// is full or the decimal places are used up.
    pub fn push_digit(&mut self, digit: u8, field: FieldFormat) -> bool {
        if digit > 9 || self.total_chars >= field.max_chars {
            return false;
        }
        if self.decimal_used {
            if self.decimal_chars >= field.max_decimals {
                return false;
            }
            self.decimal_chars += 1;
        } else {
            self.int_chars += 1;
        }
        self.mantissa = self.mantissa * 10 + u32::from(digit);
        self.total_chars += 1;
        true
    }

    /// Add the decimal point.  Needs decimals allowed, room for one more
    /// character, no point yet and at least one integer digit.
    pub fn push_dot(&mut self, field: FieldFormat) -> bool {
        if field.max_decimals == 0
            || self.total_chars >= field.max_chars
            || self.decimal_used
            || self.int_chars == 0
        {
            return false;
        }
        self.decimal_used = true;
        self.total_chars += 1;
        true
    }

    /// Remove the last entered character: a decimal digit, the point, or
    /// an integer digit.
    pub fn delete(&mut self) -> bool {
        if self.total_chars == 0 {
            return false;
        }
        if self.decimal_used {
            if self.decimal_chars > 0 {
                self.decimal_chars -= 1;
                self.mantissa /= 10;
            } else {
                self.decimal_used = false;
            }
        } else {
            self.int_chars -= 1;
            self.mantissa /= 10;
        }
        self.total_chars -= 1;
        true
    }

    /// The characters as typed, e.g. `"12."` between deleting the last
    /// decimal and deleting the point.
    pub fn text(&self) -> heapless::String<8> {
        let mut buf = heapless::String::new();
        let scale = 10u32.pow(u32::from(self.decimal_chars));
        if self.int_chars > 0 {
            let _ = write!(buf, "{:0w$}", self.mantissa / scale, w = self.int_chars as usize);
        }
        if self.decimal_used {
            let _ = buf.push('.');
            if self.decimal_chars > 0 {
                let _ = write!(buf, "{:0w$}", self.mantissa % scale, w = self.decimal_chars as usize);
            }
        }
        buf
    }

    /// Redraw the entry at the bottom-right of the panel and park the
    /// blinking cursor in the last cell.
    pub fn echo<D: DisplayPort>(&self, field: FieldFormat, lcd: &mut Lcd<'_, D>) {
        let last_col = COLUMNS - 1;
        let last_row = ROWS - 1;
        lcd.clear_right_aligned(last_col, last_row, field.max_chars);
        lcd.cursor(COLUMNS - self.total_chars.max(1), last_row);
        lcd.print(&self.text());
        lcd.cursor(last_col, last_row);
        lcd.blink(true);
    }
}
