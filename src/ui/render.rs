//! Flicker-free drawing helpers on top of [`DisplayPort`].
//!
//! Every display call goes through the retry wrapper.  A call that still
//! fails is logged and dropped: a glitched character is preferable to
//! stalling the control loop.
//!
//! Right-aligned values are drawn by clearing only the cells the new text
//! will not cover, so a reading never blanks out completely between updates.

use core::fmt::Write;

use log::debug;

use crate::app::ports::DisplayPort;
use crate::error::DeviceError;
use crate::retry::retry;

/// Panel width in characters.
pub const COLUMNS: u8 = 20;
/// Panel height in rows.
pub const ROWS: u8 = 4;

pub const STARS: &str = "********************";
pub const DIVIDER: &str = "--------------------";
pub const ERROR_TEXT: &str = "ERROR";
pub const NO_READING_TEXT: &str = "N/A";

/// Format `value` with exactly `decimals` places.  Values too wide for the
/// buffer come back as `"#"`.
pub fn format_value(value: f32, decimals: u8) -> heapless::String<16> {
    let mut buf = heapless::String::new();
    if write!(buf, "{:.*}", decimals as usize, value).is_err() {
        buf.clear();
        let _ = buf.push('#');
    }
    buf
}

/// Retrying view over a display.
pub struct Lcd<'a, D: DisplayPort> {
    display: &'a mut D,
}

impl<'a, D: DisplayPort> Lcd<'a, D> {
    pub fn new(display: &'a mut D) -> Self {
        Self { display }
    }

    fn call(&mut self, what: &str, mut op: impl FnMut(&mut D) -> Result<(), DeviceError>) {
        let display = &mut *self.display;
        if let Err(e) = retry(|| op(&mut *display)) {
            debug!("lcd: {} failed: {}", what, e);
        }
    }

    /// Blink off, then clear.
    pub fn reset(&mut self) {
        self.blink(false);
        self.call("clear", |d| d.clear());
    }

    pub fn cursor(&mut self, col: u8, row: u8) {
        self.call("cursor", |d| d.set_cursor(col, row));
    }

    pub fn print(&mut self, text: &str) {
        self.call("print", |d| d.write_str(text));
    }

    /// Cursor to (col, row), then print.
    pub fn at(&mut self, col: u8, row: u8, text: &str) {
        self.cursor(col, row);
        self.print(text);
    }

    pub fn blink(&mut self, on: bool) {
        self.call("blink", |d| d.set_blink(on));
    }

    pub fn backlight(&mut self, rgb: u32) {
        self.call("backlight", |d| d.set_backlight(rgb));
    }

    pub fn contrast(&mut self, contrast: u8) {
        self.call("contrast", |d| d.set_contrast(contrast));
    }

    /// Blank `count` cells ending at `rightmost`.
    pub fn clear_right_aligned(&mut self, rightmost: u8, row: u8, count: u8) {
        if count == 0 {
            return;
        }
        self.cursor((rightmost + 1).saturating_sub(count), row);
        let mut blanks: heapless::String<{ COLUMNS as usize }> = heapless::String::new();
        for _ in 0..count.min(COLUMNS) {
            let _ = blanks.push(' ');
        }
        self.print(&blanks);
    }

    /// Print `text` so its last character lands on `rightmost`.
    pub fn text_right_aligned(&mut self, text: &str, rightmost: u8, row: u8) {
        let len = text.len().min(COLUMNS as usize) as u8;
        self.at((rightmost + 1).saturating_sub(len), row, text);
    }

    /// Right-aligned number with a fixed number of decimals.
    pub fn value_right_aligned(&mut self, value: f32, decimals: u8, rightmost: u8, row: u8) {
        let text = format_value(value, decimals);
        self.text_right_aligned(&text, rightmost, row);
    }

    /// Redraw a reading in a field `max_chars` wide, blanking only the
    /// leading cells the new value leaves uncovered.
    pub fn reading_right_aligned(&mut self, value: f32, decimals: u8, max_chars: u8, rightmost: u8, row: u8) {
        let text = format_value(value, decimals);
        self.field_right_aligned(&text, max_chars, rightmost, row);
    }

    /// [`reading_right_aligned`](Self::reading_right_aligned) for a status
    /// word such as `ERROR`.
    pub fn text_reading(&mut self, text: &str, max_chars: u8, rightmost: u8, row: u8) {
        self.field_right_aligned(text, max_chars, rightmost, row);
    }

    fn field_right_aligned(&mut self, text: &str, max_chars: u8, rightmost: u8, row: u8) {
        let len = text.len().min(u8::MAX as usize) as u8;
        self.clear_right_aligned(rightmost.saturating_sub(len), row, max_chars.saturating_sub(len));
        self.text_right_aligned(text, rightmost, row);
    }
}
