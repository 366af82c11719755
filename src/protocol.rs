//! Host serial line protocol.
//!
//! Wire format (ASCII, one message per line):
//! ```text
//! inbound   ^<cmd>[|<param>]*@\n
//! data      ^d|<rh or e>|<temp or e>|<rpm or e>|<rhTarget or i>|<rpmTarget or i>@\n
//! ack       ^r|<cmd>|<y or n>@\n
//! ```
//!
//! `e` marks a reading whose fetch failed, `i` a target whose loop is
//! inactive.  [`CommandReader`] accumulates raw bytes from the UART and
//! yields one parsed command per line.  Bytes before a `^` are discarded
//! and a line longer than [`MAX_LINE_LEN`] is dropped whole.

use core::fmt::{self, Write};

use crate::app::commands::AppCommand;
use crate::app::events::TelemetryData;

pub const FRAME_START: char = '^';
pub const FRAME_END: char = '@';
pub const SEPARATOR: char = '|';
pub const LINE_END: u8 = b'\n';

/// Maximum inbound line length, start marker included.
pub const MAX_LINE_LEN: usize = 128;

const DATA_CODE: char = 'd';
const ACK_CODE: char = 'r';
const VALUE_ERROR: &str = "e";
const VALUE_INACTIVE: &str = "i";

const HUMIDITY_DECIMALS: usize = 1;
const TEMPERATURE_DECIMALS: usize = 1;
const FAN_SPEED_DECIMALS: usize = 0;

/// Outbound frame buffer.
pub type Frame = heapless::String<64>;

/// Why an inbound line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Nothing between the markers.
    Empty,
    MissingStart,
    /// No end marker, or text after it.
    MissingEnd,
    UnknownCommand(char),
    WrongParameterCount { expected: usize, found: usize },
    /// Line exceeded [`MAX_LINE_LEN`].
    Overflow,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty command"),
            Self::MissingStart => write!(f, "missing start marker"),
            Self::MissingEnd => write!(f, "missing or misplaced end marker"),
            Self::UnknownCommand(c) => write!(f, "unknown command '{}'", c),
            Self::WrongParameterCount { expected, found } => {
                write!(f, "expected {} parameter(s), got {}", expected, found)
            }
            Self::Overflow => write!(f, "line too long"),
        }
    }
}

/// Parse one complete line (without the trailing `\n`).
///
/// Empty fragments between separators are skipped, so `^d||@` is the
/// same command as `^d@`.
pub fn parse_command(line: &str) -> Result<AppCommand, ProtocolError> {
    let line = line.trim_end_matches('\r');
    let inner = line.strip_prefix(FRAME_START).ok_or(ProtocolError::MissingStart)?;
    let inner = inner.strip_suffix(FRAME_END).ok_or(ProtocolError::MissingEnd)?;
    if inner.contains(FRAME_END) {
        return Err(ProtocolError::MissingEnd);
    }

    let mut fragments = inner.split(SEPARATOR).filter(|f| !f.is_empty());
    let code = fragments
        .next()
        .and_then(|f| f.chars().next())
        .ok_or(ProtocolError::Empty)?;
    let command = AppCommand::from_code(code).ok_or(ProtocolError::UnknownCommand(code))?;

    let found = fragments.count();
    let expected = command.param_count();
    if found != expected {
        return Err(ProtocolError::WrongParameterCount { expected, found });
    }
    Ok(command)
}

/// Streaming line assembler for the inbound half of the link.
pub struct CommandReader {
    buf: heapless::Vec<u8, MAX_LINE_LEN>,
    in_line: bool,
    overflowed: bool,
}

impl Default for CommandReader {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandReader {
    pub fn new() -> Self {
        Self {
            buf: heapless::Vec::new(),
            in_line: false,
            overflowed: false,
        }
    }

    /// Feed one byte.  Returns the parse result when a line completes.
    pub fn push(&mut self, byte: u8) -> Option<Result<AppCommand, ProtocolError>> {
        if !self.in_line {
            // Garbage until a start marker.
            if byte == FRAME_START as u8 {
                self.in_line = true;
                self.overflowed = false;
                self.buf.clear();
                let _ = self.buf.push(byte);
            }
            return None;
        }

        if byte == LINE_END {
            self.in_line = false;
            if self.overflowed {
                return Some(Err(ProtocolError::Overflow));
            }
            let result = match core::str::from_utf8(&self.buf) {
                Ok(line) => parse_command(line),
                Err(_) => Err(ProtocolError::MissingEnd),
            };
            self.buf.clear();
            return Some(result);
        }

        if self.buf.push(byte).is_err() {
            self.overflowed = true;
        }
        None
    }

    /// Feed a slice; commands are handed to `on_command` in order.
    pub fn feed(&mut self, bytes: &[u8], mut on_command: impl FnMut(Result<AppCommand, ProtocolError>)) {
        for &b in bytes {
            if let Some(result) = self.push(b) {
                on_command(result);
            }
        }
    }

    /// Drop any partial line.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.in_line = false;
        self.overflowed = false;
    }
}

fn write_field(out: &mut Frame, value: Option<f32>, decimals: usize, missing: &str) -> fmt::Result {
    out.write_char(SEPARATOR)?;
    match value {
        Some(v) => write!(out, "{:.*}", decimals, v),
        None => out.write_str(missing),
    }
}

/// Encode the data frame sent after every acquisition fetch while
/// streaming is on.
pub fn encode_data_frame(data: &TelemetryData) -> Result<Frame, fmt::Error> {
    let mut out = Frame::new();
    out.write_char(FRAME_START)?;
    out.write_char(DATA_CODE)?;
    write_field(&mut out, data.humidity, HUMIDITY_DECIMALS, VALUE_ERROR)?;
    // Temperature comes from the same fetch as humidity.
    let temperature = data.humidity.and(data.temperature);
    write_field(&mut out, temperature, TEMPERATURE_DECIMALS, VALUE_ERROR)?;
    write_field(&mut out, data.fan_speed, FAN_SPEED_DECIMALS, VALUE_ERROR)?;
    write_field(&mut out, data.humidity_target, HUMIDITY_DECIMALS, VALUE_INACTIVE)?;
    write_field(&mut out, data.fan_speed_target, FAN_SPEED_DECIMALS, VALUE_INACTIVE)?;
    out.write_char(FRAME_END)?;
    out.write_char(LINE_END as char)?;
    Ok(out)
}

/// Encode the acknowledgement for a handled command.
pub fn encode_ack(code: char, ok: bool) -> Result<Frame, fmt::Error> {
    let mut out = Frame::new();
    writeln!(
        out,
        "{}{}{}{}{}{}{}",
        FRAME_START,
        ACK_CODE,
        SEPARATOR,
        code,
        SEPARATOR,
        if ok { 'y' } else { 'n' },
        FRAME_END
    )?;
    Ok(out)
}
