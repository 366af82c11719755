//! Inbound commands to the application service.
//!
//! Two sources feed the core: the host serial link (parsed by
//! [`protocol`](crate::protocol)) and the keypad scanner.

/// Commands the host can send over the serial link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Emit a data frame after every acquisition fetch.
    StartSendData,

    /// Stop emitting data frames.
    StopSendData,
}

impl AppCommand {
    /// Command character on the wire, echoed back in the ack frame.
    pub fn code(self) -> char {
        match self {
            Self::StartSendData => 'd',
            Self::StopSendData => 's',
        }
    }

    /// Parameter count the command carries after its code.
    pub fn param_count(self) -> usize {
        match self {
            Self::StartSendData | Self::StopSendData => 0,
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'd' => Some(Self::StartSendData),
            's' => Some(Self::StopSendData),
            _ => None,
        }
    }
}

/// Phase of a key event reported by the keypad scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Pressed,
    /// The key has stayed down past the hold threshold.
    Hold,
    Released,
}

/// One discrete keypad event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: char,
    pub kind: KeyKind,
}

impl KeyEvent {
    pub fn pressed(key: char) -> Self {
        Self { key, kind: KeyKind::Pressed }
    }

    pub fn hold(key: char) -> Self {
        Self { key, kind: KeyKind::Hold }
    }

    pub fn released(key: char) -> Self {
        Self { key, kind: KeyKind::Released }
    }
}
