//! Host serial link.
//!
//! Outbound frames go straight to the UART.  Inbound bytes are drained
//! without blocking and assembled into commands by [`CommandReader`];
//! malformed lines are logged and dropped without an acknowledgement.
//!
//! On the host the UART is replaced by two in-memory queues.

use log::warn;

use crate::app::commands::AppCommand;
use crate::app::ports::HostLink;
use crate::error::DeviceError;
use crate::protocol::CommandReader;

#[cfg(not(target_os = "espidf"))]
use std::collections::VecDeque;

#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::uart::UartDriver;

pub struct SerialLink {
    reader: CommandReader,
    #[cfg(target_os = "espidf")]
    uart: UartDriver<'static>,
    #[cfg(not(target_os = "espidf"))]
    rx: VecDeque<u8>,
    #[cfg(not(target_os = "espidf"))]
    tx: Vec<String>,
}

impl SerialLink {
    #[cfg(target_os = "espidf")]
    pub fn new(uart: UartDriver<'static>) -> Self {
        Self {
            reader: CommandReader::new(),
            uart,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            reader: CommandReader::new(),
            rx: VecDeque::new(),
            tx: Vec::new(),
        }
    }

    /// Queue bytes as if the host had sent them.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_receive(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }

    /// Every line sent so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn sent(&self) -> &[String] {
        &self.tx
    }

    #[cfg(target_os = "espidf")]
    fn next_byte(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        // Timeout 0: return at once when the RX buffer is empty.
        match self.uart.read(&mut byte, 0) {
            Ok(1) => Some(byte[0]),
            Ok(_) => None,
            Err(e) => {
                warn!("Serial: read failed: {}", e);
                None
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn next_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    /// Drain received bytes until one complete command is available.
    ///
    /// Bytes after that command stay buffered for the next call.
    pub fn poll_command(&mut self) -> Option<AppCommand> {
        while let Some(byte) = self.next_byte() {
            match self.reader.push(byte) {
                Some(Ok(command)) => return Some(command),
                Some(Err(e)) => warn!("Serial: dropped host line: {}", e),
                None => {}
            }
        }
        None
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for SerialLink {
    fn default() -> Self {
        Self::new()
    }
}

impl HostLink for SerialLink {
    #[cfg(target_os = "espidf")]
    fn send(&mut self, line: &str) -> Result<(), DeviceError> {
        let mut bytes = line.as_bytes();
        while !bytes.is_empty() {
            let written = self.uart.write(bytes).map_err(|_| DeviceError::Bus)?;
            bytes = &bytes[written..];
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn send(&mut self, line: &str) -> Result<(), DeviceError> {
        self.tx.push(line.to_owned());
        Ok(())
    }
}
