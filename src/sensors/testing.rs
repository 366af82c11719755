//! Bus and storage doubles shared by the driver tests.

use std::collections::{HashMap, VecDeque};

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

use crate::app::ports::{StorageError, StoragePort};

/// Register-file I2C target.  `[reg, value]` writes store a register,
/// `[reg]` sets the read pointer.  Queued `reads` are served first; a
/// read with nothing queued and no pointer is NACKed.
pub struct MockI2c {
    pub writes: Vec<(u8, Vec<u8>)>,
    pub reads: VecDeque<Vec<u8>>,
    pub registers: [u8; 256],
    pointer: Option<u8>,
}

impl Default for MockI2c {
    fn default() -> Self {
        Self {
            writes: Vec::new(),
            reads: VecDeque::new(),
            registers: [0; 256],
            pointer: None,
        }
    }
}

impl ErrorType for MockI2c {
    type Error = ErrorKind;
}

impl I2c for MockI2c {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    match **bytes {
                        [reg] => self.pointer = Some(reg),
                        [reg, value] => self.registers[reg as usize] = value,
                        _ => {}
                    }
                    self.writes.push((address, bytes.to_vec()));
                }
                Operation::Read(buf) => {
                    if let Some(data) = self.reads.pop_front() {
                        buf.copy_from_slice(&data[..buf.len()]);
                    } else if let Some(reg) = self.pointer.take() {
                        for (i, b) in buf.iter_mut().enumerate() {
                            *b = self.registers[(reg as usize + i) & 0xFF];
                        }
                    } else {
                        return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemStorage {
    blobs: HashMap<(String, String), Vec<u8>>,
}

impl StoragePort for MemStorage {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let blob = self
            .blobs
            .get(&(namespace.to_string(), key.to_string()))
            .ok_or(StorageError::NotFound)?;
        if blob.len() > buf.len() {
            return Err(StorageError::Corrupted);
        }
        buf[..blob.len()].copy_from_slice(blob);
        Ok(blob.len())
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.blobs.insert((namespace.to_string(), key.to_string()), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.blobs.remove(&(namespace.to_string(), key.to_string()));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.blobs.contains_key(&(namespace.to_string(), key.to_string()))
    }
}
