//! Byte-addressable simulated memory.
//!
//! Words are stored little-endian. All word accesses must be 4-byte aligned
//! and fall entirely inside the configured size; violations surface as
//! [`ExecError`]s that the engine turns into a halt.

use byteorder::{ByteOrder, LittleEndian};

use crate::common::error::ExecError;
use crate::common::WORD_SIZE;

#[derive(Clone, Debug)]
pub struct Memory {
    bytes: Vec<u8>,
}

impl Memory {
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size],
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Checks alignment only; the effective-address bounds are validated by
    /// the access itself.
    pub fn check_aligned(addr: i32) -> Result<(), ExecError> {
        if addr % WORD_SIZE as i32 != 0 {
            return Err(ExecError::UnalignedAccess { addr });
        }
        Ok(())
    }

    fn word_range(&self, addr: i32) -> Result<usize, ExecError> {
        Self::check_aligned(addr)?;
        let size = self.bytes.len();
        if addr < 0 || addr as usize + WORD_SIZE > size {
            return Err(ExecError::OutOfBounds { addr, size });
        }
        Ok(addr as usize)
    }

    pub fn load_word(&self, addr: i32) -> Result<i32, ExecError> {
        let at = self.word_range(addr)?;
        Ok(LittleEndian::read_u32(&self.bytes[at..at + WORD_SIZE]) as i32)
    }

    pub fn store_word(&mut self, addr: i32, value: i32) -> Result<(), ExecError> {
        let at = self.word_range(addr)?;
        LittleEndian::write_u32(&mut self.bytes[at..at + WORD_SIZE], value as u32);
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
