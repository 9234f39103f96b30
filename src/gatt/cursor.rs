//! # Byte Cursor
//!
//! Forward-only little-endian reader over a borrowed characteristic value.

use crate::error::{GattError, Result};

/// Cursor over a GATT characteristic value.
///
/// Every read consumes exactly the width of the value it returns. A read that
/// needs more bytes than remain fails with [`GattError::OutOfRange`] and leaves
/// the position untouched.
///
/// # Example
///
/// ```no_run
/// use gatt_measure::gatt::cursor::ByteCursor;
///
/// let mut cursor = ByteCursor::new(&[0x2C, 0x01, 0x05]);
/// assert_eq!(cursor.read_u16_le()?, 300);
/// assert_eq!(cursor.read_u8()?, 5);
/// assert!(cursor.read_u8().is_err());
/// # Ok::<(), gatt_measure::error::GattError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor positioned at the first byte of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Bytes consumed so far
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes left to read
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// True once every byte has been consumed
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Look at the next byte without consuming it
    pub fn peek_u8(&self) -> Result<u8> {
        self.data
            .get(self.position)
            .copied()
            .ok_or_else(|| self.out_of_range(1))
    }

    /// Read one byte as a signed value
    pub fn read_i8(&mut self) -> Result<i8> {
        let [b] = self.take::<1>()?;
        Ok(b as i8)
    }

    /// Read one byte as an unsigned value
    pub fn read_u8(&mut self) -> Result<u8> {
        let [b] = self.take::<1>()?;
        Ok(b)
    }

    /// Read a little-endian `u16`
    pub fn read_u16_le(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    /// Read a little-endian `i16`
    pub fn read_i16_le(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.take()?))
    }

    /// Read a little-endian `u32`
    pub fn read_u32_le(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        if self.remaining() < N {
            return Err(self.out_of_range(N));
        }

        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.data[self.position..self.position + N]);
        self.position += N;
        Ok(bytes)
    }

    fn out_of_range(&self, requested: usize) -> GattError {
        GattError::OutOfRange {
            requested,
            remaining: self.remaining(),
            offset: self.position,
        }
    }
}
