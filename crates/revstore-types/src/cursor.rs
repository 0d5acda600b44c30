//! Bounds-checked read position over an in-memory buffer.
//!
//! A [`Cursor`] is the single piece of mutable state threaded through every
//! decode step. Decoders take it by `&mut`, read forward, and leave it
//! positioned at the first byte they did not consume. It never moves
//! backwards; callers that need to look ahead clone it.

use crate::error::{PrimitiveError, PrimitiveResult};

/// Read position into a borrowed byte buffer.
#[derive(Clone, Copy, Debug)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Cursor at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Cursor at an arbitrary offset. Offsets past the end are allowed and
    /// simply leave nothing to read.
    pub fn at(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    /// Current absolute offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left between the position and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Returns `true` if nothing is left to read.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// The whole underlying buffer.
    pub fn buffer(&self) -> &'a [u8] {
        self.buf
    }

    /// Fail with [`PrimitiveError::BufferUnderrun`] unless `needed` bytes remain.
    pub fn ensure(&self, needed: usize, context: &'static str) -> PrimitiveResult<()> {
        let available = self.remaining();
        if needed > available {
            return Err(PrimitiveError::BufferUnderrun {
                offset: self.pos,
                needed,
                available,
                context,
            });
        }
        Ok(())
    }

    /// Look at the next byte without consuming it.
    pub fn peek_u8(&self, context: &'static str) -> PrimitiveResult<u8> {
        self.ensure(1, context)?;
        Ok(self.buf[self.pos])
    }

    /// Consume exactly `len` bytes.
    pub fn read_bytes(&mut self, len: usize, context: &'static str) -> PrimitiveResult<&'a [u8]> {
        self.ensure(len, context)?;
        let start = self.pos;
        self.pos += len;
        Ok(&self.buf[start..self.pos])
    }

    /// Consume a fixed-size array.
    pub fn read_array<const N: usize>(&mut self, context: &'static str) -> PrimitiveResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N, context)?);
        Ok(out)
    }

    /// Advance past `len` bytes.
    pub fn skip(&mut self, len: usize, context: &'static str) -> PrimitiveResult<()> {
        self.read_bytes(len, context).map(|_| ())
    }

    pub fn read_u8(&mut self, context: &'static str) -> PrimitiveResult<u8> {
        let [b] = self.read_array::<1>(context)?;
        Ok(b)
    }

    pub fn read_u16_le(&mut self, context: &'static str) -> PrimitiveResult<u16> {
        self.read_array(context).map(u16::from_le_bytes)
    }

    pub fn read_u32_le(&mut self, context: &'static str) -> PrimitiveResult<u32> {
        self.read_array(context).map(u32::from_le_bytes)
    }

    pub fn read_u64_le(&mut self, context: &'static str) -> PrimitiveResult<u64> {
        self.read_array(context).map(u64::from_le_bytes)
    }

    /// Build an [`PrimitiveError::InvalidEncoding`] anchored at `offset`.
    pub fn invalid(offset: usize, context: &'static str, reason: impl Into<String>) -> PrimitiveError {
        PrimitiveError::InvalidEncoding {
            offset,
            context,
            reason: reason.into(),
        }
    }
}
