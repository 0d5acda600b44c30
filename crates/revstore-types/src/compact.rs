use std::fmt;

use bytes::BufMut;
use serde::{Deserialize, Serialize};

use crate::cursor::Cursor;
use crate::error::PrimitiveResult;
use crate::wire::WireValue;

/// Marker byte for the full 64-bit form.
const FORM_64: u8 = 0x80;

/// Widest value (in bytes) of the self-describing short forms.
const MAX_SHORT_WIDTH: usize = 7;

/// Compact unsigned 64-bit integer.
///
/// The number of trailing zero bits in the first byte tells the decoder how
/// many bytes the value occupies:
///
/// | first byte   | bytes | value bits |
/// |--------------|-------|------------|
/// | `0000_0000`  | 1     | 0 (zero)   |
/// | `xxxx_xxx1`  | 1     | 7          |
/// | `xxxx_xx10`  | 2     | 14         |
/// | `xxxx_x100`  | 3     | 21         |
/// | ...          | ...   | ...        |
/// | `x100_0000`  | 7     | 49         |
/// | `1000_0000`  | 9     | 64         |
///
/// Short forms store the value shifted left past the marker bits in a
/// little-endian word. Encoding always picks the narrowest form.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompactU64(u64);

impl CompactU64 {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    /// Byte width of the narrowest short form holding `value`, if any.
    fn short_width(value: u64) -> Option<usize> {
        (1..=MAX_SHORT_WIDTH).find(|&width| value < 1u64 << (7 * width))
    }
}

impl WireValue for CompactU64 {
    const NAME: &'static str = "compact u64";

    fn decode(cursor: &mut Cursor<'_>) -> PrimitiveResult<Self> {
        let first = cursor.peek_u8(Self::NAME)?;
        match first {
            0 => {
                cursor.skip(1, Self::NAME)?;
                Ok(Self(0))
            }
            FORM_64 => {
                cursor.skip(1, Self::NAME)?;
                cursor.read_u64_le(Self::NAME).map(Self)
            }
            _ => {
                // first is neither 0 nor 0x80, so trailing_zeros is 0..=6
                let width = first.trailing_zeros() as usize + 1;
                let raw = cursor.read_bytes(width, Self::NAME)?;
                let mut word = [0u8; 8];
                word[..width].copy_from_slice(raw);
                Ok(Self(u64::from_le_bytes(word) >> width))
            }
        }
    }

    fn encode<B: BufMut>(&self, out: &mut B) {
        match (self.0, Self::short_width(self.0)) {
            (0, _) => out.put_u8(0),
            (value, Some(width)) => {
                let word = (value << width) | (1 << (width - 1));
                out.put_slice(&word.to_le_bytes()[..width]);
            }
            (value, None) => {
                out.put_u8(FORM_64);
                out.put_u64_le(value);
            }
        }
    }

    fn encoded_len(&self) -> usize {
        match self.0 {
            0 => 1,
            value => Self::short_width(value).unwrap_or(9),
        }
    }
}

impl fmt::Debug for CompactU64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompactU64({})", self.0)
    }
}

impl fmt::Display for CompactU64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CompactU64 {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<CompactU64> for u64 {
    fn from(value: CompactU64) -> Self {
        value.0
    }
}
