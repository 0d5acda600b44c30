use std::fmt;

use bytes::BufMut;
use serde::{Deserialize, Serialize};

use crate::cursor::Cursor;
use crate::error::PrimitiveResult;
use crate::guid::Guid;
use crate::wire::WireValue;

const NULL: u8 = 0x00;
const FORM_5: u8 = 0x04;
const FORM_10: u16 = 0x20;
const FORM_17: u32 = 0x40;
const FORM_32: u8 = 0x80;

/// Extended GUID: a GUID scoping a 32-bit integer.
///
/// Wire forms, selected by the low bits of the first byte:
///
/// | low bits    | value bits | size (with GUID) |
/// |-------------|------------|------------------|
/// | `0000_0000` | null       | 1                |
/// | `xxxx_x100` | 5          | 17               |
/// | `xx10_0000` | 10         | 18               |
/// | `x100_0000` | 17         | 19               |
/// | `1000_0000` | 32         | 21               |
///
/// The all-zero extended GUID is the null form.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExGuid {
    pub guid: Guid,
    pub value: u32,
}

impl ExGuid {
    pub const fn new(guid: Guid, value: u32) -> Self {
        Self { guid, value }
    }

    pub const fn null() -> Self {
        Self {
            guid: Guid::nil(),
            value: 0,
        }
    }

    pub fn is_null(&self) -> bool {
        self.guid.is_nil() && self.value == 0
    }

    fn value_len(&self) -> usize {
        match self.value {
            v if v < 1 << 5 => 1,
            v if v < 1 << 10 => 2,
            v if v < 1 << 17 => 3,
            _ => 5,
        }
    }
}

impl WireValue for ExGuid {
    const NAME: &'static str = "extended guid";

    fn decode(cursor: &mut Cursor<'_>) -> PrimitiveResult<Self> {
        let offset = cursor.position();
        let first = cursor.peek_u8(Self::NAME)?;
        let value = if first == NULL {
            cursor.skip(1, Self::NAME)?;
            return Ok(Self::null());
        } else if first & 0x07 == FORM_5 {
            u32::from(cursor.read_u8(Self::NAME)? >> 3)
        } else if first & 0x3F == FORM_10 as u8 {
            u32::from(cursor.read_u16_le(Self::NAME)? >> 6)
        } else if first & 0x7F == FORM_17 as u8 {
            let raw = cursor.read_array::<3>(Self::NAME)?;
            u32::from_le_bytes([raw[0], raw[1], raw[2], 0]) >> 7
        } else if first == FORM_32 {
            cursor.skip(1, Self::NAME)?;
            cursor.read_u32_le(Self::NAME)?
        } else {
            return Err(Cursor::invalid(
                offset,
                Self::NAME,
                format!("unknown form marker {first:#04x}"),
            ));
        };
        let guid = Guid::decode(cursor)?;
        Ok(Self { guid, value })
    }

    fn encode<B: BufMut>(&self, out: &mut B) {
        if self.is_null() {
            out.put_u8(NULL);
            return;
        }
        match self.value_len() {
            1 => out.put_u8(((self.value as u8) << 3) | FORM_5),
            2 => out.put_u16_le(((self.value as u16) << 6) | FORM_10),
            3 => out.put_slice(&((self.value << 7) | FORM_17).to_le_bytes()[..3]),
            _ => {
                out.put_u8(FORM_32);
                out.put_u32_le(self.value);
            }
        }
        self.guid.encode(out);
    }

    fn encoded_len(&self) -> usize {
        if self.is_null() {
            1
        } else {
            self.value_len() + Guid::SIZE
        }
    }
}

impl fmt::Debug for ExGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExGuid({}, {})", self.guid, self.value)
    }
}

impl fmt::Display for ExGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.guid, self.value)
    }
}

/// Cell identifier: a pair of extended GUIDs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId {
    pub ex1: ExGuid,
    pub ex2: ExGuid,
}

impl CellId {
    pub const fn new(ex1: ExGuid, ex2: ExGuid) -> Self {
        Self { ex1, ex2 }
    }
}

impl WireValue for CellId {
    const NAME: &'static str = "cell id";

    fn decode(cursor: &mut Cursor<'_>) -> PrimitiveResult<Self> {
        let ex1 = ExGuid::decode(cursor)?;
        let ex2 = ExGuid::decode(cursor)?;
        Ok(Self { ex1, ex2 })
    }

    fn encode<B: BufMut>(&self, out: &mut B) {
        self.ex1.encode(out);
        self.ex2.encode(out);
    }

    fn encoded_len(&self) -> usize {
        self.ex1.encoded_len() + self.ex2.encoded_len()
    }
}
