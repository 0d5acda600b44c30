use std::fmt;

use bytes::BufMut;
use serde::{Deserialize, Serialize};

use crate::cursor::Cursor;
use crate::error::PrimitiveResult;
use crate::guid::Guid;
use crate::wire::WireValue;

const NULL: u8 = 0x00;
const FORM_64: u8 = 0x80;

/// Serial number: a GUID-scoped 64-bit counter.
///
/// Either the single null byte or `0x80` followed by the GUID and a
/// little-endian `u64`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SerialNumber {
    pub guid: Guid,
    pub value: u64,
}

impl SerialNumber {
    pub const fn new(guid: Guid, value: u64) -> Self {
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
}

impl WireValue for SerialNumber {
    const NAME: &'static str = "serial number";

    fn decode(cursor: &mut Cursor<'_>) -> PrimitiveResult<Self> {
        let offset = cursor.position();
        match cursor.read_u8(Self::NAME)? {
            NULL => Ok(Self::null()),
            FORM_64 => {
                let guid = Guid::decode(cursor)?;
                let value = cursor.read_u64_le(Self::NAME)?;
                Ok(Self { guid, value })
            }
            other => Err(Cursor::invalid(
                offset,
                Self::NAME,
                format!("unknown form marker {other:#04x}"),
            )),
        }
    }

    fn encode<B: BufMut>(&self, out: &mut B) {
        if self.is_null() {
            out.put_u8(NULL);
        } else {
            out.put_u8(FORM_64);
            self.guid.encode(out);
            out.put_u64_le(self.value);
        }
    }

    fn encoded_len(&self) -> usize {
        if self.is_null() {
            1
        } else {
            1 + Guid::SIZE + 8
        }
    }
}

impl fmt::Debug for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SerialNumber({}, {})", self.guid, self.value)
    }
}
