use std::fmt;
use std::str::FromStr;

use bytes::BufMut;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cursor::Cursor;
use crate::error::{PrimitiveError, PrimitiveResult};
use crate::wire::WireValue;

/// A 16-byte GUID in the Windows mixed-endian wire layout.
///
/// The first three groups are little-endian on the wire, the last eight bytes
/// are stored as-is. Text form is the usual hyphenated lowercase string.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Guid(Uuid);

impl Guid {
    pub const SIZE: usize = 16;

    /// The all-zero GUID.
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Parse from the hyphenated or braced text form.
    pub fn parse_str(s: &str) -> PrimitiveResult<Self> {
        Uuid::parse_str(s.trim_start_matches('{').trim_end_matches('}'))
            .map(Self)
            .map_err(|e| PrimitiveError::InvalidEncoding {
                offset: 0,
                context: "guid text",
                reason: e.to_string(),
            })
    }
}

impl WireValue for Guid {
    const NAME: &'static str = "guid";

    fn decode(cursor: &mut Cursor<'_>) -> PrimitiveResult<Self> {
        let raw = cursor.read_array::<16>(Self::NAME)?;
        Ok(Self(Uuid::from_bytes_le(raw)))
    }

    fn encode<B: BufMut>(&self, out: &mut B) {
        out.put_slice(&self.0.to_bytes_le());
    }

    fn encoded_len(&self) -> usize {
        Self::SIZE
    }
}

impl FromStr for Guid {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({{{}}})", self.0)
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0)
    }
}

impl From<Uuid> for Guid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}
