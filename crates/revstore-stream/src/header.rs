//! Stream object header framing.
//!
//! Four header shapes share the low two bits of the first byte as a shape
//! selector. All fields are packed least-significant bit first into a
//! little-endian word:
//!
//! ```text
//! 16-bit start: [shape=00:2][compound:1][type:6][length:7]
//! 32-bit start: [shape=10:2][compound:1][type:14][length:15] (+ compact u64 if length == 0x7FFF)
//!  8-bit end:   [shape=01:2][type:6]
//! 16-bit end:   [shape=11:2][type:14]
//! ```

use std::fmt;

use bytes::BufMut;
use revstore_types::{CompactU64, Cursor, PrimitiveResult, WireValue};
use serde::{Deserialize, Serialize};

use crate::error::{StreamError, StreamResult};

const SHAPE_MASK: u8 = 0b11;
const SHAPE_START16: u8 = 0b00;
const SHAPE_END8: u8 = 0b01;
const SHAPE_START32: u8 = 0b10;
const SHAPE_END16: u8 = 0b11;

/// Largest type tag a compact (16-bit start / 8-bit end) header can carry.
pub const MAX_COMPACT_TYPE: u16 = 0x3F;
/// Largest type tag any header can carry.
pub const MAX_TYPE: u16 = 0x3FFF;
/// Largest length a 16-bit start header can carry.
pub const MAX_COMPACT_LENGTH: u64 = 0x7F;
/// 15-bit length value signalling that a compact u64 length follows.
const LARGE_LENGTH: u32 = 0x7FFF;

/// Structural role of a stream object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compound {
    /// A standalone record.
    Single,
    /// Opens a container; children follow until the matching End.
    Start,
    /// Closes the container of the same type.
    End,
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Single => "single",
            Self::Start => "container start",
            Self::End => "container end",
        })
    }
}

/// Which of the four wire shapes a header uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeaderShape {
    Start16,
    Start32,
    End8,
    End16,
}

/// A decoded or freshly built stream object header.
///
/// Headers built with [`single`](Self::single), [`start`](Self::start) and
/// [`end`](Self::end) always use the narrowest shape for their type tag and
/// length. Decoded headers keep whatever shape the input used. Every header,
/// including a deserialized one, satisfies [`validate`](Self::validate), so
/// encoding never truncates a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawHeader")]
pub struct StreamObjectHeader {
    type_tag: u16,
    compound: Compound,
    length: u64,
    shape: HeaderShape,
}

impl StreamObjectHeader {
    /// Header for a standalone record with a `length`-byte payload.
    pub fn single(type_tag: u16, length: u64) -> StreamResult<Self> {
        Self::opening(type_tag, Compound::Single, length)
    }

    /// Header opening a container.
    pub fn start(type_tag: u16, length: u64) -> StreamResult<Self> {
        Self::opening(type_tag, Compound::Start, length)
    }

    /// Header closing a container.
    pub fn end(type_tag: u16) -> StreamResult<Self> {
        check_type_tag(type_tag)?;
        let shape = if type_tag <= MAX_COMPACT_TYPE {
            HeaderShape::End8
        } else {
            HeaderShape::End16
        };
        Ok(Self {
            type_tag,
            compound: Compound::End,
            length: 0,
            shape,
        })
    }

    fn opening(type_tag: u16, compound: Compound, length: u64) -> StreamResult<Self> {
        check_type_tag(type_tag)?;
        let shape = if type_tag <= MAX_COMPACT_TYPE && length <= MAX_COMPACT_LENGTH {
            HeaderShape::Start16
        } else {
            HeaderShape::Start32
        };
        Ok(Self {
            type_tag,
            compound,
            length,
            shape,
        })
    }

    /// Check that every field fits the bits its shape gives it.
    pub fn validate(&self) -> StreamResult<()> {
        check_type_tag(self.type_tag)?;
        let reason = match self.shape {
            HeaderShape::Start16 | HeaderShape::Start32 if self.compound == Compound::End => {
                Some("start shape cannot carry an end header".to_owned())
            }
            HeaderShape::End8 | HeaderShape::End16 if self.compound != Compound::End => {
                Some(format!("end shape cannot carry a {} header", self.compound))
            }
            HeaderShape::End8 | HeaderShape::End16 if self.length != 0 => {
                Some(format!("end header with length {}", self.length))
            }
            HeaderShape::Start16 | HeaderShape::End8 if self.type_tag > MAX_COMPACT_TYPE => {
                Some(format!("type exceeds the 6-bit maximum {MAX_COMPACT_TYPE:#x}"))
            }
            HeaderShape::Start16 if self.length > MAX_COMPACT_LENGTH => {
                Some(format!("length {} exceeds the 7-bit maximum {MAX_COMPACT_LENGTH:#x}", self.length))
            }
            _ => None,
        };
        match reason {
            Some(reason) => Err(StreamError::InvalidHeader {
                type_tag: self.type_tag,
                shape: self.shape,
                reason,
            }),
            None => Ok(()),
        }
    }

    pub fn type_tag(&self) -> u16 {
        self.type_tag
    }

    pub fn compound(&self) -> Compound {
        self.compound
    }

    /// Declared payload length. Always 0 for End headers.
    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn shape(&self) -> HeaderShape {
        self.shape
    }

    /// Returns `true` for the 16-bit start and 8-bit end shapes.
    pub fn is_compact(&self) -> bool {
        matches!(self.shape, HeaderShape::Start16 | HeaderShape::End8)
    }

    pub fn is_end(&self) -> bool {
        self.compound == Compound::End
    }

    /// Returns `true` if a header beginning with `first` is an End header.
    pub fn is_end_marker(first: u8) -> bool {
        matches!(first & SHAPE_MASK, SHAPE_END8 | SHAPE_END16)
    }
}

/// Unchecked header fields, as they appear in serialized form.
#[derive(Deserialize)]
struct RawHeader {
    type_tag: u16,
    compound: Compound,
    length: u64,
    shape: HeaderShape,
}

impl TryFrom<RawHeader> for StreamObjectHeader {
    type Error = StreamError;

    fn try_from(raw: RawHeader) -> StreamResult<Self> {
        let header = Self {
            type_tag: raw.type_tag,
            compound: raw.compound,
            length: raw.length,
            shape: raw.shape,
        };
        header.validate()?;
        Ok(header)
    }
}

fn check_type_tag(type_tag: u16) -> StreamResult<()> {
    if type_tag > MAX_TYPE {
        return Err(StreamError::InvalidTypeTag {
            type_tag,
            reason: format!("exceeds the 14-bit maximum {MAX_TYPE:#x}"),
        });
    }
    Ok(())
}

fn compound_flag(word: u32) -> Compound {
    if word & 0b100 != 0 {
        Compound::Start
    } else {
        Compound::Single
    }
}

impl WireValue for StreamObjectHeader {
    const NAME: &'static str = "stream object header";

    fn decode(cursor: &mut Cursor<'_>) -> PrimitiveResult<Self> {
        let first = cursor.peek_u8(Self::NAME)?;
        let header = match first & SHAPE_MASK {
            SHAPE_START16 => {
                let word = u32::from(cursor.read_u16_le(Self::NAME)?);
                Self {
                    type_tag: ((word >> 3) & 0x3F) as u16,
                    compound: compound_flag(word),
                    length: u64::from(word >> 9),
                    shape: HeaderShape::Start16,
                }
            }
            SHAPE_START32 => {
                let word = cursor.read_u32_le(Self::NAME)?;
                let short_length = (word >> 17) & LARGE_LENGTH;
                let length = if short_length == LARGE_LENGTH {
                    CompactU64::decode(cursor)?.value()
                } else {
                    u64::from(short_length)
                };
                Self {
                    type_tag: ((word >> 3) & 0x3FFF) as u16,
                    compound: compound_flag(word),
                    length,
                    shape: HeaderShape::Start32,
                }
            }
            SHAPE_END8 => {
                let byte = cursor.read_u8(Self::NAME)?;
                Self {
                    type_tag: u16::from(byte >> 2),
                    compound: Compound::End,
                    length: 0,
                    shape: HeaderShape::End8,
                }
            }
            _ => {
                let word = cursor.read_u16_le(Self::NAME)?;
                Self {
                    type_tag: word >> 2,
                    compound: Compound::End,
                    length: 0,
                    shape: HeaderShape::End16,
                }
            }
        };
        Ok(header)
    }

    fn encode<B: BufMut>(&self, out: &mut B) {
        // fields are masked to their widths; validate() guarantees nothing is lost
        let flag: u32 = if self.compound == Compound::Start { 0b100 } else { 0 };
        let tag = u32::from(self.type_tag & MAX_TYPE);
        match self.shape {
            HeaderShape::Start16 => {
                let tag = tag & u32::from(MAX_COMPACT_TYPE);
                let length = (self.length & MAX_COMPACT_LENGTH) as u32;
                let word = u32::from(SHAPE_START16) | flag | (tag << 3) | (length << 9);
                out.put_u16_le(word as u16);
            }
            HeaderShape::Start32 => {
                let short_length = if self.length >= u64::from(LARGE_LENGTH) {
                    LARGE_LENGTH
                } else {
                    self.length as u32
                };
                out.put_u32_le(u32::from(SHAPE_START32) | flag | (tag << 3) | (short_length << 17));
                if short_length == LARGE_LENGTH {
                    CompactU64::new(self.length).encode(out);
                }
            }
            HeaderShape::End8 => out.put_u8(SHAPE_END8 | (((tag as u8) & MAX_COMPACT_TYPE as u8) << 2)),
            HeaderShape::End16 => out.put_u16_le(u16::from(SHAPE_END16) | ((tag as u16) << 2)),
        }
    }

    fn encoded_len(&self) -> usize {
        match self.shape {
            HeaderShape::Start16 | HeaderShape::End16 => 2,
            HeaderShape::End8 => 1,
            HeaderShape::Start32 if self.length >= u64::from(LARGE_LENGTH) => {
                4 + CompactU64::new(self.length).encoded_len()
            }
            HeaderShape::Start32 => 4,
        }
    }
}
