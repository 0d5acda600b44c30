use std::fmt;

use bytes::BufMut;
use serde::{Deserialize, Serialize};

use crate::compact::CompactU64;
use crate::cursor::Cursor;
use crate::error::PrimitiveResult;
use crate::wire::WireValue;

/// Decode a compact length prefix as a `usize`.
fn decode_len(cursor: &mut Cursor<'_>, context: &'static str) -> PrimitiveResult<usize> {
    let offset = cursor.position();
    let len = CompactU64::decode(cursor)?.value();
    usize::try_from(len)
        .map_err(|_| Cursor::invalid(offset, context, format!("length {len} exceeds address space")))
}

/// Length-prefixed opaque bytes: a [`CompactU64`] byte count, then the bytes.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BinaryItem(Vec<u8>);

impl BinaryItem {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self(data.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Hex-encoded content.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl WireValue for BinaryItem {
    const NAME: &'static str = "binary item";

    fn decode(cursor: &mut Cursor<'_>) -> PrimitiveResult<Self> {
        let len = decode_len(cursor, Self::NAME)?;
        let data = cursor.read_bytes(len, Self::NAME)?;
        Ok(Self(data.to_vec()))
    }

    fn encode<B: BufMut>(&self, out: &mut B) {
        CompactU64::new(self.0.len() as u64).encode(out);
        out.put_slice(&self.0);
    }

    fn encoded_len(&self) -> usize {
        CompactU64::new(self.0.len() as u64).encoded_len() + self.0.len()
    }
}

impl fmt::Debug for BinaryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREVIEW: usize = 16;
        if self.0.len() <= PREVIEW {
            write!(f, "BinaryItem({})", self.to_hex())
        } else {
            write!(
                f,
                "BinaryItem({}.. {} bytes)",
                hex::encode(&self.0[..PREVIEW]),
                self.0.len()
            )
        }
    }
}

impl fmt::Display for BinaryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<Vec<u8>> for BinaryItem {
    fn from(data: Vec<u8>) -> Self {
        Self(data)
    }
}

impl From<&[u8]> for BinaryItem {
    fn from(data: &[u8]) -> Self {
        Self(data.to_vec())
    }
}

/// UTF-16LE string: a [`CompactU64`] count of code units, then the units.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StringItem(String);

impl StringItem {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn unit_count(&self) -> usize {
        self.0.encode_utf16().count()
    }
}

impl WireValue for StringItem {
    const NAME: &'static str = "string item";

    fn decode(cursor: &mut Cursor<'_>) -> PrimitiveResult<Self> {
        let count = decode_len(cursor, Self::NAME)?;
        let offset = cursor.position();
        let byte_len = count
            .checked_mul(2)
            .ok_or_else(|| Cursor::invalid(offset, Self::NAME, format!("unit count {count} overflows")))?;
        let raw = cursor.read_bytes(byte_len, Self::NAME)?;
        let units: Vec<u16> = raw
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16(&units)
            .map(Self)
            .map_err(|e| Cursor::invalid(offset, Self::NAME, e.to_string()))
    }

    fn encode<B: BufMut>(&self, out: &mut B) {
        CompactU64::new(self.unit_count() as u64).encode(out);
        for unit in self.0.encode_utf16() {
            out.put_u16_le(unit);
        }
    }

    fn encoded_len(&self) -> usize {
        let count = self.unit_count();
        CompactU64::new(count as u64).encoded_len() + 2 * count
    }
}

impl fmt::Display for StringItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StringItem {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PrimitiveError;

    #[test]
    fn binary_item_layout() {
        let item = BinaryItem::new(vec![0xDE, 0xAD]);
        assert_eq!(item.to_bytes(), vec![0x05, 0xDE, 0xAD]);
        assert_eq!(item.encoded_len(), 3);
    }

    #[test]
    fn binary_item_roundtrip() {
        let item = BinaryItem::new(vec![0u8; 32]);
        let bytes = item.to_bytes();
        assert_eq!(bytes[0], 0x41);
        assert_eq!(BinaryItem::decode_at(&bytes, 0).unwrap(), (item, 33));
    }

    #[test]
    fn empty_binary_item() {
        assert_eq!(BinaryItem::default().to_bytes(), vec![0x00]);
        let (item, consumed) = BinaryItem::decode_at(&[0x00], 0).unwrap();
        assert!(item.is_empty());
        assert_eq!(consumed, 1);
    }

    #[test]
    fn binary_item_declared_length_exceeds_buffer() {
        // declares 32 bytes, carries 4
        let bytes = [0x41, 1, 2, 3, 4];
        let err = BinaryItem::decode_at(&bytes, 0).unwrap_err();
        assert_eq!(
            err,
            PrimitiveError::BufferUnderrun {
                offset: 1,
                needed: 32,
                available: 4,
                context: "binary item",
            }
        );
    }

    #[test]
    fn binary_item_huge_declared_length() {
        let mut bytes = vec![0x80];
        bytes.extend_from_slice(&u64::MAX.to_le_bytes());
        assert!(BinaryItem::decode_at(&bytes, 0).is_err());
    }

    #[test]
    fn debug_truncates_long_content() {
        let item = BinaryItem::new(vec![0xAB; 40]);
        let dbg = format!("{item:?}");
        assert!(dbg.contains("40 bytes"));
    }

    #[test]
    fn string_item_roundtrip() {
        let s = StringItem::new("Notizbuch é");
        let bytes = s.to_bytes();
        assert_eq!(bytes.len(), s.encoded_len());
        assert_eq!(bytes[0], (11 << 1) | 1);
        assert_eq!(StringItem::decode_at(&bytes, 0).unwrap(), (s, bytes.len()));
    }

    #[test]
    fn string_item_counts_utf16_units() {
        // U+1F600 is a surrogate pair
        let s = StringItem::new("\u{1F600}");
        let bytes = s.to_bytes();
        assert_eq!(bytes[0], (2 << 1) | 1);
        assert_eq!(bytes.len(), 5);
    }

    #[test]
    fn string_item_rejects_lone_surrogate() {
        let bytes = [0x03, 0x00, 0xD8];
        let err = StringItem::decode_at(&bytes, 0).unwrap_err();
        assert!(matches!(err, PrimitiveError::InvalidEncoding { offset: 1, .. }));
    }

    #[test]
    fn string_array_roundtrip() {
        let items = vec![StringItem::from("a"), StringItem::from("bc")];
        let bytes = items.to_bytes();
        assert_eq!(bytes, vec![0x05, 0x03, b'a', 0, 0x05, b'b', 0, b'c', 0]);
        assert_eq!(Vec::<StringItem>::decode_at(&bytes, 0).unwrap(), (items, 9));
    }
}
