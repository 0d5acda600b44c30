use bytes::BufMut;

use crate::compact::CompactU64;
use crate::cursor::Cursor;
use crate::error::PrimitiveResult;

/// A value with a fixed wire representation.
///
/// Implementations must satisfy the round-trip law: decoding the output of
/// [`encode`](WireValue::encode) yields the same value and consumes exactly
/// [`encoded_len`](WireValue::encoded_len) bytes.
pub trait WireValue: Sized {
    /// Name used in error context.
    const NAME: &'static str;

    /// Decode one value, advancing the cursor past it.
    fn decode(cursor: &mut Cursor<'_>) -> PrimitiveResult<Self>;

    /// Append the wire form to `out`.
    fn encode<B: BufMut>(&self, out: &mut B);

    /// Size of the wire form in bytes.
    fn encoded_len(&self) -> usize;

    /// Decode at `offset`. Returns `(value, bytes_consumed)`.
    fn decode_at(buf: &[u8], offset: usize) -> PrimitiveResult<(Self, usize)> {
        let mut cursor = Cursor::at(buf, offset);
        let value = Self::decode(&mut cursor)?;
        Ok((value, cursor.position() - offset))
    }

    /// Encode into a fresh buffer.
    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode(&mut out);
        out
    }
}

macro_rules! fixed_le {
    ($ty:ty, $name:literal, $read:ident, $put:ident) => {
        impl WireValue for $ty {
            const NAME: &'static str = $name;

            fn decode(cursor: &mut Cursor<'_>) -> PrimitiveResult<Self> {
                cursor.$read(Self::NAME)
            }

            fn encode<B: BufMut>(&self, out: &mut B) {
                out.$put(*self);
            }

            fn encoded_len(&self) -> usize {
                std::mem::size_of::<$ty>()
            }
        }
    };
}

fixed_le!(u16, "u16", read_u16_le, put_u16_le);
fixed_le!(u32, "u32", read_u32_le, put_u32_le);
fixed_le!(u64, "u64", read_u64_le, put_u64_le);

impl WireValue for u8 {
    const NAME: &'static str = "u8";

    fn decode(cursor: &mut Cursor<'_>) -> PrimitiveResult<Self> {
        cursor.read_u8(Self::NAME)
    }

    fn encode<B: BufMut>(&self, out: &mut B) {
        out.put_u8(*self);
    }

    fn encoded_len(&self) -> usize {
        1
    }
}

/// Counted array: a [`CompactU64`] element count followed by the elements.
impl<T: WireValue> WireValue for Vec<T> {
    const NAME: &'static str = "array";

    fn decode(cursor: &mut Cursor<'_>) -> PrimitiveResult<Self> {
        let offset = cursor.position();
        let count = CompactU64::decode(cursor)?.value();
        let count = usize::try_from(count)
            .map_err(|_| Cursor::invalid(offset, Self::NAME, format!("count {count} exceeds address space")))?;
        // Every element occupies at least one byte.
        let mut items = Vec::with_capacity(count.min(cursor.remaining()));
        for _ in 0..count {
            items.push(T::decode(cursor)?);
        }
        Ok(items)
    }

    fn encode<B: BufMut>(&self, out: &mut B) {
        CompactU64::new(self.len() as u64).encode(out);
        for item in self {
            item.encode(out);
        }
    }

    fn encoded_len(&self) -> usize {
        CompactU64::new(self.len() as u64).encoded_len()
            + self.iter().map(WireValue::encoded_len).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PrimitiveError;

    #[test]
    fn fixed_width_roundtrip() {
        let bytes = 0xBEEFu16.to_bytes();
        assert_eq!(bytes, vec![0xEF, 0xBE]);
        assert_eq!(u16::decode_at(&bytes, 0).unwrap(), (0xBEEF, 2));

        let bytes = 7u64.to_bytes();
        assert_eq!(bytes.len(), 8);
        assert_eq!(u64::decode_at(&bytes, 0).unwrap(), (7, 8));
    }

    #[test]
    fn array_prefixes_count() {
        let values: Vec<u16> = vec![1, 2, 3];
        let bytes = values.to_bytes();
        // count 3 as compact 7-bit form, then three little-endian u16s
        assert_eq!(bytes, vec![0x07, 1, 0, 2, 0, 3, 0]);
        assert_eq!(values.encoded_len(), bytes.len());
        let (decoded, consumed) = Vec::<u16>::decode_at(&bytes, 0).unwrap();
        assert_eq!(decoded, values);
        assert_eq!(consumed, 7);
    }

    #[test]
    fn empty_array() {
        let values: Vec<u32> = Vec::new();
        assert_eq!(values.to_bytes(), vec![0x00]);
        assert_eq!(Vec::<u32>::decode_at(&[0x00], 0).unwrap(), (vec![], 1));
    }

    #[test]
    fn array_count_larger_than_buffer() {
        // count = 100, but only two elements present
        let bytes = [0xC9, 0x01, 0x02];
        let err = Vec::<u8>::decode_at(&bytes, 0).unwrap_err();
        assert!(matches!(err, PrimitiveError::BufferUnderrun { offset: 3, .. }));
    }
}
