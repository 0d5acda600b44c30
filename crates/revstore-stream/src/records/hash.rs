use revstore_types::{BinaryItem, CompactU64};

record! {
    /// Hash of a data element's content.
    ///
    /// Payload: the hash scheme as a compact integer, then the digest as a
    /// length-prefixed binary item. The header length must equal the sum of
    /// the two encoded sizes exactly.
    pub struct DataElementHash {
        /// Identifies the algorithm that produced `data`.
        pub scheme: CompactU64,
        pub data: BinaryItem,
    }
}

impl DataElementHash {
    /// Content Information Data Structure Version 1.0.
    pub const SCHEME_CONTENT_INFORMATION_V1: u64 = 1;

    pub fn new(scheme: u64, data: impl Into<Vec<u8>>) -> Self {
        Self {
            scheme: CompactU64::new(scheme),
            data: BinaryItem::new(data),
        }
    }

    pub fn digest(&self) -> &[u8] {
        self.data.as_bytes()
    }
}
