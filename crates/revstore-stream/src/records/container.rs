use bytes::BufMut;
use revstore_types::{CompactU64, Cursor, ExGuid, Guid, PrimitiveResult, SerialNumber, WireValue};
use serde::{Deserialize, Serialize};

/// The kind of content a data element carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataElementType {
    StorageIndex,
    StorageManifest,
    CellManifest,
    RevisionManifest,
    ObjectGroup,
    DataElementFragment,
    ObjectDataBlob,
    /// A value with no name of its own.
    Other(u64),
}

impl DataElementType {
    pub fn from_raw(raw: u64) -> Self {
        match raw {
            0x01 => Self::StorageIndex,
            0x02 => Self::StorageManifest,
            0x03 => Self::CellManifest,
            0x04 => Self::RevisionManifest,
            0x05 => Self::ObjectGroup,
            0x06 => Self::DataElementFragment,
            0x0A => Self::ObjectDataBlob,
            other => Self::Other(other),
        }
    }

    pub fn raw(self) -> u64 {
        match self {
            Self::StorageIndex => 0x01,
            Self::StorageManifest => 0x02,
            Self::CellManifest => 0x03,
            Self::RevisionManifest => 0x04,
            Self::ObjectGroup => 0x05,
            Self::DataElementFragment => 0x06,
            Self::ObjectDataBlob => 0x0A,
            Self::Other(raw) => raw,
        }
    }
}

impl WireValue for DataElementType {
    const NAME: &'static str = "data element type";

    fn decode(cursor: &mut Cursor<'_>) -> PrimitiveResult<Self> {
        CompactU64::decode(cursor).map(|raw| Self::from_raw(raw.value()))
    }

    fn encode<B: BufMut>(&self, out: &mut B) {
        CompactU64::new(self.raw()).encode(out);
    }

    fn encoded_len(&self) -> usize {
        CompactU64::new(self.raw()).encoded_len()
    }
}

container_record! {
    /// A versioned unit of storage: one storage index, manifest, object
    /// group or blob, identified by extended GUID and serial number.
    pub struct DataElement {
        pub id: ExGuid,
        pub serial: SerialNumber,
        pub element_type: DataElementType,
    }
}

container_record! {
    /// Top-level package of data elements.
    pub struct DataElementPackage {
        /// Must be zero when written; preserved as read.
        pub reserved: u8,
    }
}

container_record! {
    /// Set of specialized knowledge records.
    pub struct Knowledge {}
}

container_record! {
    /// Knowledge of a specific kind, named by GUID.
    pub struct SpecializedKnowledge {
        pub guid: Guid,
    }
}

container_record! {
    pub struct CellKnowledge {}
}

container_record! {
    pub struct WaterlineKnowledge {}
}

container_record! {
    /// Object and object-data-BLOB declarations of an object group.
    pub struct ObjectGroupDeclarations {}
}

container_record! {
    /// Object data of an object group, in declaration order.
    pub struct ObjectGroupData {}
}

container_record! {
    pub struct ObjectGroupMetadataDeclarations {}
}

impl DataElement {
    pub fn new(id: ExGuid, serial: SerialNumber, element_type: DataElementType) -> Self {
        Self {
            id,
            serial,
            element_type,
            children: Vec::new(),
        }
    }
}

impl DataElementPackage {
    pub fn new(children: Vec<crate::object::StreamObject>) -> Self {
        Self {
            reserved: 0,
            children,
        }
    }
}
