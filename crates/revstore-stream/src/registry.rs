//! Closed mapping from type tag to record kind and payload codec.
//!
//! The table below is the single source of truth: the `registry!` macro
//! expands it into the kind enums, the [`lookup`] function and the
//! exhaustive per-kind dispatch used by the decoder and encoder. A tag that
//! appears in neither list is [`Lookup::Unknown`].

use bytes::BufMut;
use revstore_types::{Cursor, PrimitiveResult};
use serde::{Deserialize, Serialize};

use crate::object::StreamObject;
use crate::records::*;

/// Payload fields of a record, excluding its header and any children.
pub trait Fields: Sized {
    fn decode_fields(cursor: &mut Cursor<'_>) -> PrimitiveResult<Self>;
    fn encode_fields<B: BufMut>(&self, out: &mut B);
    fn fields_len(&self) -> usize;
}

/// A registered record type that can be pulled out of a decoded tree.
pub trait Record: Fields + Into<StreamObject> {
    const TYPE_TAG: u16;
    const TYPE_NAME: &'static str;

    /// Unwrap an owned object, handing it back if it is another type.
    fn from_object(object: StreamObject) -> Result<Self, StreamObject>;

    /// Borrow the record if `object` is of this type.
    fn from_object_ref(object: &StreamObject) -> Option<&Self>;
}

/// A record that brackets nested stream objects.
pub trait Container {
    fn children(&self) -> &[StreamObject];
    fn children_mut(&mut self) -> &mut Vec<StreamObject>;
}

/// Result of looking up a type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lookup {
    Leaf(LeafKind),
    Container(ContainerKind),
    /// Not registered. Skippable only as a single object.
    Unknown(u16),
}

impl Lookup {
    pub fn type_tag(self) -> u16 {
        match self {
            Self::Leaf(kind) => kind.type_tag(),
            Self::Container(kind) => kind.type_tag(),
            Self::Unknown(tag) => tag,
        }
    }
}

/// Human-readable name for a type tag, used in diagnostics.
pub fn type_name(type_tag: u16) -> String {
    match lookup(type_tag) {
        Lookup::Leaf(kind) => kind.name().to_owned(),
        Lookup::Container(kind) => kind.name().to_owned(),
        Lookup::Unknown(tag) => format!("Unknown({tag:#06x})"),
    }
}

macro_rules! registry {
    (
        leaves { $( $leaf:ident = $ltag:literal, )* }
        containers { $( $container:ident = $ctag:literal, )* }
    ) => {
        /// Registered single (non-container) record kinds.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum LeafKind { $( $leaf, )* }

        impl LeafKind {
            pub const ALL: &'static [Self] = &[ $( Self::$leaf, )* ];

            pub const fn type_tag(self) -> u16 {
                match self { $( Self::$leaf => $ltag, )* }
            }

            pub const fn name(self) -> &'static str {
                match self { $( Self::$leaf => stringify!($leaf), )* }
            }
        }

        /// Registered container record kinds.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum ContainerKind { $( $container, )* }

        impl ContainerKind {
            pub const ALL: &'static [Self] = &[ $( Self::$container, )* ];

            pub const fn type_tag(self) -> u16 {
                match self { $( Self::$container => $ctag, )* }
            }

            pub const fn name(self) -> &'static str {
                match self { $( Self::$container => stringify!($container), )* }
            }
        }

        /// Look up a type tag in the registry.
        pub fn lookup(type_tag: u16) -> Lookup {
            match type_tag {
                $( $ltag => Lookup::Leaf(LeafKind::$leaf), )*
                $( $ctag => Lookup::Container(ContainerKind::$container), )*
                other => Lookup::Unknown(other),
            }
        }

        /// A decoded single record of any registered kind.
        #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
        pub enum LeafObject { $( $leaf($leaf), )* }

        impl LeafObject {
            pub fn kind(&self) -> LeafKind {
                match self { $( Self::$leaf(_) => LeafKind::$leaf, )* }
            }

            pub(crate) fn decode_fields(kind: LeafKind, cursor: &mut Cursor<'_>) -> PrimitiveResult<Self> {
                match kind { $( LeafKind::$leaf => $leaf::decode_fields(cursor).map(Self::$leaf), )* }
            }

            pub(crate) fn encode_fields<B: BufMut>(&self, out: &mut B) {
                match self { $( Self::$leaf(record) => record.encode_fields(out), )* }
            }

            pub fn fields_len(&self) -> usize {
                match self { $( Self::$leaf(record) => record.fields_len(), )* }
            }
        }

        /// A decoded container record of any registered kind.
        #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
        pub enum ContainerObject { $( $container($container), )* }

        impl ContainerObject {
            pub fn kind(&self) -> ContainerKind {
                match self { $( Self::$container(_) => ContainerKind::$container, )* }
            }

            pub(crate) fn decode_fields(kind: ContainerKind, cursor: &mut Cursor<'_>) -> PrimitiveResult<Self> {
                match kind { $( ContainerKind::$container => $container::decode_fields(cursor).map(Self::$container), )* }
            }

            pub(crate) fn encode_fields<B: BufMut>(&self, out: &mut B) {
                match self { $( Self::$container(record) => record.encode_fields(out), )* }
            }

            /// Size of the container's own fields, excluding children.
            pub fn fields_len(&self) -> usize {
                match self { $( Self::$container(record) => record.fields_len(), )* }
            }

            pub fn children(&self) -> &[StreamObject] {
                match self { $( Self::$container(record) => record.children(), )* }
            }

            pub fn children_mut(&mut self) -> &mut Vec<StreamObject> {
                match self { $( Self::$container(record) => record.children_mut(), )* }
            }
        }

        $(
            impl Record for $leaf {
                const TYPE_TAG: u16 = $ltag;
                const TYPE_NAME: &'static str = stringify!($leaf);

                fn from_object(object: StreamObject) -> Result<Self, StreamObject> {
                    match object {
                        StreamObject::Leaf(LeafObject::$leaf(record)) => Ok(record),
                        other => Err(other),
                    }
                }

                fn from_object_ref(object: &StreamObject) -> Option<&Self> {
                    match object {
                        StreamObject::Leaf(LeafObject::$leaf(record)) => Some(record),
                        _ => None,
                    }
                }
            }

            impl From<$leaf> for StreamObject {
                fn from(record: $leaf) -> Self {
                    StreamObject::Leaf(LeafObject::$leaf(record))
                }
            }
        )*

        $(
            impl Record for $container {
                const TYPE_TAG: u16 = $ctag;
                const TYPE_NAME: &'static str = stringify!($container);

                fn from_object(object: StreamObject) -> Result<Self, StreamObject> {
                    match object {
                        StreamObject::Container(ContainerObject::$container(record)) => Ok(record),
                        other => Err(other),
                    }
                }

                fn from_object_ref(object: &StreamObject) -> Option<&Self> {
                    match object {
                        StreamObject::Container(ContainerObject::$container(record)) => Some(record),
                        _ => None,
                    }
                }
            }

            impl From<$container> for StreamObject {
                fn from(record: $container) -> Self {
                    StreamObject::Container(ContainerObject::$container(record))
                }
            }
        )*
    };
}

registry! {
    leaves {
        ObjectDataBlob = 0x02,
        WaterlineKnowledgeEntry = 0x04,
        ObjectGroupObjectBlobDataDeclaration = 0x05,
        DataElementHash = 0x06,
        StorageManifestRootDeclare = 0x07,
        RevisionManifestRootDeclare = 0x0A,
        CellManifestCurrentRevision = 0x0B,
        StorageManifestSchemaGuid = 0x0C,
        StorageIndexRevisionMapping = 0x0D,
        StorageIndexCellMapping = 0x0E,
        CellKnowledgeRange = 0x0F,
        StorageIndexManifestMapping = 0x11,
        ObjectGroupObjectData = 0x16,
        CellKnowledgeEntry = 0x17,
        ObjectGroupObjectDeclare = 0x18,
        RevisionManifestObjectGroupReferences = 0x19,
        RevisionManifest = 0x1A,
        ObjectGroupObjectDataBlobReference = 0x1C,
        DataElementFragment = 0x6A,
        ObjectGroupMetadata = 0x78,
    }
    containers {
        DataElement = 0x01,
        Knowledge = 0x10,
        CellKnowledge = 0x14,
        DataElementPackage = 0x15,
        ObjectGroupDeclarations = 0x1D,
        ObjectGroupData = 0x1E,
        WaterlineKnowledge = 0x29,
        SpecializedKnowledge = 0x44,
        ObjectGroupMetadataDeclarations = 0x79,
    }
}
