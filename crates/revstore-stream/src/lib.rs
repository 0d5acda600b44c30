//! # revstore-stream
//!
//! Stream object codec for revision-store documents (MS-FSSHTTPB framing,
//! as used by OneNote and other Office cell storage).
//!
//! A stream is a sequence of self-describing records. Each begins with a
//! compact bit-packed header naming its type, whether it is a single record
//! or opens a container, and its payload length. Containers are closed by a
//! dedicated End header. This crate turns such bytes into a tree of typed
//! records and back.
//!
//! ## Key Types
//!
//! - [`StreamObjectHeader`] - the four header shapes and their bit layout
//! - [`StreamObject`] - a decoded node: registered leaf, container or opaque unknown
//! - [`Decoder`] / [`Encoder`] - tree builder and serializer, driven by a [`CodecConfig`]
//! - [`Record`] - implemented by every registered record type for typed access
//!
//! ```
//! use revstore_stream::{parse, serialize, records::DataElementHash};
//!
//! let hash = DataElementHash::new(2, vec![0u8; 32]);
//! let bytes = serialize(&hash.clone().into()).unwrap();
//! assert_eq!(&bytes[..4], &[0x30, 0x44, 0x05, 0x41]);
//! assert_eq!(parse::<DataElementHash>(&bytes, 0).unwrap(), hash);
//! ```

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod header;
pub mod object;
pub mod records;
pub mod registry;

pub use config::{CodecConfig, ContainerLength};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{StreamError, StreamResult};
pub use header::{Compound, HeaderShape, StreamObjectHeader};
pub use object::{StreamObject, UnknownObject};
pub use registry::{lookup, ContainerKind, ContainerObject, LeafKind, LeafObject, Lookup, Record};

use revstore_types::Cursor;

/// Decode the object at `offset` with the default configuration and
/// require it to be a `T`.
pub fn parse<T: Record>(buffer: &[u8], offset: usize) -> StreamResult<T> {
    Decoder::default().decode_record(&mut Cursor::at(buffer, offset))
}

/// Decode the object at `offset`, returning it with the number of bytes it
/// occupied.
pub fn decode_object(buffer: &[u8], offset: usize) -> StreamResult<(StreamObject, usize)> {
    let mut cursor = Cursor::at(buffer, offset);
    let object = Decoder::default().decode_object(&mut cursor)?;
    Ok((object, cursor.position() - offset))
}

/// Decode the whole buffer as a top-level sequence of objects.
pub fn decode_all(buffer: &[u8]) -> StreamResult<Vec<StreamObject>> {
    Decoder::default().decode_sequence(&mut Cursor::new(buffer), buffer.len() as u64)
}

/// Encode an object tree with the default configuration.
pub fn serialize(object: &StreamObject) -> StreamResult<Vec<u8>> {
    Encoder::default().encode_object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::*;
    use revstore_types::{CellId, CompactU64, ExGuid, Guid, SerialNumber, WireValue};

    const GUID_A: Guid = Guid::from_u128(0x0123_4567_89ab_cdef_0011_2233_4455_6677);
    const GUID_B: Guid = Guid::from_u128(0xfedc_ba98_7654_3210_8899_aabb_ccdd_eeff);

    fn ex(value: u32) -> ExGuid {
        ExGuid::new(GUID_A, value)
    }

    fn cell() -> CellId {
        CellId::new(ex(1), ExGuid::new(GUID_B, 70_000))
    }

    fn serial(value: u64) -> SerialNumber {
        SerialNumber::new(GUID_B, value)
    }

    fn sample_leaf(kind: LeafKind) -> StreamObject {
        match kind {
            LeafKind::ObjectDataBlob => ObjectDataBlob { data: vec![0xABu8; 200].into() }.into(),
            LeafKind::WaterlineKnowledgeEntry => WaterlineKnowledgeEntry {
                cell_storage: ex(3),
                waterline: CompactU64::new(1_000),
                reserved: CompactU64::new(0),
            }
            .into(),
            LeafKind::ObjectGroupObjectBlobDataDeclaration => ObjectGroupObjectBlobDataDeclaration {
                object: ex(4),
                blob: ex(500),
                partition_id: CompactU64::new(1),
                object_references_count: CompactU64::new(2),
                cell_references_count: CompactU64::new(0),
            }
            .into(),
            LeafKind::DataElementHash => DataElementHash::new(1, vec![0x5Au8; 20]).into(),
            LeafKind::StorageManifestRootDeclare => StorageManifestRootDeclare {
                root: ex(2),
                cell: cell(),
            }
            .into(),
            LeafKind::RevisionManifestRootDeclare => RevisionManifestRootDeclare {
                root: ex(2),
                object: ExGuid::null(),
            }
            .into(),
            LeafKind::CellManifestCurrentRevision => CellManifestCurrentRevision { revision: ex(9) }.into(),
            LeafKind::StorageManifestSchemaGuid => StorageManifestSchemaGuid { schema: GUID_B }.into(),
            LeafKind::StorageIndexRevisionMapping => StorageIndexRevisionMapping {
                revision: ex(1),
                revision_mapping: ex(2),
                serial: serial(77),
            }
            .into(),
            LeafKind::StorageIndexCellMapping => StorageIndexCellMapping {
                cell: cell(),
                cell_mapping: ex(12),
                serial: SerialNumber::null(),
            }
            .into(),
            LeafKind::CellKnowledgeRange => CellKnowledgeRange {
                guid: GUID_A,
                from: CompactU64::new(1),
                to: CompactU64::new(1 << 40),
            }
            .into(),
            LeafKind::StorageIndexManifestMapping => StorageIndexManifestMapping {
                manifest_mapping: ex(31),
                serial: serial(1),
            }
            .into(),
            LeafKind::ObjectGroupObjectData => ObjectGroupObjectData {
                object_refs: vec![ex(1), ex(2), ExGuid::null()],
                cell_refs: vec![cell()],
                data: vec![1u8, 2, 3].into(),
            }
            .into(),
            LeafKind::CellKnowledgeEntry => CellKnowledgeEntry { serial: serial(5) }.into(),
            LeafKind::ObjectGroupObjectDeclare => ObjectGroupObjectDeclare {
                object: ex(8),
                partition_id: CompactU64::new(1),
                data_size: CompactU64::new(3),
                object_references_count: CompactU64::new(3),
                cell_references_count: CompactU64::new(1),
            }
            .into(),
            LeafKind::RevisionManifestObjectGroupReferences => {
                RevisionManifestObjectGroupReferences { object_group: ex(6) }.into()
            }
            LeafKind::RevisionManifest => RevisionManifest {
                revision: ex(2),
                base_revision: ExGuid::null(),
            }
            .into(),
            LeafKind::ObjectGroupObjectDataBlobReference => ObjectGroupObjectDataBlobReference {
                object_refs: Vec::new(),
                cell_refs: vec![cell(), cell()],
                blob: ex(u32::MAX),
            }
            .into(),
            LeafKind::DataElementFragment => DataElementFragment {
                fragment: ex(40),
                data_element_size: CompactU64::new(0x1_0000),
                chunk_start: CompactU64::new(0x8000),
                chunk_length: CompactU64::new(4),
                data: vec![9u8, 8, 7, 6].into(),
            }
            .into(),
            LeafKind::ObjectGroupMetadata => ObjectGroupMetadata { change_frequency: CompactU64::new(2) }.into(),
        }
    }

    fn sample_container(kind: ContainerKind, children: Vec<StreamObject>) -> StreamObject {
        match kind {
            ContainerKind::DataElement => {
                let mut element = DataElement::new(ex(20), serial(3), DataElementType::ObjectGroup);
                element.children = children;
                element.into()
            }
            ContainerKind::Knowledge => Knowledge { children }.into(),
            ContainerKind::CellKnowledge => CellKnowledge { children }.into(),
            ContainerKind::DataElementPackage => DataElementPackage::new(children).into(),
            ContainerKind::ObjectGroupDeclarations => ObjectGroupDeclarations { children }.into(),
            ContainerKind::ObjectGroupData => ObjectGroupData { children }.into(),
            ContainerKind::WaterlineKnowledge => WaterlineKnowledge { children }.into(),
            ContainerKind::SpecializedKnowledge => SpecializedKnowledge {
                guid: GUID_A,
                children,
            }
            .into(),
            ContainerKind::ObjectGroupMetadataDeclarations => {
                ObjectGroupMetadataDeclarations { children }.into()
            }
        }
    }

    fn all_leaves() -> Vec<StreamObject> {
        LeafKind::ALL.iter().map(|&kind| sample_leaf(kind)).collect()
    }

    fn roundtrip(config: CodecConfig, object: &StreamObject) -> Vec<u8> {
        let bytes = Encoder::new(config.clone()).encode_object(object).unwrap();
        let mut cursor = Cursor::new(&bytes);
        let decoded = Decoder::new(config).decode_object(&mut cursor).unwrap();
        assert_eq!(&decoded, object);
        assert!(cursor.is_empty());
        bytes
    }

    #[test]
    fn every_leaf_roundtrips() {
        for object in all_leaves() {
            let bytes = roundtrip(CodecConfig::default(), &object);
            let header = StreamObjectHeader::decode_at(&bytes, 0).unwrap().0;
            assert_eq!(header.type_tag(), object.type_tag());
            assert_eq!(header.compound(), Compound::Single);
            // length invariant
            assert_eq!(header.encoded_len() as u64 + header.length(), bytes.len() as u64);
        }
    }

    #[test]
    fn every_container_roundtrips() {
        for config in [CodecConfig::default(), CodecConfig::fsshttpb()] {
            for &kind in ContainerKind::ALL {
                roundtrip(config.clone(), &sample_container(kind, Vec::new()));
                roundtrip(config.clone(), &sample_container(kind, all_leaves()));
            }
        }
    }

    #[test]
    fn nested_tree_roundtrips() {
        let group = sample_container(ContainerKind::ObjectGroupData, all_leaves());
        let element = sample_container(ContainerKind::DataElement, vec![group]);
        let knowledge = sample_container(
            ContainerKind::Knowledge,
            vec![sample_container(
                ContainerKind::SpecializedKnowledge,
                vec![sample_container(ContainerKind::CellKnowledge, all_leaves())],
            )],
        );
        let package = sample_container(ContainerKind::DataElementPackage, vec![element, knowledge]);

        for config in [CodecConfig::default(), CodecConfig::fsshttpb()] {
            let bytes = roundtrip(config.clone(), &package);
            // re-encoding decoded bytes is stable
            let decoded = Decoder::new(config.clone()).decode_object(&mut Cursor::new(&bytes)).unwrap();
            assert_eq!(Encoder::new(config).encode_object(&decoded).unwrap(), bytes);
        }
    }

    /// Check the extent rule for `object` and all of its descendants.
    fn assert_nesting(encoder: &Encoder, object: &StreamObject) {
        let bytes = encoder.encode_object(object).unwrap();
        assert_eq!(encoder.encoded_len(object).unwrap(), bytes.len());

        if let StreamObject::Container(container) = object {
            let (start, start_len) = StreamObjectHeader::decode_at(&bytes, 0).unwrap();
            let end = StreamObjectHeader::end(start.type_tag()).unwrap();
            assert_eq!(start_len as u64 + start.length() + end.encoded_len() as u64, bytes.len() as u64);

            let mut body = container.fields_len();
            for child in container.children() {
                body += encoder.encoded_len(child).unwrap();
                assert_nesting(encoder, child);
            }
            assert_eq!(body as u64, start.length());
        }
    }

    #[test]
    fn container_nesting_invariant() {
        let inner = sample_container(ContainerKind::CellKnowledge, all_leaves());
        let tree = sample_container(
            ContainerKind::DataElementPackage,
            vec![sample_container(ContainerKind::DataElement, vec![inner]), sample_leaf(LeafKind::ObjectDataBlob)],
        );
        assert_nesting(&Encoder::default(), &tree);
    }

    #[test]
    fn data_element_hash_scenario() {
        let mut bytes = vec![0x30, 0x44, 0x05, 0x41];
        bytes.extend([0u8; 32]);

        let hash = parse::<DataElementHash>(&bytes, 0).unwrap();
        assert_eq!(hash.scheme.value(), 2);
        assert_eq!(hash.digest(), &[0u8; 32]);

        let header = StreamObjectHeader::decode_at(&bytes, 0).unwrap().0;
        assert!(header.is_compact());
        assert_eq!(header.length(), 34);

        assert_eq!(serialize(&hash.into()).unwrap(), bytes);
    }

    #[test]
    fn truncated_binary_item_underruns() {
        let bytes = serialize(&sample_leaf(LeafKind::ObjectDataBlob)).unwrap();
        for cut in 0..bytes.len() {
            let err = decode_object(&bytes[..cut], 0).unwrap_err();
            assert!(matches!(err, StreamError::BufferUnderrun { .. }), "cut at {cut}: {err}");
        }
    }

    #[test]
    fn unknown_leaf_between_records() {
        let unknown = UnknownObject {
            type_tag: 0x2F,
            payload: vec![1, 2, 3, 4, 5],
        };
        let objects = vec![
            sample_leaf(LeafKind::RevisionManifest),
            unknown.clone().into(),
            sample_leaf(LeafKind::CellKnowledgeEntry),
        ];
        let bytes = Encoder::default().encode_sequence(&objects).unwrap();

        let decoded = decode_all(&bytes).unwrap();
        assert_eq!(decoded, objects);
        assert_eq!(decoded[1], StreamObject::Unknown(unknown));
        // preserved byte-for-byte
        assert_eq!(Encoder::default().encode_sequence(&decoded).unwrap(), bytes);
    }

    #[test]
    fn mismatched_end_reports_end_offset() {
        let mut bytes = StreamObjectHeader::start(0x10, 3).unwrap().to_bytes();
        bytes.extend(StreamObjectHeader::single(0x17, 1).unwrap().to_bytes());
        bytes.push(0x00);
        let end_offset = bytes.len();
        bytes.extend(StreamObjectHeader::end(0x29).unwrap().to_bytes());

        let err = decode_object(&bytes, 0).unwrap_err();
        assert_eq!(
            err,
            StreamError::MismatchedContainerEnd {
                offset: end_offset,
                expected: "Knowledge".into(),
                found: 0x29,
            }
        );
    }

    #[test]
    fn structural_errors() {
        let unknown_start = StreamObjectHeader::start(0x3D, 0).unwrap().to_bytes();
        assert!(matches!(
            decode_object(&unknown_start, 0),
            Err(StreamError::UnknownContainerType { type_tag: 0x3D, .. })
        ));

        let stray_end = StreamObjectHeader::end(0x79).unwrap().to_bytes();
        assert!(matches!(
            decode_all(&stray_end),
            Err(StreamError::UnexpectedEnd { offset: 0, type_tag: 0x79 })
        ));

        let deep = knowledge_chain(65);
        let roomy = CodecConfig {
            max_depth: 65,
            ..CodecConfig::default()
        };
        let bytes = Encoder::new(roomy).encode_object(&deep).unwrap();
        assert!(matches!(
            decode_object(&bytes, 0),
            Err(StreamError::NestingTooDeep { max_depth: 64, .. })
        ));
    }

    /// `levels` containers, each the only child of the one above.
    fn knowledge_chain(levels: usize) -> StreamObject {
        let mut chain = sample_container(ContainerKind::Knowledge, Vec::new());
        for _ in 1..levels {
            chain = sample_container(ContainerKind::Knowledge, vec![chain]);
        }
        chain
    }

    #[test]
    fn encoder_applies_decoder_depth_limit() {
        let deep = knowledge_chain(65);
        let roomy = CodecConfig {
            max_depth: 65,
            ..CodecConfig::default()
        };
        let bytes = Encoder::new(roomy.clone()).encode_object(&deep).unwrap();
        assert!(Decoder::new(roomy).decode_object(&mut Cursor::new(&bytes)).is_ok());

        // same error, at the same offset, as decoding would report
        let err = serialize(&deep).unwrap_err();
        assert!(matches!(err, StreamError::NestingTooDeep { max_depth: 64, .. }));
        assert_eq!(err, decode_object(&bytes, 0).unwrap_err());
        assert_eq!(Encoder::default().encoded_len(&deep).unwrap_err(), err);

        let leaf = sample_leaf(LeafKind::RevisionManifest);
        let leaf_len = serialize(&leaf).unwrap().len();
        let in_sequence = Encoder::default().encode_sequence(&[leaf, deep]).unwrap_err();
        assert_eq!(in_sequence.offset(), err.offset().map(|offset| offset + leaf_len));

        let at_limit = knowledge_chain(64);
        let bytes = serialize(&at_limit).unwrap();
        assert_eq!(decode_object(&bytes, 0).unwrap().0, at_limit);
    }

    // A package as written with the MS-FSSHTTPB container rule: the start
    // headers count only the containers' own fields.
    const FSSHTTPB_PACKAGE: &str = concat!(
        "ac0200",
        "0c26",
        "0c00000000000000000000000000000000",
        "00",
        "03",
        "3008",
        "0305abcd",
        "05",
        "55",
    );

    #[test]
    fn own_fields_package_is_byte_exact() {
        let bytes = hex::decode(FSSHTTPB_PACKAGE).unwrap();
        let decoder = Decoder::new(CodecConfig::fsshttpb());
        let package = decoder.decode_object(&mut Cursor::new(&bytes)).unwrap();

        let package_record = package.get::<DataElementPackage>().unwrap();
        assert_eq!(package_record.reserved, 0);
        let element = package_record.children[0].get::<DataElement>().unwrap();
        assert_eq!(element.id, ExGuid::new(Guid::nil(), 1));
        assert!(element.serial.is_null());
        assert_eq!(element.element_type, DataElementType::StorageIndex);
        let hash = package.find_all::<DataElementHash>().next().unwrap();
        assert_eq!(hash.digest(), &[0xAB, 0xCD]);

        let encoded = Encoder::new(CodecConfig::fsshttpb()).encode_object(&package).unwrap();
        assert_eq!(hex::encode(encoded), FSSHTTPB_PACKAGE);

        // the default extent rule rejects it
        assert!(matches!(decode_object(&bytes, 0), Err(StreamError::OverParse { .. })));
    }

    #[test]
    fn decode_object_reports_consumed() {
        let mut bytes = vec![0xFF, 0xFF];
        bytes.extend(serialize(&sample_leaf(LeafKind::StorageManifestSchemaGuid)).unwrap());
        let (object, consumed) = decode_object(&bytes, 2).unwrap();
        assert_eq!(consumed, bytes.len() - 2);
        assert_eq!(object.get::<StorageManifestSchemaGuid>().unwrap().schema, GUID_B);
    }

    #[test]
    fn parse_type_mismatch() {
        let bytes = serialize(&sample_leaf(LeafKind::RevisionManifest)).unwrap();
        let err = parse::<CellManifestCurrentRevision>(&bytes, 0).unwrap_err();
        assert!(matches!(
            err,
            StreamError::TypeMismatch { expected: "CellManifestCurrentRevision", .. }
        ));
    }

    #[test]
    fn parse_past_end() {
        assert!(matches!(parse::<RevisionManifest>(&[], 4), Err(StreamError::BufferUnderrun { .. })));
    }

    #[test]
    fn try_decode_optional_record() {
        let objects = vec![sample_leaf(LeafKind::RevisionManifest), sample_leaf(LeafKind::ObjectGroupMetadata)];
        let bytes = Encoder::default().encode_sequence(&objects).unwrap();
        let decoder = Decoder::default();
        let mut cursor = Cursor::new(&bytes);

        let manifest = decoder.decode_record::<RevisionManifest>(&mut cursor).unwrap();
        assert_eq!(manifest.revision, ex(2));
        assert!(decoder.try_decode::<RevisionManifestRootDeclare>(&mut cursor).unwrap().is_none());
        let metadata = decoder.try_decode::<ObjectGroupMetadata>(&mut cursor).unwrap().unwrap();
        assert_eq!(metadata.change_frequency.value(), 2);
        assert!(cursor.is_empty());
    }

    #[test]
    fn tree_serde_roundtrip() {
        let tree = sample_container(
            ContainerKind::DataElementPackage,
            vec![
                sample_container(ContainerKind::DataElement, all_leaves()),
                UnknownObject { type_tag: 0x3C, payload: vec![7] }.into(),
            ],
        );
        let json = serde_json::to_string(&tree).unwrap();
        let back: StreamObject = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn encoders_are_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Decoder>();
        assert_send_sync::<Encoder>();
        assert_send_sync::<StreamObject>();
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn blob_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..600)) {
                let object: StreamObject = ObjectDataBlob { data: data.into() }.into();
                let bytes = serialize(&object).unwrap();
                let (decoded, consumed) = decode_object(&bytes, 0).unwrap();
                prop_assert_eq!(consumed, bytes.len());
                prop_assert_eq!(decoded, object);
            }

            #[test]
            fn unknown_roundtrip(tag in 0x7Au16..0x3FFF, payload in proptest::collection::vec(any::<u8>(), 0..300)) {
                prop_assume!(matches!(lookup(tag), Lookup::Unknown(_)));
                let object: StreamObject = UnknownObject { type_tag: tag, payload }.into();
                let bytes = serialize(&object).unwrap();
                prop_assert_eq!(decode_all(&bytes).unwrap(), vec![object]);
            }
        }
    }
}
