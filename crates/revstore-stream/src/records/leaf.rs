use revstore_types::{BinaryItem, CellId, CompactU64, ExGuid, Guid, SerialNumber};

record! {
    /// Raw bytes of an object stored outside its object group.
    pub struct ObjectDataBlob {
        pub data: BinaryItem,
    }
}

record! {
    /// One cell storage's waterline in a waterline knowledge set.
    pub struct WaterlineKnowledgeEntry {
        pub cell_storage: ExGuid,
        pub waterline: CompactU64,
        pub reserved: CompactU64,
    }
}

record! {
    /// Declares an object whose data lives in a separate object data BLOB.
    pub struct ObjectGroupObjectBlobDataDeclaration {
        pub object: ExGuid,
        pub blob: ExGuid,
        pub partition_id: CompactU64,
        pub object_references_count: CompactU64,
        pub cell_references_count: CompactU64,
    }
}

record! {
    /// Root of a storage manifest, bound to the cell it describes.
    pub struct StorageManifestRootDeclare {
        pub root: ExGuid,
        pub cell: CellId,
    }
}

record! {
    pub struct RevisionManifestRootDeclare {
        pub root: ExGuid,
        pub object: ExGuid,
    }
}

record! {
    pub struct CellManifestCurrentRevision {
        pub revision: ExGuid,
    }
}

record! {
    /// Schema identifier of a storage manifest.
    pub struct StorageManifestSchemaGuid {
        pub schema: Guid,
    }
}

record! {
    /// Maps a revision to the data element holding its manifest.
    pub struct StorageIndexRevisionMapping {
        pub revision: ExGuid,
        pub revision_mapping: ExGuid,
        pub serial: SerialNumber,
    }
}

record! {
    /// Maps a cell to the data element holding its manifest.
    pub struct StorageIndexCellMapping {
        pub cell: CellId,
        pub cell_mapping: ExGuid,
        pub serial: SerialNumber,
    }
}

record! {
    /// A contiguous range of serial numbers known for one GUID.
    pub struct CellKnowledgeRange {
        pub guid: Guid,
        pub from: CompactU64,
        pub to: CompactU64,
    }
}

record! {
    pub struct StorageIndexManifestMapping {
        pub manifest_mapping: ExGuid,
        pub serial: SerialNumber,
    }
}

record! {
    /// Inline object data with the objects and cells it references.
    pub struct ObjectGroupObjectData {
        pub object_refs: Vec<ExGuid>,
        pub cell_refs: Vec<CellId>,
        pub data: BinaryItem,
    }
}

record! {
    pub struct CellKnowledgeEntry {
        pub serial: SerialNumber,
    }
}

record! {
    /// Declares an object stored inline in the object group data.
    pub struct ObjectGroupObjectDeclare {
        pub object: ExGuid,
        pub partition_id: CompactU64,
        pub data_size: CompactU64,
        pub object_references_count: CompactU64,
        pub cell_references_count: CompactU64,
    }
}

record! {
    pub struct RevisionManifestObjectGroupReferences {
        pub object_group: ExGuid,
    }
}

record! {
    /// A revision and the revision it is based on (null for the first).
    pub struct RevisionManifest {
        pub revision: ExGuid,
        pub base_revision: ExGuid,
    }
}

record! {
    /// Object data held in a separate data element, with its references.
    pub struct ObjectGroupObjectDataBlobReference {
        pub object_refs: Vec<ExGuid>,
        pub cell_refs: Vec<CellId>,
        pub blob: ExGuid,
    }
}

record! {
    /// One slice of a data element too large to transmit whole.
    pub struct DataElementFragment {
        pub fragment: ExGuid,
        pub data_element_size: CompactU64,
        /// Offset of this slice within the reassembled data element.
        pub chunk_start: CompactU64,
        pub chunk_length: CompactU64,
        pub data: BinaryItem,
    }
}

record! {
    pub struct ObjectGroupMetadata {
        pub change_frequency: CompactU64,
    }
}
