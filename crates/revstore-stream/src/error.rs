//! Error types for stream object decoding and encoding.

use revstore_types::PrimitiveError;
use thiserror::Error;

use crate::header::{Compound, HeaderShape};

/// Errors that can occur while decoding or encoding a stream object tree.
///
/// Every decode error carries the absolute byte offset of the record (or End
/// header) that failed, and where known the record's type name.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StreamError {
    /// A read, or a declared length, runs past the end of the buffer.
    #[error("buffer underrun at offset {offset} in {type_name}: need {needed} bytes, {available} available")]
    BufferUnderrun {
        offset: usize,
        type_name: String,
        needed: usize,
        available: usize,
    },

    /// A primitive field carried an unrecognized form.
    #[error("invalid encoding at offset {offset} in {type_name}: {reason}")]
    InvalidEncoding {
        offset: usize,
        type_name: String,
        reason: String,
    },

    /// The payload decoder consumed more bytes than the header declared.
    #[error("stream object over-parse error at offset {offset} in {type_name}: declared {declared} bytes, consumed {consumed}")]
    OverParse {
        offset: usize,
        type_name: String,
        declared: u64,
        consumed: u64,
    },

    /// The payload decoder consumed fewer bytes than the header declared.
    #[error("stream object under-parse error at offset {offset} in {type_name}: declared {declared} bytes, consumed {consumed}")]
    UnderParse {
        offset: usize,
        type_name: String,
        declared: u64,
        consumed: u64,
    },

    /// A single object with an unregistered type tag, with skipping disabled.
    #[error("unknown stream object type {type_tag:#06x} at offset {offset}")]
    UnknownLeafType { offset: usize, type_tag: u16 },

    /// A container start with an unregistered type tag. Never skippable.
    #[error("unknown container stream object type {type_tag:#06x} at offset {offset}")]
    UnknownContainerType { offset: usize, type_tag: u16 },

    /// An End header closing a different container than the one open.
    #[error("mismatched container end at offset {offset}: expected end of {expected}, found end of type {found:#06x}")]
    MismatchedContainerEnd {
        offset: usize,
        expected: String,
        found: u16,
    },

    /// An End header where an object was expected.
    #[error("unexpected container end of type {type_tag:#06x} at offset {offset}")]
    UnexpectedEnd { offset: usize, type_tag: u16 },

    /// A registered type used with the wrong compound flag.
    #[error("{type_name} at offset {offset} must be a {expected} object, found {found}")]
    CompoundMismatch {
        offset: usize,
        type_name: String,
        expected: Compound,
        found: Compound,
    },

    /// Containers nested deeper than the configured limit.
    #[error("containers nested deeper than {max_depth} at offset {offset}")]
    NestingTooDeep { offset: usize, max_depth: usize },

    /// A typed parse found a different record than requested.
    #[error("expected {expected} at offset {offset}, found {found}")]
    TypeMismatch {
        offset: usize,
        expected: &'static str,
        found: String,
    },

    /// A type tag that no header shape can carry.
    #[error("type tag {type_tag:#x} cannot be encoded: {reason}")]
    InvalidTypeTag { type_tag: u16, reason: String },

    /// A header whose fields do not fit its shape.
    #[error("invalid {shape:?} header for type {type_tag:#x}: {reason}")]
    InvalidHeader {
        type_tag: u16,
        shape: HeaderShape,
        reason: String,
    },

    #[error("invalid codec configuration: {0}")]
    InvalidConfig(String),
}

impl StreamError {
    /// Lift a primitive failure into the context of the record being decoded.
    pub fn from_primitive(err: PrimitiveError, type_name: &str) -> Self {
        match err {
            PrimitiveError::BufferUnderrun {
                offset,
                needed,
                available,
                ..
            } => Self::BufferUnderrun {
                offset,
                type_name: type_name.to_owned(),
                needed,
                available,
            },
            PrimitiveError::InvalidEncoding {
                offset,
                context,
                reason,
            } => Self::InvalidEncoding {
                offset,
                type_name: type_name.to_owned(),
                reason: format!("{context}: {reason}"),
            },
        }
    }

    /// Byte offset the error is anchored at, if it has one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::BufferUnderrun { offset, .. }
            | Self::InvalidEncoding { offset, .. }
            | Self::OverParse { offset, .. }
            | Self::UnderParse { offset, .. }
            | Self::UnknownLeafType { offset, .. }
            | Self::UnknownContainerType { offset, .. }
            | Self::MismatchedContainerEnd { offset, .. }
            | Self::UnexpectedEnd { offset, .. }
            | Self::CompoundMismatch { offset, .. }
            | Self::NestingTooDeep { offset, .. }
            | Self::TypeMismatch { offset, .. } => Some(*offset),
            Self::InvalidTypeTag { .. } | Self::InvalidHeader { .. } | Self::InvalidConfig(_) => None,
        }
    }

    /// Pick over- or under-parse for a length mismatch.
    pub(crate) fn length_mismatch(offset: usize, type_name: &str, declared: u64, consumed: u64) -> Self {
        let type_name = type_name.to_owned();
        if consumed > declared {
            Self::OverParse {
                offset,
                type_name,
                declared,
                consumed,
            }
        } else {
            Self::UnderParse {
                offset,
                type_name,
                declared,
                consumed,
            }
        }
    }
}

/// Convenience alias for stream codec results.
pub type StreamResult<T> = Result<T, StreamError>;
