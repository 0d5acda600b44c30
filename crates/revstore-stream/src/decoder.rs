//! Stream object graph builder.
//!
//! Decoding is strict: the first malformed record aborts with an error
//! anchored at its byte offset, and the caller's cursor is left where it was.

use revstore_types::{Cursor, WireValue};
use tracing::{debug, trace, warn};

use crate::config::{CodecConfig, ContainerLength};
use crate::error::{StreamError, StreamResult};
use crate::header::{Compound, StreamObjectHeader};
use crate::object::{StreamObject, UnknownObject};
use crate::registry::{self, ContainerKind, ContainerObject, LeafObject, Lookup, Record};

const SEQUENCE_NAME: &str = "stream object sequence";

/// Decodes stream object trees from a byte buffer.
#[derive(Clone, Debug, Default)]
pub struct Decoder {
    config: CodecConfig,
}

impl Decoder {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Read the header at the cursor without advancing it.
    pub fn peek_header(&self, cursor: &Cursor<'_>) -> StreamResult<StreamObjectHeader> {
        let mut lookahead = *cursor;
        read_header(&mut lookahead)
    }

    /// Decode one object, including all of its descendants.
    pub fn decode_object(&self, cursor: &mut Cursor<'_>) -> StreamResult<StreamObject> {
        let mut work = *cursor;
        let object = self.decode_nested(&mut work, 0)?;
        *cursor = work;
        Ok(object)
    }

    /// Decode objects until exactly `total_length` bytes have been consumed.
    pub fn decode_sequence(
        &self,
        cursor: &mut Cursor<'_>,
        total_length: u64,
    ) -> StreamResult<Vec<StreamObject>> {
        let start = cursor.position();
        let total = fit_length(cursor, start, SEQUENCE_NAME, total_length)?;

        let mut work = *cursor;
        let mut objects = Vec::new();
        while work.position() - start < total {
            objects.push(self.decode_nested(&mut work, 0)?);
        }

        let consumed = work.position() - start;
        if consumed != total {
            return Err(StreamError::length_mismatch(
                start,
                SEQUENCE_NAME,
                total_length,
                consumed as u64,
            ));
        }

        debug!(
            offset = start,
            objects = objects.len(),
            bytes = consumed,
            "decoded stream object sequence"
        );
        *cursor = work;
        Ok(objects)
    }

    /// Decode the next object only if it is a `T`.
    ///
    /// Returns `Ok(None)` without moving the cursor when the buffer is
    /// exhausted, the next header closes a container, or it carries another
    /// type tag.
    pub fn try_decode<T: Record>(&self, cursor: &mut Cursor<'_>) -> StreamResult<Option<T>> {
        if cursor.is_empty() {
            return Ok(None);
        }
        let header = self.peek_header(cursor)?;
        if header.is_end() || header.type_tag() != T::TYPE_TAG {
            return Ok(None);
        }
        self.decode_record(cursor).map(Some)
    }

    /// Decode the next object and require it to be a `T`.
    pub fn decode_record<T: Record>(&self, cursor: &mut Cursor<'_>) -> StreamResult<T> {
        let offset = cursor.position();
        let mut work = *cursor;
        let record = T::from_object(self.decode_nested(&mut work, 0)?).map_err(|other| {
            StreamError::TypeMismatch {
                offset,
                expected: T::TYPE_NAME,
                found: registry::type_name(other.type_tag()),
            }
        })?;
        *cursor = work;
        Ok(record)
    }

    fn decode_nested(&self, cursor: &mut Cursor<'_>, depth: usize) -> StreamResult<StreamObject> {
        let offset = cursor.position();
        let header = read_header(cursor)?;
        match header.compound() {
            Compound::End => Err(StreamError::UnexpectedEnd {
                offset,
                type_tag: header.type_tag(),
            }),
            Compound::Single => self.decode_single(cursor, offset, header),
            Compound::Start => self.decode_container(cursor, offset, header, depth),
        }
    }

    fn decode_single(
        &self,
        cursor: &mut Cursor<'_>,
        offset: usize,
        header: StreamObjectHeader,
    ) -> StreamResult<StreamObject> {
        let type_tag = header.type_tag();
        let type_name = registry::type_name(type_tag);
        let length = fit_length(cursor, offset, &type_name, header.length())?;

        let kind = match registry::lookup(type_tag) {
            Lookup::Leaf(kind) => kind,
            Lookup::Container(_) => {
                return Err(StreamError::CompoundMismatch {
                    offset,
                    type_name,
                    expected: Compound::Start,
                    found: Compound::Single,
                })
            }
            Lookup::Unknown(_) if self.config.skip_unknown_leaves => {
                let payload = cursor
                    .read_bytes(length, "unknown object payload")
                    .map_err(|e| StreamError::from_primitive(e, &type_name))?;
                warn!(offset, type_tag, length, "skipping unknown stream object");
                return Ok(StreamObject::Unknown(UnknownObject {
                    type_tag,
                    payload: payload.to_vec(),
                }));
            }
            Lookup::Unknown(_) => return Err(StreamError::UnknownLeafType { offset, type_tag }),
        };

        let payload_start = cursor.position();
        let leaf = LeafObject::decode_fields(kind, cursor)
            .map_err(|e| StreamError::from_primitive(e, kind.name()))?;
        check_consumed(offset, kind.name(), header.length(), cursor.position() - payload_start)?;

        trace!(offset, type_tag, length, kind = kind.name(), "decoded stream object");
        Ok(StreamObject::Leaf(leaf))
    }

    fn decode_container(
        &self,
        cursor: &mut Cursor<'_>,
        offset: usize,
        header: StreamObjectHeader,
        depth: usize,
    ) -> StreamResult<StreamObject> {
        let type_tag = header.type_tag();
        let kind = match registry::lookup(type_tag) {
            Lookup::Container(kind) => kind,
            Lookup::Leaf(kind) => {
                return Err(StreamError::CompoundMismatch {
                    offset,
                    type_name: kind.name().to_owned(),
                    expected: Compound::Single,
                    found: Compound::Start,
                })
            }
            Lookup::Unknown(_) => return Err(StreamError::UnknownContainerType { offset, type_tag }),
        };
        if depth >= self.config.max_depth {
            return Err(StreamError::NestingTooDeep {
                offset,
                max_depth: self.config.max_depth,
            });
        }

        let body_start = cursor.position();
        fit_length(cursor, offset, kind.name(), header.length())?;

        let mut container = ContainerObject::decode_fields(kind, cursor)
            .map_err(|e| StreamError::from_primitive(e, kind.name()))?;
        if self.config.container_length == ContainerLength::OwnFields {
            check_consumed(offset, kind.name(), header.length(), cursor.position() - body_start)?;
        }

        let mut children = Vec::new();
        let end_offset = loop {
            let first = cursor
                .peek_u8("container end")
                .map_err(|e| StreamError::from_primitive(e, kind.name()))?;
            if StreamObjectHeader::is_end_marker(first) {
                break self.close_container(cursor, kind)?;
            }
            children.push(self.decode_nested(cursor, depth + 1)?);
        };
        if self.config.container_length == ContainerLength::Extent {
            check_consumed(offset, kind.name(), header.length(), end_offset - body_start)?;
        }

        trace!(
            offset,
            type_tag,
            length = header.length(),
            kind = kind.name(),
            children = children.len(),
            "decoded stream object container"
        );
        *container.children_mut() = children;
        Ok(StreamObject::Container(container))
    }

    /// Consume the End header of `kind`, returning its offset.
    fn close_container(&self, cursor: &mut Cursor<'_>, kind: ContainerKind) -> StreamResult<usize> {
        let end_offset = cursor.position();
        let end = read_header(cursor)?;
        if end.type_tag() != kind.type_tag() {
            return Err(StreamError::MismatchedContainerEnd {
                offset: end_offset,
                expected: kind.name().to_owned(),
                found: end.type_tag(),
            });
        }
        Ok(end_offset)
    }
}

fn read_header(cursor: &mut Cursor<'_>) -> StreamResult<StreamObjectHeader> {
    StreamObjectHeader::decode(cursor)
        .map_err(|e| StreamError::from_primitive(e, StreamObjectHeader::NAME))
}

/// Check a declared length against the bytes left after the cursor.
fn fit_length(cursor: &Cursor<'_>, offset: usize, type_name: &str, declared: u64) -> StreamResult<usize> {
    let available = cursor.remaining();
    match usize::try_from(declared) {
        Ok(length) if length <= available => Ok(length),
        _ => Err(StreamError::BufferUnderrun {
            offset,
            type_name: type_name.to_owned(),
            needed: usize::try_from(declared).unwrap_or(usize::MAX),
            available,
        }),
    }
}

fn check_consumed(offset: usize, type_name: &str, declared: u64, consumed: usize) -> StreamResult<()> {
    let consumed = consumed as u64;
    if consumed != declared {
        return Err(StreamError::length_mismatch(offset, type_name, declared, consumed));
    }
    Ok(())
}
