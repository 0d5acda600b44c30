//! Stream object serializer.

use bytes::{BufMut, BytesMut};
use revstore_types::WireValue;
use tracing::{debug, trace};

use crate::config::{CodecConfig, ContainerLength};
use crate::error::{StreamError, StreamResult};
use crate::header::StreamObjectHeader;
use crate::object::{StreamObject, UnknownObject};
use crate::registry::{self, ContainerObject, Lookup};

/// Serializes stream object trees, always choosing the narrowest header.
#[derive(Clone, Debug, Default)]
pub struct Encoder {
    config: CodecConfig,
}

impl Encoder {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn encode_object(&self, object: &StreamObject) -> StreamResult<Vec<u8>> {
        let mut out = Vec::new();
        self.write_object(object, &mut out)?;
        Ok(out)
    }

    /// Encode objects back to back, as a top-level sequence.
    pub fn encode_sequence(&self, objects: &[StreamObject]) -> StreamResult<Vec<u8>> {
        let mut out = Vec::new();
        for object in objects {
            self.check_depth(object, 0, out.len())?;
            self.write_nested(object, &mut out)?;
        }
        debug!(objects = objects.len(), bytes = out.len(), "encoded stream object sequence");
        Ok(out)
    }

    /// Append one encoded object to `out`.
    ///
    /// Fails with `NestingTooDeep` for trees the decoder under the same
    /// configuration would reject; the offset is relative to the object.
    pub fn write_object<B: BufMut>(&self, object: &StreamObject, out: &mut B) -> StreamResult<()> {
        self.check_depth(object, 0, 0)?;
        self.write_nested(object, out)
    }

    /// Encoded size of `object` and all of its descendants.
    pub fn encoded_len(&self, object: &StreamObject) -> StreamResult<usize> {
        self.check_depth(object, 0, 0)?;
        self.measure(object)
    }

    fn write_nested<B: BufMut>(&self, object: &StreamObject, out: &mut B) -> StreamResult<()> {
        match object {
            StreamObject::Leaf(leaf) => {
                let type_tag = leaf.kind().type_tag();
                let length = leaf.fields_len();
                StreamObjectHeader::single(type_tag, length as u64)?.encode(out);
                leaf.encode_fields(out);
                trace!(type_tag, length, "encoded stream object");
            }
            StreamObject::Unknown(unknown) => {
                check_unregistered(unknown)?;
                StreamObjectHeader::single(unknown.type_tag, unknown.payload.len() as u64)?.encode(out);
                out.put_slice(&unknown.payload);
                trace!(type_tag = unknown.type_tag, length = unknown.payload.len(), "encoded unknown stream object");
            }
            StreamObject::Container(container) => self.write_container(container, out)?,
        }
        Ok(())
    }

    fn write_container<B: BufMut>(&self, container: &ContainerObject, out: &mut B) -> StreamResult<()> {
        let type_tag = container.kind().type_tag();

        let mut body = BytesMut::with_capacity(container.fields_len());
        container.encode_fields(&mut body);
        for child in container.children() {
            self.write_nested(child, &mut body)?;
        }

        let length = self.declared_len(container, body.len());
        StreamObjectHeader::start(type_tag, length as u64)?.encode(out);
        out.put_slice(&body);
        StreamObjectHeader::end(type_tag)?.encode(out);

        trace!(
            type_tag,
            length,
            children = container.children().len(),
            "encoded stream object container"
        );
        Ok(())
    }

    fn measure(&self, object: &StreamObject) -> StreamResult<usize> {
        match object {
            StreamObject::Leaf(leaf) => {
                let length = leaf.fields_len();
                let header = StreamObjectHeader::single(leaf.kind().type_tag(), length as u64)?;
                Ok(header.encoded_len() + length)
            }
            StreamObject::Unknown(unknown) => {
                check_unregistered(unknown)?;
                let length = unknown.payload.len();
                let header = StreamObjectHeader::single(unknown.type_tag, length as u64)?;
                Ok(header.encoded_len() + length)
            }
            StreamObject::Container(container) => {
                let (start_len, body) = self.container_frame(container)?;
                let end = StreamObjectHeader::end(container.kind().type_tag())?;
                Ok(start_len + body + end.encoded_len())
            }
        }
    }

    /// Start header size and body size (own fields plus children) of `container`.
    fn container_frame(&self, container: &ContainerObject) -> StreamResult<(usize, usize)> {
        let mut body = container.fields_len();
        for child in container.children() {
            body += self.measure(child)?;
        }
        let declared = self.declared_len(container, body) as u64;
        let start = StreamObjectHeader::start(container.kind().type_tag(), declared)?;
        Ok((start.encoded_len(), body))
    }

    /// Reject containers nested at or past `max_depth`, the same limit the
    /// decoder applies. `offset` is where `object` starts in the output.
    fn check_depth(&self, object: &StreamObject, depth: usize, offset: usize) -> StreamResult<()> {
        let StreamObject::Container(container) = object else {
            return Ok(());
        };
        if depth >= self.config.max_depth {
            return Err(StreamError::NestingTooDeep {
                offset,
                max_depth: self.config.max_depth,
            });
        }
        if !container.children().iter().any(StreamObject::is_container) {
            return Ok(());
        }

        let (start_len, _) = self.container_frame(container)?;
        let mut child_offset = offset + start_len + container.fields_len();
        for child in container.children() {
            self.check_depth(child, depth + 1, child_offset)?;
            child_offset += self.measure(child)?;
        }
        Ok(())
    }

    /// Length written into a container's Start header, given its body size.
    fn declared_len(&self, container: &ContainerObject, body_len: usize) -> usize {
        match self.config.container_length {
            ContainerLength::Extent => body_len,
            ContainerLength::OwnFields => container.fields_len(),
        }
    }
}

/// An unknown object reusing a registered tag would decode as something else.
fn check_unregistered(unknown: &UnknownObject) -> StreamResult<()> {
    match registry::lookup(unknown.type_tag) {
        Lookup::Unknown(_) => Ok(()),
        _ => Err(StreamError::InvalidTypeTag {
            type_tag: unknown.type_tag,
            reason: format!(
                "registered as {}, not usable for an unknown object",
                registry::type_name(unknown.type_tag)
            ),
        }),
    }
}
