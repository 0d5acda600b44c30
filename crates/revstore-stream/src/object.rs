use serde::{Deserialize, Serialize};

use crate::header::Compound;
use crate::registry::{ContainerObject, LeafObject, Record};

/// A node in a decoded stream object tree.
///
/// The tree is owned top-down: containers own their children, and a child's
/// bytes always lie strictly inside its parent's, so there are no cycles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamObject {
    /// A registered single record.
    Leaf(LeafObject),
    /// A registered container with its children.
    Container(ContainerObject),
    /// A single record with an unregistered type tag, kept verbatim.
    Unknown(UnknownObject),
}

/// Opaque payload of a single object the registry does not know.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownObject {
    pub type_tag: u16,
    /// Payload bytes exactly as declared by the header.
    pub payload: Vec<u8>,
}

impl StreamObject {
    pub fn type_tag(&self) -> u16 {
        match self {
            Self::Leaf(leaf) => leaf.kind().type_tag(),
            Self::Container(container) => container.kind().type_tag(),
            Self::Unknown(unknown) => unknown.type_tag,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Leaf(leaf) => leaf.kind().name(),
            Self::Container(container) => container.kind().name(),
            Self::Unknown(_) => "Unknown",
        }
    }

    /// Compound flag this object is written with.
    pub fn compound(&self) -> Compound {
        match self {
            Self::Container(_) => Compound::Start,
            Self::Leaf(_) | Self::Unknown(_) => Compound::Single,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Self::Container(_))
    }

    /// Direct children. Empty for single records.
    pub fn children(&self) -> &[StreamObject] {
        match self {
            Self::Container(container) => container.children(),
            Self::Leaf(_) | Self::Unknown(_) => &[],
        }
    }

    /// Borrow as a specific record type.
    pub fn get<T: Record>(&self) -> Option<&T> {
        T::from_object_ref(self)
    }

    /// Convert into a specific record type, handing the object back on mismatch.
    pub fn into_record<T: Record>(self) -> Result<T, StreamObject> {
        T::from_object(self)
    }

    /// Depth-first, pre-order walk over this object and all descendants.
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    /// Every record of type `T` in this subtree, in stream order.
    pub fn find_all<'a, T: Record + 'a>(&'a self) -> impl Iterator<Item = &'a T> + 'a {
        self.iter().filter_map(T::from_object_ref)
    }
}

impl From<UnknownObject> for StreamObject {
    fn from(unknown: UnknownObject) -> Self {
        Self::Unknown(unknown)
    }
}

/// Pre-order iterator returned by [`StreamObject::iter`].
pub struct Iter<'a> {
    stack: Vec<&'a StreamObject>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a StreamObject;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children().iter().rev());
        Some(next)
    }
}
