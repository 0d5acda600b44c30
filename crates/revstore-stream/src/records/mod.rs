//! Concrete stream object record types.
//!
//! Field layouts follow MS-FSSHTTPB section 2.2. Fields are decoded and
//! encoded in declaration order, so adding a record kind is a matter of
//! listing its fields here and registering its type tag in
//! [`registry`](crate::registry).

/// Declare a single (non-container) record whose payload is the listed
/// fields, each a [`WireValue`](revstore_types::WireValue), in order.
macro_rules! record {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $(#[$fmeta:meta])* pub $field:ident : $ty:ty, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, ::serde::Serialize, ::serde::Deserialize)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $ty, )*
        }

        impl $crate::registry::Fields for $name {
            #[allow(unused_variables)]
            fn decode_fields(
                cursor: &mut ::revstore_types::Cursor<'_>,
            ) -> ::revstore_types::PrimitiveResult<Self> {
                Ok(Self {
                    $( $field: <$ty as ::revstore_types::WireValue>::decode(cursor)?, )*
                })
            }

            #[allow(unused_variables)]
            fn encode_fields<B: ::bytes::BufMut>(&self, out: &mut B) {
                $( ::revstore_types::WireValue::encode(&self.$field, out); )*
            }

            fn fields_len(&self) -> usize {
                0 $( + ::revstore_types::WireValue::encoded_len(&self.$field) )*
            }
        }
    };
}

/// Declare a container record: its own fields, followed on the wire by
/// nested stream objects up to the matching End header.
macro_rules! container_record {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $(#[$fmeta:meta])* pub $field:ident : $ty:ty, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, ::serde::Serialize, ::serde::Deserialize)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $ty, )*
            /// Nested stream objects in stream order.
            #[serde(default)]
            pub children: Vec<$crate::object::StreamObject>,
        }

        impl $crate::registry::Fields for $name {
            #[allow(unused_variables)]
            fn decode_fields(
                cursor: &mut ::revstore_types::Cursor<'_>,
            ) -> ::revstore_types::PrimitiveResult<Self> {
                Ok(Self {
                    $( $field: <$ty as ::revstore_types::WireValue>::decode(cursor)?, )*
                    children: Vec::new(),
                })
            }

            #[allow(unused_variables)]
            fn encode_fields<B: ::bytes::BufMut>(&self, out: &mut B) {
                $( ::revstore_types::WireValue::encode(&self.$field, out); )*
            }

            fn fields_len(&self) -> usize {
                0 $( + ::revstore_types::WireValue::encoded_len(&self.$field) )*
            }
        }

        impl $crate::registry::Container for $name {
            fn children(&self) -> &[$crate::object::StreamObject] {
                &self.children
            }

            fn children_mut(&mut self) -> &mut Vec<$crate::object::StreamObject> {
                &mut self.children
            }
        }
    };
}

mod container;
mod hash;
mod leaf;

pub use container::*;
pub use hash::DataElementHash;
pub use leaf::*;
