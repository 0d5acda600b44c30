//! Primitive wire values for revision-store stream objects.
//!
//! Every stream object payload is built from a small set of scalar building
//! blocks. This crate provides their codecs, the bounds-checked [`Cursor`]
//! they read from, and the [`WireValue`] trait that ties them together.
//!
//! # Key Types
//!
//! - [`CompactU64`] - self-describing variable-width unsigned integer
//! - [`BinaryItem`] - length-prefixed opaque bytes
//! - [`StringItem`] - length-prefixed UTF-16 string
//! - [`Guid`] - 16-byte GUID in Windows wire layout
//! - [`ExGuid`] - GUID-scoped integer with four compact forms
//! - [`SerialNumber`] - GUID-scoped 64-bit counter
//! - [`CellId`] - pair of extended GUIDs
//!
//! Counted arrays of any of these are plain `Vec<T>`: a [`CompactU64`]
//! count followed by the elements.

pub mod binary;
pub mod compact;
pub mod cursor;
pub mod error;
pub mod extended;
pub mod guid;
pub mod serial;
pub mod wire;

pub use binary::{BinaryItem, StringItem};
pub use compact::CompactU64;
pub use cursor::Cursor;
pub use error::{PrimitiveError, PrimitiveResult};
pub use extended::{CellId, ExGuid};
pub use guid::Guid;
pub use serial::SerialNumber;
pub use wire::WireValue;
