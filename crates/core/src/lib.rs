//! Core domain types for the slotform dialog engine.
//!
//! This crate holds the leaves of the dependency graph: the opaque [`Value`]
//! element type and raw [`Payload`] mapping, the [`FieldValue`] classification
//! enum, the type-preserving JSON codec, and the error taxonomy shared by the
//! `slotform-forms` and `slotform-history` crates.

pub mod codec;
pub mod error;
pub mod field_value;
pub mod value;

pub use codec::{EntityResolver, PassthroughResolver};
pub use error::{CodecError, Error, FormError, HistoryError, Result};
pub use field_value::FieldValue;
pub use value::{Payload, Value};
