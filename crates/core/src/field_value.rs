//! Classified field values.
//!
//! Every field slot (`origin`, `matched`, `suggested`) holds a [`FieldValue`]:
//! an ordered sequence of opaque values tagged by cardinality and by whether
//! it came through the suggestion path. Classification is pure; absent or
//! empty input always degrades to `Empty` rather than erroring.

use crate::value::Value;
use std::fmt;

/// A classified, immutable sequence of field values.
///
/// `Single` structurally wraps exactly one element, so the multi-element
/// single value is unrepresentable. A suggested result with exactly one
/// element is an ordinary `Single`: the suggestion tag only matters for
/// multi-valued candidates that still need narrowing.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Empty,
    Single(Value),
    Multi(Vec<Value>),
    SuggestedList(Vec<Value>),
}

impl FieldValue {
    /// Classify a plain (non-suggested) sequence.
    pub fn new(mut values: Vec<Value>) -> Self {
        match values.len() {
            0 => FieldValue::Empty,
            1 => FieldValue::Single(values.remove(0)),
            _ => FieldValue::Multi(values),
        }
    }

    /// Classify a sequence produced by the suggestion path.
    pub fn suggested(mut values: Vec<Value>) -> Self {
        match values.len() {
            0 => FieldValue::Empty,
            1 => FieldValue::Single(values.remove(0)),
            _ => FieldValue::SuggestedList(values),
        }
    }

    /// The canonical empty value.
    pub fn empty() -> Self {
        FieldValue::Empty
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Empty)
    }

    pub fn is_single(&self) -> bool {
        matches!(self, FieldValue::Single(_))
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, FieldValue::Multi(_))
    }

    pub fn is_suggested(&self) -> bool {
        matches!(self, FieldValue::SuggestedList(_))
    }

    /// The wrapped sequence; empty slice for `Empty`.
    pub fn values(&self) -> &[Value] {
        match self {
            FieldValue::Empty => &[],
            FieldValue::Single(v) => std::slice::from_ref(v),
            FieldValue::Multi(vs) | FieldValue::SuggestedList(vs) => vs,
        }
    }

    pub fn into_values(self) -> Vec<Value> {
        match self {
            FieldValue::Empty => Vec::new(),
            FieldValue::Single(v) => vec![v],
            FieldValue::Multi(vs) | FieldValue::SuggestedList(vs) => vs,
        }
    }

    pub fn len(&self) -> usize {
        self.values().len()
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Empty
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.values().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, "]")
    }
}
