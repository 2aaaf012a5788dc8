//! The opaque value element and raw payload mapping.
//!
//! Fields do not interpret the values they carry; they only classify, order,
//! and serialize them. `Value` enumerates the kinds the codec knows how to
//! round-trip: JSON-like scalars, chrono temporal types, tuples, and
//! references to external entities.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// A single opaque value carried by a field or payload entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(DateTime<Utc>),
    /// Fixed-shape grouping, preserved distinctly from plain sequences.
    Tuple(Vec<Value>),
    /// Reference to an external entity, resolved at the codec boundary.
    Entity { kind: String, id: String },
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn entity(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Value::Entity {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// The textual content, when this value is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::Time(t) => write!(f, "{t}"),
            Value::DateTime(dt) => write!(f, "{dt}"),
            Value::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            Value::Entity { kind, id } => write!(f, "{kind}({id})"),
        }
    }
}

/// The raw input mapping a form is built from.
///
/// Every entry is an ordered sequence of values; a scalar payload entry is a
/// one-element sequence. Field origins are extracted from here by source key
/// at bind time and classified by length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload(BTreeMap<String, Vec<Value>>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert for declaring payloads inline.
    pub fn with(mut self, name: impl Into<String>, values: Vec<Value>) -> Self {
        self.insert(name, values);
        self
    }

    /// Builder-style insert of a single textual value.
    pub fn with_text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(name, vec![Value::Text(value.into())])
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<Value>) {
        self.0.insert(name.into(), values);
    }

    pub fn get(&self, name: &str) -> Option<&[Value]> {
        self.0.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
