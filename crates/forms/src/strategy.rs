//! Strategy seams for field behavior.
//!
//! Fields hold ordered collections of these trait objects instead of baking
//! behavior in: a [`Matcher`] canonicalizes a field's origin, a [`Suggester`]
//! proposes candidates when nothing matched, and a [`Chooser`] narrows an
//! ambiguous multi-valued suggestion. Plain functions and closures implement
//! the traits directly through the blanket impls.

use crate::field::DialogField;
use slotform_core::{FieldValue, FormError, Payload, Value};
use std::collections::BTreeMap;

/// Immutable view of the form handed to strategies.
///
/// Carries the raw payload plus a snapshot of every field's currently
/// resolved value, rebuilt before each field's pipeline step so strategies
/// observe all previously resolved fields.
pub struct FormContext<'a> {
    payload: &'a Payload,
    values: BTreeMap<String, FieldValue>,
}

impl<'a> FormContext<'a> {
    pub fn new(payload: &'a Payload, values: BTreeMap<String, FieldValue>) -> Self {
        Self { payload, values }
    }

    pub fn payload(&self) -> &Payload {
        self.payload
    }

    /// The named field's current value; `Empty` for unknown fields.
    pub fn value(&self, name: &str) -> &FieldValue {
        self.values.get(name).unwrap_or(&FieldValue::Empty)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }
}

/// Deterministic extraction of a canonical value from a field's origin.
pub trait Matcher: Send + Sync {
    fn run(&self, origin: &FieldValue, ctx: &FormContext<'_>) -> Result<Vec<Value>, FormError>;
}

impl<F> Matcher for F
where
    F: Fn(&FieldValue, &FormContext<'_>) -> Result<Vec<Value>, FormError> + Send + Sync,
{
    fn run(&self, origin: &FieldValue, ctx: &FormContext<'_>) -> Result<Vec<Value>, FormError> {
        self(origin, ctx)
    }
}

/// Proposes candidate values for a field; an empty result means nothing to
/// suggest and the next suggester is tried.
pub trait Suggester: Send + Sync {
    fn run(&self, field: &DialogField, ctx: &FormContext<'_>) -> Result<Vec<Value>, FormError>;
}

impl<F> Suggester for F
where
    F: Fn(&DialogField, &FormContext<'_>) -> Result<Vec<Value>, FormError> + Send + Sync,
{
    fn run(&self, field: &DialogField, ctx: &FormContext<'_>) -> Result<Vec<Value>, FormError> {
        self(field, ctx)
    }
}

/// Narrows a multi-valued suggestion. A chooser wins when its output is
/// non-empty and strictly shorter than its input; an empty result defers to
/// the next chooser.
pub trait Chooser: Send + Sync {
    fn run(&self, candidates: &[Value]) -> Vec<Value>;
}

impl<F> Chooser for F
where
    F: Fn(&[Value]) -> Vec<Value> + Send + Sync,
{
    fn run(&self, candidates: &[Value]) -> Vec<Value> {
        self(candidates)
    }
}
