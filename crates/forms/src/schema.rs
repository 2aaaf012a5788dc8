//! Immutable form schemas.
//!
//! A schema declares the named fields of a form once, at startup, together
//! with its validation hooks. It is never mutated: `build` allocates fresh
//! field instances bound to a payload, which is the only way a
//! [`FormInstance`] comes into existence.

use crate::field::{DialogField, OverrideField};
use crate::form::FormInstance;
use crate::group::GroupField;
use crate::strategy::FormContext;
use slotform_core::codec::EntityResolver;
use slotform_core::{CodecError, FieldValue, FormError, Payload, Value};
use std::fmt;
use std::sync::Arc;

/// A field declaration or instance as held by a form: either a single slot
/// or a group of alternatives.
#[derive(Clone, Debug)]
pub enum FormField {
    Field(DialogField),
    Group(GroupField),
}

impl FormField {
    pub fn run_match(&mut self, ctx: &FormContext<'_>) -> Result<(), FormError> {
        match self {
            FormField::Field(field) => field.run_match(ctx),
            FormField::Group(group) => group.run_match(ctx),
        }
    }

    pub fn run_suggest(&mut self, ctx: &FormContext<'_>) -> Result<FieldValue, FormError> {
        match self {
            FormField::Field(field) => field.run_suggest(ctx),
            FormField::Group(group) => group.run_suggest(ctx),
        }
    }

    pub fn value(&self) -> &FieldValue {
        match self {
            FormField::Field(field) => field.value(),
            FormField::Group(group) => group.value(),
        }
    }

    pub fn get_value(&self) -> &[Value] {
        self.value().values()
    }

    pub fn origin(&self) -> &FieldValue {
        match self {
            FormField::Field(field) => field.origin(),
            FormField::Group(group) => group.origin(),
        }
    }

    pub fn matched(&self) -> &FieldValue {
        match self {
            FormField::Field(field) => field.matched(),
            FormField::Group(group) => group.matched(),
        }
    }

    pub fn suggested(&self) -> &FieldValue {
        match self {
            FormField::Field(field) => field.suggested(),
            FormField::Group(group) => group.suggested(),
        }
    }

    /// The slot's source key; a group delegates to its selected child.
    pub fn source(&self) -> Option<&str> {
        match self {
            FormField::Field(field) => Some(field.source()),
            FormField::Group(group) => group.source(),
        }
    }

    pub fn exclude(&self) -> Option<&FieldValue> {
        match self {
            FormField::Field(field) => field.exclude(),
            FormField::Group(_) => None,
        }
    }

    /// Whether form-level suggestion skips this field when its origin is empty.
    pub fn is_optional(&self) -> bool {
        match self {
            FormField::Field(field) => field.is_optional(),
            FormField::Group(_) => false,
        }
    }

    pub fn bind(
        &self,
        payload: &Payload,
        overrides: &[OverrideField],
        skip_payload: bool,
    ) -> FormField {
        match self {
            FormField::Field(field) => FormField::Field(field.bind(payload, overrides, skip_payload)),
            FormField::Group(group) => FormField::Group(group.bind(payload, overrides, skip_payload)),
        }
    }

    pub fn serialize(&self) -> serde_json::Value {
        match self {
            FormField::Field(field) => field.serialize(),
            FormField::Group(group) => group.serialize(),
        }
    }

    pub fn deserialize(
        &mut self,
        data: &serde_json::Value,
        resolver: &dyn EntityResolver,
    ) -> Result<(), CodecError> {
        match self {
            FormField::Field(field) => field.deserialize(data, resolver),
            FormField::Group(group) => group.deserialize(data, resolver),
        }
    }
}

impl From<DialogField> for FormField {
    fn from(field: DialogField) -> Self {
        FormField::Field(field)
    }
}

impl From<GroupField> for FormField {
    fn from(group: GroupField) -> Self {
        FormField::Group(group)
    }
}

/// Per-field validation hook, run for each field during full validation and
/// for the suggesting field alone when a suggestion interrupts the pipeline.
pub trait FieldValidator: Send + Sync {
    fn validate(&self, name: &str, field: &FormField, ctx: &FormContext<'_>)
    -> Result<(), FormError>;
}

impl<F> FieldValidator for F
where
    F: Fn(&str, &FormField, &FormContext<'_>) -> Result<(), FormError> + Send + Sync,
{
    fn validate(
        &self,
        name: &str,
        field: &FormField,
        ctx: &FormContext<'_>,
    ) -> Result<(), FormError> {
        self(name, field, ctx)
    }
}

/// Form-level validation rule. Mandatory: running full validation on a form
/// whose schema has no validator is a misuse error.
pub trait FormValidator: Send + Sync {
    fn validate(&self, form: &FormInstance) -> Result<(), FormError>;
}

impl<F> FormValidator for F
where
    F: Fn(&FormInstance) -> Result<(), FormError> + Send + Sync,
{
    fn validate(&self, form: &FormInstance) -> Result<(), FormError> {
        self(form)
    }
}

/// Immutable template for a form: name, declared fields, validation hooks.
pub struct FormSchema {
    name: String,
    fields: Vec<(String, FormField)>,
    field_validator: Option<Arc<dyn FieldValidator>>,
    form_validator: Option<Arc<dyn FormValidator>>,
}

impl FormSchema {
    /// Start declaring a schema under a stable registry name.
    pub fn builder(name: impl Into<String>) -> FormSchemaBuilder {
        FormSchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
            field_validator: None,
            form_validator: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub(crate) fn field_validator(&self) -> Option<&Arc<dyn FieldValidator>> {
        self.field_validator.as_ref()
    }

    pub(crate) fn form_validator(&self) -> Option<&Arc<dyn FormValidator>> {
        self.form_validator.as_ref()
    }

    /// Bind every declared field against a payload, optionally suppressing
    /// the payload lookup for one named field.
    pub(crate) fn bind_fields(
        &self,
        payload: &Payload,
        overrides: &[OverrideField],
        skip_payload_for: Option<&str>,
    ) -> Vec<(String, FormField)> {
        self.fields
            .iter()
            .map(|(name, def)| {
                let skip = skip_payload_for == Some(name.as_str());
                (name.clone(), def.bind(payload, overrides, skip))
            })
            .collect()
    }

    /// Allocate a fresh form instance bound to the payload. The only way a
    /// form comes into existence; the schema itself is never mutated.
    pub fn build(
        self: &Arc<Self>,
        payload: Payload,
        overrides: Vec<OverrideField>,
    ) -> FormInstance {
        FormInstance::new(Arc::clone(self), payload, overrides)
    }
}

impl fmt::Debug for FormSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormSchema")
            .field("name", &self.name)
            .field("fields", &self.field_names().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

pub struct FormSchemaBuilder {
    name: String,
    fields: Vec<(String, FormField)>,
    field_validator: Option<Arc<dyn FieldValidator>>,
    form_validator: Option<Arc<dyn FormValidator>>,
}

impl FormSchemaBuilder {
    /// Declare a field under its external name. Declaration order is the
    /// pipeline's scan order.
    pub fn field(mut self, name: impl Into<String>, def: impl Into<FormField>) -> Self {
        self.fields.push((name.into(), def.into()));
        self
    }

    pub fn field_validator(mut self, validator: impl FieldValidator + 'static) -> Self {
        self.field_validator = Some(Arc::new(validator));
        self
    }

    pub fn validator(mut self, validator: impl FormValidator + 'static) -> Self {
        self.form_validator = Some(Arc::new(validator));
        self
    }

    pub fn finish(self) -> Arc<FormSchema> {
        Arc::new(FormSchema {
            name: self.name,
            fields: self.fields,
            field_validator: self.field_validator,
            form_validator: self.form_validator,
        })
    }
}
