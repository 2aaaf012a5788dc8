//! The form orchestrator.
//!
//! A [`FormInstance`] runs the whole-field pipeline: match every field,
//! find the first field that needs clarification, validate. It is rebuilt,
//! never patched, when a field's payload-derived state must be re-derived
//! (`clean_field_data`).

use crate::field::OverrideField;
use crate::schema::{FormField, FormSchema};
use crate::strategy::FormContext;
use slotform_core::codec::{self, EntityResolver};
use slotform_core::{Error, FieldValue, FormError, Payload, Result, Value};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of handling a form for one dialog turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// One field needs clarification from the user; no other field was
    /// validated. Look the field up by name on the form to render the
    /// question.
    Suggestion { field: String },
    /// Every field resolved and the whole form validated.
    Complete,
}

/// A payload-bound form: fresh field instances plus the accumulated
/// overrides, created through [`FormSchema::build`].
#[derive(Clone)]
pub struct FormInstance {
    schema: Arc<FormSchema>,
    payload: Payload,
    overrides: Vec<OverrideField>,
    fields: Vec<(String, FormField)>,
}

impl FormInstance {
    pub(crate) fn new(
        schema: Arc<FormSchema>,
        payload: Payload,
        overrides: Vec<OverrideField>,
    ) -> Self {
        let fields = schema.bind_fields(&payload, &overrides, None);
        Self {
            schema,
            payload,
            overrides,
            fields,
        }
    }

    pub fn schema(&self) -> &Arc<FormSchema> {
        &self.schema
    }

    pub fn name(&self) -> &str {
        self.schema.name()
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    fn snapshot(fields: &[(String, FormField)]) -> BTreeMap<String, FieldValue> {
        fields
            .iter()
            .map(|(name, field)| (name.clone(), field.value().clone()))
            .collect()
    }

    /// Run every field's match in declaration order.
    pub fn match_fields(&mut self) -> Result<()> {
        info!(form = %self.schema.name(), "matching form");
        for i in 0..self.fields.len() {
            let ctx = FormContext::new(&self.payload, Self::snapshot(&self.fields));
            self.fields[i].1.run_match(&ctx)?;
        }
        Ok(())
    }

    /// Scan fields in declaration order for the first one that needs
    /// clarification: its suggest result is empty (nothing known, must ask)
    /// or still an ambiguous suggested list. Optional fields without payload
    /// data are skipped. At most one field actively suggests per call.
    pub fn suggest(&mut self) -> Result<Option<String>> {
        info!(form = %self.schema.name(), "suggesting form");
        for i in 0..self.fields.len() {
            let (name, field) = &self.fields[i];
            if field.is_optional() && field.origin().is_empty() {
                debug!(field = %name, "skipping empty optional field");
                continue;
            }
            let ctx = FormContext::new(&self.payload, Self::snapshot(&self.fields));
            let result = self.fields[i].1.run_suggest(&ctx)?;
            if result.is_empty() || result.is_suggested() {
                let name = self.fields[i].0.clone();
                debug!(field = %name, "field needs clarification");
                return Ok(Some(name));
            }
        }
        Ok(None)
    }

    /// Run one field's suggest directly, outside the form-level scan.
    pub fn suggest_by_field(&mut self, name: &str) -> Result<FieldValue> {
        let i = self
            .fields
            .iter()
            .position(|(field_name, _)| field_name == name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        let ctx = FormContext::new(&self.payload, Self::snapshot(&self.fields));
        self.fields[i].1.run_suggest(&ctx).map_err(Error::from)
    }

    /// The full pipeline for one turn: match, then suggest; a suggestion is
    /// validated alone and returned without touching other fields, otherwise
    /// the whole form is validated. The pipeline never validates a form that
    /// still has an open clarification question.
    pub fn handle(&mut self) -> Result<Outcome> {
        self.match_fields()?;
        if let Some(name) = self.suggest()? {
            self.validate_field(&name)?;
            return Ok(Outcome::Suggestion { field: name });
        }
        self.validate()?;
        Ok(Outcome::Complete)
    }

    /// Validate every field, then the mandatory form-level rule.
    pub fn validate(&self) -> Result<()> {
        for (name, _) in &self.fields {
            self.validate_field(name)?;
        }
        let validator = self
            .schema
            .form_validator()
            .ok_or_else(|| FormError::MissingValidator {
                form: self.schema.name().to_string(),
            })?;
        validator.validate(self).map_err(Error::from)
    }

    /// Run the per-field validation hook for one field, when configured.
    pub fn validate_field(&self, name: &str) -> Result<()> {
        let Some(validator) = self.schema.field_validator() else {
            return Ok(());
        };
        let field = self
            .get(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        let ctx = FormContext::new(&self.payload, Self::snapshot(&self.fields));
        validator.validate(name, field, &ctx).map_err(Error::from)
    }

    /// Merge in new overrides and rebuild the entire field set from the
    /// stored payload, suppressing the named field's payload lookup. All
    /// prior match/suggest state is discarded and recomputed.
    pub fn clean_field_data(&mut self, name: &str, overrides: Vec<OverrideField>) {
        info!(form = %self.schema.name(), field = %name, "rebuilding form without field payload");
        self.overrides.extend(overrides);
        self.fields = self
            .schema
            .bind_fields(&self.payload, &self.overrides, Some(name));
    }

    pub fn get(&self, name: &str) -> Option<&FormField> {
        self.fields
            .iter()
            .find(|(field_name, _)| field_name == name)
            .map(|(_, field)| field)
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// The external name of the field currently answering for `source`.
    pub fn name_by_source(&self, source: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(_, field)| field.source() == Some(source))
            .map(|(name, _)| name.as_str())
    }

    /// A field's exclusion marker; `Empty` when unset so callers never see
    /// an absent value.
    pub fn get_exclude(&self, name: &str) -> FieldValue {
        self.get(name)
            .and_then(FormField::exclude)
            .cloned()
            .unwrap_or(FieldValue::Empty)
    }

    /// Snapshot of every field's resolved value sequence.
    pub fn to_map(&self) -> BTreeMap<String, Vec<Value>> {
        self.fields
            .iter()
            .map(|(name, field)| (name.clone(), field.get_value().to_vec()))
            .collect()
    }

    /// Whole-form wire shape: `{name, payload, fields}`.
    pub fn serialize(&self) -> serde_json::Value {
        let mut fields = serde_json::Map::new();
        for (name, field) in &self.fields {
            fields.insert(name.clone(), field.serialize());
        }
        json!({
            "name": self.schema.name(),
            "payload": codec::encode_payload(&self.payload),
            "fields": fields,
        })
    }

    /// Restore payload and field state from serialized data. Fields are
    /// rebuilt from the restored payload without applying overrides, then
    /// each field's state is replaced from the stored data. Accumulated
    /// overrides are kept and take effect again on the next rebuild.
    pub fn deserialize(
        &mut self,
        data: &serde_json::Value,
        resolver: &dyn EntityResolver,
    ) -> Result<()> {
        let raw_payload = data.get("payload").cloned().unwrap_or_else(|| json!({}));
        self.payload = codec::decode_payload(&raw_payload, resolver).map_err(Error::from)?;
        self.fields = self.schema.bind_fields(&self.payload, &[], None);
        if let Some(serde_json::Value::Object(stored)) = data.get("fields") {
            for (name, field) in &mut self.fields {
                if let Some(field_data) = stored.get(name.as_str()) {
                    field.deserialize(field_data, resolver).map_err(Error::from)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for FormInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormInstance")
            .field("name", &self.schema.name())
            .field("values", &self.to_map())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for FormInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?}", self.schema.name(), self.to_map())
    }
}
