//! Form registry — stable names to schemas.
//!
//! Deserialized forms are resolved through an explicit registry populated at
//! process start: every form type that must be restorable registers its
//! schema under the name it serializes with. No lookup by reflection.

use crate::form::FormInstance;
use crate::schema::FormSchema;
use slotform_core::codec::EntityResolver;
use slotform_core::{FormError, Payload, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Registry mapping a stable string key to a form schema.
#[derive(Debug, Default)]
pub struct FormRegistry {
    schemas: HashMap<String, Arc<FormSchema>>,
}

impl FormRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema under its own name.
    pub fn register(&mut self, schema: Arc<FormSchema>) {
        info!(form = %schema.name(), "Registered form schema");
        self.schemas.insert(schema.name().to_string(), schema);
    }

    /// Get a schema by name.
    pub fn get(&self, name: &str) -> Option<&Arc<FormSchema>> {
        self.schemas.get(name)
    }

    /// List all registered schema names.
    pub fn list(&self) -> Vec<String> {
        self.schemas.keys().cloned().collect()
    }

    /// Number of registered schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Rebuild a form from its serialized shape: resolve the stored name to
    /// a schema, build an empty instance, and restore its state.
    pub fn restore(
        &self,
        data: &serde_json::Value,
        resolver: &dyn EntityResolver,
    ) -> Result<FormInstance> {
        let name = data
            .get("name")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| FormError::UnknownForm("<missing name>".to_string()))?;
        let schema = self
            .get(name)
            .ok_or_else(|| FormError::UnknownForm(name.to_string()))?;
        let mut form = schema.build(Payload::new(), Vec::new());
        form.deserialize(data, resolver)?;
        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::DialogField;
    use slotform_core::{Error, PassthroughResolver, Value};

    fn schema(name: &str) -> Arc<FormSchema> {
        FormSchema::builder(name)
            .field("name", DialogField::new("name"))
            .finish()
    }

    #[test]
    fn empty_registry() {
        let reg = FormRegistry::new();
        assert!(reg.is_empty());
        assert_eq!(reg.len(), 0);
    }

    #[test]
    fn register_and_list() {
        let mut reg = FormRegistry::new();
        reg.register(schema("booking.BookingForm"));
        reg.register(schema("booking.CancelForm"));

        assert_eq!(reg.len(), 2);
        assert!(reg.get("booking.BookingForm").is_some());
        assert!(reg.get("other").is_none());
        assert!(reg.list().contains(&"booking.CancelForm".to_string()));
    }

    #[test]
    fn restore_round_trips_a_form() {
        let mut reg = FormRegistry::new();
        reg.register(schema("tests.Simple"));

        let form = reg
            .get("tests.Simple")
            .unwrap()
            .build(Payload::new().with_text("name", "Vasia"), Vec::new());
        let data = form.serialize();

        let restored = reg.restore(&data, &PassthroughResolver).unwrap();
        assert_eq!(restored.name(), "tests.Simple");
        assert_eq!(
            restored.get("name").unwrap().origin().values(),
            &[Value::from("Vasia")][..]
        );
    }

    #[test]
    fn restore_fails_for_unknown_form() {
        let reg = FormRegistry::new();
        let data = serde_json::json!({"name": "tests.Missing"});
        let err = reg.restore(&data, &PassthroughResolver).unwrap_err();
        assert!(matches!(err, Error::Form(FormError::UnknownForm(name)) if name == "tests.Missing"));
    }
}
