//! A single history event: one handled dialog turn.

use chrono::Utc;
use serde_json::json;
use slotform_core::codec::EntityResolver;
use slotform_core::Result;
use slotform_forms::{FormInstance, FormRegistry};
use std::fmt;
use tracing::warn;
use uuid::Uuid;

/// One recorded turn: the intent name, the form after handling, the
/// prioritization data that drove the turn, and what was rendered back.
#[derive(Clone, Debug)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub form: Option<FormInstance>,
    pub priorities: Option<serde_json::Value>,
    pub render: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Event {
    /// A fresh event stamped with the current time.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            form: None,
            priorities: None,
            render: None,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn form(mut self, form: FormInstance) -> Self {
        self.form = Some(form);
        self
    }

    pub fn priorities(mut self, priorities: serde_json::Value) -> Self {
        self.priorities = Some(priorities);
        self
    }

    pub fn render(mut self, render: impl Into<String>) -> Self {
        self.render = Some(render.into());
        self
    }

    /// Wire shape of the event. An event without a form stores `{}` in the
    /// `form` slot.
    pub fn to_json(&self) -> serde_json::Value {
        let form = self
            .form
            .as_ref()
            .map(FormInstance::serialize)
            .unwrap_or_else(|| json!({}));
        json!({
            "id": self.id,
            "name": self.name,
            "form": form,
            "priorities": self.priorities,
            "render": self.render,
            "timestamp": self.timestamp,
        })
    }

    /// Rebuild an event from its wire shape. Events missing a name or
    /// timestamp are logged and dropped (`Ok(None)`); a stored form that no
    /// longer resolves against the registry is an error.
    pub fn from_json(
        data: &serde_json::Value,
        registry: &FormRegistry,
        resolver: &dyn EntityResolver,
    ) -> Result<Option<Event>> {
        let (Some(name), Some(timestamp)) = (
            data.get("name").and_then(serde_json::Value::as_str),
            data.get("timestamp").and_then(serde_json::Value::as_i64),
        ) else {
            warn!(event = %data, "Skipping malformed history event");
            return Ok(None);
        };
        let form = match data.get("form") {
            Some(stored) if stored.as_object().is_some_and(|map| !map.is_empty()) => {
                Some(registry.restore(stored, resolver)?)
            }
            _ => None,
        };
        Ok(Some(Event {
            id: data
                .get("id")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: name.to_string(),
            form,
            priorities: data.get("priorities").filter(|p| !p.is_null()).cloned(),
            render: data
                .get("render")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string),
            timestamp,
        }))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event {} ({}) at {}", self.name, self.id, self.timestamp)?;
        if let Some(form) = &self.form {
            write!(f, " form {form}")?;
        }
        if let Some(render) = &self.render {
            write!(f, " render {render}")?;
        }
        Ok(())
    }
}
