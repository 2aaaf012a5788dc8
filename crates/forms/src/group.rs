//! A group of alternative fields behind one external name.
//!
//! Exactly one child is "selected" after matching; every external read
//! delegates to it. Selection order: first child whose match succeeds, else
//! the first child that has payload data, else the first declared child.

use crate::field::{DialogField, OverrideField};
use crate::strategy::FormContext;
use slotform_core::codec::EntityResolver;
use slotform_core::{CodecError, FieldValue, FormError, Payload, Value};
use serde_json::json;
use std::fmt;
use tracing::debug;

#[derive(Clone)]
pub struct GroupField {
    children: Vec<DialogField>,
    selected: Option<usize>,
}

impl GroupField {
    pub fn new(children: Vec<DialogField>) -> Self {
        Self {
            children,
            selected: None,
        }
    }

    pub fn children(&self) -> &[DialogField] {
        &self.children
    }

    /// The currently selected child, if matching has run.
    pub fn selected(&self) -> Option<&DialogField> {
        self.selected.map(|i| &self.children[i])
    }

    /// Scan children in declared order: the first successful match wins;
    /// otherwise fall back to the first child with data, then the first
    /// declared child.
    pub fn run_match(&mut self, ctx: &FormContext<'_>) -> Result<(), FormError> {
        let mut first_with_origin = None;
        for i in 0..self.children.len() {
            if self.children[i].origin().is_empty() {
                continue;
            }
            if first_with_origin.is_none() {
                first_with_origin = Some(i);
            }
            self.children[i].run_match(ctx)?;
            if !self.children[i].matched().is_empty() {
                debug!(source = %self.children[i].source(), "group selected matched child");
                self.selected = Some(i);
                return Ok(());
            }
        }
        if let Some(i) = first_with_origin {
            debug!(source = %self.children[i].source(), "group selected first child with data");
            self.selected = Some(i);
        } else if !self.children.is_empty() {
            debug!(source = %self.children[0].source(), "group selected first declared child");
            self.selected = Some(0);
        }
        Ok(())
    }

    /// Delegate suggestion to the selected child; `Empty` when none.
    pub fn run_suggest(&mut self, ctx: &FormContext<'_>) -> Result<FieldValue, FormError> {
        match self.selected {
            Some(i) => self.children[i].run_suggest(ctx),
            None => Ok(FieldValue::Empty),
        }
    }

    pub fn value(&self) -> &FieldValue {
        self.selected()
            .map(DialogField::value)
            .unwrap_or(&FieldValue::Empty)
    }

    pub fn get_value(&self) -> &[Value] {
        self.value().values()
    }

    pub fn origin(&self) -> &FieldValue {
        self.selected()
            .map(DialogField::origin)
            .unwrap_or(&FieldValue::Empty)
    }

    pub fn matched(&self) -> &FieldValue {
        self.selected()
            .map(DialogField::matched)
            .unwrap_or(&FieldValue::Empty)
    }

    pub fn suggested(&self) -> &FieldValue {
        self.selected()
            .map(DialogField::suggested)
            .unwrap_or(&FieldValue::Empty)
    }

    /// The selected child's source key.
    pub fn source(&self) -> Option<&str> {
        self.selected().map(DialogField::source)
    }

    /// Bind every child against the payload; selection resets.
    pub fn bind(
        &self,
        payload: &Payload,
        overrides: &[OverrideField],
        skip_payload: bool,
    ) -> GroupField {
        GroupField {
            children: self
                .children
                .iter()
                .map(|child| child.bind(payload, overrides, skip_payload))
                .collect(),
            selected: None,
        }
    }

    /// Emit `selected_field` plus the selected child's own serialize output,
    /// flattened into one object. An unselected group serializes empty.
    pub fn serialize(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        if let Some(child) = self.selected() {
            map.insert("selected_field".into(), json!(child.source()));
            if let serde_json::Value::Object(child_map) = child.serialize() {
                map.extend(child_map);
            }
        }
        serde_json::Value::Object(map)
    }

    /// Re-select the stored child by source key and restore its state.
    pub fn deserialize(
        &mut self,
        data: &serde_json::Value,
        resolver: &dyn EntityResolver,
    ) -> Result<(), CodecError> {
        let Some(selected_source) = data.get("selected_field").and_then(serde_json::Value::as_str)
        else {
            return Ok(());
        };
        if let Some(i) = self
            .children
            .iter()
            .position(|child| child.source() == selected_source)
        {
            self.children[i].deserialize(data, resolver)?;
            self.selected = Some(i);
        }
        Ok(())
    }
}

impl fmt::Debug for GroupField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupField")
            .field("children", &self.children)
            .field("selected", &self.source())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotform_core::PassthroughResolver;
    use std::collections::BTreeMap;

    fn ctx(payload: &Payload) -> FormContext<'_> {
        FormContext::new(payload, BTreeMap::new())
    }

    fn texts(items: &[&str]) -> Vec<Value> {
        items.iter().map(|s| Value::from(*s)).collect()
    }

    fn group(children: Vec<DialogField>, payload: &Payload) -> GroupField {
        GroupField::new(children).bind(payload, &[], false)
    }

    #[test]
    fn first_child_with_data_is_selected_without_matchers() {
        let payload = Payload::new().with_text("f2", "33");
        let mut gp = group(
            vec![DialogField::new("f1"), DialogField::new("f2")],
            &payload,
        );
        gp.run_match(&ctx(&payload)).unwrap();
        assert_eq!(gp.source(), Some("f2"));
        assert!(gp.value().is_empty());
        assert_eq!(gp.origin().values(), &texts(&["33"])[..]);
    }

    #[test]
    fn matched_child_wins_over_earlier_child_with_data() {
        fn match_ok(origin: &FieldValue, _: &FormContext<'_>) -> Result<Vec<Value>, FormError> {
            Ok(origin.values().to_vec())
        }

        let payload = Payload::new().with_text("f1", "22").with_text("f2", "33");
        let mut gp = group(
            vec![DialogField::new("f1"), DialogField::new("f2").matcher(match_ok)],
            &payload,
        );
        gp.run_match(&ctx(&payload)).unwrap();
        assert_eq!(gp.source(), Some("f2"));
        assert_eq!(gp.get_value(), &texts(&["33"])[..]);
    }

    #[test]
    fn first_declared_child_is_last_resort() {
        let payload = Payload::new();
        let mut gp = group(
            vec![DialogField::new("f1"), DialogField::new("f2")],
            &payload,
        );
        gp.run_match(&ctx(&payload)).unwrap();
        assert_eq!(gp.source(), Some("f1"));
        assert!(gp.origin().is_empty());
    }

    #[test]
    fn empty_group_selects_nothing() {
        let payload = Payload::new();
        let mut gp = group(vec![], &payload);
        gp.run_match(&ctx(&payload)).unwrap();
        assert!(gp.source().is_none());
        assert!(gp.value().is_empty());
    }

    #[test]
    fn suggest_without_selection_is_empty() {
        let payload = Payload::new();
        let mut gp = group(vec![DialogField::new("f1")], &payload);
        let result = gp.run_suggest(&ctx(&payload)).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn suggest_delegates_to_selected_child() {
        fn suggest_pair(_: &DialogField, _: &FormContext<'_>) -> Result<Vec<Value>, FormError> {
            Ok(texts(&["3", "1"]))
        }
        fn choose_first(candidates: &[Value]) -> Vec<Value> {
            candidates.first().cloned().into_iter().collect()
        }

        let payload = Payload::new().with_text("f1", "22");
        let mut gp = group(
            vec![
                DialogField::new("f1").suggester(suggest_pair).chooser(choose_first),
                DialogField::new("f2"),
            ],
            &payload,
        );
        gp.run_match(&ctx(&payload)).unwrap();
        gp.run_suggest(&ctx(&payload)).unwrap();
        assert_eq!(gp.get_value(), &texts(&["3"])[..]);
    }

    #[test]
    fn serialize_round_trip_restores_selection() {
        let payload = Payload::new().with_text("f2", "33");
        let mut gp = group(
            vec![DialogField::new("f1"), DialogField::new("f2")],
            &payload,
        );
        gp.run_match(&ctx(&payload)).unwrap();

        let data = gp.serialize();
        assert_eq!(data["selected_field"], "f2");

        let mut restored = GroupField::new(vec![DialogField::new("f1"), DialogField::new("f2")])
            .bind(&Payload::new(), &[], false);
        restored.deserialize(&data, &PassthroughResolver).unwrap();
        assert_eq!(restored.source(), Some("f2"));
        assert_eq!(restored.origin().values(), &texts(&["33"])[..]);
    }

    #[test]
    fn unselected_group_serializes_empty() {
        let payload = Payload::new();
        let gp = group(vec![DialogField::new("f1")], &payload);
        assert_eq!(gp.serialize(), json!({}));
    }
}
