//! A single named slot and the per-field pipeline.
//!
//! A [`DialogField`] is declared once as part of a schema and bound fresh per
//! form build: `bind` clones the static config, extracts the origin from the
//! payload, and applies any matching overrides. Pipeline state (`origin`,
//! `matched`, `suggested`) never leaks between builds.

use crate::strategy::{Chooser, FormContext, Matcher, Suggester};
use slotform_core::codec::{self, EntityResolver};
use slotform_core::{CodecError, FieldValue, FormError, Payload, Value};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Behavioral variant of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Ordinary slot: matcher must produce a single value.
    Standard,
    /// Accepts multi-valued matches; a non-empty origin takes precedence
    /// over the suggested-list tagging.
    List,
    /// Skipped by form-level suggestion when its origin is empty.
    Optional,
}

/// One named slot with its matching/suggestion/narrowing configuration and
/// pipeline state.
#[derive(Clone)]
pub struct DialogField {
    source: String,
    kind: FieldKind,
    matcher: Option<Arc<dyn Matcher>>,
    suggesters: Vec<Arc<dyn Suggester>>,
    choosers: Vec<Arc<dyn Chooser>>,
    exclude: Option<FieldValue>,
    origin: FieldValue,
    matched: FieldValue,
    suggested: FieldValue,
}

impl DialogField {
    pub fn new(source: impl Into<String>) -> Self {
        Self::with_kind(source, FieldKind::Standard)
    }

    pub fn list(source: impl Into<String>) -> Self {
        Self::with_kind(source, FieldKind::List)
    }

    pub fn optional(source: impl Into<String>) -> Self {
        Self::with_kind(source, FieldKind::Optional)
    }

    fn with_kind(source: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            source: source.into(),
            kind,
            matcher: None,
            suggesters: Vec::new(),
            choosers: Vec::new(),
            exclude: None,
            origin: FieldValue::Empty,
            matched: FieldValue::Empty,
            suggested: FieldValue::Empty,
        }
    }

    pub fn matcher(mut self, matcher: impl Matcher + 'static) -> Self {
        self.matcher = Some(Arc::new(matcher));
        self
    }

    pub fn suggester(mut self, suggester: impl Suggester + 'static) -> Self {
        self.suggesters.push(Arc::new(suggester));
        self
    }

    pub fn chooser(mut self, chooser: impl Chooser + 'static) -> Self {
        self.choosers.push(Arc::new(chooser));
        self
    }

    pub fn with_exclude(mut self, exclude: FieldValue) -> Self {
        self.exclude = Some(exclude);
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn is_optional(&self) -> bool {
        self.kind == FieldKind::Optional
    }

    pub fn origin(&self) -> &FieldValue {
        &self.origin
    }

    pub fn matched(&self) -> &FieldValue {
        &self.matched
    }

    pub fn suggested(&self) -> &FieldValue {
        &self.suggested
    }

    pub fn exclude(&self) -> Option<&FieldValue> {
        self.exclude.as_ref()
    }

    /// The field's resolved value: suggestion shadows match.
    pub fn value(&self) -> &FieldValue {
        if !self.suggested.is_empty() {
            &self.suggested
        } else if !self.matched.is_empty() {
            &self.matched
        } else {
            &FieldValue::Empty
        }
    }

    /// The exact value sequence of the field.
    pub fn get_value(&self) -> &[Value] {
        self.value().values()
    }

    /// Run the configured matcher against a non-empty origin.
    ///
    /// A matcher returning more than one value fails with
    /// [`FormError::MultiValuedMatch`] unless the field is a list.
    pub fn run_match(&mut self, ctx: &FormContext<'_>) -> Result<(), FormError> {
        debug!(source = %self.source, origin = %self.origin, "matching field");
        let Some(matcher) = &self.matcher else {
            return Ok(());
        };
        if self.origin.is_empty() {
            return Ok(());
        }
        let raw = matcher.run(&self.origin, ctx)?;
        if self.kind != FieldKind::List && raw.len() > 1 {
            return Err(FormError::MultiValuedMatch {
                field: self.source.clone(),
            });
        }
        self.matched = FieldValue::new(raw);
        debug!(source = %self.source, matched = %self.matched, "field matched");
        Ok(())
    }

    /// Run suggesters in order; the first non-empty result wins. An ambiguous
    /// multi-valued candidate is narrowed by the choosers before being stored.
    pub fn run_suggest(&mut self, ctx: &FormContext<'_>) -> Result<FieldValue, FormError> {
        debug!(source = %self.source, "suggesting field");
        for i in 0..self.suggesters.len() {
            let raw = self.suggesters[i].run(self, ctx)?;
            if raw.is_empty() {
                continue;
            }
            let mut candidate = self.to_suggested(raw.clone());
            if candidate.is_suggested() {
                if let Some(chosen) = self.choose(&raw) {
                    candidate = self.to_suggested(chosen);
                }
            }
            debug!(source = %self.source, suggested = %candidate, "field suggested");
            self.suggested = candidate.clone();
            return Ok(candidate);
        }
        debug!(source = %self.source, "nothing to suggest");
        Ok(FieldValue::Empty)
    }

    /// First chooser whose non-empty output is strictly shorter than the
    /// candidate list wins.
    fn choose(&self, candidates: &[Value]) -> Option<Vec<Value>> {
        for chooser in &self.choosers {
            let chosen = chooser.run(candidates);
            if !chosen.is_empty() && chosen.len() < candidates.len() {
                debug!(source = %self.source, count = chosen.len(), "chooser narrowed suggestion");
                return Some(chosen);
            }
        }
        None
    }

    fn to_suggested(&self, values: Vec<Value>) -> FieldValue {
        // A list field with payload data keeps plain classification: the
        // origin takes precedence over the suggested-list tagging.
        if self.kind == FieldKind::List && !self.origin.is_empty() {
            FieldValue::new(values)
        } else {
            FieldValue::suggested(values)
        }
    }

    /// Produce a fresh payload-bound instance of this definition.
    pub fn bind(
        &self,
        payload: &Payload,
        overrides: &[OverrideField],
        skip_payload: bool,
    ) -> DialogField {
        let mut field = self.clone();
        field.origin = FieldValue::Empty;
        field.matched = FieldValue::Empty;
        field.suggested = FieldValue::Empty;
        if !skip_payload {
            field.origin =
                FieldValue::new(payload.get(&self.source).map(<[Value]>::to_vec).unwrap_or_default());
        }
        field.apply_overrides(overrides);
        field
    }

    /// Replace suggesters/choosers/exclude wholesale from every override
    /// matching this field's source. The matcher is never overridden.
    fn apply_overrides(&mut self, overrides: &[OverrideField]) {
        for override_field in overrides.iter().filter(|o| o.source == self.source) {
            if let Some(suggesters) = &override_field.suggesters {
                self.suggesters = suggesters.clone();
            }
            if let Some(choosers) = &override_field.choosers {
                self.choosers = choosers.clone();
            }
            if let Some(exclude) = &override_field.exclude {
                self.exclude = Some(exclude.clone());
            }
        }
    }

    pub fn serialize(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert("source".into(), json!(self.source));
        map.insert("origin".into(), codec::encode_values(self.origin.values()));
        map.insert("matched".into(), codec::encode_values(self.matched.values()));
        map.insert(
            "suggested".into(),
            codec::encode_values(self.suggested.values()),
        );
        if let Some(exclude) = &self.exclude {
            map.insert("exclude".into(), codec::encode_values(exclude.values()));
        }
        serde_json::Value::Object(map)
    }

    /// Replace state wholesale from serialized data; does not merge.
    pub fn deserialize(
        &mut self,
        data: &serde_json::Value,
        resolver: &dyn EntityResolver,
    ) -> Result<(), CodecError> {
        if let Some(source) = data.get("source").and_then(serde_json::Value::as_str) {
            self.source = source.to_string();
        }
        self.origin = Self::decode_state(data, "origin", resolver)?;
        self.matched = Self::decode_state(data, "matched", resolver)?;
        self.suggested = Self::decode_state(data, "suggested", resolver)?;
        if let Some(raw) = data.get("exclude") {
            self.exclude = Some(FieldValue::new(codec::decode_values(raw, resolver)?));
        }
        Ok(())
    }

    fn decode_state(
        data: &serde_json::Value,
        key: &str,
        resolver: &dyn EntityResolver,
    ) -> Result<FieldValue, CodecError> {
        match data.get(key) {
            Some(raw) => Ok(FieldValue::new(codec::decode_values(raw, resolver)?)),
            None => Ok(FieldValue::Empty),
        }
    }
}

/// Identity is the slot name, not the value.
impl PartialEq for DialogField {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Debug for DialogField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogField")
            .field("source", &self.source)
            .field("kind", &self.kind)
            .field("origin", &self.origin)
            .field("matched", &self.matched)
            .field("suggested", &self.suggested)
            .finish_non_exhaustive()
    }
}

/// A patch record applied to a matching field during bind.
///
/// `source` identifies the target field; suggesters, choosers, and the
/// exclude marker are replaced wholesale when present.
#[derive(Clone, Default)]
pub struct OverrideField {
    source: String,
    suggesters: Option<Vec<Arc<dyn Suggester>>>,
    choosers: Option<Vec<Arc<dyn Chooser>>>,
    exclude: Option<FieldValue>,
}

impl OverrideField {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    pub fn suggester(mut self, suggester: impl Suggester + 'static) -> Self {
        self.suggesters
            .get_or_insert_with(Vec::new)
            .push(Arc::new(suggester));
        self
    }

    pub fn chooser(mut self, chooser: impl Chooser + 'static) -> Self {
        self.choosers
            .get_or_insert_with(Vec::new)
            .push(Arc::new(chooser));
        self
    }

    pub fn exclude(mut self, exclude: FieldValue) -> Self {
        self.exclude = Some(exclude);
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for OverrideField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverrideField")
            .field("source", &self.source)
            .finish_non_exhaustive()
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

    fn match_ttt(_: &FieldValue, _: &FormContext<'_>) -> Result<Vec<Value>, FormError> {
        Ok(texts(&["TTT"]))
    }

    fn match_many(_: &FieldValue, _: &FormContext<'_>) -> Result<Vec<Value>, FormError> {
        Ok(texts(&["1", "3"]))
    }

    fn suggest_pair(_: &DialogField, _: &FormContext<'_>) -> Result<Vec<Value>, FormError> {
        Ok(texts(&["3", "1"]))
    }

    fn choose_first(candidates: &[Value]) -> Vec<Value> {
        candidates.first().cloned().into_iter().collect()
    }

    #[test]
    fn match_requires_matcher_and_origin() {
        let payload = Payload::new();
        let mut field = DialogField::new("name").bind(&payload, &[], false);
        field.run_match(&ctx(&payload)).unwrap();
        assert!(field.matched().is_empty());

        // Matcher configured but origin empty: still nothing.
        let mut field = DialogField::new("name")
            .matcher(match_ttt)
            .bind(&payload, &[], false);
        field.run_match(&ctx(&payload)).unwrap();
        assert!(field.matched().is_empty());
    }

    #[test]
    fn match_wraps_result_as_single() {
        let payload = Payload::new().with_text("name", "Vasia");
        let mut field = DialogField::new("name")
            .matcher(match_ttt)
            .bind(&payload, &[], false);
        field.run_match(&ctx(&payload)).unwrap();
        assert_eq!(field.get_value(), &texts(&["TTT"])[..]);
    }

    #[test]
    fn multi_valued_match_fails_on_standard_field() {
        let payload = Payload::new().with_text("name", "Vasia");
        let mut field = DialogField::new("name")
            .matcher(match_many)
            .bind(&payload, &[], false);
        let err = field.run_match(&ctx(&payload)).unwrap_err();
        assert!(matches!(err, FormError::MultiValuedMatch { field } if field == "name"));
    }

    #[test]
    fn list_field_accepts_multi_valued_match() {
        let payload = Payload::new().with("some", texts(&["1"]));
        let mut field = DialogField::list("some")
            .matcher(match_many)
            .bind(&payload, &[], false);
        field.run_match(&ctx(&payload)).unwrap();
        assert_eq!(field.get_value(), &texts(&["1", "3"])[..]);
    }

    #[test]
    fn suggest_then_choose_narrows_candidates() {
        let payload = Payload::new();
        let mut field = DialogField::new("name")
            .suggester(suggest_pair)
            .chooser(choose_first)
            .bind(&payload, &[], false);
        let result = field.run_suggest(&ctx(&payload)).unwrap();
        assert!(result.is_single());
        assert_eq!(field.get_value(), &texts(&["3"])[..]);
    }

    #[test]
    fn suggestion_without_chooser_stays_suggested() {
        let payload = Payload::new();
        let mut field = DialogField::new("name")
            .suggester(suggest_pair)
            .bind(&payload, &[], false);
        let result = field.run_suggest(&ctx(&payload)).unwrap();
        assert!(result.is_suggested());
        assert_eq!(field.get_value(), &texts(&["3", "1"])[..]);
    }

    #[test]
    fn losing_chooser_keeps_candidates_whole() {
        fn choose_everything(candidates: &[Value]) -> Vec<Value> {
            candidates.to_vec()
        }
        let payload = Payload::new();
        let mut field = DialogField::new("name")
            .suggester(suggest_pair)
            .chooser(choose_everything)
            .bind(&payload, &[], false);
        let result = field.run_suggest(&ctx(&payload)).unwrap();
        assert!(result.is_suggested());
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn list_field_with_origin_tags_suggestion_plain() {
        let payload = Payload::new().with("some", texts(&["1"]));
        let mut field = DialogField::list("some")
            .suggester(suggest_pair)
            .bind(&payload, &[], false);
        let result = field.run_suggest(&ctx(&payload)).unwrap();
        assert!(result.is_multi());
        assert!(!result.is_suggested());
    }

    #[test]
    fn suggestion_shadows_match() {
        fn suggest_one(_: &DialogField, _: &FormContext<'_>) -> Result<Vec<Value>, FormError> {
            Ok(texts(&["suggested"]))
        }
        let payload = Payload::new().with_text("name", "Vasia");
        let mut field = DialogField::new("name")
            .matcher(match_ttt)
            .suggester(suggest_one)
            .bind(&payload, &[], false);
        field.run_match(&ctx(&payload)).unwrap();
        field.run_suggest(&ctx(&payload)).unwrap();
        assert_eq!(field.get_value(), &texts(&["suggested"])[..]);
    }

    #[test]
    fn bind_fills_origin_unless_skipped() {
        let payload = Payload::new().with_text("name", "Vasia");
        let def = DialogField::new("name");

        let bound = def.bind(&payload, &[], false);
        assert_eq!(bound.origin().values(), &texts(&["Vasia"])[..]);

        let skipped = def.bind(&payload, &[], true);
        assert!(skipped.origin().is_empty());
    }

    #[test]
    fn override_replaces_suggesters_wholesale() {
        fn base(_: &DialogField, _: &FormContext<'_>) -> Result<Vec<Value>, FormError> {
            Ok(texts(&["a"]))
        }
        fn patched(_: &DialogField, _: &FormContext<'_>) -> Result<Vec<Value>, FormError> {
            Ok(texts(&["12", "34", "55"]))
        }

        let payload = Payload::new();
        let overrides = [OverrideField::new("name").suggester(patched)];
        let mut field = DialogField::new("name")
            .suggester(base)
            .chooser(choose_first)
            .bind(&payload, &overrides, false);
        field.run_suggest(&ctx(&payload)).unwrap();
        // Base chooser survived the override and narrowed the new candidates.
        assert_eq!(field.get_value(), &texts(&["12"])[..]);
    }

    #[test]
    fn override_for_other_source_is_ignored() {
        fn base(_: &DialogField, _: &FormContext<'_>) -> Result<Vec<Value>, FormError> {
            Ok(texts(&["a"]))
        }
        fn patched(_: &DialogField, _: &FormContext<'_>) -> Result<Vec<Value>, FormError> {
            Ok(texts(&["b"]))
        }

        let payload = Payload::new();
        let overrides = [OverrideField::new("other").suggester(patched)];
        let mut field = DialogField::new("name")
            .suggester(base)
            .bind(&payload, &overrides, false);
        field.run_suggest(&ctx(&payload)).unwrap();
        assert_eq!(field.get_value(), &texts(&["a"])[..]);
    }

    #[test]
    fn serialize_round_trip_replaces_state() {
        let payload = Payload::new().with("some", texts(&["1"]));
        let mut field = DialogField::list("some")
            .matcher(match_many)
            .bind(&payload, &[], false);
        field.run_match(&ctx(&payload)).unwrap();

        let data = field.serialize();
        let mut restored = DialogField::list("some").bind(&Payload::new(), &[], false);
        restored.deserialize(&data, &PassthroughResolver).unwrap();
        assert_eq!(restored.origin().values(), field.origin().values());
        assert_eq!(restored.get_value(), field.get_value());
    }

    #[test]
    fn exclude_is_serialized_when_present() {
        let payload = Payload::new();
        let field = DialogField::new("name")
            .with_exclude(FieldValue::new(texts(&["x"])))
            .bind(&payload, &[], false);
        let data = field.serialize();
        assert!(data.get("exclude").is_some());

        let bare = DialogField::new("name").bind(&payload, &[], false);
        assert!(bare.serialize().get("exclude").is_none());
    }

    #[test]
    fn equality_is_by_source() {
        let a = DialogField::new("name");
        let b = DialogField::new("name").matcher(match_ttt);
        let c = DialogField::new("other");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
