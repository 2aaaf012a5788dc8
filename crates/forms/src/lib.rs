//! Field resolution engine and form orchestrator.
//!
//! A form declares a set of named fields; building it against a raw payload
//! produces fresh field instances that run the match → suggest → validate
//! pipeline. Schemas are immutable templates ([`FormSchema`]), instances are
//! per-turn state ([`FormInstance`]), and matching/suggestion/narrowing
//! behavior is injected through the [`Matcher`]/[`Suggester`]/[`Chooser`]
//! strategy traits.

pub mod field;
pub mod form;
pub mod group;
pub mod registry;
pub mod schema;
pub mod strategy;

pub use field::{DialogField, FieldKind, OverrideField};
pub use form::{FormInstance, Outcome};
pub use group::GroupField;
pub use registry::FormRegistry;
pub use schema::{FieldValidator, FormField, FormSchema, FormSchemaBuilder, FormValidator};
pub use strategy::{Chooser, FormContext, Matcher, Suggester};
