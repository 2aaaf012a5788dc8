//! History over real forms: append a handled form, reload the log, and get
//! the same resolved values back, across memory and file stores.

use serde_json::json;
use slotform_core::{FormError, PassthroughResolver, Payload, Value};
use slotform_forms::{DialogField, FormContext, FormRegistry, FormSchema};
use slotform_history::{Event, History, HistoryManager, HistoryStore, JsonFileStore, MemoryStore};
use std::sync::Arc;

fn texts(items: &[&str]) -> Vec<Value> {
    items.iter().map(|s| Value::from(*s)).collect()
}

fn suggest_names(_: &DialogField, _: &FormContext<'_>) -> Result<Vec<Value>, FormError> {
    Ok(texts(&["TTT", "HHH"]))
}

fn choose_first(candidates: &[Value]) -> Vec<Value> {
    candidates.first().cloned().into_iter().collect()
}

fn match_lastnames(
    _: &slotform_core::FieldValue,
    _: &FormContext<'_>,
) -> Result<Vec<Value>, FormError> {
    Ok(texts(&["1", "3"]))
}

fn registry() -> FormRegistry {
    let schema: Arc<FormSchema> = FormSchema::builder("tests.SimpleForm")
        .field(
            "name",
            DialogField::new("name")
                .suggester(suggest_names)
                .chooser(choose_first),
        )
        .field("lastnames", DialogField::list("some").matcher(match_lastnames))
        .finish();
    let mut registry = FormRegistry::new();
    registry.register(schema);
    registry
}

fn handled_form(registry: &FormRegistry) -> slotform_forms::FormInstance {
    let mut form = registry.get("tests.SimpleForm").unwrap().build(
        Payload::new()
            .with_text("name", "Vasia")
            .with("some", texts(&["1"])),
        Vec::new(),
    );
    form.match_fields().unwrap();
    form.suggest().unwrap();
    form
}

#[test]
fn appended_form_is_readable_from_the_event() {
    let registry = registry();
    let mut history = History::load(
        Box::new(MemoryStore::new()),
        &registry,
        &PassthroughResolver,
    )
    .unwrap();

    history
        .append(Event::new("test").form(handled_form(&registry)).render("testing"))
        .unwrap();

    assert_eq!(history.len(), 1);
    let form = history.first().unwrap().form.as_ref().unwrap();
    assert_eq!(form.get("name").unwrap().get_value(), &texts(&["TTT"])[..]);
}

#[test]
fn reloaded_history_restores_the_form_through_the_registry() {
    let registry = registry();
    let store = MemoryStore::new();
    let handle = store.handle();

    let mut history = History::load(Box::new(store), &registry, &PassthroughResolver).unwrap();
    history
        .append(
            Event::new("test")
                .form(handled_form(&registry))
                .priorities(json!({"test": 1}))
                .render("testing"),
        )
        .unwrap();

    let raw = handle.lock().unwrap().clone();
    let reloaded = History::load(
        Box::new(MemoryStore::seeded(raw)),
        &registry,
        &PassthroughResolver,
    )
    .unwrap();

    assert_eq!(reloaded.len(), 1);
    let event = reloaded.first().unwrap();
    assert_eq!(event.name, "test");
    assert_eq!(event.render.as_deref(), Some("testing"));
    let form = event.form.as_ref().unwrap();
    assert_eq!(form.get("name").unwrap().get_value(), &texts(&["TTT"])[..]);
    assert_eq!(
        form.get("lastnames").unwrap().get_value(),
        &texts(&["1", "3"])[..]
    );
}

#[test]
fn file_store_carries_history_across_instances() {
    let registry = registry();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dialog").join("history.json");

    let mut history = History::load(
        Box::new(JsonFileStore::new(&path)),
        &registry,
        &PassthroughResolver,
    )
    .unwrap();
    assert!(history.is_empty());
    history
        .append(Event::new("test").form(handled_form(&registry)).render("testing"))
        .unwrap();

    let reloaded = History::load(
        Box::new(JsonFileStore::new(&path)),
        &registry,
        &PassthroughResolver,
    )
    .unwrap();
    assert_eq!(reloaded.len(), 1);
    let form = reloaded.first().unwrap().form.as_ref().unwrap();
    assert_eq!(form.get("name").unwrap().get_value(), &texts(&["TTT"])[..]);
}

#[test]
fn manager_keeps_generations_apart() {
    let registry = registry();
    let old = MemoryStore::seeded(json!([
        {"name": "a", "timestamp": 1},
        {"name": "b", "timestamp": 2},
    ]));

    let mut mgr = HistoryManager::load(
        Box::new(MemoryStore::new()),
        Some(Box::new(old) as Box<dyn HistoryStore>),
        &registry,
        &PassthroughResolver,
    )
    .unwrap();

    mgr.append(Event::new("test").form(handled_form(&registry)).render("testing"))
        .unwrap();
    assert_eq!(mgr.all().len(), 1);
    assert_eq!(mgr.old().unwrap().len(), 2);
    assert_eq!(
        mgr.first()
            .unwrap()
            .form
            .as_ref()
            .unwrap()
            .get("name")
            .unwrap()
            .get_value(),
        &texts(&["TTT"])[..]
    );
}
