//! One generation of dialog history.

use crate::event::Event;
use crate::store::HistoryStore;
use slotform_core::codec::EntityResolver;
use slotform_core::{HistoryError, Result};
use slotform_forms::FormRegistry;
use std::fmt;
use tracing::info;

/// An event log over a persistence store.
///
/// Events are parsed and timestamp-sorted once at load; appends go to the
/// end and flush the whole log back to the store. A frozen history rejects
/// appends with [`HistoryError::ReadOnly`].
pub struct History {
    events: Vec<Event>,
    store: Box<dyn HistoryStore>,
    read_only: bool,
}

impl History {
    /// Load a writable history from its store.
    pub fn load(
        store: Box<dyn HistoryStore>,
        registry: &FormRegistry,
        resolver: &dyn EntityResolver,
    ) -> Result<Self> {
        Self::load_inner(store, registry, resolver, false)
    }

    /// Load a frozen history: readable, but every append fails.
    pub fn load_frozen(
        store: Box<dyn HistoryStore>,
        registry: &FormRegistry,
        resolver: &dyn EntityResolver,
    ) -> Result<Self> {
        Self::load_inner(store, registry, resolver, true)
    }

    fn load_inner(
        store: Box<dyn HistoryStore>,
        registry: &FormRegistry,
        resolver: &dyn EntityResolver,
        read_only: bool,
    ) -> Result<Self> {
        let raw = store.load()?;
        let mut events = Vec::new();
        if let serde_json::Value::Array(items) = raw {
            for item in &items {
                if let Some(event) = Event::from_json(item, registry, resolver)? {
                    events.push(event);
                }
            }
        }
        events.sort_by_key(|event| event.timestamp);
        Ok(Self {
            events,
            store,
            read_only,
        })
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Append an event and flush the log to the store.
    pub fn append(&mut self, event: Event) -> Result<()> {
        if self.read_only {
            return Err(HistoryError::ReadOnly.into());
        }
        info!(%event, "New event added to history");
        self.events.push(event);
        self.store.save(&self.to_json())?;
        Ok(())
    }

    /// The earliest-appended event.
    pub fn first(&self) -> Option<&Event> {
        self.events.first()
    }

    /// The latest-appended event.
    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    /// All events with the given name, timestamp-sorted.
    pub fn group_by_name(&self, name: &str, reverse: bool) -> Vec<&Event> {
        let mut filtered: Vec<&Event> = self
            .events
            .iter()
            .filter(|event| event.name == name)
            .collect();
        if reverse {
            filtered.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        } else {
            filtered.sort_by_key(|event| event.timestamp);
        }
        filtered
    }

    /// The newest event with the given name.
    pub fn by_name(&self, name: &str) -> Option<&Event> {
        self.group_by_name(name, false).pop()
    }

    /// Every event in insertion order.
    pub fn all(&self) -> &[Event] {
        &self.events
    }

    /// Events oldest first by timestamp.
    pub fn iter_from_begin(&self) -> Vec<&Event> {
        let mut sorted: Vec<&Event> = self.events.iter().collect();
        sorted.sort_by_key(|event| event.timestamp);
        sorted
    }

    /// Events newest first by timestamp.
    pub fn iter_from_end(&self) -> Vec<&Event> {
        let mut sorted: Vec<&Event> = self.events.iter().collect();
        sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        sorted
    }

    /// Named events oldest first.
    pub fn iter_from_begin_by_name(&self, name: &str) -> Vec<&Event> {
        self.group_by_name(name, false)
    }

    /// Named events newest first.
    pub fn iter_from_end_by_name(&self, name: &str) -> Vec<&Event> {
        self.group_by_name(name, true)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The whole log in wire shape: a JSON array of events.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.events.iter().map(Event::to_json).collect())
    }
}

impl fmt::Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("events", &self.events.len())
            .field("read_only", &self.read_only)
            .finish_non_exhaustive()
    }
}
