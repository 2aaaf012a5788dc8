//! Generation pairing: a writable young history over an optional frozen old
//! one. All mutation and the common queries go to the young generation; the
//! old one is reachable for explicit archaeology.

use crate::event::Event;
use crate::history::History;
use crate::store::HistoryStore;
use slotform_core::codec::EntityResolver;
use slotform_core::Result;
use slotform_forms::FormRegistry;

#[derive(Debug)]
pub struct HistoryManager {
    young: History,
    old: Option<History>,
}

impl HistoryManager {
    /// Load the young generation, and the old one frozen when a second
    /// store is given.
    pub fn load(
        young: Box<dyn HistoryStore>,
        old: Option<Box<dyn HistoryStore>>,
        registry: &FormRegistry,
        resolver: &dyn EntityResolver,
    ) -> Result<Self> {
        Ok(Self {
            young: History::load(young, registry, resolver)?,
            old: old
                .map(|store| History::load_frozen(store, registry, resolver))
                .transpose()?,
        })
    }

    pub fn young(&self) -> &History {
        &self.young
    }

    pub fn old(&self) -> Option<&History> {
        self.old.as_ref()
    }

    pub fn old_mut(&mut self) -> Option<&mut History> {
        self.old.as_mut()
    }

    pub fn append(&mut self, event: Event) -> Result<()> {
        self.young.append(event)
    }

    pub fn first(&self) -> Option<&Event> {
        self.young.first()
    }

    pub fn last(&self) -> Option<&Event> {
        self.young.last()
    }

    pub fn group_by_name(&self, name: &str, reverse: bool) -> Vec<&Event> {
        self.young.group_by_name(name, reverse)
    }

    pub fn by_name(&self, name: &str) -> Option<&Event> {
        self.young.by_name(name)
    }

    pub fn all(&self) -> &[Event] {
        self.young.all()
    }

    pub fn iter_from_begin(&self) -> Vec<&Event> {
        self.young.iter_from_begin()
    }

    pub fn iter_from_end(&self) -> Vec<&Event> {
        self.young.iter_from_end()
    }

    pub fn iter_from_begin_by_name(&self, name: &str) -> Vec<&Event> {
        self.young.iter_from_begin_by_name(name)
    }

    pub fn iter_from_end_by_name(&self, name: &str) -> Vec<&Event> {
        self.young.iter_from_end_by_name(name)
    }
}
