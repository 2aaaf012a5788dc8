//! Dialog history — an append-only event log with generations.
//!
//! Every handled turn is recorded as an [`Event`]: the intent name, the form
//! after handling, the render result, and a millisecond timestamp. Events
//! live in a [`History`] backed by a pluggable [`HistoryStore`]; the
//! [`HistoryManager`] pairs a writable "young" history with an optional
//! frozen "old" generation.

pub mod event;
pub mod history;
pub mod manager;
pub mod store;

pub use event::Event;
pub use history::History;
pub use manager::HistoryManager;
pub use store::{HistoryStore, JsonFileStore, MemoryStore};
