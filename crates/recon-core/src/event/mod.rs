//! Journal append-only de la corrida.

mod store;
mod types;

pub use store::{write_jsonl, EventStore, InMemoryEventStore};
pub use types::{RunEvent, RunEventKind};
