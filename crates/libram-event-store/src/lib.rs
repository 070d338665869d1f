//! Event store implementations for the Libram book catalog.
//!
//! `PgEventStore` is the production store; `MemoryEventStore` backs tests
//! and single-process runs with the same contract.

pub mod memory_event_store;
pub mod pg_event_store;
pub mod schema;

pub use memory_event_store::MemoryEventStore;
pub use pg_event_store::PgEventStore;
