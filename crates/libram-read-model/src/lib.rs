//! Read side of the Libram catalog.
//!
//! The projector consumes the event feed and keeps one queryable row per
//! live book, eventually consistent with the event log. The store trait
//! hides Postgres behind the same contract as the in-memory
//! implementation.

pub mod memory_read_model_store;
pub mod model;
pub mod pg_read_model_store;
pub mod projector;
pub mod schema;
pub mod store;
pub mod worker;

pub use memory_read_model_store::MemoryReadModelStore;
pub use model::{BookReadModel, BookSearch, BookStatistics};
pub use pg_read_model_store::PgReadModelStore;
pub use projector::{BookProjector, ProjectionOutcome};
pub use store::ReadModelStore;
pub use worker::ProjectorWorker;
