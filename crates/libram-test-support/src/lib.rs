//! Shared test doubles for the Libram catalog.

mod bus;
mod clock;
mod store;

pub use bus::FailingEventBus;
pub use clock::FixedClock;
pub use store::FailingEventStore;
