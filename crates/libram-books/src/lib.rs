//! Libram: the Book bounded context.
//!
//! Owns the typed commands, events and the aggregate state machine, plus
//! the application services that load, mutate and publish book history.

pub mod application;
pub mod domain;
