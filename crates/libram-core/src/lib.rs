//! Libram Core: shared domain abstractions.
//!
//! This crate defines the error taxonomy, the event log record types and
//! the store/feed traits that every other crate depends on. It contains
//! no infrastructure code.

pub mod bus;
pub mod clock;
pub mod error;
pub mod event;
pub mod store;
