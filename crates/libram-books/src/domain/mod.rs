//! Domain model for the Book context.

pub mod aggregates;
pub mod commands;
pub mod events;
