//! Application services for the Book context.

pub mod command_handlers;
pub mod dispatch;
pub mod publisher;
pub mod repository;
