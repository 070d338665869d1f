//! Mock `EventBus` implementations for tests.

use async_trait::async_trait;

use libram_core::bus::{EventBus, EventMessage, Subscription};
use libram_core::error::DomainError;

/// An event bus that always fails with a connectivity error. Useful for
/// testing that command paths survive a dead feed.
#[derive(Debug)]
pub struct FailingEventBus;

#[async_trait]
impl EventBus for FailingEventBus {
    async fn publish(&self, _topic: &str, _message: EventMessage) -> Result<(), DomainError> {
        Err(DomainError::Connectivity("feed unreachable".into()))
    }

    async fn subscribe(&self, _topics: &[&str]) -> Result<Subscription, DomainError> {
        Err(DomainError::Connectivity("feed unreachable".into()))
    }
}
