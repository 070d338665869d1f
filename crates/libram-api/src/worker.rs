//! Background worker that applies commands arriving on the feed.
//!
//! Producers publish [`BookCommand`] envelopes on the command topic; the
//! consumer decodes each one and runs it through the same dispatch point
//! as the HTTP routes, so both paths classify failures identically. Only
//! the reporting differs: business rejections are final here (logged and
//! acked, there is no caller to answer), version conflicts are retried
//! from a fresh load a bounded number of times, and everything else is
//! dead-lettered.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use libram_books::application::dispatch::{self, BookCommand};
use libram_books::application::publisher::EventPublisher;
use libram_books::application::repository::BookRepository;
use libram_core::bus::{Delivery, Subscription};
use libram_core::clock::Clock;
use libram_core::error::DomainError;

/// Total attempts for a command whose append keeps losing the version
/// race.
const MAX_CONFLICT_ATTEMPTS: u32 = 3;

/// Initial backoff before a conflict retry; doubles per attempt.
const CONFLICT_BACKOFF: Duration = Duration::from_millis(50);

/// Owns the background task consuming the command topic.
pub struct CommandConsumer {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl CommandConsumer {
    /// Spawns the consumer over an open subscription.
    #[must_use]
    pub fn spawn(
        clock: Arc<dyn Clock>,
        repository: BookRepository,
        publisher: EventPublisher,
        mut subscription: Subscription,
    ) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            tracing::info!("command consumer started");
            loop {
                tokio::select! {
                    delivery = subscription.recv() => {
                        let Some(delivery) = delivery else { break };
                        handle_delivery(clock.as_ref(), &repository, &publisher, delivery).await;
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
            tracing::info!("command consumer stopped");
        });
        Self { handle, shutdown }
    }

    /// Signals the consumer to stop and waits for it to finish. A
    /// delivery already being processed is resolved first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}

async fn handle_delivery(
    clock: &dyn Clock,
    repository: &BookRepository,
    publisher: &EventPublisher,
    delivery: Delivery,
) {
    let command: BookCommand = match serde_json::from_value(delivery.message.payload.clone()) {
        Ok(command) => command,
        Err(error) => {
            tracing::error!(%error, "undecodable command envelope, dead lettering delivery");
            delivery.nack();
            return;
        }
    };

    let mut backoff = CONFLICT_BACKOFF;
    let mut attempt = 1;
    loop {
        match dispatch::execute(&command, clock, repository, publisher).await {
            Ok(stored_events) => {
                tracing::info!(
                    aggregate_id = %command.aggregate_id(),
                    command_type = command.command_type(),
                    events_count = stored_events.len(),
                    "command applied from feed"
                );
                delivery.ack();
                return;
            }
            Err(
                error @ (DomainError::Validation(_)
                | DomainError::AlreadyExists(_)
                | DomainError::NotFound(_)),
            ) => {
                tracing::warn!(
                    aggregate_id = %command.aggregate_id(),
                    command_type = command.command_type(),
                    %error,
                    "command rejected, acking delivery"
                );
                delivery.ack();
                return;
            }
            Err(DomainError::Conflict { .. }) if attempt < MAX_CONFLICT_ATTEMPTS => {
                tracing::warn!(
                    aggregate_id = %command.aggregate_id(),
                    attempt,
                    "version conflict, retrying from a fresh load"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
                attempt += 1;
            }
            Err(error) => {
                tracing::error!(
                    aggregate_id = %command.aggregate_id(),
                    command_type = command.command_type(),
                    %error,
                    "command failed, dead lettering delivery"
                );
                delivery.nack();
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use uuid::Uuid;

    use libram_books::domain::commands::{CreateBook, UpdateBook};
    use libram_bus::InMemoryEventBus;
    use libram_core::bus::{DeliveryOutcome, EventBus, EventMessage};
    use libram_core::event::{EventDraft, EventRecord};
    use libram_core::store::EventStore;
    use libram_event_store::MemoryEventStore;
    use libram_test_support::FixedClock;

    /// Store whose appends always lose the version race.
    struct ConflictingEventStore {
        inner: MemoryEventStore,
        appends: AtomicU32,
    }

    impl ConflictingEventStore {
        fn new() -> Self {
            Self {
                inner: MemoryEventStore::new(),
                appends: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl EventStore for ConflictingEventStore {
        async fn append(&self, draft: EventDraft) -> Result<EventRecord, DomainError> {
            self.appends.fetch_add(1, Ordering::SeqCst);
            Err(DomainError::Conflict {
                aggregate_id: draft.aggregate_id,
                version: draft.version,
            })
        }

        async fn events_for(&self, aggregate_id: Uuid) -> Result<Vec<EventRecord>, DomainError> {
            self.inner.events_for(aggregate_id).await
        }

        async fn latest_version(&self, aggregate_id: Uuid) -> Result<i64, DomainError> {
            self.inner.latest_version(aggregate_id).await
        }

        async fn all_events(
            &self,
            event_type: Option<&str>,
        ) -> Result<Vec<EventRecord>, DomainError> {
            self.inner.all_events(event_type).await
        }
    }

    fn command_message(command: &BookCommand) -> EventMessage {
        EventMessage {
            event_type: command.command_type().to_string(),
            aggregate_id: command.aggregate_id(),
            payload: serde_json::to_value(command).unwrap(),
            version: 0,
            occurred_at: Utc::now(),
        }
    }

    fn create_command(aggregate_id: Uuid) -> BookCommand {
        BookCommand::CreateBook(CreateBook {
            aggregate_id,
            title: "Dune".to_string(),
            description: None,
            author: "Frank Herbert".to_string(),
        })
    }

    fn fixtures(store: Arc<dyn EventStore>) -> (Arc<dyn Clock>, BookRepository, EventPublisher) {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(Utc::now()));
        let repository = BookRepository::new(store);
        let publisher = EventPublisher::new(Arc::new(InMemoryEventBus::new()));
        (clock, repository, publisher)
    }

    #[tokio::test]
    async fn test_valid_command_is_applied_and_acked() {
        // Arrange
        let store = Arc::new(MemoryEventStore::new());
        let (clock, repository, publisher) = fixtures(store.clone());
        let aggregate_id = Uuid::new_v4();
        let message = command_message(&create_command(aggregate_id));
        let (delivery, outcome) = Delivery::new(dispatch::COMMAND_TOPIC.to_string(), message);

        // Act
        handle_delivery(clock.as_ref(), &repository, &publisher, delivery).await;

        // Assert
        assert_eq!(outcome.await, Ok(DeliveryOutcome::Ack));
        assert_eq!(store.events_for(aggregate_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_business_rejection_is_acked_not_dead_lettered() {
        // Arrange
        let store = Arc::new(MemoryEventStore::new());
        let (clock, repository, publisher) = fixtures(store.clone());
        let aggregate_id = Uuid::new_v4();
        let command = BookCommand::CreateBook(CreateBook {
            aggregate_id,
            title: "  ".to_string(),
            description: None,
            author: "Frank Herbert".to_string(),
        });
        let (delivery, outcome) =
            Delivery::new(dispatch::COMMAND_TOPIC.to_string(), command_message(&command));

        // Act
        handle_delivery(clock.as_ref(), &repository, &publisher, delivery).await;

        // Assert
        assert_eq!(outcome.await, Ok(DeliveryOutcome::Ack));
        assert!(store.events_for(aggregate_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_envelope_is_dead_lettered() {
        // Arrange
        let store = Arc::new(MemoryEventStore::new());
        let (clock, repository, publisher) = fixtures(store);
        let message = EventMessage {
            event_type: "archive_book".to_string(),
            aggregate_id: Uuid::new_v4(),
            payload: serde_json::json!({"command_type": "archive_book", "command_data": {}}),
            version: 0,
            occurred_at: Utc::now(),
        };
        let (delivery, outcome) = Delivery::new(dispatch::COMMAND_TOPIC.to_string(), message);

        // Act
        handle_delivery(clock.as_ref(), &repository, &publisher, delivery).await;

        // Assert
        assert_eq!(outcome.await, Ok(DeliveryOutcome::DeadLetter));
    }

    #[tokio::test]
    async fn test_conflict_is_retried_then_dead_lettered() {
        // Arrange: seed an active book, then make every append conflict.
        let store = Arc::new(ConflictingEventStore::new());
        let aggregate_id = Uuid::new_v4();
        let created = libram_books::domain::events::BookEventKind::Created(
            libram_books::domain::events::BookCreated {
                title: "Dune".to_string(),
                description: None,
                author: "Frank Herbert".to_string(),
                created_at: Utc::now(),
            },
        );
        store
            .inner
            .append(created.into_draft(aggregate_id, 1))
            .await
            .unwrap();

        let (clock, repository, publisher) = fixtures(store.clone());
        let command = BookCommand::UpdateBook(UpdateBook {
            aggregate_id,
            title: Some("Dune Messiah".to_string()),
            description: None,
            author: None,
        });
        let (delivery, outcome) =
            Delivery::new(dispatch::COMMAND_TOPIC.to_string(), command_message(&command));

        // Act
        handle_delivery(clock.as_ref(), &repository, &publisher, delivery).await;

        // Assert
        assert_eq!(outcome.await, Ok(DeliveryOutcome::DeadLetter));
        assert_eq!(store.appends.load(Ordering::SeqCst), MAX_CONFLICT_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_consumer_loop_applies_published_commands() {
        // Arrange
        let bus = InMemoryEventBus::new();
        let store = Arc::new(MemoryEventStore::new());
        let (clock, repository, publisher) = fixtures(store.clone());
        let subscription = bus.subscribe(&[dispatch::COMMAND_TOPIC]).await.unwrap();
        let consumer = CommandConsumer::spawn(clock, repository, publisher, subscription);
        let aggregate_id = Uuid::new_v4();

        // Act
        bus.publish(
            dispatch::COMMAND_TOPIC,
            command_message(&create_command(aggregate_id)),
        )
        .await
        .unwrap();

        // Assert
        let mut events = Vec::new();
        for _ in 0..100 {
            events = store.events_for(aggregate_id).await.unwrap();
            if !events.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(events.len(), 1);
        assert!(bus.dead_letters().await.is_empty());
        consumer.shutdown().await;
    }
}
