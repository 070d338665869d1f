//! Event feed abstraction.
//!
//! The feed decouples the command side from its consumers. Delivery is
//! at-least-once: consumers must tolerate duplicates and deduplicate by
//! `(aggregate_id, version)`. A negatively acknowledged delivery is
//! dead-lettered, never requeued, so a poison message cannot wedge a
//! subscription.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::error::DomainError;

/// Message body published to the feed for every appended event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    /// Event type tag, which is also the topic the message went out on.
    pub event_type: String,
    /// Aggregate the event belongs to.
    pub aggregate_id: Uuid,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// Per-aggregate version of the event.
    pub version: i64,
    /// When the event was recorded.
    pub occurred_at: DateTime<Utc>,
}

/// Terminal decision a consumer takes for one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Processing finished; the message is consumed.
    Ack,
    /// Processing cannot succeed; the message goes to the dead letters.
    DeadLetter,
}

/// One in-flight message handed to a subscriber.
///
/// Exactly one of [`ack`](Self::ack) or [`nack`](Self::nack) should be
/// called once processing is resolved.
#[derive(Debug)]
pub struct Delivery {
    /// Topic the message was published on.
    pub topic: String,
    /// The message body.
    pub message: EventMessage,
    outcome: oneshot::Sender<DeliveryOutcome>,
}

impl Delivery {
    /// Builds a delivery together with the receiver its verdict arrives
    /// on. Dropping the delivery without deciding closes the receiver
    /// with no outcome.
    #[must_use]
    pub fn new(
        topic: String,
        message: EventMessage,
    ) -> (Self, oneshot::Receiver<DeliveryOutcome>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                topic,
                message,
                outcome: tx,
            },
            rx,
        )
    }

    /// Marks the delivery as successfully processed.
    pub fn ack(self) {
        let _ = self.outcome.send(DeliveryOutcome::Ack);
    }

    /// Rejects the delivery permanently. It is dead-lettered, not
    /// requeued.
    pub fn nack(self) {
        let _ = self.outcome.send(DeliveryOutcome::DeadLetter);
    }
}

/// A consumer's end of the feed for a set of topics.
///
/// `recv` yields deliveries one at a time. Workers resolve each delivery
/// before asking for the next, which keeps at most one delivery in
/// flight per subscription.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::Receiver<Delivery>,
}

impl Subscription {
    /// Wraps the receiving half a feed implementation hands out.
    #[must_use]
    pub fn new(rx: mpsc::Receiver<Delivery>) -> Self {
        Self { rx }
    }

    /// Waits for the next delivery, or `None` once the feed is closed.
    pub async fn recv(&mut self) -> Option<Delivery> {
        self.rx.recv().await
    }
}

/// Publish/subscribe seam between the command side and its consumers.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publishes a message to a topic.
    ///
    /// Implementations wait a bounded time for queue capacity and fail
    /// with [`DomainError::Connectivity`] instead of blocking the
    /// command path indefinitely.
    async fn publish(&self, topic: &str, message: EventMessage) -> Result<(), DomainError>;

    /// Opens a subscription covering the given topics.
    async fn subscribe(&self, topics: &[&str]) -> Result<Subscription, DomainError>;
}
