//! In-process implementation of the event feed.
//!
//! `InMemoryEventBus` fans messages out per topic over bounded channels
//! and satisfies the same contract a broker-backed feed would: bounded
//! publish wait, at-least-once hand-off, explicit ack/nack per delivery
//! and a dead-letter store for rejected messages. Broker administration
//! (exchanges, queues, connections) is out of scope; anything
//! implementing [`EventBus`] can replace this.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::time::timeout;

use libram_core::bus::{Delivery, DeliveryOutcome, EventBus, EventMessage, Subscription};
use libram_core::error::DomainError;

const DEFAULT_CAPACITY: usize = 1024;
const DEFAULT_PUBLISH_WAIT: Duration = Duration::from_secs(5);

/// A message that a consumer rejected.
#[derive(Debug, Clone)]
pub struct DeadLetter {
    /// Topic the message was published on.
    pub topic: String,
    /// The rejected message.
    pub message: EventMessage,
}

/// Topic fan-out over bounded in-process channels.
///
/// A message published to a topic with no live subscription is dropped,
/// matching broker behavior for unbound topics.
pub struct InMemoryEventBus {
    capacity: usize,
    publish_wait: Duration,
    subscribers: Mutex<HashMap<String, Vec<mpsc::Sender<Delivery>>>>,
    dead_letters: Arc<Mutex<Vec<DeadLetter>>>,
}

impl InMemoryEventBus {
    /// Creates a bus with default queue capacity and publish wait.
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_CAPACITY, DEFAULT_PUBLISH_WAIT)
    }

    /// Creates a bus with an explicit per-subscription queue capacity
    /// and publish wait. Capacity is clamped to at least 1.
    #[must_use]
    pub fn with_settings(capacity: usize, publish_wait: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            publish_wait,
            subscribers: Mutex::new(HashMap::new()),
            dead_letters: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Snapshot of the rejected messages collected so far.
    pub async fn dead_letters(&self) -> Vec<DeadLetter> {
        self.dead_letters.lock().await.clone()
    }

    fn watch_outcome(
        &self,
        topic: String,
        message: EventMessage,
        outcome_rx: oneshot::Receiver<DeliveryOutcome>,
    ) {
        let dead_letters = Arc::clone(&self.dead_letters);
        tokio::spawn(async move {
            match outcome_rx.await {
                Ok(DeliveryOutcome::Ack) => {}
                Ok(DeliveryOutcome::DeadLetter) => {
                    tracing::warn!(
                        topic = %topic,
                        aggregate_id = %message.aggregate_id,
                        version = message.version,
                        "delivery dead-lettered"
                    );
                    dead_letters.lock().await.push(DeadLetter { topic, message });
                }
                Err(_) => {
                    tracing::debug!(topic = %topic, "delivery dropped without an outcome");
                }
            }
        });
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, topic: &str, message: EventMessage) -> Result<(), DomainError> {
        let senders: Vec<mpsc::Sender<Delivery>> = {
            let mut subscribers = self.subscribers.lock().await;
            match subscribers.get_mut(topic) {
                Some(senders) => {
                    senders.retain(|s| !s.is_closed());
                    senders.clone()
                }
                None => Vec::new(),
            }
        };

        for sender in senders {
            let (delivery, outcome_rx) = Delivery::new(topic.to_owned(), message.clone());
            match timeout(self.publish_wait, sender.send(delivery)).await {
                Ok(Ok(())) => self.watch_outcome(topic.to_owned(), message.clone(), outcome_rx),
                Ok(Err(_)) => {
                    // Subscriber closed between the prune and the send.
                }
                Err(_) => {
                    return Err(DomainError::Connectivity(format!(
                        "publish to topic {topic} timed out after {:?}",
                        self.publish_wait
                    )));
                }
            }
        }
        Ok(())
    }

    async fn subscribe(&self, topics: &[&str]) -> Result<Subscription, DomainError> {
        let (tx, rx) = mpsc::channel(self.capacity);
        let mut subscribers = self.subscribers.lock().await;
        for topic in topics {
            subscribers
                .entry((*topic).to_owned())
                .or_default()
                .push(tx.clone());
        }
        Ok(Subscription::new(rx))
    }
}
