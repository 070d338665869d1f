//! Background worker that drives the projector from the event feed.

use tokio::sync::watch;
use tokio::task::JoinHandle;

use libram_core::bus::{Delivery, Subscription};

use crate::projector::BookProjector;

/// Owns the background task that folds feed deliveries into the read
/// model.
///
/// Each delivery is resolved before the next is taken, so only one
/// message is in flight. Successful projection acks the delivery;
/// failures nack it and the feed dead letters the message instead of
/// requeueing it.
pub struct ProjectorWorker {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl ProjectorWorker {
    /// Spawns the worker over an open subscription.
    #[must_use]
    pub fn spawn(projector: BookProjector, mut subscription: Subscription) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            tracing::info!("projection worker started");
            loop {
                tokio::select! {
                    delivery = subscription.recv() => {
                        let Some(delivery) = delivery else { break };
                        handle_delivery(&projector, delivery).await;
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
            tracing::info!("projection worker stopped");
        });
        Self { handle, shutdown }
    }

    /// Signals the worker to stop and waits for it to finish. A delivery
    /// already being processed is resolved first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}

async fn handle_delivery(projector: &BookProjector, delivery: Delivery) {
    match projector.project(&delivery.message).await {
        Ok(outcome) => {
            tracing::debug!(
                aggregate_id = %delivery.message.aggregate_id,
                event_type = %delivery.message.event_type,
                version = delivery.message.version,
                ?outcome,
                "projected event"
            );
            delivery.ack();
        }
        Err(error) => {
            tracing::error!(
                aggregate_id = %delivery.message.aggregate_id,
                event_type = %delivery.message.event_type,
                version = delivery.message.version,
                %error,
                "projection failed, dead lettering delivery"
            );
            delivery.nack();
        }
    }
}
