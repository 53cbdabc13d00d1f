//! In-process domain event bus
//!
//! Scheduling operations publish onto a `tokio::sync::broadcast` channel.
//! Subscribers (the coach SSE stream, the Redis forwarder) each get their own
//! receiver; a slow subscriber only loses its own backlog.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};

use crate::{
    error::AppResult,
    models::event::{DomainEvent, EventEnvelope},
};

/// External sink for domain events (e.g. a message broker)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &EventEnvelope) -> AppResult<()>;
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event. Having no subscriber is not an error.
    pub fn publish(&self, event: DomainEvent) {
        let envelope = EventEnvelope::new(event);
        tracing::debug!(
            event_id = %envelope.id,
            event = envelope.event.name(),
            "Publishing domain event"
        );
        if self.sender.send(envelope).is_err() {
            tracing::trace!("No subscriber for domain events");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    /// Forward every event to `publisher` until the bus is dropped.
    /// Publisher failures are logged and the event is skipped.
    pub fn forward_to(&self, publisher: Arc<dyn EventPublisher>) -> JoinHandle<()> {
        let mut receiver = self.subscribe();
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(envelope) => {
                        if let Err(e) = publisher.publish(&envelope).await {
                            tracing::warn!(
                                event_id = %envelope.id,
                                event = envelope.event.name(),
                                "Failed to forward domain event: {}",
                                e
                            );
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Event forwarder lagged behind, events dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

/// Whether a coach should see this event on their stream
pub fn concerns_coach(envelope: &EventEnvelope, coach_id: &str) -> bool {
    envelope.event.coach_id() == Some(coach_id)
}
