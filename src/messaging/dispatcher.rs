use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::core::{DomainEvent, EventEnvelope};

// ============================================================================
// Event Dispatch Boundary
// ============================================================================
//
// Consumes drained, enveloped events after the snapshot that produced them
// was durably persisted. Delivery is at-least-once; consumers must be
// idempotent against re-delivery.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("failed to publish {event_type}: {reason}")]
    PublishFailed { event_type: String, reason: String },
}

/// Outbound transport for domain events.
#[async_trait]
pub trait EventDispatcher<E: DomainEvent>: Send + Sync {
    /// Publishes envelopes in the order given. A failure means delivery was
    /// not taken; the caller must keep the events buffered.
    async fn publish(&self, envelopes: &[EventEnvelope<E>]) -> Result<(), DispatchError>;
}

/// Dispatcher that records published envelopes in memory.
///
/// Reference implementation of the boundary contract and the test double
/// used by the command handler tests.
pub struct InMemoryDispatcher<E> {
    published: Mutex<Vec<EventEnvelope<E>>>,
}

impl<E: DomainEvent> InMemoryDispatcher<E> {
    pub fn new() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
        }
    }

    /// Everything published so far, in delivery order.
    pub async fn published(&self) -> Vec<EventEnvelope<E>> {
        self.published.lock().await.clone()
    }
}

impl<E: DomainEvent> Default for InMemoryDispatcher<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: DomainEvent + 'static> EventDispatcher<E> for InMemoryDispatcher<E> {
    async fn publish(&self, envelopes: &[EventEnvelope<E>]) -> Result<(), DispatchError> {
        let mut published = self.published.lock().await;
        for envelope in envelopes {
            tracing::info!(
                aggregate_id = %envelope.aggregate_id,
                event_type = %envelope.event_type,
                sequence = envelope.sequence_number,
                "Dispatched domain event"
            );
            published.push(envelope.clone());
        }
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
