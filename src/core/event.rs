use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

// ============================================================================
// Domain Event Contract + Dispatch Envelope
// ============================================================================
//
// Events are immutable facts. An aggregate buffers them in its outbox during
// a business transaction; the orchestrating layer wraps them in envelopes
// when handing them to a dispatcher.
//
// This is GENERIC and works with ANY event type.
//
// ============================================================================

/// Generic domain event trait.
///
/// Events carry identifiers and primitive facts only, never a reference back
/// to the aggregate that produced them. Consumers must be idempotent against
/// re-delivery; the dispatcher only guarantees at-least-once.
pub trait DomainEvent: Serialize + for<'de> Deserialize<'de> + Clone + Send + Sync {
    /// Wire name for this specific event occurrence (e.g. "MemberJoined").
    fn event_type(&self) -> &'static str;

    /// When the fact occurred, stamped at event construction.
    fn occurred_at(&self) -> DateTime<Utc>;
}

/// Wraps a drained domain event with dispatch metadata.
///
/// `sequence_number` is the aggregate version the event was persisted under,
/// so ordering across transactions follows the store's version ordering.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EventEnvelope<E> {
    pub event_id: Uuid,
    pub aggregate_id: Uuid,
    pub sequence_number: i64,
    pub event_type: String,
    pub event_data: E,
    pub correlation_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

impl<E: DomainEvent> EventEnvelope<E> {
    pub fn new(aggregate_id: Uuid, sequence_number: i64, event_data: E, correlation_id: Uuid) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            aggregate_id,
            sequence_number,
            event_type: event_data.event_type().to_string(),
            timestamp: event_data.occurred_at(),
            event_data,
            correlation_id,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
