use uuid::Uuid;
use chrono::{DateTime, Utc};

// ============================================================================
// Aggregate Root Pattern - Snapshot-Persisted Core
// ============================================================================
//
// Key Principles:
// 1. State changes only through validated business operations
// 2. Every accepted change bumps a monotonic version (optimistic concurrency)
// 3. Semantically significant changes buffer exactly one event in the outbox
// 4. Aggregates are rebuilt from snapshots, never by replaying events
// 5. Identity, not state, defines equality
//
// This is the GENERIC contract every aggregate implements.
//
// ============================================================================

/// Generic aggregate root trait.
///
/// The outbox operations exist for the single orchestrating caller: it drains
/// events after running business operations, persists the snapshot, publishes
/// the drained events, and only then clears the buffer and sets the dispatch
/// latch. Draining is a side-effect-free read.
pub trait AggregateRoot: Sized + Send + Sync {
    type Event;

    /// Stable identity; the sole basis of aggregate equality.
    fn id(&self) -> Uuid;

    fn created_at(&self) -> DateTime<Utc>;

    /// Refreshed if and only if the version advances.
    fn updated_at(&self) -> DateTime<Utc>;

    /// Monotonic version, starting at 1; +1 per accepted state change.
    fn version(&self) -> i64;

    /// Copy of the buffered events, without clearing them.
    fn drain_events(&self) -> Vec<Self::Event>;

    /// Empties the buffer. Call only after persistence and dispatch succeeded.
    fn clear_events(&mut self);

    /// One-way latch: once set, later operations still mutate state but no
    /// longer buffer events. Guards against double-publishing when an
    /// instance is reused across retried commands.
    fn mark_events_dispatched(&mut self);

    fn events_dispatched(&self) -> bool;
}

/// Projection of aggregate state a store can persist and version-check.
pub trait AggregateSnapshot {
    fn aggregate_id(&self) -> Uuid;
    fn version(&self) -> i64;
}

// ============================================================================
// Event Outbox
// ============================================================================

/// Append-only event buffer with a one-way dispatched latch.
///
/// Aggregates embed one of these and route every emission through `record`;
/// the latch cannot be unset for the lifetime of the instance.
#[derive(Debug, Clone, Default)]
pub struct EventOutbox<E> {
    events: Vec<E>,
    dispatched: bool,
}

impl<E: Clone> EventOutbox<E> {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            dispatched: false,
        }
    }

    /// Buffers an event, unless the dispatch latch is set.
    pub fn record(&mut self, event: E) {
        if !self.dispatched {
            self.events.push(event);
        }
    }

    /// Returns a copy of the buffered events in emission order.
    pub fn drain(&self) -> Vec<E> {
        self.events.clone()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn mark_dispatched(&mut self) {
        self.dispatched = true;
    }

    pub fn is_dispatched(&self) -> bool {
        self.dispatched
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
