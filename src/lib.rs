//! Community aggregate domain core.
//!
//! A community is a consistency boundary: it owns its business state,
//! enforces invariants on every mutation, derives metrics from that state,
//! and buffers an ordered log of domain events in an outbox. The
//! orchestrating command handler loads a snapshot, reconstitutes the
//! aggregate, runs business operations, persists the new snapshot under
//! optimistic concurrency, and only then dispatches the buffered events.

pub mod core;
pub mod domain;
pub mod messaging;
pub mod store;
pub mod utils;

pub use crate::core::{AggregateRoot, AggregateSnapshot, DomainEvent, EventEnvelope, EventOutbox};
pub use crate::domain::community::{
    Community, CommunityCommand, CommunityCommandHandler, CommunityError, CommunityEvent,
    CommunitySnapshot, RegisterCommunity, ValidationError,
};
pub use crate::messaging::{DispatchError, EventDispatcher, InMemoryDispatcher};
pub use crate::store::{InMemorySnapshotStore, SnapshotStore, StoreError};
