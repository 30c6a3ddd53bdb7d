// ============================================================================
// Aggregate Core - Generic Infrastructure Abstractions
// ============================================================================
//
// This module contains GENERIC, reusable aggregate-root infrastructure
// that works with ANY domain aggregate.
//
// Key Principles:
// - No domain-specific code (no Community, no Placemat concepts)
// - Generic over aggregate and event types
// - Snapshot-based: aggregates are rehydrated from persisted state, not
//   from an event log
//
// ============================================================================

pub mod aggregate;
pub mod event;

// Re-export core types for convenience
pub use aggregate::{AggregateRoot, AggregateSnapshot, EventOutbox};
pub use event::{DomainEvent, EventEnvelope};
