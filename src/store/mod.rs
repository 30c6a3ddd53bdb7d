// ============================================================================
// Persistence Boundary - Snapshot Storage
// ============================================================================
//
// Aggregates never touch storage directly; the orchestrating layer saves
// snapshots here and relies on the store's version check for concurrency
// control across writers.
//
// ============================================================================

pub mod snapshot_store;

pub use snapshot_store::{InMemorySnapshotStore, SnapshotStore, StoreError};
