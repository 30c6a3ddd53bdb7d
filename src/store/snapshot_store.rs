use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::marker::PhantomData;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::AggregateSnapshot;

// ============================================================================
// Generic Snapshot Store - Repository for Aggregate State
// ============================================================================
//
// This is a GENERIC snapshot store that works with ANY aggregate snapshot.
//
// Responsibilities:
// 1. Persist the latest snapshot per aggregate
// 2. Enforce optimistic concurrency keyed on (aggregate_id, version)
// 3. Rehydrate snapshots for reconstitution
//
// Concurrency conflicts are surfaced here, never inside the aggregate: a
// caller that loaded at version v must present v as expected_version, and a
// concurrent writer that advanced the stored version wins.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("concurrency conflict for {id}: expected version {expected}, stored is {actual}")]
    ConcurrencyConflict {
        id: Uuid,
        expected: i64,
        actual: i64,
    },

    #[error("aggregate not found: {0}")]
    NotFound(Uuid),

    #[error("snapshot codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Persistence boundary for aggregate snapshots.
///
/// `expected_version` is the version the caller loaded (0 for a brand-new
/// aggregate). A mismatch with the stored version means a concurrent writer
/// won; the caller must reload and retry the whole command.
#[async_trait]
pub trait SnapshotStore<S>: Send + Sync
where
    S: AggregateSnapshot + Serialize + DeserializeOwned + Send + Sync,
{
    /// Persists the snapshot, returning the newly stored version.
    async fn save(&self, snapshot: &S, expected_version: i64) -> Result<i64, StoreError>;

    async fn load(&self, aggregate_id: Uuid) -> Result<S, StoreError>;

    /// Stored version, or 0 when the aggregate does not exist.
    async fn current_version(&self, aggregate_id: Uuid) -> Result<i64, StoreError>;

    async fn exists(&self, aggregate_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.current_version(aggregate_id).await? > 0)
    }
}

// ============================================================================
// In-Memory Implementation
// ============================================================================

struct StoredRow {
    version: i64,
    payload: String,
}

/// In-memory snapshot store. Reference implementation of the optimistic
/// concurrency contract; rows hold the JSON-serialized snapshot next to its
/// version column, mirroring how a table-backed store would lay it out.
pub struct InMemorySnapshotStore<S> {
    rows: RwLock<HashMap<Uuid, StoredRow>>,
    _phantom: PhantomData<fn() -> S>,
}

impl<S> InMemorySnapshotStore<S> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            _phantom: PhantomData,
        }
    }
}

impl<S> Default for InMemorySnapshotStore<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S> SnapshotStore<S> for InMemorySnapshotStore<S>
where
    S: AggregateSnapshot + Serialize + DeserializeOwned + Send + Sync,
{
    async fn save(&self, snapshot: &S, expected_version: i64) -> Result<i64, StoreError> {
        let id = snapshot.aggregate_id();
        let payload = serde_json::to_string(snapshot)?;

        let mut rows = self.rows.write().await;
        let actual = rows.get(&id).map(|row| row.version).unwrap_or(0);
        if actual != expected_version {
            return Err(StoreError::ConcurrencyConflict {
                id,
                expected: expected_version,
                actual,
            });
        }

        let version = snapshot.version();
        rows.insert(id, StoredRow { version, payload });

        tracing::debug!(
            aggregate_id = %id,
            version = version,
            "Stored aggregate snapshot"
        );

        Ok(version)
    }

    async fn load(&self, aggregate_id: Uuid) -> Result<S, StoreError> {
        let rows = self.rows.read().await;
        let row = rows
            .get(&aggregate_id)
            .ok_or(StoreError::NotFound(aggregate_id))?;
        Ok(serde_json::from_str(&row.payload)?)
    }

    async fn current_version(&self, aggregate_id: Uuid) -> Result<i64, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows.get(&aggregate_id).map(|row| row.version).unwrap_or(0))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestSnapshot {
        id: Uuid,
        version: i64,
        label: String,
    }

    impl AggregateSnapshot for TestSnapshot {
        fn aggregate_id(&self) -> Uuid {
            self.id
        }

        fn version(&self) -> i64 {
            self.version
        }
    }

    fn snapshot(id: Uuid, version: i64) -> TestSnapshot {
        TestSnapshot {
            id,
            version,
            label: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let store = InMemorySnapshotStore::new();
        let id = Uuid::new_v4();

        store.save(&snapshot(id, 1), 0).await.unwrap();

        let loaded = store.load(id).await.unwrap();
        assert_eq!(loaded, snapshot(id, 1));
        assert_eq!(store.current_version(id).await.unwrap(), 1);
        assert!(store.exists(id).await.unwrap());
    }

    #[tokio::test]
    async fn new_aggregate_requires_expected_version_zero() {
        let store = InMemorySnapshotStore::new();
        let id = Uuid::new_v4();
        store.save(&snapshot(id, 1), 0).await.unwrap();

        // Creating again at the same id must conflict.
        let err = store.save(&snapshot(id, 1), 0).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::ConcurrencyConflict {
                expected: 0,
                actual: 1,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn stale_version_is_rejected() {
        let store = InMemorySnapshotStore::new();
        let id = Uuid::new_v4();

        store.save(&snapshot(id, 1), 0).await.unwrap();
        store.save(&snapshot(id, 2), 1).await.unwrap();

        // Writer who still thinks the version is 1 loses.
        let err = store.save(&snapshot(id, 2), 1).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::ConcurrencyConflict {
                expected: 1,
                actual: 2,
                ..
            }
        ));
        assert_eq!(store.current_version(id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn load_missing_aggregate_fails() {
        let store: InMemorySnapshotStore<TestSnapshot> = InMemorySnapshotStore::new();
        let id = Uuid::new_v4();

        assert!(matches!(
            store.load(id).await.unwrap_err(),
            StoreError::NotFound(missing) if missing == id
        ));
        assert!(!store.exists(id).await.unwrap());
    }
}
