use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::AggregateSnapshot;

// ============================================================================
// Community Snapshot
// ============================================================================
//
// Flat, serializable projection of community state for the persistence
// collaborator. Stores enforce optimistic concurrency keyed on
// (community_id, version). Fields are primitives, not the live value
// objects, so the record can cross any serialization boundary.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunitySnapshot {
    pub community_id: Uuid,
    pub name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub founded_date: NaiveDate,
    pub member_count: u32,
    pub story_count: u32,
    pub total_impact: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl AggregateSnapshot for CommunitySnapshot {
    fn aggregate_id(&self) -> Uuid {
        self.community_id
    }

    fn version(&self) -> i64 {
        self.version
    }
}
