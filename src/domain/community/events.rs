use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::DomainEvent;

// ============================================================================
// Community Domain Events
// ============================================================================
//
// Immutable records of facts that already happened. Payloads carry
// identifiers and primitives only, never value objects or aggregate
// references. Each factory stamps the occurrence time at construction.
//
// Deactivation and reactivation deliberately emit no event; nothing
// downstream consumes one today.
//
// ============================================================================

/// Union type for all community events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CommunityEvent {
    Created(CommunityCreated),
    Updated(CommunityDetailsUpdated),
    MemberJoined(MemberJoined),
    StoryAdded(StoryAdded),
}

impl DomainEvent for CommunityEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CommunityEvent::Created(_) => "CommunityCreated",
            CommunityEvent::Updated(_) => "CommunityDetailsUpdated",
            CommunityEvent::MemberJoined(_) => "MemberJoined",
            CommunityEvent::StoryAdded(_) => "StoryAdded",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CommunityEvent::Created(e) => e.occurred_at,
            CommunityEvent::Updated(e) => e.occurred_at,
            CommunityEvent::MemberJoined(e) => e.occurred_at,
            CommunityEvent::StoryAdded(e) => e.occurred_at,
        }
    }
}

// Individual event types

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityCreated {
    pub community_id: Uuid,
    pub name: String,
    pub founded_date: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

impl CommunityCreated {
    pub fn new(community_id: Uuid, name: String, founded_date: NaiveDate) -> Self {
        Self {
            community_id,
            name,
            founded_date,
            occurred_at: Utc::now(),
        }
    }
}

/// Which fields actually changed in a partial update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFields {
    pub name: bool,
    pub description: bool,
    pub location: bool,
}

impl ChangedFields {
    pub fn any(&self) -> bool {
        self.name || self.description || self.location
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityDetailsUpdated {
    pub community_id: Uuid,
    pub old_name: String,
    pub new_name: String,
    pub changed: ChangedFields,
    pub occurred_at: DateTime<Utc>,
}

impl CommunityDetailsUpdated {
    pub fn new(community_id: Uuid, old_name: String, new_name: String, changed: ChangedFields) -> Self {
        Self {
            community_id,
            old_name,
            new_name,
            changed,
            occurred_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberJoined {
    pub community_id: Uuid,
    pub member_id: Uuid,
    pub member_name: String,
    /// Member count after the join.
    pub member_count: u32,
    pub occurred_at: DateTime<Utc>,
}

impl MemberJoined {
    pub fn new(community_id: Uuid, member_id: Uuid, member_name: String, member_count: u32) -> Self {
        Self {
            community_id,
            member_id,
            member_name,
            member_count,
            occurred_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryAdded {
    pub community_id: Uuid,
    pub story_id: Uuid,
    pub impact_value: f64,
    /// Story count after the addition.
    pub story_count: u32,
    /// Cumulative impact after the addition.
    pub total_impact: f64,
    pub occurred_at: DateTime<Utc>,
}

impl StoryAdded {
    pub fn new(
        community_id: Uuid,
        story_id: Uuid,
        impact_value: f64,
        story_count: u32,
        total_impact: f64,
    ) -> Self {
        Self {
            community_id,
            story_id,
            impact_value,
            story_count,
            total_impact,
            occurred_at: Utc::now(),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
