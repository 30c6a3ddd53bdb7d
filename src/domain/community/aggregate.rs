use chrono::{DateTime, Datelike, NaiveDate, Utc};
use uuid::Uuid;

use crate::core::{AggregateRoot, EventOutbox};
use super::errors::CommunityError;
use super::events::*;
use super::snapshot::CommunitySnapshot;
use super::value_objects::{CommunityId, CommunityName, Description, GeoLocation};

// ============================================================================
// Community Aggregate - Business Logic
// ============================================================================
//
// Consistency boundary for a single community. All mutation goes through the
// business operations below; each accepted change bumps the version by
// exactly one, refreshes updated_at, and buffers at most one event in the
// outbox. Rejected operations leave everything untouched.
//
// Two construction paths, never merged into one:
// - `create`: new community, version 1, emits CommunityCreated
// - `reconstitute`: rehydration from a persisted snapshot; trusts the data,
//   runs no validation, emits nothing
//
// ============================================================================

/// Established status requires all three: age, members, stories.
const ESTABLISHED_MIN_AGE_YEARS: u32 = 1;
const ESTABLISHED_MIN_MEMBERS: u32 = 10;
const ESTABLISHED_MIN_STORIES: u32 = 5;

/// High impact requires either threshold.
const HIGH_IMPACT_TOTAL: f64 = 1000.0;
const HIGH_IMPACT_PER_MEMBER: f64 = 100.0;

#[derive(Debug, Clone)]
pub struct Community {
    id: CommunityId,
    name: CommunityName,
    description: Description,
    location: GeoLocation,
    founded_date: NaiveDate,
    member_count: u32,
    story_count: u32,
    total_impact: f64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
    outbox: EventOutbox<CommunityEvent>,
}

impl Community {
    /// Creates a new community with a fresh identity.
    ///
    /// Infallible: the value objects already rejected invalid input.
    pub fn create(
        name: CommunityName,
        description: Description,
        location: GeoLocation,
        founded_date: NaiveDate,
    ) -> Self {
        let id = CommunityId::generate();
        let now = Utc::now();

        let mut community = Self {
            id,
            name,
            description,
            location,
            founded_date,
            member_count: 0,
            story_count: 0,
            total_impact: 0.0,
            is_active: true,
            created_at: now,
            updated_at: now,
            version: 1,
            outbox: EventOutbox::new(),
        };

        let event = CommunityCreated::new(
            id.as_uuid(),
            community.name.as_str().to_string(),
            founded_date,
        );
        community.outbox.record(CommunityEvent::Created(event));

        community
    }

    /// Rehydrates a community from persisted state.
    ///
    /// Field assignment only: the snapshot was validated when originally
    /// written. Starts with an empty outbox and an unlatched dispatch flag.
    pub fn reconstitute(snapshot: CommunitySnapshot) -> Self {
        Self {
            id: CommunityId::from_uuid(snapshot.community_id),
            name: CommunityName::from_stored(snapshot.name),
            description: Description::from_stored(snapshot.description),
            location: GeoLocation::from_stored(
                snapshot.latitude,
                snapshot.longitude,
                snapshot.address,
            ),
            founded_date: snapshot.founded_date,
            member_count: snapshot.member_count,
            story_count: snapshot.story_count,
            total_impact: snapshot.total_impact,
            is_active: snapshot.is_active,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
            version: snapshot.version,
            outbox: EventOutbox::new(),
        }
    }

    // ------------------------------------------------------------------
    // Business operations
    // ------------------------------------------------------------------

    /// Partial update of name, description, and location.
    ///
    /// A no-op (no version bump, no event) when every supplied field equals
    /// the current value, so retried commands with identical data are
    /// idempotent. Allowed while inactive: editing metadata does not require
    /// an active community.
    pub fn update_details(
        &mut self,
        name: Option<CommunityName>,
        description: Option<Description>,
        location: Option<GeoLocation>,
    ) {
        let changed = ChangedFields {
            name: name.as_ref().is_some_and(|n| *n != self.name),
            description: description.as_ref().is_some_and(|d| *d != self.description),
            location: location.as_ref().is_some_and(|l| *l != self.location),
        };

        if !changed.any() {
            return;
        }

        let old_name = self.name.as_str().to_string();

        if changed.name {
            self.name = name.unwrap();
        }
        if changed.description {
            self.description = description.unwrap();
        }
        if changed.location {
            self.location = location.unwrap();
        }

        self.bump_version();
        self.outbox
            .record(CommunityEvent::Updated(CommunityDetailsUpdated::new(
                self.id.as_uuid(),
                old_name,
                self.name.as_str().to_string(),
                changed,
            )));
    }

    pub fn add_member(&mut self, member_id: Uuid, member_name: &str) -> Result<(), CommunityError> {
        if !self.is_active {
            return Err(CommunityError::MembersRequireActive);
        }

        self.member_count += 1;
        self.bump_version();
        self.outbox
            .record(CommunityEvent::MemberJoined(MemberJoined::new(
                self.id.as_uuid(),
                member_id,
                member_name.to_string(),
                self.member_count,
            )));

        Ok(())
    }

    pub fn add_story(&mut self, story_id: Uuid, impact_value: f64) -> Result<(), CommunityError> {
        if !self.is_active {
            return Err(CommunityError::StoriesRequireActive);
        }
        // Written with a negated >= so NaN is rejected too; a NaN contribution
        // would poison total_impact for the rest of the aggregate's life.
        if !(impact_value >= 0.0) {
            return Err(CommunityError::NegativeImpact(impact_value));
        }

        self.story_count += 1;
        self.total_impact += impact_value;
        self.bump_version();
        self.outbox
            .record(CommunityEvent::StoryAdded(StoryAdded::new(
                self.id.as_uuid(),
                story_id,
                impact_value,
                self.story_count,
                self.total_impact,
            )));

        Ok(())
    }

    /// No-op when already inactive. Emits no event.
    pub fn deactivate(&mut self) {
        if !self.is_active {
            return;
        }
        self.is_active = false;
        self.bump_version();
    }

    /// No-op when already active. Emits no event.
    pub fn reactivate(&mut self) {
        if self.is_active {
            return;
        }
        self.is_active = true;
        self.bump_version();
    }

    // ------------------------------------------------------------------
    // Derived reads (no state change, no events)
    // ------------------------------------------------------------------

    /// Whole years elapsed since founding, floored. 0 for future dates.
    pub fn age_in_years(&self) -> u32 {
        self.age_in_years_on(Utc::now().date_naive())
    }

    fn age_in_years_on(&self, on: NaiveDate) -> u32 {
        let mut years = on.year() - self.founded_date.year();
        if (on.month(), on.day()) < (self.founded_date.month(), self.founded_date.day()) {
            years -= 1;
        }
        years.max(0) as u32
    }

    pub fn impact_per_member(&self) -> f64 {
        if self.member_count == 0 {
            0.0
        } else {
            self.total_impact / f64::from(self.member_count)
        }
    }

    pub fn can_add_members(&self) -> bool {
        self.is_active
    }

    pub fn can_add_stories(&self) -> bool {
        self.is_active && self.member_count > 0
    }

    pub fn is_established(&self) -> bool {
        self.is_established_on(Utc::now().date_naive())
    }

    fn is_established_on(&self, on: NaiveDate) -> bool {
        self.age_in_years_on(on) >= ESTABLISHED_MIN_AGE_YEARS
            && self.member_count >= ESTABLISHED_MIN_MEMBERS
            && self.story_count >= ESTABLISHED_MIN_STORIES
    }

    pub fn is_high_impact(&self) -> bool {
        self.total_impact >= HIGH_IMPACT_TOTAL
            || (self.member_count > 0 && self.impact_per_member() >= HIGH_IMPACT_PER_MEMBER)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn name(&self) -> &CommunityName {
        &self.name
    }

    pub fn description(&self) -> &Description {
        &self.description
    }

    pub fn location(&self) -> &GeoLocation {
        &self.location
    }

    pub fn founded_date(&self) -> NaiveDate {
        self.founded_date
    }

    pub fn member_count(&self) -> u32 {
        self.member_count
    }

    pub fn story_count(&self) -> u32 {
        self.story_count
    }

    pub fn total_impact(&self) -> f64 {
        self.total_impact
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Plain-data projection of all state fields, suitable for persistence
    /// with optimistic concurrency keyed on (id, version).
    pub fn to_snapshot(&self) -> CommunitySnapshot {
        CommunitySnapshot {
            community_id: self.id.as_uuid(),
            name: self.name.as_str().to_string(),
            description: self.description.as_str().to_string(),
            latitude: self.location.latitude(),
            longitude: self.location.longitude(),
            address: self.location.address().to_string(),
            founded_date: self.founded_date,
            member_count: self.member_count,
            story_count: self.story_count,
            total_impact: self.total_impact,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
            version: self.version,
        }
    }

    fn bump_version(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}

impl AggregateRoot for Community {
    type Event = CommunityEvent;

    fn id(&self) -> Uuid {
        self.id.as_uuid()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn drain_events(&self) -> Vec<CommunityEvent> {
        self.outbox.drain()
    }

    fn clear_events(&mut self) {
        self.outbox.clear()
    }

    fn mark_events_dispatched(&mut self) {
        self.outbox.mark_dispatched()
    }

    fn events_dispatched(&self) -> bool {
        self.outbox.is_dispatched()
    }
}

/// Identity equality: two communities are the same aggregate iff their ids
/// match, regardless of mutable state.
impl PartialEq for Community {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Community {}

// ============================================================================
// Unit Tests
// ============================================================================
