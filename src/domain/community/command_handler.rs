use std::sync::Arc;
use anyhow::{Context, Result};
use uuid::Uuid;

use crate::core::{AggregateRoot, EventEnvelope};
use crate::messaging::EventDispatcher;
use crate::store::{SnapshotStore, StoreError};
use crate::utils::RetryConfig;

use super::aggregate::Community;
use super::commands::{CommunityCommand, RegisterCommunity};
use super::errors::CommunityError;
use super::events::CommunityEvent;
use super::snapshot::CommunitySnapshot;
use super::value_objects::{CommunityName, Description, GeoLocation};

// ============================================================================
// Community Command Handler
// ============================================================================
//
// Orchestrates: Command → Aggregate → Snapshot Store → Dispatcher
//
// The ordering guarantee lives here: events are published only after the
// snapshot that produced them is persisted, and the outbox is cleared and
// latched only after the dispatcher has taken delivery. A lost concurrency
// race reloads the aggregate and re-runs the whole command; the aggregate
// itself carries no retry logic.
//
// ============================================================================

pub struct CommunityCommandHandler {
    store: Arc<dyn SnapshotStore<CommunitySnapshot>>,
    dispatcher: Arc<dyn EventDispatcher<CommunityEvent>>,
    retry: RetryConfig,
}

impl CommunityCommandHandler {
    pub fn new(
        store: Arc<dyn SnapshotStore<CommunitySnapshot>>,
        dispatcher: Arc<dyn EventDispatcher<CommunityEvent>>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Registers a new community and returns its id and stored version.
    pub async fn register(
        &self,
        command: RegisterCommunity,
        correlation_id: Uuid,
    ) -> Result<(Uuid, i64)> {
        let name = CommunityName::new(command.name)?;
        let description = Description::new(command.description)?;
        let location = GeoLocation::new(command.latitude, command.longitude, command.address)?;

        let mut community = Community::create(name, description, location, command.founded_date);
        let community_id = community.id();

        let new_version = self
            .store
            .save(&community.to_snapshot(), 0)
            .await
            .context("failed to persist new community")?;

        self.publish_and_settle(&mut community, 0, correlation_id)
            .await?;

        tracing::info!(
            community_id = %community_id,
            version = new_version,
            "Registered community"
        );

        Ok((community_id, new_version))
    }

    /// Handles a command against an existing community and returns the
    /// stored version afterwards.
    pub async fn handle(
        &self,
        community_id: Uuid,
        command: CommunityCommand,
        correlation_id: Uuid,
    ) -> Result<i64> {
        let mut attempt = 1;

        loop {
            let snapshot = self
                .store
                .load(community_id)
                .await
                .context("failed to load community")?;
            let expected_version = snapshot.version;

            let mut community = Community::reconstitute(snapshot);
            apply_command(&mut community, &command)?;

            // No state change: nothing to persist, nothing to dispatch.
            if community.version() == expected_version {
                tracing::debug!(
                    community_id = %community_id,
                    version = expected_version,
                    "Command was a no-op"
                );
                return Ok(expected_version);
            }

            match self
                .store
                .save(&community.to_snapshot(), expected_version)
                .await
            {
                Ok(new_version) => {
                    self.publish_and_settle(&mut community, expected_version, correlation_id)
                        .await?;
                    return Ok(new_version);
                }
                Err(StoreError::ConcurrencyConflict { expected, actual, .. })
                    if attempt < self.retry.max_attempts =>
                {
                    tracing::warn!(
                        community_id = %community_id,
                        expected = expected,
                        actual = actual,
                        attempt = attempt,
                        "Concurrency conflict, retrying command"
                    );
                    tokio::time::sleep(self.retry.delay_for(attempt)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e).context("failed to persist community"),
            }
        }
    }

    /// Publishes the buffered events, then clears the outbox and sets the
    /// dispatch latch. Called only after a successful save; a dispatch
    /// failure propagates with the events still buffered.
    async fn publish_and_settle(
        &self,
        community: &mut Community,
        base_version: i64,
        correlation_id: Uuid,
    ) -> Result<()> {
        let events = community.drain_events();
        if !events.is_empty() {
            let envelopes: Vec<_> = events
                .into_iter()
                .enumerate()
                .map(|(i, event)| {
                    EventEnvelope::new(
                        community.id(),
                        base_version + i as i64 + 1,
                        event,
                        correlation_id,
                    )
                })
                .collect();

            self.dispatcher
                .publish(&envelopes)
                .await
                .context("failed to dispatch community events")?;
        }

        community.clear_events();
        community.mark_events_dispatched();
        Ok(())
    }
}

fn apply_command(community: &mut Community, command: &CommunityCommand) -> Result<(), CommunityError> {
    match command {
        CommunityCommand::UpdateDetails {
            name,
            description,
            location,
        } => {
            let name = name.as_deref().map(CommunityName::new).transpose()?;
            let description = description.as_deref().map(Description::new).transpose()?;
            let location = location
                .as_ref()
                .map(|(lat, lon, addr)| GeoLocation::new(*lat, *lon, addr.clone()))
                .transpose()?;
            community.update_details(name, description, location);
            Ok(())
        }
        CommunityCommand::AddMember {
            member_id,
            member_name,
        } => community.add_member(*member_id, member_name),
        CommunityCommand::AddStory {
            story_id,
            impact_value,
        } => community.add_story(*story_id, *impact_value),
        CommunityCommand::Deactivate => {
            community.deactivate();
            Ok(())
        }
        CommunityCommand::Reactivate => {
            community.reactivate();
            Ok(())
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::{DispatchError, InMemoryDispatcher};
    use crate::store::InMemorySnapshotStore;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    fn riverside_command() -> RegisterCommunity {
        RegisterCommunity {
            name: "Riverside".to_string(),
            description: "A riverside community".to_string(),
            latitude: -33.8,
            longitude: 151.2,
            address: "Sydney".to_string(),
            founded_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        }
    }

    struct Harness {
        store: Arc<InMemorySnapshotStore<CommunitySnapshot>>,
        dispatcher: Arc<InMemoryDispatcher<CommunityEvent>>,
        handler: CommunityCommandHandler,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemorySnapshotStore::new());
        let dispatcher = Arc::new(InMemoryDispatcher::new());
        let handler = CommunityCommandHandler::new(store.clone(), dispatcher.clone());
        Harness {
            store,
            dispatcher,
            handler,
        }
    }

    #[tokio::test]
    async fn register_persists_then_dispatches() {
        let h = harness();
        let correlation_id = Uuid::new_v4();

        let (id, version) = h.handler.register(riverside_command(), correlation_id).await.unwrap();
        assert_eq!(version, 1);
        assert_eq!(h.store.current_version(id).await.unwrap(), 1);

        let published = h.dispatcher.published().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].event_type, "CommunityCreated");
        assert_eq!(published[0].sequence_number, 1);
        assert_eq!(published[0].correlation_id, correlation_id);
    }

    #[tokio::test]
    async fn register_rejects_invalid_input() {
        let h = harness();
        let mut command = riverside_command();
        command.latitude = 123.0;

        let err = h.handler.register(command, Uuid::new_v4()).await.unwrap_err();
        assert!(err.to_string().contains("latitude"));
        assert!(h.dispatcher.published().await.is_empty());
    }

    #[tokio::test]
    async fn commands_advance_version_and_dispatch_in_order() {
        let h = harness();
        let correlation_id = Uuid::new_v4();
        let (id, _) = h.handler.register(riverside_command(), correlation_id).await.unwrap();

        let v2 = h
            .handler
            .handle(
                id,
                CommunityCommand::AddMember {
                    member_id: Uuid::new_v4(),
                    member_name: "Ana".to_string(),
                },
                correlation_id,
            )
            .await
            .unwrap();
        let v3 = h
            .handler
            .handle(
                id,
                CommunityCommand::AddStory {
                    story_id: Uuid::new_v4(),
                    impact_value: 150.0,
                },
                correlation_id,
            )
            .await
            .unwrap();

        assert_eq!(v2, 2);
        assert_eq!(v3, 3);

        let published = h.dispatcher.published().await;
        let types: Vec<_> = published.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(types, vec!["CommunityCreated", "MemberJoined", "StoryAdded"]);
        let sequences: Vec<_> = published.iter().map(|e| e.sequence_number).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn noop_update_persists_and_dispatches_nothing() {
        let h = harness();
        let (id, _) = h.handler.register(riverside_command(), Uuid::new_v4()).await.unwrap();

        let version = h
            .handler
            .handle(
                id,
                CommunityCommand::UpdateDetails {
                    name: Some("Riverside".to_string()),
                    description: None,
                    location: None,
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap();

        assert_eq!(version, 1);
        assert_eq!(h.store.current_version(id).await.unwrap(), 1);
        assert_eq!(h.dispatcher.published().await.len(), 1);
    }

    #[tokio::test]
    async fn rejected_command_changes_nothing() {
        let h = harness();
        let (id, _) = h.handler.register(riverside_command(), Uuid::new_v4()).await.unwrap();

        h.handler
            .handle(id, CommunityCommand::Deactivate, Uuid::new_v4())
            .await
            .unwrap();

        let err = h
            .handler
            .handle(
                id,
                CommunityCommand::AddMember {
                    member_id: Uuid::new_v4(),
                    member_name: "Ana".to_string(),
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<CommunityError>(),
            Some(&CommunityError::MembersRequireActive)
        );
        assert_eq!(h.store.current_version(id).await.unwrap(), 2);
        // Deactivation emits no event, so only the creation was published.
        assert_eq!(h.dispatcher.published().await.len(), 1);
    }

    #[tokio::test]
    async fn deactivate_then_reactivate_allows_members_again() {
        let h = harness();
        let (id, _) = h.handler.register(riverside_command(), Uuid::new_v4()).await.unwrap();

        h.handler
            .handle(id, CommunityCommand::Deactivate, Uuid::new_v4())
            .await
            .unwrap();
        h.handler
            .handle(id, CommunityCommand::Reactivate, Uuid::new_v4())
            .await
            .unwrap();

        let version = h
            .handler
            .handle(
                id,
                CommunityCommand::AddMember {
                    member_id: Uuid::new_v4(),
                    member_name: "Ana".to_string(),
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap();

        assert_eq!(version, 4);
        let stored = h.store.load(id).await.unwrap();
        assert_eq!(stored.member_count, 1);
        assert!(stored.is_active);
    }

    // Store wrapper that loses the version race a fixed number of times.
    struct FlakyStore {
        inner: InMemorySnapshotStore<CommunitySnapshot>,
        conflicts_remaining: Mutex<u32>,
    }

    #[async_trait]
    impl SnapshotStore<CommunitySnapshot> for FlakyStore {
        async fn save(
            &self,
            snapshot: &CommunitySnapshot,
            expected_version: i64,
        ) -> Result<i64, StoreError> {
            // Never fail the initial registration, only later writes.
            if expected_version > 0 {
                let mut remaining = self.conflicts_remaining.lock().unwrap();
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(StoreError::ConcurrencyConflict {
                        id: snapshot.community_id,
                        expected: expected_version,
                        actual: expected_version + 1,
                    });
                }
            }
            self.inner.save(snapshot, expected_version).await
        }

        async fn load(&self, aggregate_id: Uuid) -> Result<CommunitySnapshot, StoreError> {
            self.inner.load(aggregate_id).await
        }

        async fn current_version(&self, aggregate_id: Uuid) -> Result<i64, StoreError> {
            self.inner.current_version(aggregate_id).await
        }
    }

    #[tokio::test]
    async fn handler_retries_through_transient_conflicts() {
        let store = Arc::new(FlakyStore {
            inner: InMemorySnapshotStore::new(),
            conflicts_remaining: Mutex::new(2),
        });
        let dispatcher = Arc::new(InMemoryDispatcher::new());
        let handler = CommunityCommandHandler::new(store.clone(), dispatcher.clone());

        let (id, _) = handler.register(riverside_command(), Uuid::new_v4()).await.unwrap();

        let version = handler
            .handle(
                id,
                CommunityCommand::AddMember {
                    member_id: Uuid::new_v4(),
                    member_name: "Ana".to_string(),
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap();

        assert_eq!(version, 2);
        // The member join was published exactly once despite the retries.
        let published = dispatcher.published().await;
        let joins = published
            .iter()
            .filter(|e| e.event_type == "MemberJoined")
            .count();
        assert_eq!(joins, 1);
    }

    #[tokio::test]
    async fn conflicts_beyond_the_retry_budget_fail() {
        let store = Arc::new(FlakyStore {
            inner: InMemorySnapshotStore::new(),
            conflicts_remaining: Mutex::new(u32::MAX),
        });
        let dispatcher = Arc::new(InMemoryDispatcher::new());
        let handler = CommunityCommandHandler::new(store.clone(), dispatcher.clone());

        let (id, _) = handler.register(riverside_command(), Uuid::new_v4()).await.unwrap();

        let err = handler
            .handle(id, CommunityCommand::Deactivate, Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::ConcurrencyConflict { .. })
        ));
    }

    // Dispatcher that never takes delivery.
    struct FailingDispatcher;

    #[async_trait]
    impl EventDispatcher<CommunityEvent> for FailingDispatcher {
        async fn publish(
            &self,
            envelopes: &[EventEnvelope<CommunityEvent>],
        ) -> Result<(), DispatchError> {
            Err(DispatchError::PublishFailed {
                event_type: envelopes[0].event_type.clone(),
                reason: "transport down".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn dispatch_failure_surfaces_after_state_is_persisted() {
        let store = Arc::new(InMemorySnapshotStore::new());
        let ok_handler = CommunityCommandHandler::new(
            store.clone(),
            Arc::new(InMemoryDispatcher::new()),
        );
        let (id, _) = ok_handler.register(riverside_command(), Uuid::new_v4()).await.unwrap();

        let broken_handler =
            CommunityCommandHandler::new(store.clone(), Arc::new(FailingDispatcher));
        let err = broken_handler
            .handle(
                id,
                CommunityCommand::AddMember {
                    member_id: Uuid::new_v4(),
                    member_name: "Ana".to_string(),
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap_err();

        // The failure must not be silently treated as success, but the state
        // write happened before the dispatch attempt.
        assert!(err.to_string().contains("dispatch"));
        assert_eq!(store.current_version(id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn dispatch_failure_leaves_events_buffered() {
        let handler = CommunityCommandHandler::new(
            Arc::new(InMemorySnapshotStore::new()),
            Arc::new(FailingDispatcher),
        );

        let mut community = Community::create(
            CommunityName::new("Riverside").unwrap(),
            Description::new("").unwrap(),
            GeoLocation::new(-33.8, 151.2, "Sydney").unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        );

        let err = handler
            .publish_and_settle(&mut community, 0, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("dispatch"));

        // The outbox is cleared and latched only after the dispatcher takes
        // delivery; a failed publish must leave both untouched so a crash
        // here is not mistaken for success.
        assert_eq!(community.drain_events().len(), 1);
        assert!(!community.events_dispatched());
    }
}
