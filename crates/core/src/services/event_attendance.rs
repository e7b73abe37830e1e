//! Event attendance service.

use std::sync::Arc;

use carmeet_common::{AppResult, CounterMode};
use carmeet_db::entities::event_attendee::AttendeeStatus;
use serde::Serialize;

use super::invalidation::{CacheTag, InvalidationDispatcher};
use super::toggle::{
    AttendanceChoice, CounterField, CounterStore, Relationship, RelationshipKind,
    RelationshipStore, RelationshipToggle, Resolution, ToggleSpec,
};

/// Result of an attendance toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceResult {
    pub is_attending: bool,
    pub attendee_count: i64,
    pub status: Option<AttendeeStatus>,
    pub resolution: Resolution,
}

fn attend_tags(actor_id: &str, event_id: &str) -> Vec<CacheTag> {
    vec![
        CacheTag::Event(event_id.to_string()),
        CacheTag::User(actor_id.to_string()),
        CacheTag::EventList,
    ]
}

/// Toggle spec for event attendance.
#[must_use]
pub fn attend_spec(attendees: Arc<dyn RelationshipStore>) -> ToggleSpec {
    ToggleSpec {
        kind: RelationshipKind::Attend,
        relationships: attendees,
        target_counter: CounterField::EventAttendees,
        actor_counter: None,
        self_reference_error: None,
        default_status: Some(AttendeeStatus::Going),
        invalidation_tags: attend_tags,
    }
}

/// Event attendance service for business logic.
#[derive(Clone)]
pub struct EventAttendanceService {
    toggle: RelationshipToggle,
}

impl EventAttendanceService {
    /// Create a new event attendance service.
    #[must_use]
    pub fn new(
        attendees: Arc<dyn RelationshipStore>,
        counters: Arc<dyn CounterStore>,
        invalidation: InvalidationDispatcher,
        mode: CounterMode,
    ) -> Self {
        Self {
            toggle: RelationshipToggle::new(attend_spec(attendees), counters, invalidation, mode),
        }
    }

    fn attendees(&self) -> &dyn RelationshipStore {
        self.toggle.spec().relationships.as_ref()
    }

    /// Set or toggle attendance.
    ///
    /// `interested`/`going` always set that status, keeping an existing row.
    /// `remove` deletes. Without a status an existing row is removed and a
    /// missing one is created as `going`.
    pub async fn toggle_attendance(
        &self,
        actor_id: Option<&str>,
        event_id: &str,
        choice: Option<AttendanceChoice>,
    ) -> AppResult<AttendanceResult> {
        let outcome = self.toggle.toggle(actor_id, event_id, choice).await?;

        Ok(AttendanceResult {
            is_attending: outcome.is_active,
            attendee_count: outcome.counter,
            status: outcome.status,
            resolution: outcome.resolution,
        })
    }

    /// A user's attendance status for an event, if any.
    pub async fn attendance_status(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> AppResult<Option<AttendeeStatus>> {
        Ok(self
            .attendees()
            .find(user_id, event_id)
            .await?
            .and_then(|r| r.status))
    }

    /// Attendees of an event, newest first.
    pub async fn attendees_of(
        &self,
        event_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<Relationship>> {
        self.attendees().list_for_target(event_id, limit, until_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::memory::{MemoryCounterStore, MemoryRelationshipStore};

    async fn setup() -> (EventAttendanceService, Arc<MemoryRelationshipStore>) {
        let attendees = Arc::new(MemoryRelationshipStore::new());
        let counters = Arc::new(MemoryCounterStore::new());
        counters.insert(CounterField::EventAttendees, "ev1", 0).await;

        let service = EventAttendanceService::new(
            attendees.clone(),
            counters,
            InvalidationDispatcher::noop(),
            CounterMode::Atomic,
        );
        (service, attendees)
    }

    #[tokio::test]
    async fn test_interested_then_going_then_remove() {
        let (service, attendees) = setup().await;

        let interested = service
            .toggle_attendance(Some("userA"), "ev1", Some(AttendanceChoice::Interested))
            .await
            .unwrap();
        assert!(interested.is_attending);
        assert_eq!(interested.attendee_count, 1);
        assert_eq!(interested.status, Some(AttendeeStatus::Interested));
        let row_id = attendees.get("userA", "ev1").await.unwrap().id;

        let going = service
            .toggle_attendance(Some("userA"), "ev1", Some(AttendanceChoice::Going))
            .await
            .unwrap();
        assert!(going.is_attending);
        assert_eq!(going.attendee_count, 1);
        assert_eq!(attendees.get("userA", "ev1").await.unwrap().id, row_id);
        assert_eq!(
            service.attendance_status("userA", "ev1").await.unwrap(),
            Some(AttendeeStatus::Going)
        );

        let removed = service
            .toggle_attendance(Some("userA"), "ev1", Some(AttendanceChoice::Remove))
            .await
            .unwrap();
        assert!(!removed.is_attending);
        assert_eq!(removed.attendee_count, 0);
        assert_eq!(removed.status, None);
        assert_eq!(service.attendance_status("userA", "ev1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_toggle_without_status() {
        let (service, _) = setup().await;

        let joined = service.toggle_attendance(Some("userA"), "ev1", None).await.unwrap();
        assert!(joined.is_attending);
        assert_eq!(joined.status, Some(AttendeeStatus::Going));

        let left = service.toggle_attendance(Some("userA"), "ev1", None).await.unwrap();
        assert!(!left.is_attending);
        assert_eq!(left.attendee_count, 0);
    }

    #[tokio::test]
    async fn test_attendees_of_event() {
        let (service, _) = setup().await;
        service.toggle_attendance(Some("userA"), "ev1", None).await.unwrap();
        service
            .toggle_attendance(Some("userB"), "ev1", Some(AttendanceChoice::Interested))
            .await
            .unwrap();

        let rows = service.attendees_of("ev1", 10, None).await.unwrap();

        assert_eq!(rows.len(), 2);
    }
}
