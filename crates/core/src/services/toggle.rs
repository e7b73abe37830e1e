//! Toggle-and-recount engine.
//!
//! Car likes, follows and event attendance all share one algorithm: look up
//! the (actor, target) relationship, insert/delete/re-status it, then bring the
//! denormalized counter(s) on the target (and for follows, the actor) back in
//! line with the relationship rows. [`RelationshipToggle`] implements it once;
//! a [`ToggleSpec`] supplies what differs between the kinds.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use carmeet_common::{AppError, AppResult, CounterMode, IdGenerator};
use carmeet_db::entities::event_attendee::AttendeeStatus;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::invalidation::{CacheTag, InvalidationDispatcher};
use super::recount::RecountHelper;

/// Kind of relationship an actor can hold towards a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
    /// A user likes a car.
    Like,
    /// A user follows another user.
    Follow,
    /// A user attends an event.
    Attend,
}

impl RelationshipKind {
    /// Wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Follow => "follow",
            Self::Attend => "attend",
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored (actor, target) relationship row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub actor_id: String,
    pub target_id: String,
    /// Only attendance rows carry a status.
    pub status: Option<AttendeeStatus>,
}

/// Explicit attendance status requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceChoice {
    Interested,
    Going,
    Remove,
}

impl AttendanceChoice {
    /// The status to store, or `None` for [`AttendanceChoice::Remove`].
    #[must_use]
    pub const fn status(self) -> Option<AttendeeStatus> {
        match self {
            Self::Interested => Some(AttendeeStatus::Interested),
            Self::Going => Some(AttendeeStatus::Going),
            Self::Remove => None,
        }
    }
}

/// How a successful toggle was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Resolution {
    /// The relationship write changed a row.
    Applied,
    /// A concurrent request already put the relationship in the requested
    /// state; counters were left alone.
    ConflictIgnored,
}

/// Result of a toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// Whether the relationship exists after the toggle.
    pub is_active: bool,
    /// Counter on the target after the toggle.
    pub counter: i64,
    /// Counter on the actor, for kinds that maintain one.
    pub actor_counter: Option<i64>,
    /// Attendance status after the toggle.
    pub status: Option<AttendeeStatus>,
    pub resolution: Resolution,
}

/// Denormalized counter columns maintained by the toggle engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterField {
    /// `car.total_likes`
    CarLikes,
    /// `user.follower_count`
    UserFollowers,
    /// `user.following_count`
    UserFollowing,
    /// `event.attendee_count`
    EventAttendees,
}

impl CounterField {
    /// Name of the entity holding the counter.
    #[must_use]
    pub const fn entity(self) -> &'static str {
        match self {
            Self::CarLikes => "Car",
            Self::UserFollowers | Self::UserFollowing => "User",
            Self::EventAttendees => "Event",
        }
    }

    /// Whether the counter aggregates rows where its entity is the actor.
    #[must_use]
    pub const fn counts_actor_side(self) -> bool {
        matches!(self, Self::UserFollowing)
    }
}

/// Keyed set of (actor, target) rows for one relationship kind.
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    /// Point lookup by pair.
    async fn find(&self, actor_id: &str, target_id: &str) -> AppResult<Option<Relationship>>;

    /// Insert unless the pair already exists. Returns `true` if a row was written.
    async fn insert(&self, relationship: Relationship) -> AppResult<bool>;

    /// Delete by pair. Returns `true` if a row was removed.
    async fn delete(&self, actor_id: &str, target_id: &str) -> AppResult<bool>;

    /// Overwrite the status of an existing row, keeping its id.
    ///
    /// Returns `false` if the row does not exist.
    async fn update_status(
        &self,
        _actor_id: &str,
        _target_id: &str,
        _status: AttendeeStatus,
    ) -> AppResult<bool> {
        Err(AppError::InvalidOperation(
            "Relationship does not carry a status".to_string(),
        ))
    }

    /// Count rows referencing a target.
    async fn count_for_target(&self, target_id: &str) -> AppResult<u64>;

    /// Count rows created by an actor.
    async fn count_for_actor(&self, actor_id: &str) -> AppResult<u64>;

    /// Rows referencing a target, newest first.
    async fn list_for_target(
        &self,
        target_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<Relationship>>;

    /// Rows created by an actor, newest first.
    async fn list_for_actor(
        &self,
        actor_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<Relationship>>;
}

/// Read/write access to the denormalized counters.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Current value, or `None` if the entity does not exist.
    async fn read(&self, field: CounterField, entity_id: &str) -> AppResult<Option<i64>>;

    /// Apply a signed delta in a single statement (clamped at zero) and
    /// return the new value.
    async fn adjust(&self, field: CounterField, entity_id: &str, delta: i64) -> AppResult<i64>;

    /// Overwrite the counter.
    async fn overwrite(&self, field: CounterField, entity_id: &str, value: i64) -> AppResult<()>;
}

/// What differs between relationship kinds.
#[derive(Clone)]
pub struct ToggleSpec {
    pub kind: RelationshipKind,
    pub relationships: Arc<dyn RelationshipStore>,
    /// Counter on the target entity.
    pub target_counter: CounterField,
    /// Counter on the actor, if the kind maintains one.
    pub actor_counter: Option<CounterField>,
    /// Error message when actor and target are the same, if that is forbidden.
    pub self_reference_error: Option<&'static str>,
    /// Status given to rows created without an explicit status.
    pub default_status: Option<AttendeeStatus>,
    /// Cache tags made stale by a toggle, given (actor, target).
    pub invalidation_tags: fn(&str, &str) -> Vec<CacheTag>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Insert(Option<AttendeeStatus>),
    /// Explicit status with no row seen: insert, or update if one appeared.
    Upsert(AttendeeStatus),
    /// Explicit status on an existing row: update, or insert if it vanished.
    SetStatus(AttendeeStatus),
    Delete,
}

/// Effect of the relationship write.
struct Write {
    is_active: bool,
    /// Change to apply to the counters (0 for a status change).
    delta: i64,
    changed: bool,
    status: Option<AttendeeStatus>,
}

/// Decide what to do with the relationship row.
///
/// An explicit non-remove status always upserts. `remove`, or no status
/// while a row exists, deletes. No status and no row inserts.
fn decide(
    existing: bool,
    choice: Option<AttendanceChoice>,
    default_status: Option<AttendeeStatus>,
) -> Action {
    match (choice.map(AttendanceChoice::status), existing) {
        (Some(Some(status)), false) => Action::Upsert(status),
        (Some(Some(status)), true) => Action::SetStatus(status),
        (Some(None), _) | (None, true) => Action::Delete,
        (None, false) => Action::Insert(default_status),
    }
}

/// Generic toggle-and-recount operation.
#[derive(Clone)]
pub struct RelationshipToggle {
    spec: ToggleSpec,
    counters: Arc<dyn CounterStore>,
    recount: RecountHelper,
    invalidation: InvalidationDispatcher,
    mode: CounterMode,
    id_gen: IdGenerator,
}

impl RelationshipToggle {
    /// Create a new toggle engine.
    #[must_use]
    pub fn new(
        spec: ToggleSpec,
        counters: Arc<dyn CounterStore>,
        invalidation: InvalidationDispatcher,
        mode: CounterMode,
    ) -> Self {
        Self {
            spec,
            recount: RecountHelper::new(counters.clone()),
            counters,
            invalidation,
            mode,
            id_gen: IdGenerator::new(),
        }
    }

    /// The spec this engine was built with.
    #[must_use]
    pub const fn spec(&self) -> &ToggleSpec {
        &self.spec
    }

    /// Flip the relationship between `actor_id` and `target_id`.
    ///
    /// `choice` is only accepted for attendance.
    pub async fn toggle(
        &self,
        actor_id: Option<&str>,
        target_id: &str,
        choice: Option<AttendanceChoice>,
    ) -> AppResult<ToggleOutcome> {
        let kind = self.spec.kind;
        let actor_id = actor_id.ok_or(AppError::Unauthenticated)?;

        if target_id.trim().is_empty() {
            return Err(AppError::InvalidArgument(format!(
                "{} id is required",
                self.spec.target_counter.entity()
            )));
        }
        if choice.is_some() && kind != RelationshipKind::Attend {
            return Err(AppError::InvalidArgument(format!(
                "A {kind} does not take a status"
            )));
        }
        if let Some(message) = self.spec.self_reference_error {
            if actor_id == target_id {
                return Err(AppError::InvalidOperation(message.to_string()));
            }
        }

        let before = self
            .counters
            .read(self.spec.target_counter, target_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "{} {target_id}",
                    self.spec.target_counter.entity()
                ))
            })?;

        let existing = self.spec.relationships.find(actor_id, target_id).await?;
        let action = decide(existing.is_some(), choice, self.spec.default_status);
        debug!(%kind, actor_id, target_id, ?action, "Toggling relationship");

        let write = self.apply(actor_id, target_id, action).await?;

        let (counter, actor_counter, resolution) = if !write.changed {
            info!(%kind, actor_id, target_id, "Relationship already in requested state, conflict ignored");
            let counter = self
                .counters
                .read(self.spec.target_counter, target_id)
                .await?
                .unwrap_or(before);
            (
                counter,
                self.read_actor_counter(actor_id).await?,
                Resolution::ConflictIgnored,
            )
        } else if write.delta == 0 {
            let counter = self
                .counters
                .read(self.spec.target_counter, target_id)
                .await?
                .unwrap_or(before);
            (
                counter,
                self.read_actor_counter(actor_id).await?,
                Resolution::Applied,
            )
        } else {
            let (counter, actor_counter) =
                self.update_counters(actor_id, target_id, write.delta).await?;
            (counter, actor_counter, Resolution::Applied)
        };

        let status = if !write.changed && write.is_active && kind == RelationshipKind::Attend {
            // Lost an insert race; report what the winner stored.
            self.spec
                .relationships
                .find(actor_id, target_id)
                .await?
                .and_then(|r| r.status)
        } else {
            write.status
        };

        self.invalidation
            .dispatch((self.spec.invalidation_tags)(actor_id, target_id));

        Ok(ToggleOutcome {
            is_active: write.is_active,
            counter,
            actor_counter,
            status,
            resolution,
        })
    }

    async fn apply(&self, actor_id: &str, target_id: &str, action: Action) -> AppResult<Write> {
        match action {
            Action::Insert(status) => self.insert(actor_id, target_id, status).await,
            Action::Upsert(status) => {
                let write = self.insert(actor_id, target_id, Some(status)).await?;
                if write.changed {
                    return Ok(write);
                }
                // Lost an insert race; the explicit status still applies.
                Ok(self
                    .update_status(actor_id, target_id, status)
                    .await?
                    .unwrap_or(write))
            }
            Action::SetStatus(status) => {
                match self.update_status(actor_id, target_id, status).await? {
                    Some(write) => Ok(write),
                    // Row vanished between lookup and update.
                    None => self.insert(actor_id, target_id, Some(status)).await,
                }
            }
            Action::Delete => {
                let changed = self.spec.relationships.delete(actor_id, target_id).await?;
                Ok(Write {
                    is_active: false,
                    delta: -1,
                    changed,
                    status: None,
                })
            }
        }
    }

    async fn update_status(
        &self,
        actor_id: &str,
        target_id: &str,
        status: AttendeeStatus,
    ) -> AppResult<Option<Write>> {
        let updated = self
            .spec
            .relationships
            .update_status(actor_id, target_id, status)
            .await?;

        Ok(updated.then_some(Write {
            is_active: true,
            delta: 0,
            changed: true,
            status: Some(status),
        }))
    }

    async fn insert(
        &self,
        actor_id: &str,
        target_id: &str,
        status: Option<AttendeeStatus>,
    ) -> AppResult<Write> {
        let changed = self
            .spec
            .relationships
            .insert(Relationship {
                id: self.id_gen.generate(),
                actor_id: actor_id.to_string(),
                target_id: target_id.to_string(),
                status,
            })
            .await?;

        Ok(Write {
            is_active: true,
            delta: 1,
            changed,
            status,
        })
    }

    async fn update_counters(
        &self,
        actor_id: &str,
        target_id: &str,
        delta: i64,
    ) -> AppResult<(i64, Option<i64>)> {
        let counter = self
            .write_counter(self.spec.target_counter, target_id, delta)
            .await
            .map_err(|e| self.counter_failed(target_id, &e))?;

        let actor_counter = match self.spec.actor_counter {
            Some(field) => Some(
                self.write_counter(field, actor_id, delta)
                    .await
                    .map_err(|e| self.counter_failed(actor_id, &e))?,
            ),
            None => None,
        };

        Ok((counter, actor_counter))
    }

    async fn write_counter(&self, field: CounterField, entity_id: &str, delta: i64) -> AppResult<i64> {
        match self.mode {
            CounterMode::Atomic => self.counters.adjust(field, entity_id, delta).await,
            CounterMode::Recount => {
                self.recount
                    .reconcile(self.spec.relationships.as_ref(), field, entity_id)
                    .await
            }
        }
    }

    async fn read_actor_counter(&self, actor_id: &str) -> AppResult<Option<i64>> {
        match self.spec.actor_counter {
            Some(field) => self.counters.read(field, actor_id).await,
            None => Ok(None),
        }
    }

    fn counter_failed(&self, entity_id: &str, err: &AppError) -> AppError {
        error!(
            kind = %self.spec.kind,
            entity_id,
            error = %err,
            "Counter update failed after relationship write"
        );
        AppError::CounterUpdateFailed {
            target_id: entity_id.to_string(),
            message: err.to_string(),
        }
    }
}
