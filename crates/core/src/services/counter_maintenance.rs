//! Counter maintenance service.
//!
//! Recounts relationship rows and overwrites the denormalized counters. This
//! is the repair path after a toggle reported `CounterUpdateFailed`.

use std::sync::Arc;

use carmeet_common::{AppError, AppResult};
use serde::Serialize;
use tracing::info;

use super::invalidation::{CacheTag, InvalidationDispatcher};
use super::recount::RecountHelper;
use super::toggle::{CounterField, CounterStore, RelationshipKind, RelationshipStore};

/// Counters after a reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub kind: RelationshipKind,
    pub target_id: String,
    pub counter: i64,
    /// For follows, the user's own following count.
    pub actor_counter: Option<i64>,
}

/// Counter maintenance service.
#[derive(Clone)]
pub struct CounterMaintenanceService {
    likes: Arc<dyn RelationshipStore>,
    follows: Arc<dyn RelationshipStore>,
    attendees: Arc<dyn RelationshipStore>,
    recount: RecountHelper,
    invalidation: InvalidationDispatcher,
}

impl CounterMaintenanceService {
    /// Create a new counter maintenance service.
    #[must_use]
    pub fn new(
        likes: Arc<dyn RelationshipStore>,
        follows: Arc<dyn RelationshipStore>,
        attendees: Arc<dyn RelationshipStore>,
        counters: Arc<dyn CounterStore>,
        invalidation: InvalidationDispatcher,
    ) -> Self {
        Self {
            likes,
            follows,
            attendees,
            recount: RecountHelper::new(counters),
            invalidation,
        }
    }

    /// Recount and overwrite the counter(s) of one target.
    pub async fn reconcile(
        &self,
        kind: RelationshipKind,
        target_id: &str,
    ) -> AppResult<ReconcileReport> {
        if target_id.trim().is_empty() {
            return Err(AppError::InvalidArgument("Target id is required".to_string()));
        }

        let (counter, actor_counter, tags) = match kind {
            RelationshipKind::Like => {
                let counter = self
                    .recount
                    .repair(self.likes.as_ref(), CounterField::CarLikes, target_id)
                    .await?;
                let tags = vec![CacheTag::Car(target_id.to_string()), CacheTag::Leaderboard];
                (counter, None, tags)
            }
            RelationshipKind::Follow => {
                let followers = self
                    .recount
                    .repair(self.follows.as_ref(), CounterField::UserFollowers, target_id)
                    .await?;
                let following = self
                    .recount
                    .repair(self.follows.as_ref(), CounterField::UserFollowing, target_id)
                    .await?;
                (followers, Some(following), vec![CacheTag::User(target_id.to_string())])
            }
            RelationshipKind::Attend => {
                let counter = self
                    .recount
                    .repair(self.attendees.as_ref(), CounterField::EventAttendees, target_id)
                    .await?;
                let tags = vec![CacheTag::Event(target_id.to_string()), CacheTag::EventList];
                (counter, None, tags)
            }
        };

        info!(%kind, target_id, counter, ?actor_counter, "Reconciled counters");
        self.invalidation.dispatch(tags);

        Ok(ReconcileReport {
            kind,
            target_id: target_id.to_string(),
            counter,
            actor_counter,
        })
    }
}
