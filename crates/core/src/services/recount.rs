//! Aggregate recount helper.

use std::sync::Arc;

use carmeet_common::{AppError, AppResult};
use tracing::info;

use super::toggle::{CounterField, CounterStore, RelationshipStore};

/// Counts relationship rows and writes the result back to a counter.
#[derive(Clone)]
pub struct RecountHelper {
    counters: Arc<dyn CounterStore>,
}

impl RecountHelper {
    /// Create a new recount helper.
    #[must_use]
    pub fn new(counters: Arc<dyn CounterStore>) -> Self {
        Self { counters }
    }

    /// Exact number of rows the counter `field` of `entity_id` should hold.
    pub async fn count(
        &self,
        store: &dyn RelationshipStore,
        field: CounterField,
        entity_id: &str,
    ) -> AppResult<i64> {
        let rows = if field.counts_actor_side() {
            store.count_for_actor(entity_id).await?
        } else {
            store.count_for_target(entity_id).await?
        };

        i64::try_from(rows).map_err(|_| AppError::Internal(format!("Row count {rows} overflows")))
    }

    /// Recount and overwrite the counter, returning the stored value.
    pub async fn reconcile(
        &self,
        store: &dyn RelationshipStore,
        field: CounterField,
        entity_id: &str,
    ) -> AppResult<i64> {
        let count = self.count(store, field, entity_id).await?;
        self.counters.overwrite(field, entity_id, count).await?;
        Ok(count)
    }

    /// Like [`Self::reconcile`], logging when the stored value had drifted.
    pub async fn repair(
        &self,
        store: &dyn RelationshipStore,
        field: CounterField,
        entity_id: &str,
    ) -> AppResult<i64> {
        let stored = self
            .counters
            .read(field, entity_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {entity_id}", field.entity())))?;

        let count = self.reconcile(store, field, entity_id).await?;
        if stored != count {
            info!(?field, entity_id, stored, count, "Repaired drifted counter");
        }

        Ok(count)
    }
}
