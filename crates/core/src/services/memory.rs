//! In-memory stores for tests.
//!
//! Each store counts the calls it receives and can be told to fail, so tests
//! can assert which side effects an operation had.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

use async_trait::async_trait;
use carmeet_common::{AppError, AppResult};
use carmeet_db::entities::event_attendee::AttendeeStatus;
use tokio::sync::{Barrier, Mutex, mpsc};

use super::invalidation::{CacheInvalidator, CacheTag};
use super::toggle::{CounterField, CounterStore, Relationship, RelationshipStore};
use super::user::IdentityResolver;

fn unavailable() -> AppError {
    AppError::StoreUnavailable("injected failure".to_string())
}

fn page(mut rows: Vec<Relationship>, limit: u64, until_id: Option<&str>) -> Vec<Relationship> {
    rows.retain(|r| until_id.is_none_or(|until| r.id.as_str() < until));
    rows.sort_by(|a, b| b.id.cmp(&a.id));
    rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    rows
}

/// Relationship store backed by a vector.
#[derive(Default)]
pub struct MemoryRelationshipStore {
    rows: Mutex<Vec<Relationship>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryRelationshipStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows.
    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    /// Whether the store holds no rows.
    pub async fn is_empty(&self) -> bool {
        self.rows.lock().await.is_empty()
    }

    /// Row for a pair, bypassing call counting.
    pub async fn get(&self, actor_id: &str, target_id: &str) -> Option<Relationship> {
        self.rows
            .lock()
            .await
            .iter()
            .find(|r| r.actor_id == actor_id && r.target_id == target_id)
            .cloned()
    }

    /// Number of read calls received.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of write calls received (insert, delete, status update).
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every read fail with `StoreUnavailable`.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every write fail with `StoreUnavailable`.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn begin_read(&self) -> AppResult<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(())
    }

    fn begin_write(&self) -> AppResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(())
    }
}

#[async_trait]
impl RelationshipStore for MemoryRelationshipStore {
    async fn find(&self, actor_id: &str, target_id: &str) -> AppResult<Option<Relationship>> {
        self.begin_read()?;
        Ok(self.get(actor_id, target_id).await)
    }

    async fn insert(&self, relationship: Relationship) -> AppResult<bool> {
        self.begin_write()?;
        let mut rows = self.rows.lock().await;
        if rows
            .iter()
            .any(|r| r.actor_id == relationship.actor_id && r.target_id == relationship.target_id)
        {
            return Ok(false);
        }
        rows.push(relationship);
        Ok(true)
    }

    async fn delete(&self, actor_id: &str, target_id: &str) -> AppResult<bool> {
        self.begin_write()?;
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|r| !(r.actor_id == actor_id && r.target_id == target_id));
        Ok(rows.len() < before)
    }

    async fn update_status(
        &self,
        actor_id: &str,
        target_id: &str,
        status: AttendeeStatus,
    ) -> AppResult<bool> {
        self.begin_write()?;
        let mut rows = self.rows.lock().await;
        match rows
            .iter_mut()
            .find(|r| r.actor_id == actor_id && r.target_id == target_id)
        {
            Some(row) => {
                row.status = Some(status);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count_for_target(&self, target_id: &str) -> AppResult<u64> {
        self.begin_read()?;
        let rows = self.rows.lock().await;
        Ok(rows.iter().filter(|r| r.target_id == target_id).count() as u64)
    }

    async fn count_for_actor(&self, actor_id: &str) -> AppResult<u64> {
        self.begin_read()?;
        let rows = self.rows.lock().await;
        Ok(rows.iter().filter(|r| r.actor_id == actor_id).count() as u64)
    }

    async fn list_for_target(
        &self,
        target_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<Relationship>> {
        self.begin_read()?;
        let rows = self.rows.lock().await;
        let matching = rows.iter().filter(|r| r.target_id == target_id).cloned().collect();
        Ok(page(matching, limit, until_id))
    }

    async fn list_for_actor(
        &self,
        actor_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<Relationship>> {
        self.begin_read()?;
        let rows = self.rows.lock().await;
        let matching = rows.iter().filter(|r| r.actor_id == actor_id).cloned().collect();
        Ok(page(matching, limit, until_id))
    }
}

/// Wraps a store so the first `parties` lookups wait for each other.
///
/// Every gated caller observes the state from before any of them wrote,
/// which reproduces two requests racing on the same pair.
pub struct GatedRelationshipStore {
    inner: Arc<MemoryRelationshipStore>,
    barrier: Barrier,
    remaining: AtomicUsize,
}

impl GatedRelationshipStore {
    /// Gate the first `parties` calls to `find`.
    #[must_use]
    pub fn new(inner: Arc<MemoryRelationshipStore>, parties: usize) -> Self {
        Self {
            inner,
            barrier: Barrier::new(parties),
            remaining: AtomicUsize::new(parties),
        }
    }
}

#[async_trait]
impl RelationshipStore for GatedRelationshipStore {
    async fn find(&self, actor_id: &str, target_id: &str) -> AppResult<Option<Relationship>> {
        let found = self.inner.find(actor_id, target_id).await?;
        if self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            self.barrier.wait().await;
        }
        Ok(found)
    }

    async fn insert(&self, relationship: Relationship) -> AppResult<bool> {
        self.inner.insert(relationship).await
    }

    async fn delete(&self, actor_id: &str, target_id: &str) -> AppResult<bool> {
        self.inner.delete(actor_id, target_id).await
    }

    async fn update_status(
        &self,
        actor_id: &str,
        target_id: &str,
        status: AttendeeStatus,
    ) -> AppResult<bool> {
        self.inner.update_status(actor_id, target_id, status).await
    }

    async fn count_for_target(&self, target_id: &str) -> AppResult<u64> {
        self.inner.count_for_target(target_id).await
    }

    async fn count_for_actor(&self, actor_id: &str) -> AppResult<u64> {
        self.inner.count_for_actor(actor_id).await
    }

    async fn list_for_target(
        &self,
        target_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<Relationship>> {
        self.inner.list_for_target(target_id, limit, until_id).await
    }

    async fn list_for_actor(
        &self,
        actor_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<Relationship>> {
        self.inner.list_for_actor(actor_id, limit, until_id).await
    }
}

const fn field_bit(field: CounterField) -> u8 {
    match field {
        CounterField::CarLikes => 1,
        CounterField::UserFollowers => 1 << 1,
        CounterField::UserFollowing => 1 << 2,
        CounterField::EventAttendees => 1 << 3,
    }
}

/// Counter store backed by a map.
#[derive(Default)]
pub struct MemoryCounterStore {
    values: Mutex<HashMap<(CounterField, String), i64>>,
    writes: AtomicUsize,
    failing: AtomicU8,
}

impl MemoryCounterStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a counter, creating its entity.
    pub async fn insert(&self, field: CounterField, entity_id: &str, value: i64) {
        self.values
            .lock()
            .await
            .insert((field, entity_id.to_string()), value);
    }

    /// Current value, bypassing call counting.
    pub async fn get(&self, field: CounterField, entity_id: &str) -> Option<i64> {
        self.values
            .lock()
            .await
            .get(&(field, entity_id.to_string()))
            .copied()
    }

    /// Number of write calls received.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make writes to every counter fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.failing.store(if fail { u8::MAX } else { 0 }, Ordering::SeqCst);
    }

    /// Make writes to one counter fail.
    pub fn fail_writes_for(&self, field: CounterField) {
        self.failing.fetch_or(field_bit(field), Ordering::SeqCst);
    }

    fn begin_write(&self, field: CounterField) -> AppResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) & field_bit(field) != 0 {
            return Err(unavailable());
        }
        Ok(())
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn read(&self, field: CounterField, entity_id: &str) -> AppResult<Option<i64>> {
        Ok(self.get(field, entity_id).await)
    }

    async fn adjust(&self, field: CounterField, entity_id: &str, delta: i64) -> AppResult<i64> {
        self.begin_write(field)?;
        let mut values = self.values.lock().await;
        let value = values
            .get_mut(&(field, entity_id.to_string()))
            .ok_or_else(|| AppError::NotFound(format!("{} {entity_id}", field.entity())))?;
        *value = (*value + delta).max(0);
        Ok(*value)
    }

    async fn overwrite(&self, field: CounterField, entity_id: &str, value: i64) -> AppResult<()> {
        self.begin_write(field)?;
        let mut values = self.values.lock().await;
        let stored = values
            .get_mut(&(field, entity_id.to_string()))
            .ok_or_else(|| AppError::NotFound(format!("{} {entity_id}", field.entity())))?;
        *stored = value;
        Ok(())
    }
}

/// Invalidator that forwards every tag set to a channel.
pub struct RecordingInvalidator {
    tx: mpsc::UnboundedSender<Vec<CacheTag>>,
}

impl RecordingInvalidator {
    /// Create the invalidator and the receiving end of its channel.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Vec<CacheTag>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl CacheInvalidator for RecordingInvalidator {
    async fn invalidate(&self, tags: &[CacheTag]) -> AppResult<()> {
        self.tx
            .send(tags.to_vec())
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}

/// Invalidator that always fails.
#[derive(Default)]
pub struct FailingInvalidator {
    attempts: AtomicUsize,
}

impl FailingInvalidator {
    /// Number of invalidation attempts.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheInvalidator for FailingInvalidator {
    async fn invalidate(&self, _tags: &[CacheTag]) -> AppResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AppError::Internal("cache unreachable".to_string()))
    }
}

/// Identity resolver with a fixed token table.
#[derive(Default)]
pub struct StaticIdentityResolver {
    tokens: HashMap<String, String>,
}

impl StaticIdentityResolver {
    /// Create a resolver that knows no tokens.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `token` as belonging to `actor_id`.
    #[must_use]
    pub fn with_token(mut self, token: &str, actor_id: &str) -> Self {
        self.tokens.insert(token.to_string(), actor_id.to_string());
        self
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentityResolver {
    async fn resolve(&self, token: &str) -> AppResult<Option<String>> {
        Ok(self.tokens.get(token).cloned())
    }
}
