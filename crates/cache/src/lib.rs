//! Redis-backed cache invalidation for carmeet.
//!
//! Cached views are stored under `{prefix}:view:{path}`. Invalidating a tag
//! deletes its key and announces the path on a Pub/Sub channel so other
//! instances can drop whatever they hold locally.

mod invalidator;

pub use invalidator::{CacheError, InvalidationMessage, RedisCacheInvalidator};
