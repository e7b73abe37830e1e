//! Business logic services.

#![allow(missing_docs)]

pub mod car_like;
pub mod counter_maintenance;
pub mod event_attendance;
pub mod following;
pub mod invalidation;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod recount;
pub mod store;
pub mod toggle;
pub mod user;

pub use car_like::{CarLikeService, LikeResult};
pub use counter_maintenance::{CounterMaintenanceService, ReconcileReport};
pub use event_attendance::{AttendanceResult, EventAttendanceService};
pub use following::{FollowResult, FollowingService};
pub use invalidation::{
    CacheInvalidator, CacheInvalidatorService, CacheTag, InvalidationDispatcher, NoOpInvalidator,
};
pub use recount::RecountHelper;
pub use store::SeaOrmCounterStore;
pub use toggle::{
    AttendanceChoice, CounterField, CounterStore, Relationship, RelationshipKind,
    RelationshipStore, RelationshipToggle, Resolution, ToggleOutcome, ToggleSpec,
};
pub use user::{IdentityResolver, UserService};
