//! Database entities.

#![allow(missing_docs)]

pub mod car;
pub mod car_like;
pub mod event;
pub mod event_attendee;
pub mod following;
pub mod user;

pub use car::Entity as Car;
pub use car_like::Entity as CarLike;
pub use event::Entity as Event;
pub use event_attendee::Entity as EventAttendee;
pub use following::Entity as Following;
pub use user::Entity as User;
