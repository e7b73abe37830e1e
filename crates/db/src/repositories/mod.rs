//! Data access repositories.

mod car;
mod car_like;
mod event;
mod event_attendee;
mod following;
mod user;

pub use car::CarRepository;
pub use car_like::CarLikeRepository;
pub use event::EventRepository;
pub use event_attendee::EventAttendeeRepository;
pub use following::FollowingRepository;
pub use user::UserRepository;

use sea_orm::{ColumnTrait, sea_query::{Expr, SimpleExpr}};

/// Build the `SET` expression for a signed counter adjustment.
///
/// Decrements are clamped at zero so a counter never goes negative.
pub(crate) fn counter_delta_expr<C: ColumnTrait>(column: C, delta: i32) -> SimpleExpr {
    if delta >= 0 {
        Expr::col(column).add(delta)
    } else {
        Expr::cust(format!(
            "GREATEST({} - {}, 0)",
            column.as_str(),
            delta.unsigned_abs()
        ))
    }
}
