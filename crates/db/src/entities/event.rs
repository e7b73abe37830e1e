//! Event entity (meets, track days, cruises).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Hosting user
    #[sea_orm(indexed)]
    pub host_id: String,

    pub title: String,

    #[sea_orm(nullable)]
    pub location: Option<String>,

    pub starts_at: DateTimeWithTimeZone,

    /// Attendee count (denormalized)
    #[sea_orm(default_value = 0)]
    pub attendee_count: i32,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::HostId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Host,

    #[sea_orm(has_many = "super::event_attendee::Entity")]
    Attendees,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Host.def()
    }
}

impl Related<super::event_attendee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attendees.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
