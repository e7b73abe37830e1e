//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,

    pub username_lower: String,

    /// Access token
    #[sea_orm(unique, nullable)]
    pub token: Option<String>,

    /// Display name
    #[sea_orm(nullable)]
    pub name: Option<String>,

    /// Followers count (denormalized)
    #[sea_orm(default_value = 0)]
    pub follower_count: i32,

    /// Following count (denormalized)
    #[sea_orm(default_value = 0)]
    pub following_count: i32,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::car::Entity")]
    Cars,

    #[sea_orm(has_many = "super::event::Entity")]
    HostedEvents,
}

impl Related<super::car::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cars.def()
    }
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HostedEvents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
