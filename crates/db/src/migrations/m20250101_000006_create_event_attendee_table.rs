//! Create event attendee table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EventAttendee::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EventAttendee::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EventAttendee::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(EventAttendee::EventId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(EventAttendee::Status)
                            .string_len(16)
                            .not_null()
                            .default("going"),
                    )
                    .col(
                        ColumnDef::new(EventAttendee::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(EventAttendee::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_attendee_user")
                            .from(EventAttendee::Table, EventAttendee::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_attendee_event")
                            .from(EventAttendee::Table, EventAttendee::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, event_id) - one attendance row per user per event
        manager
            .create_index(
                Index::create()
                    .name("idx_event_attendee_user_event")
                    .table(EventAttendee::Table)
                    .col(EventAttendee::UserId)
                    .col(EventAttendee::EventId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_event_attendee_event_id")
                    .table(EventAttendee::Table)
                    .col(EventAttendee::EventId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EventAttendee::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum EventAttendee {
    Table,
    Id,
    UserId,
    EventId,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Event {
    Table,
    Id,
}
