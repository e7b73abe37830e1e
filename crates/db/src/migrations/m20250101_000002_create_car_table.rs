//! Create car table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Car::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Car::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Car::OwnerId).string_len(32).not_null())
                    .col(ColumnDef::new(Car::Make).string_len(128).not_null())
                    .col(ColumnDef::new(Car::Model).string_len(128).not_null())
                    .col(ColumnDef::new(Car::Year).integer())
                    .col(ColumnDef::new(Car::Nickname).string_len(128))
                    .col(ColumnDef::new(Car::TotalLikes).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Car::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Car::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_car_owner")
                            .from(Car::Table, Car::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_car_owner_id")
                    .table(Car::Table)
                    .col(Car::OwnerId)
                    .to_owned(),
            )
            .await?;

        // Index: total_likes (leaderboard)
        manager
            .create_index(
                Index::create()
                    .name("idx_car_total_likes")
                    .table(Car::Table)
                    .col(Car::TotalLikes)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Car::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Car {
    Table,
    Id,
    OwnerId,
    Make,
    Model,
    Year,
    Nickname,
    TotalLikes,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
