//! Create car like table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CarLike::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CarLike::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(CarLike::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(CarLike::CarId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(CarLike::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_car_like_user")
                            .from(CarLike::Table, CarLike::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_car_like_car")
                            .from(CarLike::Table, CarLike::CarId)
                            .to(Car::Table, Car::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, car_id) - one like per user per car
        manager
            .create_index(
                Index::create()
                    .name("idx_car_like_user_car")
                    .table(CarLike::Table)
                    .col(CarLike::UserId)
                    .col(CarLike::CarId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_car_like_car_id")
                    .table(CarLike::Table)
                    .col(CarLike::CarId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CarLike::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CarLike {
    Table,
    Id,
    UserId,
    CarId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Car {
    Table,
    Id,
}
