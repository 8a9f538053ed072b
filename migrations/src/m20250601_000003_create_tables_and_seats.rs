use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RestaurantTables::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RestaurantTables::TableId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RestaurantTables::TableNumber)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(RestaurantTables::TotalSeats)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RestaurantTables::SeatsPerRow)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RestaurantTables::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TableSeats::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TableSeats::SeatId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TableSeats::TableId).big_integer().not_null())
                    .col(ColumnDef::new(TableSeats::SeatNumber).string().not_null())
                    .col(ColumnDef::new(TableSeats::RowNumber).integer().not_null())
                    .col(
                        ColumnDef::new(TableSeats::IsAvailable)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_table_seats_table")
                            .from(TableSeats::Table, TableSeats::TableId)
                            .to(RestaurantTables::Table, RestaurantTables::TableId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_table_seats_table_id")
                    .table(TableSeats::Table)
                    .col(TableSeats::TableId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TableSeats::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RestaurantTables::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum RestaurantTables {
    Table,
    TableId,
    TableNumber,
    TotalSeats,
    SeatsPerRow,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum TableSeats {
    Table,
    SeatId,
    TableId,
    SeatNumber,
    RowNumber,
    IsAvailable,
}
