use sea_orm_migration::prelude::*;

use crate::m20250601_000004_create_orders_table::Orders;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // History screen filters by table
        manager
            .create_index(
                Index::create()
                    .name("idx_orders_table_number")
                    .table(Orders::Table)
                    .col(Orders::TableNumber)
                    .to_owned(),
            )
            .await?;

        // Pending/paid splits
        manager
            .create_index(
                Index::create()
                    .name("idx_orders_status")
                    .table(Orders::Table)
                    .col(Orders::Status)
                    .to_owned(),
            )
            .await?;

        // Collection reports scan paid orders by date
        manager
            .create_index(
                Index::create()
                    .name("idx_orders_paid_at")
                    .table(Orders::Table)
                    .col(Orders::PaidAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_orders_paid_at")
                    .table(Orders::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_orders_status")
                    .table(Orders::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_orders_table_number")
                    .table(Orders::Table)
                    .to_owned(),
            )
            .await
    }
}
