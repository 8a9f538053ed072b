use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SubCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SubCategories::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SubCategories::Name).string().not_null())
                    .col(ColumnDef::new(SubCategories::Category).string().not_null())
                    .col(ColumnDef::new(SubCategories::StartTime).time().null())
                    .col(ColumnDef::new(SubCategories::EndTime).time().null())
                    .col(
                        ColumnDef::new(SubCategories::IsTimingActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FoodItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FoodItems::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FoodItems::Name).string().not_null())
                    .col(
                        ColumnDef::new(FoodItems::Price)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(FoodItems::SubCategoryId).big_integer().null())
                    .col(
                        ColumnDef::new(FoodItems::StockStatus)
                            .string_len(16)
                            .not_null()
                            .default("in_stock"),
                    )
                    .col(ColumnDef::new(FoodItems::StartTime).time().null())
                    .col(ColumnDef::new(FoodItems::EndTime).time().null())
                    .col(
                        ColumnDef::new(FoodItems::IsTimingActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(FoodItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_food_items_sub_category")
                            .from(FoodItems::Table, FoodItems::SubCategoryId)
                            .to(SubCategories::Table, SubCategories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FoodItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SubCategories::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum SubCategories {
    Table,
    Id,
    Name,
    Category,
    StartTime,
    EndTime,
    IsTimingActive,
}

#[derive(DeriveIden)]
pub enum FoodItems {
    Table,
    Id,
    Name,
    Price,
    SubCategoryId,
    StockStatus,
    StartTime,
    EndTime,
    IsTimingActive,
    CreatedAt,
}
