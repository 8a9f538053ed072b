use async_trait::async_trait;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A single seat at a table. Availability is a plain flag: occupied seats are
/// flipped to unavailable when an order claims them and freed only through an
/// explicit release.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "table_seats")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub seat_id: i64,
    pub table_id: i64,
    pub seat_number: String,
    pub row_number: i32,
    pub is_available: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::restaurant_table::Entity",
        from = "Column::TableId",
        to = "super::restaurant_table::Column::TableId"
    )]
    RestaurantTable,
}

impl Related<super::restaurant_table::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RestaurantTable.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {}
