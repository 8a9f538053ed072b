use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A physical table on the floor; owns an ordered set of seats.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "restaurant_tables")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub table_id: i64,
    #[sea_orm(unique)]
    pub table_number: i32,
    pub total_seats: i32,
    pub seats_per_row: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::table_seat::Entity")]
    TableSeat,
}

impl Related<super::table_seat::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TableSeat.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {}
