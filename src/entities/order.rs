use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

use crate::money;

/// Payment modes accepted at the till.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentMode {
    #[sea_orm(string_value = "cash")]
    Cash,
    #[sea_orm(string_value = "card")]
    Card,
    #[sea_orm(string_value = "upi")]
    Upi,
}

/// Order lifecycle status.
///
/// `pending` is the initial state; `paid` and `cancelled` cannot be entered
/// twice. A cancelled order may still be marked paid (the till corrects a
/// mistaken cancellation that way). Refunds are tracked separately via
/// `refunded_amount` and do not participate in this enum.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub order_id: i64,

    pub table_number: i32,
    pub table_id: Option<i64>,
    /// Seat numbers held by this order, kept so they can be released later.
    pub selected_seats: Option<Json>,

    pub total_amount: Decimal,
    pub received_amount: Decimal,
    /// Change due back to the customer. Derived, never set by callers.
    pub balance_amount: Decimal,
    /// Cumulative refunds. Monotonically non-decreasing, capped at total.
    pub refunded_amount: Decimal,

    pub payment_mode: PaymentMode,
    pub status: OrderStatus,
    pub refund_reason: Option<String>,

    pub waiter_id: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,

    /// Optimistic concurrency token; every transition bumps it.
    pub version: i32,
}

impl Model {
    pub fn is_refunded(&self) -> bool {
        self.refunded_amount > Decimal::ZERO
    }

    pub fn is_fully_refunded(&self) -> bool {
        self.refunded_amount >= self.total_amount
    }

    /// Ceiling for further refunds.
    pub fn remaining_refundable(&self) -> Decimal {
        money::remaining_refundable(self.total_amount, self.refunded_amount)
    }

    /// Seat numbers recorded at creation, empty when none were selected.
    pub fn seat_numbers(&self) -> Vec<String> {
        self.selected_seats
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItem,
    #[sea_orm(
        belongs_to = "super::staff_user::Entity",
        from = "Column::WaiterId",
        to = "super::staff_user::Column::Id"
    )]
    Waiter,
    #[sea_orm(
        belongs_to = "super::restaurant_table::Entity",
        from = "Column::TableId",
        to = "super::restaurant_table::Column::TableId"
    )]
    RestaurantTable,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

impl Related<super::staff_user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Waiter.def()
    }
}

impl Related<super::restaurant_table::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RestaurantTable.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    /// Keeps `balance_amount` consistent whenever both monetary inputs are
    /// written through the active model.
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if let (ActiveValue::Set(received), ActiveValue::Set(total)) =
            (&active_model.received_amount, &active_model.total_amount)
        {
            active_model.balance_amount = Set(money::balance(*received, *total));
        }
        Ok(active_model)
    }
}
