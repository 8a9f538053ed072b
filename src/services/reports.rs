use chrono::{Local, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, instrument};

use crate::{
    db::DbPool,
    entities::{
        food_item::{self, StockStatus},
        order::{self, OrderStatus, PaymentMode},
    },
    errors::ServiceError,
    services::{local_day_range, menu},
};

/// Collection totals for one reporting day, broken down by payment mode.
/// Modes with no orders report zero, never null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSummary {
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cash: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub card: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub upi: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSummary {
    pub total_items: u64,
    pub in_stock: u64,
    pub out_of_stock: u64,
    pub available_now: u64,
}

/// Read-only rollups over the order and menu stores. No mutation.
#[derive(Clone)]
pub struct ReportService {
    db: Arc<DbPool>,
}

impl ReportService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Paid totals for the current server-local date.
    #[instrument(skip(self))]
    pub async fn today_collection(&self) -> Result<CollectionSummary, ServiceError> {
        self.collection_on(Local::now().date_naive()).await
    }

    /// Paid totals for an arbitrary server-local date.
    #[instrument(skip(self))]
    pub async fn collection_on(&self, date: NaiveDate) -> Result<CollectionSummary, ServiceError> {
        let db = &*self.db;
        let (start, end) = local_day_range(date);

        let paid_orders = order::Entity::find()
            .filter(order::Column::Status.eq(OrderStatus::Paid))
            .filter(order::Column::PaidAt.gte(start))
            .filter(order::Column::PaidAt.lt(end))
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to load paid orders for collection");
                ServiceError::DatabaseError(e)
            })?;

        let mut summary = CollectionSummary {
            total: Decimal::ZERO,
            cash: Decimal::ZERO,
            card: Decimal::ZERO,
            upi: Decimal::ZERO,
        };

        for o in paid_orders {
            summary.total += o.total_amount;
            match o.payment_mode {
                PaymentMode::Cash => summary.cash += o.total_amount,
                PaymentMode::Card => summary.card += o.total_amount,
                PaymentMode::Upi => summary.upi += o.total_amount,
            }
        }

        Ok(summary)
    }

    /// Stock screen counters: totals plus how many items are orderable at
    /// the given time of day.
    #[instrument(skip(self))]
    pub async fn stock_summary(&self, at: NaiveTime) -> Result<StockSummary, ServiceError> {
        let db = &*self.db;

        let items = food_item::Entity::find().all(db).await.map_err(|e| {
            error!(error = %e, "Failed to load menu for stock summary");
            ServiceError::DatabaseError(e)
        })?;

        let mut summary = StockSummary {
            total_items: items.len() as u64,
            in_stock: 0,
            out_of_stock: 0,
            available_now: 0,
        };

        for item in &items {
            match item.stock_status {
                StockStatus::InStock => summary.in_stock += 1,
                StockStatus::OutOfStock => summary.out_of_stock += 1,
            }
            if menu::food_available_at(item, at) {
                summary.available_now += 1;
            }
        }

        Ok(summary)
    }
}
