use chrono::NaiveTime;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::{
    db::DbPool,
    entities::{
        food_item::{self, StockStatus},
        sub_category,
    },
    errors::ServiceError,
};

/// Three-way availability as the menu screens display it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AvailabilityStatus {
    OutOfStock,
    AvailableNow,
    AvailableLater,
}

/// Named meal windows used by bulk stock application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MealWindow {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealWindow {
    pub fn bounds(self) -> (NaiveTime, NaiveTime) {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).expect("static time literal");
        match self {
            MealWindow::Breakfast => (t(7, 0), t(11, 0)),
            MealWindow::Lunch => (t(11, 0), t(16, 0)),
            MealWindow::Dinner => (t(16, 0), t(23, 0)),
        }
    }
}

/// Inclusive time-of-day window check. A window whose start is after its end
/// wraps past midnight (22:00–02:00 covers late night and early morning).
fn within_window(at: NaiveTime, start: NaiveTime, end: NaiveTime) -> bool {
    if start <= end {
        start <= at && at <= end
    } else {
        at >= start || at <= end
    }
}

/// Whether a food item can be ordered at the given time of day. The manual
/// stock flag always wins; timing narrows availability only when active and
/// fully specified.
pub fn food_available_at(food: &food_item::Model, at: NaiveTime) -> bool {
    if food.stock_status == StockStatus::OutOfStock {
        return false;
    }
    if !food.is_timing_active {
        return true;
    }
    match (food.start_time, food.end_time) {
        (Some(start), Some(end)) => within_window(at, start, end),
        _ => true,
    }
}

/// Subcategory timing check; independent of any item's stock flag.
pub fn subcategory_available_at(sub: &sub_category::Model, at: NaiveTime) -> bool {
    if !sub.is_timing_active {
        return true;
    }
    match (sub.start_time, sub.end_time) {
        (Some(start), Some(end)) => within_window(at, start, end),
        _ => true,
    }
}

pub fn availability_status(food: &food_item::Model, at: NaiveTime) -> AvailabilityStatus {
    if food.stock_status == StockStatus::OutOfStock {
        AvailabilityStatus::OutOfStock
    } else if food_available_at(food, at) {
        AvailabilityStatus::AvailableNow
    } else {
        AvailabilityStatus::AvailableLater
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MenuItemResponse {
    pub id: i64,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub sub_category_id: Option<i64>,
    pub stock_status: StockStatus,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub is_timing_active: bool,
    pub is_available_now: bool,
    pub availability_status: AvailabilityStatus,
}

/// Service over the menu catalog: availability resolution plus the stock and
/// timing administration the stock screen drives.
#[derive(Clone)]
pub struct MenuService {
    db: Arc<DbPool>,
}

impl MenuService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// The catalog enriched with availability at the given time of day.
    #[instrument(skip(self))]
    pub async fn list_menu(&self, at: NaiveTime) -> Result<Vec<MenuItemResponse>, ServiceError> {
        let db = &*self.db;

        let items = food_item::Entity::find()
            .order_by_asc(food_item::Column::Name)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to list menu items");
                ServiceError::DatabaseError(e)
            })?;

        Ok(items.into_iter().map(|f| item_to_response(f, at)).collect())
    }

    /// Sets the manual stock flag on one item.
    #[instrument(skip(self), fields(food_id = %food_id, status = %status))]
    pub async fn set_stock(
        &self,
        food_id: i64,
        status: StockStatus,
        at: NaiveTime,
    ) -> Result<MenuItemResponse, ServiceError> {
        let db = &*self.db;

        let food = food_item::Entity::find_by_id(food_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Food item {} not found", food_id)))?;

        let mut active: food_item::ActiveModel = food.into();
        active.stock_status = Set(status);

        let updated = active.update(db).await.map_err(|e| {
            error!(error = %e, food_id, "Failed to update stock status");
            ServiceError::DatabaseError(e)
        })?;

        info!(food_id, status = %status, "Stock status updated");
        Ok(item_to_response(updated, at))
    }

    /// Bulk stock flip across the whole menu; returns the affected count.
    #[instrument(skip(self), fields(status = %status))]
    pub async fn set_all_stock(&self, status: StockStatus) -> Result<u64, ServiceError> {
        let db = &*self.db;

        let result = food_item::Entity::update_many()
            .col_expr(food_item::Column::StockStatus, Expr::value(status))
            .exec(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to bulk-update stock status");
                ServiceError::DatabaseError(e)
            })?;

        info!(updated = result.rows_affected, status = %status, "Bulk stock update");
        Ok(result.rows_affected)
    }

    /// Sets or clears an item's serving window. Activating timing requires
    /// both bounds; clearing both bounds deactivates it.
    #[instrument(skip(self), fields(food_id = %food_id))]
    pub async fn update_timing(
        &self,
        food_id: i64,
        start_time: Option<NaiveTime>,
        end_time: Option<NaiveTime>,
        is_timing_active: bool,
        at: NaiveTime,
    ) -> Result<MenuItemResponse, ServiceError> {
        if is_timing_active && (start_time.is_none() || end_time.is_none()) {
            return Err(ServiceError::ValidationError(
                "Timing window requires both start and end times".to_string(),
            ));
        }

        let db = &*self.db;

        let food = food_item::Entity::find_by_id(food_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Food item {} not found", food_id)))?;

        let active_flag = is_timing_active && start_time.is_some() && end_time.is_some();

        let mut active: food_item::ActiveModel = food.into();
        active.start_time = Set(start_time);
        active.end_time = Set(end_time);
        active.is_timing_active = Set(active_flag);

        let updated = active.update(db).await.map_err(|e| {
            error!(error = %e, food_id, "Failed to update timing");
            ServiceError::DatabaseError(e)
        })?;

        info!(food_id, is_timing_active = active_flag, "Timing updated");
        Ok(item_to_response(updated, at))
    }

    /// Sets or clears a subcategory's serving window.
    #[instrument(skip(self), fields(sub_category_id = %sub_category_id))]
    pub async fn update_subcategory_timing(
        &self,
        sub_category_id: i64,
        start_time: Option<NaiveTime>,
        end_time: Option<NaiveTime>,
        is_timing_active: bool,
    ) -> Result<sub_category::Model, ServiceError> {
        if is_timing_active && (start_time.is_none() || end_time.is_none()) {
            return Err(ServiceError::ValidationError(
                "Timing window requires both start and end times".to_string(),
            ));
        }

        let db = &*self.db;

        let sub = sub_category::Entity::find_by_id(sub_category_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Subcategory {} not found", sub_category_id))
            })?;

        let active_flag = is_timing_active && start_time.is_some() && end_time.is_some();

        let mut active: sub_category::ActiveModel = sub.into();
        active.start_time = Set(start_time);
        active.end_time = Set(end_time);
        active.is_timing_active = Set(active_flag);

        active.update(db).await.map_err(|e| {
            error!(error = %e, sub_category_id, "Failed to update subcategory timing");
            ServiceError::DatabaseError(e)
        })
    }

    /// Re-derives every item's stock flag from a named meal window: items
    /// whose serving window overlaps the meal (or that carry no active
    /// timing) go in stock, the rest go out. Returns how many rows changed.
    #[instrument(skip(self), fields(window = %window))]
    pub async fn apply_timing_stock(&self, window: MealWindow) -> Result<u64, ServiceError> {
        let db = &*self.db;
        let (meal_start, meal_end) = window.bounds();

        let items = food_item::Entity::find().all(db).await.map_err(|e| {
            error!(error = %e, "Failed to load menu for timing stock");
            ServiceError::DatabaseError(e)
        })?;

        let mut updated = 0u64;
        for item in items {
            let desired = match (item.is_timing_active, item.start_time, item.end_time) {
                (true, Some(start), Some(end)) => {
                    // windows overlap iff either start lies inside the other
                    if within_window(meal_start, start, end)
                        || within_window(start, meal_start, meal_end)
                    {
                        StockStatus::InStock
                    } else {
                        StockStatus::OutOfStock
                    }
                }
                _ => StockStatus::InStock,
            };

            if item.stock_status != desired {
                let mut active: food_item::ActiveModel = item.into();
                active.stock_status = Set(desired);
                active.update(db).await.map_err(|e| {
                    error!(error = %e, "Failed to apply timing stock");
                    ServiceError::DatabaseError(e)
                })?;
                updated += 1;
            }
        }

        info!(updated, window = %window, "Timing stock applied");
        Ok(updated)
    }
}

fn item_to_response(food: food_item::Model, at: NaiveTime) -> MenuItemResponse {
    let is_available_now = food_available_at(&food, at);
    let availability = availability_status(&food, at);
    MenuItemResponse {
        id: food.id,
        name: food.name,
        price: food.price,
        sub_category_id: food.sub_category_id,
        stock_status: food.stock_status,
        start_time: food.start_time,
        end_time: food.end_time,
        is_timing_active: food.is_timing_active,
        is_available_now,
        availability_status: availability,
    }
}
