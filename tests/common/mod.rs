//! Shared fixtures: an in-memory SQLite store built from the real
//! migrations, plus seed helpers for staff, tables and menu items.
#![allow(dead_code)]

use chrono::{NaiveTime, Utc};
use migrations::{Migrator, MigratorTrait};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use std::sync::Arc;

use tableside_api::config::OrderPolicy;
use tableside_api::entities::{
    food_item::{self, StockStatus},
    restaurant_table, staff_user, table_seat,
};
use tableside_api::services::orders::{CartItem, CreateOrderRequest, OrderService};
use tableside_api::services::reports::ReportService;
use tableside_api::services::seating::SeatingService;

/// Fresh database per test. A single pooled connection keeps every query on
/// the same in-memory store.
pub async fn setup_db() -> Arc<DatabaseConnection> {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
    opt.max_connections(1).sqlx_logging(false);

    let db = Database::connect(opt).await.expect("sqlite connection");
    Migrator::up(&db, None).await.expect("migrations apply");
    Arc::new(db)
}

pub fn order_service(db: &Arc<DatabaseConnection>) -> OrderService {
    OrderService::new(db.clone(), OrderPolicy::default(), None)
}

/// Variant with refunds forbidden once an order is cancelled.
pub fn strict_order_service(db: &Arc<DatabaseConnection>) -> OrderService {
    OrderService::new(
        db.clone(),
        OrderPolicy {
            allow_refund_after_cancel: false,
        },
        None,
    )
}

pub fn seating_service(db: &Arc<DatabaseConnection>) -> SeatingService {
    SeatingService::new(db.clone())
}

pub fn report_service(db: &Arc<DatabaseConnection>) -> ReportService {
    ReportService::new(db.clone())
}

pub async fn seed_waiter(db: &DatabaseConnection, username: &str) -> i64 {
    let waiter = staff_user::ActiveModel {
        username: Set(username.to_string()),
        role: Set(staff_user::StaffRole::Waiter),
        phone: Set(None),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    waiter.insert(db).await.expect("seed waiter").id
}

/// Creates a table with one row of seats named as given.
pub async fn seed_table(db: &DatabaseConnection, table_number: i32, seats: &[&str]) -> i64 {
    let table = restaurant_table::ActiveModel {
        table_number: Set(table_number),
        total_seats: Set(seats.len() as i32),
        seats_per_row: Set(seats.len().max(1) as i32),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let table = table.insert(db).await.expect("seed table");

    for seat_number in seats {
        let seat = table_seat::ActiveModel {
            table_id: Set(table.table_id),
            seat_number: Set(seat_number.to_string()),
            row_number: Set(1),
            is_available: Set(true),
            ..Default::default()
        };
        seat.insert(db).await.expect("seed seat");
    }

    table.table_id
}

pub async fn seed_food(
    db: &DatabaseConnection,
    name: &str,
    price: Decimal,
    stock_status: StockStatus,
    timing: Option<(NaiveTime, NaiveTime)>,
) -> i64 {
    let food = food_item::ActiveModel {
        name: Set(name.to_string()),
        price: Set(price),
        sub_category_id: Set(None),
        stock_status: Set(stock_status),
        start_time: Set(timing.map(|(s, _)| s)),
        end_time: Set(timing.map(|(_, e)| e)),
        is_timing_active: Set(timing.is_some()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    food.insert(db).await.expect("seed food item").id
}

pub fn cart(items: &[(&str, i32, Decimal)]) -> Vec<CartItem> {
    items
        .iter()
        .map(|(name, quantity, price)| CartItem {
            name: name.to_string(),
            quantity: *quantity,
            price: *price,
            food_id: None,
        })
        .collect()
}

pub fn create_request(
    table_number: i32,
    total_amount: Decimal,
    items: &[(&str, i32, Decimal)],
) -> CreateOrderRequest {
    CreateOrderRequest {
        table_number,
        total_amount,
        cart: cart(items),
        received_amount: None,
        payment_mode: None,
        waiter_id: None,
        selected_seats: vec![],
        table_id: None,
    }
}
