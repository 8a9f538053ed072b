//! Read-only rollups: today's collection by payment mode and the stock
//! screen counters.

mod common;

use chrono::{Duration, NaiveTime, Utc};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

use common::*;
use tableside_api::entities::food_item::StockStatus;
use tableside_api::entities::order;
use tableside_api::entities::order::PaymentMode;
use tableside_api::services::reports::CollectionSummary;

#[tokio::test]
async fn today_collection_sums_paid_orders_by_mode() {
    let db = setup_db().await;
    let service = order_service(&db);
    let reports = report_service(&db);

    let cash = service
        .create_order(create_request(1, dec!(100.00), &[("Meals", 1, dec!(100.00))]))
        .await
        .unwrap();
    service.mark_paid(cash.order_id).await.unwrap();

    let mut card_request = create_request(2, dec!(200.00), &[("Platter", 1, dec!(200.00))]);
    card_request.payment_mode = Some(PaymentMode::Card);
    let card = service.create_order(card_request).await.unwrap();
    service.mark_paid(card.order_id).await.unwrap();

    // Pending orders never count towards collection
    service
        .create_order(create_request(3, dec!(50.00), &[("Tea", 1, dec!(50.00))]))
        .await
        .unwrap();

    let summary = reports.today_collection().await.unwrap();
    assert_eq!(
        summary,
        CollectionSummary {
            total: dec!(300.00),
            cash: dec!(100.00),
            card: dec!(200.00),
            upi: dec!(0),
        }
    );
}

#[tokio::test]
async fn orders_paid_on_other_days_are_excluded() {
    let db = setup_db().await;
    let service = order_service(&db);
    let reports = report_service(&db);

    let old = service
        .create_order(create_request(1, dec!(75.00), &[("Meals", 1, dec!(75.00))]))
        .await
        .unwrap();
    service.mark_paid(old.order_id).await.unwrap();

    // Backdate the settlement to two days ago
    let stored = order::Entity::find_by_id(old.order_id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    let mut active: order::ActiveModel = stored.into();
    active.paid_at = Set(Some(Utc::now() - Duration::days(2)));
    active.update(&*db).await.unwrap();

    let summary = reports.today_collection().await.unwrap();
    assert_eq!(summary.total, dec!(0));
}

#[tokio::test]
async fn an_empty_day_reports_zeros_not_nulls() {
    let db = setup_db().await;
    let reports = report_service(&db);

    let summary = reports.today_collection().await.unwrap();
    assert_eq!(summary.total, dec!(0));
    assert_eq!(summary.cash, dec!(0));
    assert_eq!(summary.card, dec!(0));
    assert_eq!(summary.upi, dec!(0));

    // The boundary serialization stays numeric
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["upi"], serde_json::json!(0.0));
}

#[tokio::test]
async fn cancelled_orders_do_not_count_even_when_refunded() {
    let db = setup_db().await;
    let service = order_service(&db);
    let reports = report_service(&db);

    let order_response = service
        .create_order(create_request(1, dec!(120.00), &[("Meals", 2, dec!(60.00))]))
        .await
        .unwrap();
    service.cancel_order(order_response.order_id).await.unwrap();
    service
        .refund(
            order_response.order_id,
            tableside_api::services::orders::RefundRequest {
                amount: dec!(120.00),
                reason: Some("Order cancelled".to_string()),
            },
        )
        .await
        .unwrap();

    let summary = reports.today_collection().await.unwrap();
    assert_eq!(summary.total, dec!(0));
}

#[tokio::test]
async fn stock_summary_counts_flags_and_current_availability() {
    let db = setup_db().await;
    let reports = report_service(&db);

    let t = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();

    // Always orderable
    seed_food(&db, "Tea", dec!(20.00), StockStatus::InStock, None).await;
    // Manually out of stock
    seed_food(&db, "Samosa", dec!(15.00), StockStatus::OutOfStock, None).await;
    // In stock but outside its serving window at noon
    seed_food(
        &db,
        "Idli",
        dec!(40.00),
        StockStatus::InStock,
        Some((t(7), t(11))),
    )
    .await;

    let summary = reports.stock_summary(t(12)).await.unwrap();
    assert_eq!(summary.total_items, 3);
    assert_eq!(summary.in_stock, 2);
    assert_eq!(summary.out_of_stock, 1);
    assert_eq!(summary.available_now, 1);

    // At breakfast time the timed item is back
    let breakfast = reports.stock_summary(t(9)).await.unwrap();
    assert_eq!(breakfast.available_now, 2);
}
