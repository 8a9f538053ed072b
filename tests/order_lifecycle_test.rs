//! End-to-end order lifecycle: creation with items and seat holds,
//! settlement transitions, and the explicit seat-release hook.

mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;

use common::*;
use tableside_api::entities::order::{self, OrderStatus, PaymentMode};
use tableside_api::errors::ServiceError;
use tableside_api::services::orders::CreateOrderRequest;

// ==================== Creation ====================

#[tokio::test]
async fn create_order_computes_balance_and_captures_items() {
    let db = setup_db().await;
    let service = order_service(&db);

    let mut request = create_request(4, dec!(55.00), &[("Tea", 2, dec!(20.00)), ("Samosa", 1, dec!(15.00))]);
    request.received_amount = Some(dec!(60.00));

    let order = service.create_order(request).await.expect("order created");

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, dec!(55.00));
    assert_eq!(order.received_amount, dec!(60.00));
    assert_eq!(order.balance_amount, dec!(5.00));
    assert_eq!(order.payment_mode, PaymentMode::Cash);
    assert!(!order.is_refunded);

    assert_eq!(order.items.len(), 2);
    assert_eq!(order.items[0].subtotal, dec!(40.00));
    assert_eq!(order.items[1].subtotal, dec!(15.00));

    // Boundary timestamps carry the compact UTC format
    assert!(order.created_at.ends_with('Z'));
    assert!(order.paid_at.is_none());
}

#[tokio::test]
async fn create_order_defaults_received_to_total() {
    let db = setup_db().await;
    let service = order_service(&db);

    let order = service
        .create_order(create_request(2, dec!(120.00), &[("Thali", 2, dec!(60.00))]))
        .await
        .expect("order created");

    assert_eq!(order.received_amount, dec!(120.00));
    assert_eq!(order.balance_amount, dec!(0.00));
}

#[tokio::test]
async fn underpayment_never_produces_negative_balance() {
    let db = setup_db().await;
    let service = order_service(&db);

    let mut request = create_request(2, dec!(100.00), &[("Biryani", 1, dec!(100.00))]);
    request.received_amount = Some(dec!(40.00));

    let order = service.create_order(request).await.expect("order created");
    assert_eq!(order.balance_amount, dec!(0.00));
}

#[tokio::test]
async fn invalid_cart_persists_nothing() {
    let db = setup_db().await;
    let service = order_service(&db);

    let request = create_request(3, dec!(35.00), &[("Tea", 2, dec!(20.00)), ("", 1, dec!(15.00))]);
    let err = service.create_order(request).await.unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let listed = service.list_orders(Default::default()).await.unwrap();
    assert_eq!(listed.total, 0);
}

#[tokio::test]
async fn create_order_rejects_unknown_waiter() {
    let db = setup_db().await;
    let service = order_service(&db);

    let mut request = create_request(1, dec!(20.00), &[("Coffee", 1, dec!(20.00))]);
    request.waiter_id = Some(999);

    let err = service.create_order(request).await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn create_order_records_the_waiter() {
    let db = setup_db().await;
    let service = order_service(&db);
    let waiter_id = seed_waiter(&db, "ravi").await;

    let mut request = create_request(1, dec!(20.00), &[("Coffee", 1, dec!(20.00))]);
    request.waiter_id = Some(waiter_id);

    let order = service.create_order(request).await.expect("order created");
    assert_eq!(order.waiter_id, Some(waiter_id));
}

// ==================== Seat holds ====================

#[tokio::test]
async fn create_order_flips_selected_seats() {
    let db = setup_db().await;
    let service = order_service(&db);
    let seating = seating_service(&db);
    seed_table(&db, 7, &["A1", "A2", "A3"]).await;

    let mut request = create_request(7, dec!(80.00), &[("Dosa", 2, dec!(40.00))]);
    request.selected_seats = vec!["A1".to_string(), "A2".to_string()];

    let order = service.create_order(request).await.expect("order created");
    assert_eq!(order.selected_seats, vec!["A1", "A2"]);

    let tables = seating.list_tables().await.unwrap();
    let seats = &tables[0].seats;
    assert!(!seats.iter().find(|s| s.seat_number == "A1").unwrap().is_available);
    assert!(!seats.iter().find(|s| s.seat_number == "A2").unwrap().is_available);
    assert!(seats.iter().find(|s| s.seat_number == "A3").unwrap().is_available);
}

#[tokio::test]
async fn occupying_an_already_held_seat_is_a_no_op() {
    let db = setup_db().await;
    let service = order_service(&db);
    seed_table(&db, 7, &["A1"]).await;

    let mut first = create_request(7, dec!(20.00), &[("Tea", 1, dec!(20.00))]);
    first.selected_seats = vec!["A1".to_string()];
    service.create_order(first).await.expect("first order");

    // Retried seat selection must not fail the new order
    let mut second = create_request(7, dec!(20.00), &[("Tea", 1, dec!(20.00))]);
    second.selected_seats = vec!["A1".to_string()];
    service.create_order(second).await.expect("second order");
}

#[tokio::test]
async fn zero_matching_seats_does_not_fail_creation() {
    let db = setup_db().await;
    let service = order_service(&db);
    // No table seeded at all

    let mut request = create_request(9, dec!(20.00), &[("Tea", 1, dec!(20.00))]);
    request.selected_seats = vec!["Z9".to_string()];

    let order = service.create_order(request).await.expect("order created");
    assert_eq!(order.table_number, 9);
}

#[tokio::test]
async fn seats_stay_held_through_cancel_until_released() {
    let db = setup_db().await;
    let service = order_service(&db);
    let seating = seating_service(&db);
    seed_table(&db, 5, &["B1", "B2"]).await;

    let mut request = create_request(5, dec!(60.00), &[("Meals", 2, dec!(30.00))]);
    request.selected_seats = vec!["B1".to_string(), "B2".to_string()];
    let order = service.create_order(request).await.expect("order created");

    service.cancel_order(order.order_id).await.expect("cancelled");

    // Cancellation alone does not free seats
    let tables = seating.list_tables().await.unwrap();
    assert!(tables[0].seats.iter().all(|s| !s.is_available));

    let released = service.release_seats(order.order_id).await.unwrap();
    assert_eq!(released, 2);

    let tables = seating.list_tables().await.unwrap();
    assert!(tables[0].seats.iter().all(|s| s.is_available));

    // Releasing again stays harmless
    service.release_seats(order.order_id).await.unwrap();
}

// ==================== Settlement transitions ====================

#[tokio::test]
async fn mark_paid_is_rejected_the_second_time() {
    let db = setup_db().await;
    let service = order_service(&db);

    let order = service
        .create_order(create_request(1, dec!(50.00), &[("Juice", 1, dec!(50.00))]))
        .await
        .unwrap();

    let response = service.mark_paid(order.order_id).await.expect("paid");
    assert_eq!(response.status, OrderStatus::Paid);

    let first_paid_at = order::Entity::find_by_id(order.order_id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap()
        .paid_at
        .expect("paid_at stamped");

    let err = service.mark_paid(order.order_id).await.unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));

    let after = order::Entity::find_by_id(order.order_id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.paid_at, Some(first_paid_at));
}

#[tokio::test]
async fn cancel_is_rejected_the_second_time() {
    let db = setup_db().await;
    let service = order_service(&db);

    let order = service
        .create_order(create_request(1, dec!(50.00), &[("Juice", 1, dec!(50.00))]))
        .await
        .unwrap();

    service.cancel_order(order.order_id).await.expect("cancelled");
    let err = service.cancel_order(order.order_id).await.unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));

    let stored = order::Entity::find_by_id(order.order_id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, OrderStatus::Cancelled);
    assert!(stored.cancelled_at.is_some());
}

#[tokio::test]
async fn a_cancelled_order_can_still_be_marked_paid() {
    let db = setup_db().await;
    let service = order_service(&db);

    let order = service
        .create_order(create_request(1, dec!(50.00), &[("Juice", 1, dec!(50.00))]))
        .await
        .unwrap();

    service.cancel_order(order.order_id).await.unwrap();
    let response = service.mark_paid(order.order_id).await.expect("paid after cancel");
    assert_eq!(response.status, OrderStatus::Paid);
}

#[tokio::test]
async fn unknown_order_ids_surface_not_found() {
    let db = setup_db().await;
    let service = order_service(&db);

    assert_matches!(
        service.get_order(404).await.unwrap_err(),
        ServiceError::NotFound(_)
    );
    assert_matches!(
        service.mark_paid(404).await.unwrap_err(),
        ServiceError::NotFound(_)
    );
    assert_matches!(
        service.cancel_order(404).await.unwrap_err(),
        ServiceError::NotFound(_)
    );
}

// ==================== Request deserialization ====================

#[test]
fn create_request_accepts_numeric_amounts() {
    let request: CreateOrderRequest = serde_json::from_value(serde_json::json!({
        "table_number": 4,
        "total_amount": 55.0,
        "cart": [
            {"name": "Tea", "quantity": 2, "price": 20.0},
            {"name": "Samosa", "quantity": 1, "price": 15.0}
        ],
        "received_amount": 60,
        "payment_mode": "upi"
    }))
    .expect("request parses");

    assert_eq!(request.total_amount, dec!(55));
    assert_eq!(request.payment_mode, Some(PaymentMode::Upi));
}

#[test]
fn create_request_rejects_non_numeric_amounts() {
    let result: Result<CreateOrderRequest, _> = serde_json::from_value(serde_json::json!({
        "table_number": 4,
        "total_amount": "fifty five",
        "cart": []
    }));
    assert!(result.is_err());
}
