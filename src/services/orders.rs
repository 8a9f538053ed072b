use chrono::{DateTime, Local, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Query as SeaQuery};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, LoaderTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use validator::Validate;

use crate::{
    config::OrderPolicy,
    db::DbPool,
    entities::{
        order::{self, OrderStatus, PaymentMode},
        order_item, staff_user,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    money,
    services::{format_timestamp, local_day_range, seating},
};

const DEFAULT_PER_PAGE: u64 = 50;
const DEFAULT_REFUND_REASON: &str = "No reason provided";

/// One line of the cart a waiter submits. Name and price are captured as
/// given; `food_id` only links back to the catalog for enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub name: String,
    pub quantity: i32,
    pub price: Decimal,
    #[serde(default)]
    pub food_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(range(min = 1, message = "Table number must be at least 1"))]
    pub table_number: i32,
    #[validate(custom = "validate_non_negative_amount")]
    pub total_amount: Decimal,
    pub cart: Vec<CartItem>,
    /// Defaults to the total when omitted.
    #[serde(default)]
    pub received_amount: Option<Decimal>,
    #[serde(default)]
    pub payment_mode: Option<PaymentMode>,
    #[serde(default)]
    pub waiter_id: Option<i64>,
    #[serde(default)]
    pub selected_seats: Vec<String>,
    #[serde(default)]
    pub table_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRequest {
    pub amount: Decimal,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderItemResponse {
    pub name: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    pub food_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order_id: i64,
    pub table_number: i32,
    pub table_id: Option<i64>,
    pub selected_seats: Vec<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub received_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub refunded_amount: Decimal,
    pub is_refunded: bool,
    pub refund_reason: Option<String>,
    pub payment_mode: PaymentMode,
    pub status: OrderStatus,
    pub waiter_id: Option<i64>,
    pub created_at: String,
    pub paid_at: Option<String>,
    pub cancelled_at: Option<String>,
    pub refunded_at: Option<String>,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusChangeResponse {
    pub order_id: i64,
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefundResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub refunded_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining_amount: Decimal,
    pub is_fully_refunded: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Filters for the order history screen and bulk export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderFilters {
    pub table_number: Option<i32>,
    pub status: Option<OrderStatus>,
    pub payment_mode: Option<PaymentMode>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    /// Matches the order id or any item name.
    pub search: Option<String>,
    pub today: bool,
    pub yesterday: bool,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Lifts pagination for the export view.
    pub for_export: bool,
}

/// Service for the order lifecycle: creation, settlement transitions,
/// refunds, seat release and history queries.
///
/// Every transition is applied as one atomic unit against the store; the
/// `version` column on orders serializes conflicting writers so two
/// concurrent refunds (or mark-paid calls) can never both apply.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    policy: OrderPolicy,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    pub fn new(
        db_pool: Arc<DbPool>,
        policy: OrderPolicy,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        Self {
            db_pool,
            policy,
            event_sender,
        }
    }

    /// Creates an order with its full item set and seat holds in one
    /// transaction. The whole cart is validated before anything persists,
    /// so a bad line can never leave a partial item set behind.
    #[instrument(skip(self, request), fields(table_number = %request.table_number))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        validate_cart(&request.cart)?;

        let received_amount = match request.received_amount {
            Some(amount) if amount < Decimal::ZERO => {
                return Err(ServiceError::ValidationError(
                    "Received amount must not be negative".to_string(),
                ));
            }
            Some(amount) => amount,
            None => request.total_amount,
        };

        let db = &*self.db_pool;

        // Weak reference, but a dangling id at creation time is caller error
        if let Some(waiter_id) = request.waiter_id {
            staff_user::Entity::find_by_id(waiter_id)
                .one(db)
                .await
                .map_err(ServiceError::DatabaseError)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Waiter {} not found", waiter_id))
                })?;
        }

        let now = Utc::now();
        let selected_seats = request.selected_seats.clone();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        let order_active_model = order::ActiveModel {
            table_number: Set(request.table_number),
            table_id: Set(request.table_id),
            selected_seats: Set(if selected_seats.is_empty() {
                None
            } else {
                Some(serde_json::json!(selected_seats))
            }),
            total_amount: Set(request.total_amount),
            received_amount: Set(received_amount),
            balance_amount: Set(money::balance(received_amount, request.total_amount)),
            refunded_amount: Set(Decimal::ZERO),
            payment_mode: Set(request.payment_mode.unwrap_or(PaymentMode::Cash)),
            status: Set(OrderStatus::Pending),
            refund_reason: Set(None),
            waiter_id: Set(request.waiter_id),
            created_at: Set(now),
            paid_at: Set(None),
            cancelled_at: Set(None),
            refunded_at: Set(None),
            version: Set(1),
            ..Default::default()
        };

        let order_model = order_active_model.insert(&txn).await.map_err(|e| {
            error!(error = %e, "Failed to create order");
            ServiceError::DatabaseError(e)
        })?;

        let item_models: Vec<order_item::ActiveModel> = request
            .cart
            .iter()
            .map(|item| order_item::ActiveModel {
                order_id: Set(order_model.order_id),
                food_id: Set(item.food_id),
                name: Set(item.name.clone()),
                quantity: Set(item.quantity),
                price: Set(item.price),
                ..Default::default()
            })
            .collect();

        order_item::Entity::insert_many(item_models)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = order_model.order_id, "Failed to create order items");
                ServiceError::DatabaseError(e)
            })?;

        let occupied = if selected_seats.is_empty() {
            0
        } else {
            seating::occupy_seats(&txn, request.table_number, &selected_seats).await?
        };

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit order creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            order_id = order_model.order_id,
            table_number = request.table_number,
            seats_occupied = occupied,
            "Order created"
        );

        self.emit(Event::OrderCreated(order_model.order_id)).await;
        if occupied > 0 {
            self.emit(Event::SeatsOccupied {
                table_number: request.table_number,
                seats: selected_seats,
            })
            .await;
        }

        self.get_order(order_model.order_id).await
    }

    /// Fetches one order with its items.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: i64) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;

        let order_model = self.find_order(order_id).await?;
        let items = order_model
            .find_related(order_item::Entity)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(model_to_response(order_model, items))
    }

    /// Order history with the filter set the cashier and admin screens use.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        filters: OrderFilters,
    ) -> Result<OrderListResponse, ServiceError> {
        let db = &*self.db_pool;

        let condition = build_filter_condition(&filters);
        let query = order::Entity::find()
            .filter(condition)
            .order_by_desc(order::Column::CreatedAt);

        let (orders, total, page, per_page) = if filters.for_export {
            let orders = query.all(db).await.map_err(ServiceError::DatabaseError)?;
            let total = orders.len() as u64;
            (orders, total, 1, total.max(1))
        } else {
            let page = filters.page.unwrap_or(1).max(1);
            let per_page = filters.per_page.unwrap_or(DEFAULT_PER_PAGE).max(1);
            let paginator = query.paginate(db, per_page);
            let total = paginator
                .num_items()
                .await
                .map_err(ServiceError::DatabaseError)?;
            let orders = paginator
                .fetch_page(page - 1)
                .await
                .map_err(ServiceError::DatabaseError)?;
            (orders, total, page, per_page)
        };

        let items = orders
            .load_many(order_item::Entity, db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let responses = orders
            .into_iter()
            .zip(items)
            .map(|(o, i)| model_to_response(o, i))
            .collect();

        Ok(OrderListResponse {
            orders: responses,
            total,
            page,
            per_page,
        })
    }

    /// Marks an order paid. `paid_at` is stamped only on the first paid
    /// transition and never reset afterwards.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn mark_paid(&self, order_id: i64) -> Result<StatusChangeResponse, ServiceError> {
        let db = &*self.db_pool;
        let order_model = self.find_order(order_id).await?;

        if order_model.status == OrderStatus::Paid {
            return Err(ServiceError::Conflict("Order already paid".to_string()));
        }

        let paid_at = order_model.paid_at.unwrap_or_else(Utc::now);

        let result = order::Entity::update_many()
            .col_expr(order::Column::Status, Expr::value(OrderStatus::Paid))
            .col_expr(order::Column::PaidAt, Expr::value(paid_at))
            .col_expr(order::Column::Version, Expr::value(order_model.version + 1))
            .filter(order::Column::OrderId.eq(order_id))
            .filter(order::Column::Version.eq(order_model.version))
            .exec(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id, "Failed to mark order paid");
                ServiceError::DatabaseError(e)
            })?;

        if result.rows_affected == 0 {
            warn!(order_id, "Lost mark-paid race; concurrent transition won");
            return Err(ServiceError::ConcurrentModification(order_id));
        }

        info!(order_id, "Order marked as paid");
        self.emit(Event::OrderPaid(order_id)).await;

        Ok(StatusChangeResponse {
            order_id,
            status: OrderStatus::Paid,
        })
    }

    /// Cancels an order. Held seats are NOT released here; table management
    /// calls [`OrderService::release_seats`] when the table actually turns
    /// over.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_order(&self, order_id: i64) -> Result<StatusChangeResponse, ServiceError> {
        let db = &*self.db_pool;
        let order_model = self.find_order(order_id).await?;

        if order_model.status == OrderStatus::Cancelled {
            return Err(ServiceError::Conflict(
                "Order already cancelled".to_string(),
            ));
        }

        let result = order::Entity::update_many()
            .col_expr(order::Column::Status, Expr::value(OrderStatus::Cancelled))
            .col_expr(order::Column::CancelledAt, Expr::value(Utc::now()))
            .col_expr(order::Column::Version, Expr::value(order_model.version + 1))
            .filter(order::Column::OrderId.eq(order_id))
            .filter(order::Column::Version.eq(order_model.version))
            .exec(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id, "Failed to cancel order");
                ServiceError::DatabaseError(e)
            })?;

        if result.rows_affected == 0 {
            warn!(order_id, "Lost cancel race; concurrent transition won");
            return Err(ServiceError::ConcurrentModification(order_id));
        }

        info!(order_id, "Order cancelled");
        self.emit(Event::OrderCancelled(order_id)).await;

        Ok(StatusChangeResponse {
            order_id,
            status: OrderStatus::Cancelled,
        })
    }

    /// Applies a partial or full refund. The cumulative refunded amount
    /// never decreases and never exceeds the order total; the version check
    /// guarantees at most one of two racing refunds lands.
    #[instrument(skip(self, request), fields(order_id = %order_id))]
    pub async fn refund(
        &self,
        order_id: i64,
        request: RefundRequest,
    ) -> Result<RefundResponse, ServiceError> {
        if request.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Refund amount must be greater than 0".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let order_model = self.find_order(order_id).await?;

        if order_model.status == OrderStatus::Cancelled && !self.policy.allow_refund_after_cancel {
            return Err(ServiceError::Conflict(
                "Refunds are not allowed on a cancelled order".to_string(),
            ));
        }

        let remaining = order_model.remaining_refundable();
        if order_model.is_refunded() && remaining <= Decimal::ZERO {
            return Err(ServiceError::Conflict(
                "Order is already fully refunded".to_string(),
            ));
        }
        if request.amount > remaining {
            return Err(ServiceError::ExceedsLimit(format!(
                "Cannot refund {}. Max refundable: {}",
                money::round_display(request.amount),
                money::round_display(remaining)
            )));
        }

        let new_refunded = order_model.refunded_amount + request.amount;
        let reason = request
            .reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REFUND_REASON.to_string());

        let result = order::Entity::update_many()
            .col_expr(order::Column::RefundedAmount, Expr::value(new_refunded))
            .col_expr(order::Column::RefundReason, Expr::value(reason))
            .col_expr(order::Column::RefundedAt, Expr::value(Utc::now()))
            .col_expr(order::Column::Version, Expr::value(order_model.version + 1))
            .filter(order::Column::OrderId.eq(order_id))
            .filter(order::Column::Version.eq(order_model.version))
            .exec(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id, "Failed to apply refund");
                ServiceError::DatabaseError(e)
            })?;

        if result.rows_affected == 0 {
            warn!(order_id, "Lost refund race; concurrent transition won");
            return Err(ServiceError::ConcurrentModification(order_id));
        }

        let fully_refunded = new_refunded >= order_model.total_amount;
        info!(
            order_id,
            amount = %request.amount,
            refunded_total = %new_refunded,
            fully_refunded,
            "Refund processed"
        );

        self.emit(Event::OrderRefunded {
            order_id,
            amount: request.amount,
            fully_refunded,
        })
        .await;

        Ok(RefundResponse {
            refunded_amount: new_refunded,
            remaining_amount: money::remaining_refundable(
                order_model.total_amount,
                new_refunded,
            ),
            is_fully_refunded: fully_refunded,
        })
    }

    /// Frees the seats an order holds. Explicit hook for the table-management
    /// collaborator; nothing in the lifecycle calls it implicitly. Idempotent.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn release_seats(&self, order_id: i64) -> Result<u64, ServiceError> {
        let db = &*self.db_pool;
        let order_model = self.find_order(order_id).await?;

        let seats = order_model.seat_numbers();
        if seats.is_empty() {
            return Ok(0);
        }

        let released = seating::release_seats(db, order_model.table_number, &seats).await?;

        if released > 0 {
            info!(order_id, released, "Seats released");
            self.emit(Event::SeatsReleased {
                table_number: order_model.table_number,
                seats,
            })
            .await;
        }

        Ok(released)
    }

    async fn find_order(&self, order_id: i64) -> Result<order::Model, ServiceError> {
        let db = &*self.db_pool;
        order::Entity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id, "Failed to fetch order");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
    }

    async fn emit(&self, event: Event) {
        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(event).await {
                warn!(error = %e, "Failed to send event");
            }
        }
    }
}

fn validate_cart(cart: &[CartItem]) -> Result<(), ServiceError> {
    if cart.is_empty() {
        return Err(ServiceError::ValidationError(
            "Cart must contain at least one item".to_string(),
        ));
    }

    for (index, item) in cart.iter().enumerate() {
        if item.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(format!(
                "Invalid item in cart: name is required (item {})",
                index + 1
            )));
        }
        if item.quantity < 1 {
            return Err(ServiceError::ValidationError(format!(
                "Invalid item in cart: quantity must be at least 1 ({})",
                item.name
            )));
        }
        if item.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(format!(
                "Invalid item in cart: price must not be negative ({})",
                item.name
            )));
        }
    }

    Ok(())
}

fn validate_non_negative_amount(amount: &Decimal) -> Result<(), validator::ValidationError> {
    if *amount < Decimal::ZERO {
        return Err(validator::ValidationError::new("negative_amount"));
    }
    Ok(())
}

fn build_filter_condition(filters: &OrderFilters) -> Condition {
    let mut condition = Condition::all();

    if let Some(table_number) = filters.table_number {
        condition = condition.add(order::Column::TableNumber.eq(table_number));
    }
    if let Some(status) = filters.status {
        condition = condition.add(order::Column::Status.eq(status));
    }
    if let Some(mode) = filters.payment_mode {
        condition = condition.add(order::Column::PaymentMode.eq(mode));
    }

    if filters.today || filters.yesterday {
        let date = if filters.today {
            Local::now().date_naive()
        } else {
            Local::now().date_naive() - chrono::Duration::days(1)
        };
        let (start, end) = local_day_range(date);
        condition = condition
            .add(order::Column::CreatedAt.gte(start))
            .add(order::Column::CreatedAt.lt(end));
    } else {
        if let Some(from) = filters.date_from {
            condition = condition.add(order::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filters.date_to {
            condition = condition.add(order::Column::CreatedAt.lte(to));
        }
    }

    if let Some(search) = filters.search.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let mut any = Condition::any();
        if let Ok(id) = search.parse::<i64>() {
            any = any.add(order::Column::OrderId.eq(id));
        }
        let items_with_name = SeaQuery::select()
            .column(order_item::Column::OrderId)
            .from(order_item::Entity)
            .and_where(Expr::col(order_item::Column::Name).like(format!("%{}%", search)))
            .to_owned();
        any = any.add(order::Column::OrderId.in_subquery(items_with_name));
        condition = condition.add(any);
    }

    condition
}

fn model_to_response(model: order::Model, items: Vec<order_item::Model>) -> OrderResponse {
    let item_responses = items
        .into_iter()
        .map(|item| OrderItemResponse {
            subtotal: item.subtotal(),
            name: item.name,
            quantity: item.quantity,
            price: item.price,
            food_id: item.food_id,
        })
        .collect();

    OrderResponse {
        order_id: model.order_id,
        table_number: model.table_number,
        table_id: model.table_id,
        selected_seats: model.seat_numbers(),
        total_amount: model.total_amount,
        received_amount: model.received_amount,
        balance_amount: model.balance_amount,
        refunded_amount: model.refunded_amount,
        is_refunded: model.is_refunded(),
        refund_reason: model.refund_reason,
        payment_mode: model.payment_mode,
        status: model.status,
        waiter_id: model.waiter_id,
        created_at: format_timestamp(&model.created_at),
        paid_at: model.paid_at.as_ref().map(format_timestamp),
        cancelled_at: model.cancelled_at.as_ref().map(format_timestamp),
        refunded_at: model.refunded_at.as_ref().map(format_timestamp),
        items: item_responses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(name: &str, quantity: i32, price: Decimal) -> CartItem {
        CartItem {
            name: name.to_string(),
            quantity,
            price,
            food_id: None,
        }
    }

    #[test]
    fn cart_validation_rejects_bad_lines_before_anything_persists() {
        assert!(validate_cart(&[]).is_err());
        assert!(validate_cart(&[item("", 1, dec!(10))]).is_err());
        assert!(validate_cart(&[item("Tea", 0, dec!(10))]).is_err());
        assert!(validate_cart(&[item("Tea", 1, dec!(-1))]).is_err());
        assert!(validate_cart(&[item("Tea", 2, dec!(20)), item("Samosa", 1, dec!(15))]).is_ok());
    }

    #[test]
    fn cart_errors_name_the_offending_line() {
        let err = validate_cart(&[item("Tea", 1, dec!(10)), item("Samosa", 0, dec!(15))])
            .unwrap_err();
        assert!(err.to_string().contains("Samosa"));
    }

    #[test]
    fn create_request_rejects_bad_table_and_amount() {
        let good = CreateOrderRequest {
            table_number: 1,
            total_amount: dec!(55.00),
            cart: vec![item("Tea", 2, dec!(20))],
            received_amount: None,
            payment_mode: None,
            waiter_id: None,
            selected_seats: vec![],
            table_id: None,
        };
        assert!(good.validate().is_ok());

        let bad_table = CreateOrderRequest {
            table_number: 0,
            ..good.clone()
        };
        assert!(bad_table.validate().is_err());

        let bad_amount = CreateOrderRequest {
            total_amount: dec!(-1),
            ..good
        };
        assert!(bad_amount.validate().is_err());
    }

    #[test]
    fn search_filter_matches_order_id_or_item_name() {
        let filters = OrderFilters {
            search: Some("42".to_string()),
            ..Default::default()
        };
        // Numeric searches produce an id match plus the item-name subquery;
        // both land under one OR group.
        let condition = build_filter_condition(&filters);
        let debug = format!("{:?}", condition);
        assert!(debug.contains("42"));
        assert!(debug.contains("%42%"));

        // Blank searches add no clause at all
        let blank = build_filter_condition(&OrderFilters {
            search: Some("   ".to_string()),
            ..Default::default()
        });
        assert_eq!(format!("{:?}", blank), format!("{:?}", Condition::all()));
    }
}
