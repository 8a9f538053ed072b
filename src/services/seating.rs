use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::{
    db::DbPool,
    entities::{restaurant_table, table_seat},
    errors::ServiceError,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct SeatResponse {
    pub seat_id: i64,
    pub seat_number: String,
    pub row_number: i32,
    pub is_available: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TableWithSeats {
    pub table_id: i64,
    pub table_number: i32,
    pub total_seats: i32,
    pub seats_per_row: i32,
    pub seats: Vec<SeatResponse>,
}

/// Flips every matching seat of the table to unavailable, inside the
/// caller's transaction. Idempotent: an already-occupied seat is a no-op.
/// Zero matches (unknown table, stale seat numbers) is non-fatal — the
/// surrounding order creation proceeds.
pub async fn occupy_seats<C: ConnectionTrait>(
    conn: &C,
    table_number: i32,
    seat_numbers: &[String],
) -> Result<u64, ServiceError> {
    flip_seats(conn, table_number, seat_numbers, false).await
}

/// Inverse of [`occupy_seats`]; frees the matching seats.
pub async fn release_seats<C: ConnectionTrait>(
    conn: &C,
    table_number: i32,
    seat_numbers: &[String],
) -> Result<u64, ServiceError> {
    flip_seats(conn, table_number, seat_numbers, true).await
}

async fn flip_seats<C: ConnectionTrait>(
    conn: &C,
    table_number: i32,
    seat_numbers: &[String],
    available: bool,
) -> Result<u64, ServiceError> {
    if seat_numbers.is_empty() {
        return Ok(0);
    }

    let table = restaurant_table::Entity::find()
        .filter(restaurant_table::Column::TableNumber.eq(table_number))
        .one(conn)
        .await
        .map_err(ServiceError::DatabaseError)?;

    let Some(table) = table else {
        warn!(table_number, "No table matched for seat update; skipping");
        return Ok(0);
    };

    let result = table_seat::Entity::update_many()
        .col_expr(table_seat::Column::IsAvailable, Expr::value(available))
        .filter(table_seat::Column::TableId.eq(table.table_id))
        .filter(
            table_seat::Column::SeatNumber
                .is_in(seat_numbers.iter().map(String::as_str).collect::<Vec<_>>()),
        )
        .exec(conn)
        .await
        .map_err(ServiceError::DatabaseError)?;

    if result.rows_affected == 0 {
        warn!(
            table_number,
            requested = seat_numbers.len(),
            "No seats matched for seat update"
        );
    }

    Ok(result.rows_affected)
}

/// Service for the floor-management view of tables and seats.
#[derive(Clone)]
pub struct SeatingService {
    db: Arc<DbPool>,
}

impl SeatingService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Manually flips one seat's availability.
    #[instrument(skip(self), fields(seat_id = %seat_id))]
    pub async fn toggle_seat(&self, seat_id: i64) -> Result<SeatResponse, ServiceError> {
        let db = &*self.db;

        let seat = table_seat::Entity::find_by_id(seat_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, seat_id, "Failed to fetch seat");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound(format!("Seat {} not found", seat_id)))?;

        let next = !seat.is_available;
        let mut active: table_seat::ActiveModel = seat.into();
        active.is_available = Set(next);

        let updated = active.update(db).await.map_err(|e| {
            error!(error = %e, seat_id, "Failed to toggle seat availability");
            ServiceError::DatabaseError(e)
        })?;

        info!(seat_id, is_available = updated.is_available, "Seat toggled");
        Ok(seat_to_response(updated))
    }

    /// Tables with their seats, ordered for the floor plan.
    #[instrument(skip(self))]
    pub async fn list_tables(&self) -> Result<Vec<TableWithSeats>, ServiceError> {
        let db = &*self.db;

        let tables = restaurant_table::Entity::find()
            .order_by_asc(restaurant_table::Column::TableNumber)
            .find_with_related(table_seat::Entity)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to list tables");
                ServiceError::DatabaseError(e)
            })?;

        Ok(tables
            .into_iter()
            .map(|(table, mut seats)| {
                seats.sort_by(|a, b| {
                    (a.row_number, &a.seat_number).cmp(&(b.row_number, &b.seat_number))
                });
                TableWithSeats {
                    table_id: table.table_id,
                    table_number: table.table_number,
                    total_seats: table.total_seats,
                    seats_per_row: table.seats_per_row,
                    seats: seats.into_iter().map(seat_to_response).collect(),
                }
            })
            .collect())
    }
}

fn seat_to_response(seat: table_seat::Model) -> SeatResponse {
    SeatResponse {
        seat_id: seat.seat_id,
        seat_number: seat.seat_number,
        row_number: seat.row_number,
        is_available: seat.is_available,
    }
}
