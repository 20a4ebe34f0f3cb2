use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus, PaymentStatus};
use crate::entities::user::{self, UserRole};
use crate::entities::vehicle::{self, VehicleStatus};
use crate::error::{AppError, AppResult};
use crate::handlers::auth::UserInfo;
use crate::handlers::customer::apply_cancellation;
use crate::lifecycle;
use crate::utils::jwt::Claims;
use crate::AppState;

/// List bookings awaiting approval, oldest first
pub async fn pending_bookings(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<booking::Model>>> {
    let bookings = booking::Entity::find()
        .filter(booking::Column::Status.eq(BookingStatus::PendingApproval))
        .order_by_asc(booking::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(bookings))
}

/// List all bookings
pub async fn list_bookings(State(state): State<AppState>) -> AppResult<Json<Vec<booking::Model>>> {
    let bookings = booking::Entity::find()
        .order_by_desc(booking::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(bookings))
}

#[derive(Debug, Deserialize)]
pub struct ApproveBookingRequest {
    pub notes: Option<String>,
}

/// Approve a pending booking. The conditional update makes a repeated or
/// racing approval fail with a conflict instead of overwriting approver
/// metadata.
pub async fn approve_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<ApproveBookingRequest>,
) -> AppResult<Json<booking::Model>> {
    let now = Utc::now();

    let updated = booking::Entity::update_many()
        .set(booking::ActiveModel {
            status: Set(BookingStatus::Approved),
            approved_by: Set(Some(claims.sub)),
            approved_at: Set(Some(now.into())),
            manager_notes: Set(payload.notes),
            updated_at: Set(now.into()),
            ..Default::default()
        })
        .filter(booking::Column::Id.eq(booking_id))
        .filter(booking::Column::Status.eq(BookingStatus::PendingApproval))
        .exec(&state.db)
        .await?;

    if updated.rows_affected == 0 {
        return fail_not_pending(&state, booking_id).await;
    }

    tracing::info!(booking_id = %booking_id, manager_id = %claims.sub, "Booking approved");

    fetch_booking(&state, booking_id).await
}

#[derive(Debug, Deserialize)]
pub struct RejectBookingRequest {
    pub reason: String,
}

/// Reject a pending booking (terminal)
pub async fn reject_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<RejectBookingRequest>,
) -> AppResult<Json<booking::Model>> {
    if payload.reason.trim().is_empty() {
        return Err(AppError::BadRequest(
            "A rejection reason is required".to_string(),
        ));
    }

    let now = Utc::now();

    let updated = booking::Entity::update_many()
        .set(booking::ActiveModel {
            status: Set(BookingStatus::Rejected),
            approved_by: Set(Some(claims.sub)),
            rejection_reason: Set(Some(payload.reason)),
            updated_at: Set(now.into()),
            ..Default::default()
        })
        .filter(booking::Column::Id.eq(booking_id))
        .filter(booking::Column::Status.eq(BookingStatus::PendingApproval))
        .exec(&state.db)
        .await?;

    if updated.rows_affected == 0 {
        return fail_not_pending(&state, booking_id).await;
    }

    tracing::info!(booking_id = %booking_id, manager_id = %claims.sub, "Booking rejected");

    fetch_booking(&state, booking_id).await
}

#[derive(Debug, Deserialize)]
pub struct AssignDriverRequest {
    pub driver_id: Uuid,
}

/// Assign a driver to a booking before it is confirmed
pub async fn assign_driver(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<AssignDriverRequest>,
) -> AppResult<Json<booking::Model>> {
    let driver = user::Entity::find_by_id(payload.driver_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Driver not found".to_string()))?;

    if driver.role != UserRole::Driver {
        return Err(AppError::BadRequest(
            "Assigned user does not have the driver role".to_string(),
        ));
    }

    let booking = booking::Entity::find_by_id(booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    if !matches!(
        booking.status,
        BookingStatus::PendingApproval | BookingStatus::Approved
    ) {
        return Err(AppError::Conflict(
            "Driver can only be assigned before the booking is confirmed".to_string(),
        ));
    }

    let updated = booking::Entity::update_many()
        .set(booking::ActiveModel {
            driver_id: Set(Some(driver.id)),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        })
        .filter(booking::Column::Id.eq(booking_id))
        .filter(booking::Column::Status.eq(booking.status))
        .exec(&state.db)
        .await?;

    if updated.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Booking changed state during driver assignment".to_string(),
        ));
    }

    tracing::info!(booking_id = %booking_id, driver_id = %driver.id, "Driver assigned");

    fetch_booking(&state, booking_id).await
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

/// Cancel any non-terminal booking on a customer's behalf
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<CancelRequest>,
) -> AppResult<Json<booking::Model>> {
    let booking = booking::Entity::find_by_id(booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    let cancelled = apply_cancellation(&state.db, booking, payload.reason).await?;
    Ok(Json(cancelled))
}

/// List users with the driver role
pub async fn list_drivers(State(state): State<AppState>) -> AppResult<Json<Vec<UserInfo>>> {
    let drivers = user::Entity::find()
        .filter(user::Column::Role.eq(UserRole::Driver))
        .all(&state.db)
        .await?;

    Ok(Json(drivers.into_iter().map(UserInfo::from).collect()))
}

#[derive(Debug, Serialize)]
pub struct FleetOverview {
    pub bookings_by_status: serde_json::Value,
    pub vehicles_by_status: serde_json::Value,
    pub total_revenue: f64,
    pub driver_payout: f64,
    pub utilization: f64,
}

/// Aggregate dashboard for managers
pub async fn fleet_overview(State(state): State<AppState>) -> AppResult<Json<FleetOverview>> {
    let bookings = booking::Entity::find().all(&state.db).await?;
    let vehicles = vehicle::Entity::find().all(&state.db).await?;

    let count_bookings = |status: BookingStatus| -> usize {
        bookings.iter().filter(|b| b.status == status).count()
    };
    let count_vehicles = |status: VehicleStatus| -> usize {
        vehicles.iter().filter(|v| v.status == status).count()
    };

    let total_revenue: f64 = bookings
        .iter()
        .filter(|b| b.payment_status == PaymentStatus::Paid)
        .map(|b| b.total_price)
        .sum();

    let driver_payout: f64 = bookings
        .iter()
        .filter(|b| b.status == BookingStatus::Completed)
        .map(|b| lifecycle::driver_earnings(b.total_price))
        .sum();

    let utilization = if vehicles.is_empty() {
        0.0
    } else {
        count_vehicles(VehicleStatus::InUse) as f64 / vehicles.len() as f64
    };

    Ok(Json(FleetOverview {
        bookings_by_status: json!({
            "pending_approval": count_bookings(BookingStatus::PendingApproval),
            "approved": count_bookings(BookingStatus::Approved),
            "confirmed": count_bookings(BookingStatus::Confirmed),
            "in_progress": count_bookings(BookingStatus::InProgress),
            "completed": count_bookings(BookingStatus::Completed),
            "cancelled": count_bookings(BookingStatus::Cancelled),
            "rejected": count_bookings(BookingStatus::Rejected),
        }),
        vehicles_by_status: json!({
            "available": count_vehicles(VehicleStatus::Available),
            "in_use": count_vehicles(VehicleStatus::InUse),
            "maintenance": count_vehicles(VehicleStatus::Maintenance),
        }),
        total_revenue,
        driver_payout,
        utilization,
    }))
}

/// Distinguish "gone" from "already past approval" for a failed conditional
/// update
async fn fail_not_pending(
    state: &AppState,
    booking_id: Uuid,
) -> AppResult<Json<booking::Model>> {
    match booking::Entity::find_by_id(booking_id).one(&state.db).await? {
        None => Err(AppError::NotFound("Booking not found".to_string())),
        Some(b) => Err(AppError::Conflict(format!(
            "Booking is not awaiting approval (current status: {:?})",
            b.status
        ))),
    }
}

async fn fetch_booking(state: &AppState, booking_id: Uuid) -> AppResult<Json<booking::Model>> {
    let booking = booking::Entity::find_by_id(booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    Ok(Json(booking))
}
