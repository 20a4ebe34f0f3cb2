use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus, PaymentStatus};
use crate::entities::trip;
use crate::entities::user::{self, UserRole};
use crate::entities::vehicle::{self, VehicleStatus, VehicleType};
use crate::error::{AppError, AppResult};
use crate::handlers::auth::UserInfo;
use crate::handlers::customer::apply_cancellation;
use crate::lifecycle;
use crate::AppState;

pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserInfo>>> {
    let users = user::Entity::find()
        .order_by_asc(user::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(users.into_iter().map(UserInfo::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

pub async fn update_user_role(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> AppResult<Json<UserInfo>> {
    let user = user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let updated = user::ActiveModel {
        id: Set(user.id),
        role: Set(payload.role),
        ..Default::default()
    }
    .update(&state.db)
    .await?;

    tracing::info!(user_id = %user_id, role = ?updated.role, "User role updated");

    Ok(Json(UserInfo::from(updated)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    // A cascade delete would take live bookings with it and strand the vehicle
    let active = booking::Entity::find()
        .filter(
            Condition::any()
                .add(booking::Column::CustomerId.eq(user_id))
                .add(booking::Column::DriverId.eq(user_id)),
        )
        .filter(booking::Column::Status.is_not_in(lifecycle::TERMINAL_STATUSES))
        .one(&state.db)
        .await?;

    if active.is_some() {
        return Err(AppError::Conflict(
            "User still has active bookings".to_string(),
        ));
    }

    let result = user::Entity::delete_by_id(user_id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "deleted": user_id })))
}

#[derive(Debug, Deserialize)]
pub struct CreateVehicleRequest {
    pub registration: String,
    pub manufacturer: String,
    pub model: String,
    pub vehicle_type: VehicleType,
    pub capacity: i32,
    #[serde(default)]
    pub is_electric: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

pub async fn create_vehicle(
    State(state): State<AppState>,
    Json(payload): Json<CreateVehicleRequest>,
) -> AppResult<Json<vehicle::Model>> {
    if payload.registration.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Registration must not be empty".to_string(),
        ));
    }
    if payload.capacity <= 0 {
        return Err(AppError::BadRequest(
            "Capacity must be positive".to_string(),
        ));
    }

    let now = Utc::now();
    let vehicle = vehicle::ActiveModel {
        id: Set(Uuid::new_v4()),
        registration: Set(payload.registration),
        manufacturer: Set(payload.manufacturer),
        model: Set(payload.model),
        vehicle_type: Set(payload.vehicle_type),
        capacity: Set(payload.capacity),
        is_electric: Set(payload.is_electric),
        status: Set(VehicleStatus::Available),
        latitude: Set(payload.latitude),
        longitude: Set(payload.longitude),
        battery_level: Set(100),
        fuel_level: Set(100),
        health_score: Set(100),
        mileage: Set(0),
        current_driver_id: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(vehicle_id = %vehicle.id, registration = %vehicle.registration, "Vehicle created");

    Ok(Json(vehicle))
}

#[derive(Debug, Deserialize)]
pub struct UpdateVehicleRequest {
    pub status: Option<VehicleStatus>,
    pub capacity: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub battery_level: Option<i32>,
    pub fuel_level: Option<i32>,
    pub health_score: Option<i32>,
    pub mileage: Option<i32>,
}

pub async fn update_vehicle(
    State(state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
    Json(payload): Json<UpdateVehicleRequest>,
) -> AppResult<Json<vehicle::Model>> {
    let vehicle = vehicle::Entity::find_by_id(vehicle_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    if let Some(level) = payload.battery_level {
        if !(0..=100).contains(&level) {
            return Err(AppError::BadRequest(
                "Battery level must be between 0 and 100".to_string(),
            ));
        }
    }
    if let Some(level) = payload.fuel_level {
        if !(0..=100).contains(&level) {
            return Err(AppError::BadRequest(
                "Fuel level must be between 0 and 100".to_string(),
            ));
        }
    }
    if let Some(score) = payload.health_score {
        if !(0..=100).contains(&score) {
            return Err(AppError::BadRequest(
                "Health score must be between 0 and 100".to_string(),
            ));
        }
    }

    let mut active: vehicle::ActiveModel = vehicle.into();
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    if let Some(capacity) = payload.capacity {
        active.capacity = Set(capacity);
    }
    if let Some(lat) = payload.latitude {
        active.latitude = Set(Some(lat));
    }
    if let Some(lng) = payload.longitude {
        active.longitude = Set(Some(lng));
    }
    if let Some(level) = payload.battery_level {
        active.battery_level = Set(level);
    }
    if let Some(level) = payload.fuel_level {
        active.fuel_level = Set(level);
    }
    if let Some(score) = payload.health_score {
        active.health_score = Set(score);
    }
    if let Some(mileage) = payload.mileage {
        active.mileage = Set(mileage);
    }
    active.updated_at = Set(Utc::now().into());

    let updated = active.update(&state.db).await?;
    Ok(Json(updated))
}

pub async fn delete_vehicle(
    State(state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let vehicle = vehicle::Entity::find_by_id(vehicle_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    if vehicle.status == VehicleStatus::InUse {
        return Err(AppError::Conflict(
            "Cannot delete a vehicle that is in use".to_string(),
        ));
    }

    vehicle::Entity::delete_by_id(vehicle_id)
        .exec(&state.db)
        .await?;

    Ok(Json(serde_json::json!({ "deleted": vehicle_id })))
}

pub async fn list_bookings(State(state): State<AppState>) -> AppResult<Json<Vec<booking::Model>>> {
    let bookings = booking::Entity::find()
        .order_by_desc(booking::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(bookings))
}

pub async fn delete_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let booking = booking::Entity::find_by_id(booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    if !booking.status.is_terminal() {
        return Err(AppError::Conflict(
            "Only terminal bookings can be deleted".to_string(),
        ));
    }

    booking::Entity::delete_by_id(booking_id)
        .exec(&state.db)
        .await?;

    Ok(Json(serde_json::json!({ "deleted": booking_id })))
}

#[derive(Debug, Deserialize)]
pub struct CancelBookingRequest {
    pub reason: Option<String>,
}

/// Cancel any non-terminal booking, releasing its vehicle
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<CancelBookingRequest>,
) -> AppResult<Json<booking::Model>> {
    let booking = booking::Entity::find_by_id(booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    let cancelled = apply_cancellation(&state.db, booking, payload.reason).await?;
    Ok(Json(cancelled))
}

#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    pub total_users: usize,
    pub users_by_role: serde_json::Value,
    pub total_vehicles: usize,
    pub total_bookings: usize,
    pub total_trips: usize,
    pub total_revenue: f64,
    pub total_driver_payout: f64,
    pub net_revenue: f64,
}

pub async fn dashboard(State(state): State<AppState>) -> AppResult<Json<AdminDashboard>> {
    let users = user::Entity::find().all(&state.db).await?;
    let vehicles = vehicle::Entity::find().all(&state.db).await?;
    let bookings = booking::Entity::find().all(&state.db).await?;
    let trips = trip::Entity::find()
        .filter(trip::Column::EndedAt.is_not_null())
        .all(&state.db)
        .await?;

    let count_role =
        |role: UserRole| -> usize { users.iter().filter(|u| u.role == role).count() };

    let total_revenue: f64 = bookings
        .iter()
        .filter(|b| b.payment_status == PaymentStatus::Paid && b.status != BookingStatus::Cancelled)
        .map(|b| b.total_price)
        .sum();

    let total_driver_payout: f64 = trips.iter().filter_map(|t| t.driver_earnings).sum();

    Ok(Json(AdminDashboard {
        total_users: users.len(),
        users_by_role: serde_json::json!({
            "admin": count_role(UserRole::Admin),
            "manager": count_role(UserRole::Manager),
            "driver": count_role(UserRole::Driver),
            "customer": count_role(UserRole::Customer),
        }),
        total_vehicles: vehicles.len(),
        total_bookings: bookings.len(),
        total_trips: trips.len(),
        total_revenue,
        total_driver_payout,
        net_revenue: total_revenue - total_driver_payout,
    }))
}
