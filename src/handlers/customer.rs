use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ai::{EtaPrediction, RecommendationFilters, RecommendationResponse, RouteOptimization};
use crate::entities::booking::{self, BookingStatus, PaymentStatus};
use crate::entities::vehicle::{self, VehicleStatus, VehicleType};
use crate::error::{AppError, AppResult};
use crate::lifecycle;
use crate::utils::geo::haversine_distance;
use crate::utils::jwt::Claims;
use crate::AppState;

// ============ Vehicle Browsing ============

#[derive(Debug, Deserialize)]
pub struct VehicleFilters {
    pub vehicle_type: Option<VehicleType>,
    pub is_electric: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct VehicleInfo {
    pub id: Uuid,
    pub registration: String,
    pub manufacturer: String,
    pub model: String,
    pub vehicle_type: VehicleType,
    pub capacity: i32,
    pub is_electric: bool,
    pub health_score: i32,
}

impl From<vehicle::Model> for VehicleInfo {
    fn from(v: vehicle::Model) -> Self {
        Self {
            id: v.id,
            registration: v.registration,
            manufacturer: v.manufacturer,
            model: v.model,
            vehicle_type: v.vehicle_type,
            capacity: v.capacity,
            is_electric: v.is_electric,
            health_score: v.health_score,
        }
    }
}

/// List vehicles currently available for booking
pub async fn list_vehicles(
    State(state): State<AppState>,
    Query(filters): Query<VehicleFilters>,
) -> AppResult<Json<Vec<VehicleInfo>>> {
    let mut query = vehicle::Entity::find()
        .filter(vehicle::Column::Status.eq(VehicleStatus::Available));

    if let Some(vehicle_type) = filters.vehicle_type {
        query = query.filter(vehicle::Column::VehicleType.eq(vehicle_type));
    }
    if let Some(is_electric) = filters.is_electric {
        query = query.filter(vehicle::Column::IsElectric.eq(is_electric));
    }

    let vehicles = query.all(&state.db).await?;

    Ok(Json(vehicles.into_iter().map(VehicleInfo::from).collect()))
}

/// Get a single vehicle
pub async fn get_vehicle(
    State(state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
) -> AppResult<Json<VehicleInfo>> {
    let vehicle = vehicle::Entity::find_by_id(vehicle_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    Ok(Json(vehicle.into()))
}

// ============ Booking Management ============

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub vehicle_id: Uuid,
    pub pickup_address: String,
    pub dropoff_address: String,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub dropoff_lat: f64,
    pub dropoff_lng: f64,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
}

/// Create a booking. The booking starts in PENDING_APPROVAL and the vehicle
/// is only held once payment confirms it, so a rejected request never blocks
/// the vehicle for other customers.
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateBookingRequest>,
) -> AppResult<Json<booking::Model>> {
    let vehicle = vehicle::Entity::find_by_id(payload.vehicle_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    if vehicle.status != VehicleStatus::Available {
        return Err(AppError::Conflict(
            "Vehicle is not available for booking".to_string(),
        ));
    }

    if payload.scheduled_start < Utc::now() {
        return Err(AppError::BadRequest(
            "Cannot book a start time in the past".to_string(),
        ));
    }
    if payload.scheduled_end <= payload.scheduled_start {
        return Err(AppError::BadRequest(
            "End time must be after start time".to_string(),
        ));
    }

    let distance_km = haversine_distance(
        payload.pickup_lat,
        payload.pickup_lng,
        payload.dropoff_lat,
        payload.dropoff_lng,
    );
    let total_price = lifecycle::quote_price(&vehicle.vehicle_type, distance_km);

    let new_booking = booking::ActiveModel {
        id: Set(Uuid::new_v4()),
        customer_id: Set(claims.sub),
        vehicle_id: Set(vehicle.id),
        pickup_address: Set(payload.pickup_address),
        dropoff_address: Set(payload.dropoff_address),
        pickup_lat: Set(payload.pickup_lat),
        pickup_lng: Set(payload.pickup_lng),
        dropoff_lat: Set(payload.dropoff_lat),
        dropoff_lng: Set(payload.dropoff_lng),
        scheduled_start: Set(payload.scheduled_start.into()),
        scheduled_end: Set(payload.scheduled_end.into()),
        total_price: Set(total_price),
        status: Set(BookingStatus::PendingApproval),
        payment_status: Set(PaymentStatus::Unpaid),
        ..Default::default()
    };

    let booking = new_booking.insert(&state.db).await?;

    tracing::info!(booking_id = %booking.id, customer_id = %claims.sub,
        "Booking created, awaiting manager approval");

    Ok(Json(booking))
}

/// List the customer's bookings, newest first
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<booking::Model>>> {
    let bookings = booking::Entity::find()
        .filter(booking::Column::CustomerId.eq(claims.sub))
        .order_by_desc(booking::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(bookings))
}

/// Get one of the customer's bookings
pub async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<booking::Model>> {
    let booking = find_owned_booking(&state.db, booking_id, claims.sub).await?;
    Ok(Json(booking))
}

#[derive(Debug, Deserialize)]
pub struct PayBookingRequest {
    pub payment_method: String,
    pub transaction_id: String,
}

/// Confirm an approved booking by paying for it. Requires a driver to have
/// been assigned; places the vehicle IN_USE.
pub async fn pay_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<PayBookingRequest>,
) -> AppResult<Json<booking::Model>> {
    if payload.payment_method.trim().is_empty() || payload.transaction_id.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Payment method and transaction id are required".to_string(),
        ));
    }

    let booking = find_owned_booking(&state.db, booking_id, claims.sub).await?;

    if booking.status != BookingStatus::Approved {
        return Err(AppError::Conflict(
            "Booking must be approved before payment".to_string(),
        ));
    }

    let driver_id = booking.driver_id.ok_or_else(|| {
        AppError::Conflict("No driver has been assigned to this booking yet".to_string())
    })?;

    let now = Utc::now();
    let txn = state.db.begin().await?;

    // Conditional update so a concurrent confirm/cancel cannot double-apply
    let updated = booking::Entity::update_many()
        .set(booking::ActiveModel {
            status: Set(BookingStatus::Confirmed),
            payment_status: Set(PaymentStatus::Paid),
            payment_method: Set(Some(payload.payment_method)),
            transaction_id: Set(Some(payload.transaction_id)),
            updated_at: Set(now.into()),
            ..Default::default()
        })
        .filter(booking::Column::Id.eq(booking_id))
        .filter(booking::Column::Status.eq(BookingStatus::Approved))
        .exec(&txn)
        .await?;

    if updated.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Booking is no longer awaiting payment".to_string(),
        ));
    }

    // The vehicle must still be free; losing this race aborts the payment
    let held = vehicle::Entity::update_many()
        .set(vehicle::ActiveModel {
            status: Set(VehicleStatus::InUse),
            current_driver_id: Set(Some(driver_id)),
            updated_at: Set(now.into()),
            ..Default::default()
        })
        .filter(vehicle::Column::Id.eq(booking.vehicle_id))
        .filter(vehicle::Column::Status.eq(VehicleStatus::Available))
        .exec(&txn)
        .await?;

    if held.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Vehicle is no longer available".to_string(),
        ));
    }

    txn.commit().await?;

    tracing::info!(booking_id = %booking_id, "Booking confirmed via payment");

    let booking = booking::Entity::find_by_id(booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    Ok(Json(booking))
}

#[derive(Debug, Deserialize)]
pub struct CancelBookingRequest {
    pub reason: Option<String>,
}

/// Cancel a booking (customer-owned)
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<CancelBookingRequest>,
) -> AppResult<Json<booking::Model>> {
    let booking = find_owned_booking(&state.db, booking_id, claims.sub).await?;
    let cancelled = apply_cancellation(&state.db, booking, payload.reason).await?;
    Ok(Json(cancelled))
}

/// Shared cancellation path, also used by managers and admins. Valid from
/// any non-terminal state; releases the vehicle when the booking held it and
/// flips a paid booking to refunded.
pub(crate) async fn apply_cancellation(
    db: &DatabaseConnection,
    booking: booking::Model,
    reason: Option<String>,
) -> AppResult<booking::Model> {
    if booking.status.is_terminal() {
        return Err(AppError::Conflict(
            "Booking is already finalized".to_string(),
        ));
    }

    let now = Utc::now();
    let payment_status = if booking.payment_status == PaymentStatus::Paid {
        PaymentStatus::Refunded
    } else {
        booking.payment_status
    };

    let txn = db.begin().await?;

    let updated = booking::Entity::update_many()
        .set(booking::ActiveModel {
            status: Set(BookingStatus::Cancelled),
            payment_status: Set(payment_status),
            cancellation_reason: Set(reason),
            cancelled_at: Set(Some(now.into())),
            updated_at: Set(now.into()),
            ..Default::default()
        })
        .filter(booking::Column::Id.eq(booking.id))
        .filter(booking::Column::Status.eq(booking.status))
        .exec(&txn)
        .await?;

    if updated.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Booking changed state before cancellation".to_string(),
        ));
    }

    if booking.status.holds_vehicle() {
        vehicle::Entity::update_many()
            .set(vehicle::ActiveModel {
                status: Set(VehicleStatus::Available),
                current_driver_id: Set(None),
                updated_at: Set(now.into()),
                ..Default::default()
            })
            .filter(vehicle::Column::Id.eq(booking.vehicle_id))
            .exec(&txn)
            .await?;
    }

    txn.commit().await?;

    tracing::info!(booking_id = %booking.id, "Booking cancelled");

    booking::Entity::find_by_id(booking.id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
}

async fn find_owned_booking(
    db: &DatabaseConnection,
    booking_id: Uuid,
    customer_id: Uuid,
) -> AppResult<booking::Model> {
    let booking = booking::Entity::find_by_id(booking_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    if booking.customer_id != customer_id {
        return Err(AppError::Forbidden(
            "You can only access your own bookings".to_string(),
        ));
    }

    Ok(booking)
}

// ============ AI-backed Endpoints ============

/// Smart vehicle recommendations (AI service with local fallback)
pub async fn recommendations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(filters): Query<RecommendationFilters>,
) -> AppResult<Json<RecommendationResponse>> {
    let available = vehicle::Entity::find()
        .filter(vehicle::Column::Status.eq(VehicleStatus::Available))
        .all(&state.db)
        .await?;

    let response = state
        .ai
        .recommend_vehicles(claims.sub, &filters, &available)
        .await;

    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub dropoff_lat: f64,
    pub dropoff_lng: f64,
    pub traffic: Option<String>,
}

/// Route optimization (AI service with local fallback)
pub async fn optimize_route(
    State(state): State<AppState>,
    Json(payload): Json<RouteRequest>,
) -> AppResult<Json<RouteOptimization>> {
    let traffic = payload.traffic.as_deref().unwrap_or("medium");
    let result = state
        .ai
        .optimize_route(
            (payload.pickup_lat, payload.pickup_lng),
            (payload.dropoff_lat, payload.dropoff_lng),
            traffic,
        )
        .await;

    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct EtaRequest {
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub dropoff_lat: f64,
    pub dropoff_lng: f64,
    pub avg_speed_kmh: Option<f64>,
    pub traffic: Option<String>,
}

/// ETA prediction (AI service with local fallback)
pub async fn predict_eta(
    State(state): State<AppState>,
    Json(payload): Json<EtaRequest>,
) -> AppResult<Json<EtaPrediction>> {
    let distance_km = haversine_distance(
        payload.pickup_lat,
        payload.pickup_lng,
        payload.dropoff_lat,
        payload.dropoff_lng,
    );
    let avg_speed = payload.avg_speed_kmh.unwrap_or(40.0);
    let traffic = payload.traffic.as_deref().unwrap_or("medium");

    let prediction = state.ai.predict_eta(distance_km, avg_speed, traffic).await;

    Ok(Json(prediction))
}
