use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::trip;
use crate::entities::vehicle::{self, VehicleStatus};
use crate::error::{AppError, AppResult};
use crate::lifecycle;
use crate::utils::geo::haversine_distance;
use crate::utils::jwt::Claims;
use crate::AppState;

/// Bookings currently assigned to the authenticated driver
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<booking::Model>>> {
    let bookings = booking::Entity::find()
        .filter(booking::Column::DriverId.eq(claims.sub))
        .order_by_desc(booking::Column::ScheduledStart)
        .all(&state.db)
        .await?;

    Ok(Json(bookings))
}

/// Start the trip for a confirmed booking. Opens a trip record capturing the
/// vehicle's fuel and battery levels at departure.
pub async fn start_trip(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<trip::Model>> {
    let booking = find_assigned_booking(&state, booking_id, claims.sub).await?;

    let vehicle = vehicle::Entity::find_by_id(booking.vehicle_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    let now = Utc::now();
    let txn = state.db.begin().await?;

    let updated = booking::Entity::update_many()
        .set(booking::ActiveModel {
            status: Set(BookingStatus::InProgress),
            updated_at: Set(now.into()),
            ..Default::default()
        })
        .filter(booking::Column::Id.eq(booking.id))
        .filter(booking::Column::Status.eq(BookingStatus::Confirmed))
        .exec(&txn)
        .await?;

    if updated.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Only a confirmed booking can be started".to_string(),
        ));
    }

    let trip = trip::ActiveModel {
        id: Set(Uuid::new_v4()),
        booking_id: Set(booking.id),
        vehicle_id: Set(booking.vehicle_id),
        driver_id: Set(claims.sub),
        customer_id: Set(booking.customer_id),
        started_at: Set(now.into()),
        start_fuel_level: Set(vehicle.fuel_level),
        start_battery_level: Set(vehicle.battery_level),
        created_at: Set(now.into()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(booking_id = %booking.id, trip_id = %trip.id, "Trip started");

    Ok(Json(trip))
}

#[derive(Debug, Deserialize)]
pub struct UpdateLocationRequest {
    pub lat: f64,
    pub lng: f64,
}

/// Live position update while the trip runs; mirrored onto the vehicle so
/// fleet views stay current.
pub async fn update_location(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<UpdateLocationRequest>,
) -> AppResult<Json<booking::Model>> {
    let booking = find_assigned_booking(&state, booking_id, claims.sub).await?;

    if booking.status != BookingStatus::InProgress {
        return Err(AppError::Conflict(
            "Location can only be reported on an in-progress trip".to_string(),
        ));
    }

    let now = Utc::now();

    let updated = booking::ActiveModel {
        id: Set(booking.id),
        current_lat: Set(Some(payload.lat)),
        current_lng: Set(Some(payload.lng)),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .update(&state.db)
    .await?;

    vehicle::Entity::update_many()
        .set(vehicle::ActiveModel {
            latitude: Set(Some(payload.lat)),
            longitude: Set(Some(payload.lng)),
            updated_at: Set(now.into()),
            ..Default::default()
        })
        .filter(vehicle::Column::Id.eq(booking.vehicle_id))
        .exec(&state.db)
        .await?;

    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct CompleteTripRequest {
    pub end_fuel_level: i32,
    pub end_battery_level: i32,
}

/// Finish the trip: close the trip record with derived metrics, complete the
/// booking, and return the vehicle to the available pool.
pub async fn complete_trip(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<CompleteTripRequest>,
) -> AppResult<Json<trip::Model>> {
    if !valid_level(payload.end_fuel_level) || !valid_level(payload.end_battery_level) {
        return Err(AppError::BadRequest(
            "Fuel and battery levels must be between 0 and 100".to_string(),
        ));
    }

    let booking = find_assigned_booking(&state, booking_id, claims.sub).await?;

    let open_trip = trip::Entity::find()
        .filter(trip::Column::BookingId.eq(booking.id))
        .filter(trip::Column::EndedAt.is_null())
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Conflict("No open trip for this booking".to_string()))?;

    let vehicle = vehicle::Entity::find_by_id(booking.vehicle_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    let now = Utc::now();
    let distance = haversine_distance(
        booking.pickup_lat,
        booking.pickup_lng,
        booking.dropoff_lat,
        booking.dropoff_lng,
    );
    let duration_minutes = (now - open_trip.started_at.to_utc()).num_minutes().max(1);
    let average_speed = distance / (duration_minutes as f64 / 60.0);
    let earnings = lifecycle::driver_earnings(booking.total_price);

    let txn = state.db.begin().await?;

    let updated = booking::Entity::update_many()
        .set(booking::ActiveModel {
            status: Set(BookingStatus::Completed),
            completed_at: Set(Some(now.into())),
            updated_at: Set(now.into()),
            ..Default::default()
        })
        .filter(booking::Column::Id.eq(booking.id))
        .filter(booking::Column::Status.eq(BookingStatus::InProgress))
        .exec(&txn)
        .await?;

    if updated.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Only an in-progress booking can be completed".to_string(),
        ));
    }

    let trip = trip::ActiveModel {
        id: Set(open_trip.id),
        ended_at: Set(Some(now.into())),
        end_fuel_level: Set(Some(payload.end_fuel_level)),
        end_battery_level: Set(Some(payload.end_battery_level)),
        fuel_consumed: Set(Some((open_trip.start_fuel_level - payload.end_fuel_level).max(0))),
        battery_consumed: Set(Some(
            (open_trip.start_battery_level - payload.end_battery_level).max(0),
        )),
        distance_km: Set(Some(distance)),
        duration_minutes: Set(Some(duration_minutes)),
        average_speed_kmh: Set(Some(average_speed)),
        trip_cost: Set(Some(booking.total_price)),
        driver_earnings: Set(Some(earnings)),
        ..Default::default()
    }
    .update(&txn)
    .await?;

    vehicle::ActiveModel {
        id: Set(vehicle.id),
        status: Set(VehicleStatus::Available),
        current_driver_id: Set(None),
        fuel_level: Set(payload.end_fuel_level),
        battery_level: Set(payload.end_battery_level),
        latitude: Set(Some(booking.dropoff_lat)),
        longitude: Set(Some(booking.dropoff_lng)),
        mileage: Set(vehicle.mileage + distance.round() as i32),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .update(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(
        booking_id = %booking.id,
        trip_id = %trip.id,
        distance_km = distance,
        earnings,
        "Trip completed"
    );

    Ok(Json(trip))
}

/// Trip history for the authenticated driver
pub async fn my_trips(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<trip::Model>>> {
    let trips = trip::Entity::find()
        .filter(trip::Column::DriverId.eq(claims.sub))
        .order_by_desc(trip::Column::StartedAt)
        .all(&state.db)
        .await?;

    Ok(Json(trips))
}

#[derive(Debug, Serialize)]
pub struct EarningsSummary {
    pub total_trips: usize,
    pub total_distance_km: f64,
    pub total_earnings: f64,
}

/// Lifetime earnings over completed trips
pub async fn earnings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<EarningsSummary>> {
    let trips = trip::Entity::find()
        .filter(trip::Column::DriverId.eq(claims.sub))
        .filter(trip::Column::EndedAt.is_not_null())
        .all(&state.db)
        .await?;

    let total_distance_km = trips.iter().filter_map(|t| t.distance_km).sum();
    let total_earnings = trips.iter().filter_map(|t| t.driver_earnings).sum();

    Ok(Json(EarningsSummary {
        total_trips: trips.len(),
        total_distance_km,
        total_earnings,
    }))
}

fn valid_level(level: i32) -> bool {
    (0..=100).contains(&level)
}

/// Booking must exist and be assigned to this driver
async fn find_assigned_booking(
    state: &AppState,
    booking_id: Uuid,
    driver_id: Uuid,
) -> AppResult<booking::Model> {
    let booking = booking::Entity::find_by_id(booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    if booking.driver_id != Some(driver_id) {
        return Err(AppError::Forbidden(
            "Booking is not assigned to you".to_string(),
        ));
    }

    Ok(booking)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_levels_bounded() {
        assert!(valid_level(0));
        assert!(valid_level(100));
        assert!(!valid_level(-5));
        assert!(!valid_level(250));
    }
}
