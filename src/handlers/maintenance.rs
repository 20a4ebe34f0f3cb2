use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ai::MaintenancePrediction;
use crate::entities::maintenance_record::{self, MaintenanceStatus};
use crate::entities::vehicle::{self, VehicleStatus};
use crate::error::{AppError, AppResult};
use crate::maintenance;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RecordFilters {
    pub vehicle_id: Option<Uuid>,
    pub status: Option<MaintenanceStatus>,
}

pub async fn list_records(
    State(state): State<AppState>,
    Query(filters): Query<RecordFilters>,
) -> AppResult<Json<Vec<maintenance_record::Model>>> {
    let mut query = maintenance_record::Entity::find();

    if let Some(vehicle_id) = filters.vehicle_id {
        query = query.filter(maintenance_record::Column::VehicleId.eq(vehicle_id));
    }
    if let Some(status) = filters.status {
        query = query.filter(maintenance_record::Column::Status.eq(status));
    }

    let records = query
        .order_by_desc(maintenance_record::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(records))
}

/// On-demand prediction for a single vehicle. Does not file a record.
pub async fn predict_vehicle(
    State(state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
) -> AppResult<Json<MaintenancePrediction>> {
    let vehicle = vehicle::Entity::find_by_id(vehicle_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    let prediction = state.ai.predict_maintenance(&vehicle).await;
    Ok(Json(prediction))
}

/// Manually trigger the fleet-wide predictive sweep
pub async fn trigger_sweep(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    let created = maintenance::run_sweep(&state).await?;
    Ok(Json(serde_json::json!({ "records_created": created })))
}

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub scheduled_for: chrono::DateTime<Utc>,
}

/// Schedule a pending record and pull the vehicle out of service
pub async fn schedule_record(
    State(state): State<AppState>,
    Path(record_id): Path<Uuid>,
    Json(payload): Json<ScheduleRequest>,
) -> AppResult<Json<maintenance_record::Model>> {
    let record = maintenance_record::Entity::find_by_id(record_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Maintenance record not found".to_string()))?;

    if record.status != MaintenanceStatus::Pending {
        return Err(AppError::Conflict(
            "Only a pending record can be scheduled".to_string(),
        ));
    }

    let now = Utc::now();
    let txn = state.db.begin().await?;

    let updated = maintenance_record::ActiveModel {
        id: Set(record.id),
        status: Set(MaintenanceStatus::Scheduled),
        scheduled_for: Set(Some(payload.scheduled_for.into())),
        ..Default::default()
    }
    .update(&txn)
    .await?;

    // Take the vehicle off the road unless it is mid-trip
    vehicle::Entity::update_many()
        .set(vehicle::ActiveModel {
            status: Set(VehicleStatus::Maintenance),
            updated_at: Set(now.into()),
            ..Default::default()
        })
        .filter(vehicle::Column::Id.eq(record.vehicle_id))
        .filter(vehicle::Column::Status.eq(VehicleStatus::Available))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(record_id = %record.id, vehicle_id = %record.vehicle_id, "Maintenance scheduled");

    Ok(Json(updated))
}

/// Close a record and restore the vehicle to the available pool with full
/// health
pub async fn complete_record(
    State(state): State<AppState>,
    Path(record_id): Path<Uuid>,
) -> AppResult<Json<maintenance_record::Model>> {
    let record = maintenance_record::Entity::find_by_id(record_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Maintenance record not found".to_string()))?;

    if record.status == MaintenanceStatus::Completed {
        return Err(AppError::Conflict(
            "Record is already completed".to_string(),
        ));
    }

    let now = Utc::now();
    let txn = state.db.begin().await?;

    let updated = maintenance_record::ActiveModel {
        id: Set(record.id),
        status: Set(MaintenanceStatus::Completed),
        completed_at: Set(Some(now.into())),
        ..Default::default()
    }
    .update(&txn)
    .await?;

    vehicle::Entity::update_many()
        .set(vehicle::ActiveModel {
            status: Set(VehicleStatus::Available),
            health_score: Set(100),
            updated_at: Set(now.into()),
            ..Default::default()
        })
        .filter(vehicle::Column::Id.eq(record.vehicle_id))
        .filter(vehicle::Column::Status.eq(VehicleStatus::Maintenance))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(record_id = %record.id, vehicle_id = %record.vehicle_id, "Maintenance completed");

    Ok(Json(updated))
}

#[derive(Debug, Serialize)]
pub struct FleetHealth {
    pub total_vehicles: usize,
    pub average_health: f64,
    pub vehicles_at_risk: usize,
    pub open_alerts: usize,
}

/// Fleet-wide health snapshot
pub async fn fleet_health(State(state): State<AppState>) -> AppResult<Json<FleetHealth>> {
    let vehicles = vehicle::Entity::find().all(&state.db).await?;
    let records = maintenance_record::Entity::find().all(&state.db).await?;
    let open_alerts = records.iter().filter(|r| r.status.is_open()).count();

    let average_health = if vehicles.is_empty() {
        0.0
    } else {
        vehicles.iter().map(|v| v.health_score as f64).sum::<f64>() / vehicles.len() as f64
    };

    let vehicles_at_risk = vehicles
        .iter()
        .filter(|v| maintenance::assess(v.health_score, v.mileage).risk_score > 40)
        .count();

    Ok(Json(FleetHealth {
        total_vehicles: vehicles.len(),
        average_health,
        vehicles_at_risk,
        open_alerts,
    }))
}
