//! Maintenance risk scoring and the periodic fleet sweep.

use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::entities::maintenance_record::{self, MaintenancePriority, MaintenanceStatus};
use crate::entities::vehicle::{self, VehicleStatus};
use crate::error::AppResult;
use crate::AppState;

/// Risk above which the sweep files a predictive maintenance record.
const SWEEP_RISK_THRESHOLD: i32 = 40;

impl MaintenanceStatus {
    /// A record stays open until it is completed; an open predictive record
    /// blocks the sweep from filing another alert for the same vehicle.
    pub fn is_open(self) -> bool {
        !matches!(self, MaintenanceStatus::Completed)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    pub risk_score: i32,
    pub priority: MaintenancePriority,
    pub predicted_days_to_failure: i32,
    pub issues: Vec<String>,
}

/// Fixed rule table for maintenance risk: degraded health and high mileage
/// each add a weighted contribution, and the total buckets into a priority
/// with an associated days-to-failure estimate.
pub fn assess(health_score: i32, mileage: i32) -> RiskAssessment {
    let mut risk_score = 0;
    let mut issues = Vec::new();

    if health_score < 70 {
        risk_score += 30;
        issues.push(format!("Health score degraded to {}", health_score));
    }
    if mileage > 50_000 {
        risk_score += 20;
        issues.push(format!("High mileage: {} km", mileage));
    }

    let (priority, predicted_days_to_failure) = if risk_score > 60 {
        (MaintenancePriority::Critical, 7)
    } else if risk_score > 40 {
        (MaintenancePriority::High, 15)
    } else {
        (MaintenancePriority::Low, 30)
    };

    RiskAssessment {
        risk_score,
        priority,
        predicted_days_to_failure,
        issues,
    }
}

pub fn estimated_cost(risk_score: i32) -> f64 {
    2000.0 + risk_score as f64 * 50.0
}

/// One pass over the whole fleet: ask the AI collaborator (or its local
/// fallback) for a prediction per vehicle and file a pending predictive
/// record for anything risky that has no open alert yet.
/// Returns the number of records created.
pub async fn run_sweep(state: &AppState) -> AppResult<u32> {
    let vehicles = vehicle::Entity::find().all(&state.db).await?;
    let mut created = 0;

    for v in vehicles {
        let prediction = state.ai.predict_maintenance(&v).await;
        if prediction.risk_score <= SWEEP_RISK_THRESHOLD {
            continue;
        }

        // A scheduled alert is still open, not just a pending one
        let open_alert = maintenance_record::Entity::find()
            .filter(maintenance_record::Column::VehicleId.eq(v.id))
            .filter(maintenance_record::Column::IsPredictive.eq(true))
            .filter(maintenance_record::Column::Status.ne(MaintenanceStatus::Completed))
            .one(&state.db)
            .await?;

        if open_alert.is_some() {
            continue;
        }

        let description = if prediction.issues.is_empty() {
            format!("Predicted risk score {}", prediction.risk_score)
        } else {
            prediction.issues.join("; ")
        };

        let record = maintenance_record::ActiveModel {
            id: Set(Uuid::new_v4()),
            vehicle_id: Set(v.id),
            issue_type: Set("Predictive maintenance alert".to_string()),
            description: Set(description),
            is_predictive: Set(true),
            risk_score: Set(prediction.risk_score),
            predicted_days_to_failure: Set(Some(prediction.predicted_days_to_failure)),
            priority: Set(prediction.priority),
            status: Set(MaintenanceStatus::Pending),
            estimated_cost: Set(Some(estimated_cost(prediction.risk_score))),
            ..Default::default()
        };
        record.insert(&state.db).await?;

        tracing::info!(vehicle_id = %v.id, registration = %v.registration,
            risk_score = prediction.risk_score, "Filed predictive maintenance alert");
        created += 1;
    }

    Ok(created)
}

/// Simulated telemetry drift for vehicles currently on the road: a little
/// fuel or battery burned, a few km added.
pub async fn telemetry_tick(db: &DatabaseConnection) -> AppResult<()> {
    let in_use = vehicle::Entity::find()
        .filter(vehicle::Column::Status.eq(VehicleStatus::InUse))
        .all(db)
        .await?;

    for v in in_use {
        // Rng is not Send, so draw everything before awaiting
        let (fuel_drop, battery_drop, km) = {
            let mut rng = rand::thread_rng();
            (
                rng.gen_range(1..=3),
                rng.gen_range(1..=3),
                rng.gen_range(1..=8),
            )
        };

        let mut active: vehicle::ActiveModel = v.clone().into();
        if v.is_electric {
            active.battery_level = Set((v.battery_level - battery_drop).max(0));
        } else {
            active.fuel_level = Set((v.fuel_level - fuel_drop).max(0));
        }
        active.mileage = Set(v.mileage + km);
        active.updated_at = Set(Utc::now().into());
        active.update(db).await?;
    }

    Ok(())
}

pub fn spawn_background_tasks(state: AppState) {
    let sweep_state = state.clone();
    tokio::spawn(async move {
        let period = Duration::from_secs(sweep_state.config.maintenance_sweep_minutes * 60);
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            match run_sweep(&sweep_state).await {
                Ok(0) => tracing::debug!("Maintenance sweep complete, no new alerts"),
                Ok(n) => tracing::info!("Maintenance sweep complete, {} new alert(s)", n),
                Err(e) => tracing::error!("Maintenance sweep failed: {}", e),
            }
        }
    });

    tokio::spawn(async move {
        let period = Duration::from_secs(state.config.telemetry_tick_seconds);
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            if let Err(e) = telemetry_tick(&state.db).await {
                tracing::error!("Telemetry tick failed: {}", e);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degraded_health_and_high_mileage() {
        let a = assess(65, 60_000);
        assert_eq!(a.risk_score, 50);
        assert_eq!(a.priority, MaintenancePriority::High);
        assert_eq!(a.predicted_days_to_failure, 15);
        assert_eq!(a.issues.len(), 2);
    }

    #[test]
    fn test_healthy_low_mileage() {
        let a = assess(90, 10_000);
        assert_eq!(a.risk_score, 0);
        assert_eq!(a.priority, MaintenancePriority::Low);
        assert_eq!(a.predicted_days_to_failure, 30);
        assert!(a.issues.is_empty());
    }

    #[test]
    fn test_health_alone_stays_low_priority() {
        let a = assess(50, 20_000);
        assert_eq!(a.risk_score, 30);
        assert_eq!(a.priority, MaintenancePriority::Low);
        assert_eq!(a.predicted_days_to_failure, 30);
    }

    #[test]
    fn test_boundary_values() {
        // 70 and 50_000 are exclusive boundaries
        assert_eq!(assess(70, 50_000).risk_score, 0);
        assert_eq!(assess(69, 50_001).risk_score, 50);
    }

    #[test]
    fn test_scheduled_records_still_count_as_open() {
        assert!(MaintenanceStatus::Pending.is_open());
        assert!(MaintenanceStatus::Scheduled.is_open());
        assert!(!MaintenanceStatus::Completed.is_open());
    }

    #[test]
    fn test_estimated_cost_scales_with_risk() {
        assert_eq!(estimated_cost(0), 2000.0);
        assert_eq!(estimated_cost(50), 4500.0);
    }
}
