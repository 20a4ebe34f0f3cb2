//! Client for the out-of-process AI service.
//!
//! Every call degrades to a local heuristic when the service is unreachable
//! or returns garbage. Failures are logged and absorbed here; callers never
//! see an error from this module.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

use crate::entities::maintenance_record::MaintenancePriority;
use crate::entities::vehicle::{self, VehicleType};
use crate::maintenance;
use crate::utils::geo::haversine_distance;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct AiClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenancePrediction {
    pub risk_score: i32,
    pub priority: MaintenancePriority,
    pub predicted_days_to_failure: i32,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub fallback: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtaPrediction {
    pub eta_minutes: f64,
    #[serde(default)]
    pub fallback: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteOption {
    pub variant: String,
    pub distance_km: f64,
    pub eta_minutes: f64,
    pub energy_cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteOptimization {
    pub primary: RouteOption,
    pub alternatives: Vec<RouteOption>,
    #[serde(default)]
    pub fallback: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleRecommendation {
    pub vehicle_id: Uuid,
    pub registration: String,
    pub score: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<VehicleRecommendation>,
    #[serde(default)]
    pub fallback: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendationFilters {
    pub vehicle_type: Option<VehicleType>,
    pub is_electric: Option<bool>,
}

impl AiClient {
    pub fn new(base_url: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self { http, base_url }
    }

    pub async fn is_available(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.http.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    pub async fn predict_maintenance(&self, vehicle: &vehicle::Model) -> MaintenancePrediction {
        let url = format!("{}/api/ai/maintenance/predict", self.base_url);
        let body = json!({
            "vehicleId": vehicle.id,
            "healthScore": vehicle.health_score,
            "mileage": vehicle.mileage,
            "batteryLevel": vehicle.battery_level,
            "fuelLevel": vehicle.fuel_level,
        });

        match self.post_json::<MaintenancePrediction>(&url, &body).await {
            Ok(prediction) => prediction,
            Err(e) => {
                tracing::warn!(vehicle_id = %vehicle.id, "AI maintenance prediction unavailable, using heuristic: {}", e);
                let assessment = maintenance::assess(vehicle.health_score, vehicle.mileage);
                MaintenancePrediction {
                    risk_score: assessment.risk_score,
                    priority: assessment.priority,
                    predicted_days_to_failure: assessment.predicted_days_to_failure,
                    issues: assessment.issues,
                    fallback: true,
                }
            }
        }
    }

    pub async fn predict_eta(
        &self,
        distance_km: f64,
        avg_speed_kmh: f64,
        traffic: &str,
    ) -> EtaPrediction {
        let url = format!("{}/api/ai/eta/predict", self.base_url);
        let body = json!({
            "distanceKm": distance_km,
            "avgSpeed": avg_speed_kmh,
            "trafficLevel": traffic,
        });

        match self.post_json::<EtaPrediction>(&url, &body).await {
            Ok(prediction) => prediction,
            Err(e) => {
                tracing::warn!("AI ETA prediction unavailable, using heuristic: {}", e);
                EtaPrediction {
                    eta_minutes: fallback_eta_minutes(distance_km, avg_speed_kmh, traffic),
                    fallback: true,
                }
            }
        }
    }

    pub async fn optimize_route(
        &self,
        pickup: (f64, f64),
        dropoff: (f64, f64),
        traffic: &str,
    ) -> RouteOptimization {
        let url = format!("{}/api/ai/route/optimize", self.base_url);
        let body = json!({
            "pickup": { "lat": pickup.0, "lng": pickup.1 },
            "dropoff": { "lat": dropoff.0, "lng": dropoff.1 },
            "trafficCondition": traffic,
        });

        match self.post_json::<RouteOptimization>(&url, &body).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("AI route optimization unavailable, using heuristic: {}", e);
                fallback_routes(pickup, dropoff)
            }
        }
    }

    pub async fn recommend_vehicles(
        &self,
        customer_id: Uuid,
        filters: &RecommendationFilters,
        available: &[vehicle::Model],
    ) -> RecommendationResponse {
        let url = format!("{}/api/ai/recommend/vehicles", self.base_url);
        let body = json!({
            "customerId": customer_id,
            "filters": {
                "vehicleType": filters.vehicle_type,
                "isElectric": filters.is_electric,
            },
        });

        match self.post_json::<RecommendationResponse>(&url, &body).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(customer_id = %customer_id, "AI recommendations unavailable, using heuristic: {}", e);
                fallback_recommendations(filters, available)
            }
        }
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<T, reqwest::Error> {
        self.http
            .post(url)
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await
    }
}

/// Traffic multiplier applied on top of the free-flow travel time.
fn traffic_factor(traffic: &str) -> f64 {
    match traffic.to_ascii_lowercase().as_str() {
        "high" => 1.8,
        "medium" => 1.5,
        _ => 1.2,
    }
}

pub fn fallback_eta_minutes(distance_km: f64, avg_speed_kmh: f64, traffic: &str) -> f64 {
    let speed = if avg_speed_kmh > 0.0 { avg_speed_kmh } else { 40.0 };
    let base_minutes = distance_km / speed * 60.0;
    let eta = base_minutes * traffic_factor(traffic);
    (eta * 100.0).round() / 100.0
}

// Route variants are the haversine distance with a fixed multiplier per
// optimization goal, an ETA from a 40 km/h base speed, and a per-km energy
// cost.
const ROUTE_VARIANTS: [(&str, f64, f64); 4] = [
    ("fastest", 1.0, 2.5),
    ("shortest", 0.95, 2.3),
    ("energy_efficient", 1.05, 2.0),
    ("balanced", 1.0, 2.2),
];

const BASE_SPEED_KMH: f64 = 40.0;

pub fn fallback_routes(pickup: (f64, f64), dropoff: (f64, f64)) -> RouteOptimization {
    let direct_km = haversine_distance(pickup.0, pickup.1, dropoff.0, dropoff.1);

    let options: Vec<RouteOption> = ROUTE_VARIANTS
        .iter()
        .map(|(variant, multiplier, cost_per_km)| {
            let distance_km = direct_km * multiplier;
            RouteOption {
                variant: variant.to_string(),
                distance_km,
                eta_minutes: fallback_eta_minutes(distance_km, BASE_SPEED_KMH, "medium"),
                energy_cost: (distance_km * cost_per_km * 100.0).round() / 100.0,
            }
        })
        .collect();

    RouteOptimization {
        primary: options[0].clone(),
        alternatives: options,
        fallback: true,
    }
}

fn fallback_recommendations(
    filters: &RecommendationFilters,
    available: &[vehicle::Model],
) -> RecommendationResponse {
    let mut recommendations: Vec<VehicleRecommendation> = available
        .iter()
        .filter(|v| {
            filters
                .vehicle_type
                .as_ref()
                .is_none_or(|t| &v.vehicle_type == t)
                && filters.is_electric.is_none_or(|e| v.is_electric == e)
        })
        .map(|v| VehicleRecommendation {
            vehicle_id: v.id,
            registration: v.registration.clone(),
            score: v.health_score as f64 / 100.0,
            reason: format!("Health score {} of 100", v.health_score),
        })
        .collect();

    recommendations.sort_by(|a, b| b.score.total_cmp(&a.score));

    RecommendationResponse {
        recommendations,
        fallback: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eta_fallback_traffic_factors() {
        // 60 km at 60 km/h is 60 minutes free-flow
        assert_eq!(fallback_eta_minutes(60.0, 60.0, "low"), 72.0);
        assert_eq!(fallback_eta_minutes(60.0, 60.0, "medium"), 90.0);
        assert_eq!(fallback_eta_minutes(60.0, 60.0, "high"), 108.0);
    }

    #[test]
    fn test_eta_fallback_guards_zero_speed() {
        let eta = fallback_eta_minutes(40.0, 0.0, "low");
        assert!(eta > 0.0 && eta.is_finite());
    }

    #[test]
    fn test_route_fallback_variants() {
        let routes = fallback_routes((12.9716, 77.5946), (12.2958, 76.6394));
        assert_eq!(routes.alternatives.len(), 4);
        assert!(routes.fallback);
        assert_eq!(routes.primary.variant, "fastest");

        let shortest = routes
            .alternatives
            .iter()
            .find(|r| r.variant == "shortest")
            .unwrap();
        // 0.95 multiplier makes shortest strictly shorter than the direct route
        assert!(shortest.distance_km < routes.primary.distance_km);
    }
}
