use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers::{admin, auth, customer, driver, maintenance, manager};
use crate::middleware::auth::{
    auth_middleware, require_admin, require_customer, require_driver, require_manager,
    require_staff,
};
use crate::middleware::rate_limit::create_public_governor;
use crate::middleware::role_rate_limit::{create_role_governor, RateLimitedRole};
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Role-specific governor layers keyed on user id
    let driver_governor = create_role_governor(RateLimitedRole::Driver);
    let customer_governor = create_role_governor(RateLimitedRole::Customer);
    // IP-based governor for unauthenticated routes
    let public_governor = create_public_governor();

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(public_governor);

    // Customer routes (requires auth + customer role)
    // Rate limit: 100 requests per minute
    let customer_routes = Router::new()
        .route("/vehicles", get(customer::list_vehicles))
        .route("/vehicles/{id}", get(customer::get_vehicle))
        .route("/bookings", post(customer::create_booking))
        .route("/bookings", get(customer::my_bookings))
        .route("/bookings/{id}", get(customer::get_booking))
        .route("/bookings/{id}/pay", post(customer::pay_booking))
        .route("/bookings/{id}/cancel", post(customer::cancel_booking))
        .route("/recommendations", get(customer::recommendations))
        .route("/routes/optimize", post(customer::optimize_route))
        .route("/eta", post(customer::predict_eta))
        .layer(customer_governor)
        .layer(middleware::from_fn(require_customer))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Driver routes (requires auth + driver role)
    // Rate limit: 500 requests per minute
    let driver_routes = Router::new()
        .route("/bookings", get(driver::my_bookings))
        .route("/bookings/{id}/start", post(driver::start_trip))
        .route("/bookings/{id}/location", post(driver::update_location))
        .route("/bookings/{id}/complete", post(driver::complete_trip))
        .route("/trips", get(driver::my_trips))
        .route("/earnings", get(driver::earnings))
        .layer(driver_governor)
        .layer(middleware::from_fn(require_driver))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Manager routes (requires auth + manager role)
    let manager_routes = Router::new()
        .route("/bookings", get(manager::list_bookings))
        .route("/bookings/pending", get(manager::pending_bookings))
        .route("/bookings/{id}/approve", post(manager::approve_booking))
        .route("/bookings/{id}/reject", post(manager::reject_booking))
        .route("/bookings/{id}/assign-driver", post(manager::assign_driver))
        .route("/bookings/{id}/cancel", post(manager::cancel_booking))
        .route("/drivers", get(manager::list_drivers))
        .route("/overview", get(manager::fleet_overview))
        .layer(middleware::from_fn(require_manager))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Maintenance routes (manager or admin)
    let maintenance_routes = Router::new()
        .route("/records", get(maintenance::list_records))
        .route("/records/{id}/schedule", post(maintenance::schedule_record))
        .route("/records/{id}/complete", post(maintenance::complete_record))
        .route("/predict/{vehicle_id}", get(maintenance::predict_vehicle))
        .route("/sweep", post(maintenance::trigger_sweep))
        .route("/fleet-health", get(maintenance::fleet_health))
        .layer(middleware::from_fn(require_staff))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Admin routes (requires auth + admin role)
    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/{id}/role", put(admin::update_user_role))
        .route("/users/{id}", delete(admin::delete_user))
        .route("/vehicles", post(admin::create_vehicle))
        .route("/vehicles/{id}", put(admin::update_vehicle))
        .route("/vehicles/{id}", delete(admin::delete_vehicle))
        .route("/bookings", get(admin::list_bookings))
        .route("/bookings/{id}", delete(admin::delete_booking))
        .route("/bookings/{id}/cancel", post(admin::cancel_booking))
        .route("/dashboard", get(admin::dashboard))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/customer", customer_routes)
        .nest("/api/driver", driver_routes)
        .nest("/api/manager", manager_routes)
        .nest("/api/maintenance", maintenance_routes)
        .nest("/api/admin", admin_routes)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AiClient, Config};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn test_state() -> AppState {
        AppState {
            db: sea_orm::DatabaseConnection::default(),
            config: Config {
                database_url: String::new(),
                jwt_secret: "test-secret".to_string(),
                jwt_expiration_hours: 1,
                server_host: "127.0.0.1".to_string(),
                server_port: 0,
                ai_service_url: "http://localhost:5001".to_string(),
                maintenance_sweep_minutes: 60,
                telemetry_tick_seconds: 300,
            },
            ai: AiClient::new("http://localhost:5001".to_string()),
        }
    }

    #[tokio::test]
    async fn test_vehicle_browse_requires_token() {
        let app = create_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/customer/vehicles")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_client_error());

        // no unauthenticated mount exists for vehicle browsing
        let app = create_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/vehicles")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_booking_cancel_route_exists() {
        let app = create_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/admin/bookings/{}/cancel", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        // route is mounted; the request only fails on the missing token
        assert_ne!(response.status(), StatusCode::NOT_FOUND);
        assert_ne!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(response.status().is_client_error());
    }
}
