use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    pub ai_service_url: String,
    pub maintenance_sweep_minutes: u64,
    pub telemetry_tick_seconds: u64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            database_url: env::var("DATABASE_URL")
                .expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET")
                .expect("JWT_SECRET must be set"),
            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .expect("JWT_EXPIRATION_HOURS must be a number"),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            ai_service_url: env::var("AI_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:5001".to_string()),
            maintenance_sweep_minutes: env::var("MAINTENANCE_SWEEP_MINUTES")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .expect("MAINTENANCE_SWEEP_MINUTES must be a number"),
            telemetry_tick_seconds: env::var("TELEMETRY_TICK_SECONDS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .expect("TELEMETRY_TICK_SECONDS must be a number"),
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
