use crate::config::APPLICATION_NAME;
use axum::Json;
use serde::Serialize;

/// Liveness path, reachable without credentials.
pub const HEALTH_PATH: &str = "/actuator/health";

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub application: &'static str,
}

/// Reports the process as up. Backend reachability is not probed.
pub async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "UP",
        application: APPLICATION_NAME,
    })
}
