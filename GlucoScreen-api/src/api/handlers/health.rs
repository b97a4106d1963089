use axum::{extract::State, http::StatusCode, Json};
use tracing::{debug, instrument};

use gluco_screen_domain::health::{SystemHealth, SystemStatus};

use crate::api::routes::SharedHealthService;

/// Health of the database and the loaded classifier
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy or degraded", body = SystemHealth),
        (status = 503, description = "Service is unhealthy", body = SystemHealth)
    ),
    tag = "health"
)]
#[instrument(skip(health))]
pub async fn health_check(State(health): State<SharedHealthService>) -> (StatusCode, Json<SystemHealth>) {
    let report = health.get_system_health().await;
    debug!("Health status: {:?}", report.status);

    let status = match report.status {
        SystemStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        SystemStatus::Healthy | SystemStatus::Degraded => StatusCode::OK,
    };
    (status, Json(report))
}
