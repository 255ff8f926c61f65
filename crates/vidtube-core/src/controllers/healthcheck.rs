use axum::routing::get;
use axum::Router;
use serde::Serialize;
use utoipa::ToSchema;

use crate::response::ApiResponse;

use super::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: &'static str,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(healthcheck))
}

/// Liveness check.
#[utoipa::path(
    get,
    path = "/api/v1/healthcheck",
    responses((status = 200, description = "Service is up", body = ApiResponse<HealthStatus>)),
    tag = "healthcheck"
)]
pub async fn healthcheck() -> ApiResponse<HealthStatus> {
    ApiResponse::success(HealthStatus { status: "OK" }).with_message("Health check passed")
}
