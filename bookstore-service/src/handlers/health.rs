use crate::dtos::{ApiInfo, HealthResponse};
use crate::services::get_metrics;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

pub async fn index() -> impl IntoResponse {
    Json(ApiInfo::new())
}

/// Ping the store: 200 when reachable, 503 with the failure otherwise.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse::healthy())),
        Err(e) => {
            tracing::warn!(error = %e.message(), "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse::unhealthy(e.message())),
            )
        }
    }
}

pub async fn readiness_check(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state
        .store
        .ping()
        .await
        .map_err(|e| AppError::ServiceUnavailable(anyhow::anyhow!(e.message())))?;
    Ok(StatusCode::OK)
}

pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}
