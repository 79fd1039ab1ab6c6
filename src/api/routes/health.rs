//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
///
/// Kubernetes liveness probe.
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health
///
/// Full health status with component details.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let jobs_ok = check_jobs_health(&state).await;

    Json(HealthResponse {
        status: if jobs_ok { "healthy" } else { "unhealthy" }.to_string(),
        jobs: if jobs_ok { "ok" } else { "error" }.to_string(),
        recording: state.is_recording(),
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// The cheapest backend read
async fn check_jobs_health(state: &AppState) -> bool {
    match state.jobs.queues().await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Job backend health check failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness() {
        let status = liveness().await;
        assert_eq!(status, StatusCode::OK);
    }
}
