//! Microscope HTTP API
//!
//! Serves the dashboard shell and the job monitoring API, built with Axum.
//! Everything except static files and health probes lives under the base
//! path (`/<mount>`, or nothing when the mount path is empty).
//!
//! # Endpoints
//!
//! ## Shell
//! - `GET <base>` / `GET <base>/` - Index page with `window.Microscope`
//! - `GET /static/*` - Compiled assets
//!
//! ## Remote control
//! - `POST <base>/microscope-api/toggle-recording` - Flip recording
//!
//! ## Jobs
//! - `GET <base>/api/queues`
//! - `GET <base>/api/worker_pools`
//! - `GET <base>/api/busy_workers`
//! - `GET <base>/api/retry_jobs?page=N`
//! - `GET <base>/api/scheduled_jobs?page=N`
//! - `GET <base>/api/dead_jobs?page=N`
//! - `POST <base>/api/delete_dead_job/:died_at/:job_id`
//! - `POST <base>/api/retry_dead_job/:died_at/:job_id`
//! - `POST <base>/api/delete_all_dead_jobs`
//! - `POST <base>/api/retry_all_dead_jobs`
//! - `GET|POST <base>/api/requests`
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use microscope::api::{serve, ApiConfig, AppState};
//! use microscope::jobs::MemoryJobStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApiConfig::default();
//!     let state = AppState::new(Arc::new(MemoryJobStore::new()), config.clone());
//!     serve(state, &config).await?;
//!     Ok(())
//! }
//! ```

pub mod assets;
pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use assets::{render_index, AssetManifest};
pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue},
    middleware::map_response,
    response::Response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let base = state.config.base_path();

    let job_routes = Router::new()
        .route("/queues", get(routes::jobs::queues))
        .route("/worker_pools", get(routes::jobs::worker_pools))
        .route("/busy_workers", get(routes::jobs::busy_workers))
        .route("/retry_jobs", get(routes::jobs::retry_jobs))
        .route("/scheduled_jobs", get(routes::jobs::scheduled_jobs))
        .route("/dead_jobs", get(routes::jobs::dead_jobs))
        .route(
            "/delete_dead_job/:died_at/:job_id",
            post(routes::jobs::delete_dead_job),
        )
        .route(
            "/retry_dead_job/:died_at/:job_id",
            post(routes::jobs::retry_dead_job),
        )
        .route("/delete_all_dead_jobs", post(routes::jobs::delete_all_dead_jobs))
        .route("/retry_all_dead_jobs", post(routes::jobs::retry_all_dead_jobs))
        .route(
            "/requests",
            get(routes::jobs::requests).post(routes::jobs::requests),
        )
        .layer(map_response(json_utf8));

    let remote_routes = Router::new()
        .route("/toggle-recording", post(routes::recording::toggle_recording))
        .layer(map_response(json_utf8));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/", get(routes::health::full_health));

    let shell_routes = if base.is_empty() {
        Router::new().route("/", get(routes::index::index))
    } else {
        Router::new()
            .route(&base, get(routes::index::index))
            .route(&format!("{}/", base), get(routes::index::index))
    };

    let assets_dir = state.config.assets_dir.clone();

    // Create shared state
    let shared_state = Arc::new(state);

    shell_routes
        .nest(&format!("{}/api", base), job_routes)
        .nest(&format!("{}/microscope-api", base), remote_routes)
        .nest("/health", health_routes)
        .nest_service("/static", ServeDir::new(assets_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Label JSON responses as UTF-8
async fn json_utf8(mut response: Response) -> Response {
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );
    response
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let base = config.base_path();
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Microscope listening on http://{}{}/", addr, base);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Microscope shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
