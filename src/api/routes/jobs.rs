//! Job Routes
//!
//! Read and maintenance endpoints over the job backend.
//!
//! - GET <base>/api/queues - Pending work per job name
//! - GET <base>/api/worker_pools - Worker pool heartbeats
//! - GET <base>/api/busy_workers - Workers currently running a job
//! - GET <base>/api/retry_jobs?page=N - Retry set
//! - GET <base>/api/scheduled_jobs?page=N - Scheduled set
//! - GET <base>/api/dead_jobs?page=N - Dead set
//! - POST <base>/api/delete_dead_job/:died_at/:job_id
//! - POST <base>/api/retry_dead_job/:died_at/:job_id
//! - POST <base>/api/delete_all_dead_jobs
//! - POST <base>/api/retry_all_dead_jobs
//! - GET|POST <base>/api/requests - Always empty

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use crate::api::dto::{EntriesResponse, PageQuery, PageResponse, StatusResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::jobs::{
    DeadJob, Page, Queue, RetryJob, ScheduledJob, WorkerObservation, WorkerPoolHeartbeat,
};

/// GET <base>/api/queues
pub async fn queues(State(state): State<Arc<AppState>>) -> ApiResult<Json<EntriesResponse<Queue>>> {
    let queues = state.jobs.queues().await?;
    Ok(Json(EntriesResponse::new(queues)))
}

/// GET <base>/api/worker_pools
pub async fn worker_pools(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<EntriesResponse<WorkerPoolHeartbeat>>> {
    let heartbeats = state.jobs.worker_pool_heartbeats().await?;
    Ok(Json(EntriesResponse::new(heartbeats)))
}

/// GET <base>/api/busy_workers
pub async fn busy_workers(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<EntriesResponse<WorkerObservation>>> {
    let busy: Vec<WorkerObservation> = state
        .jobs
        .worker_observations()
        .await?
        .into_iter()
        .filter(|observation| observation.is_busy)
        .collect();
    Ok(Json(EntriesResponse::new(busy)))
}

/// GET <base>/api/retry_jobs
pub async fn retry_jobs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PageResponse<RetryJob>>> {
    let page = parse_page(&query)?;
    Ok(Json(page_response(state.jobs.retry_jobs(page).await?)))
}

/// GET <base>/api/scheduled_jobs
pub async fn scheduled_jobs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PageResponse<ScheduledJob>>> {
    let page = parse_page(&query)?;
    Ok(Json(page_response(state.jobs.scheduled_jobs(page).await?)))
}

/// GET <base>/api/dead_jobs
pub async fn dead_jobs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PageResponse<DeadJob>>> {
    let page = parse_page(&query)?;
    Ok(Json(page_response(state.jobs.dead_jobs(page).await?)))
}

/// POST <base>/api/delete_dead_job/:died_at/:job_id
pub async fn delete_dead_job(
    State(state): State<Arc<AppState>>,
    Path((died_at, job_id)): Path<(String, String)>,
) -> ApiResult<Json<StatusResponse>> {
    let died_at = parse_died_at(&died_at)?;
    state.jobs.delete_dead_job(died_at, &job_id).await?;
    Ok(Json(StatusResponse::ok()))
}

/// POST <base>/api/retry_dead_job/:died_at/:job_id
pub async fn retry_dead_job(
    State(state): State<Arc<AppState>>,
    Path((died_at, job_id)): Path<(String, String)>,
) -> ApiResult<Json<StatusResponse>> {
    let died_at = parse_died_at(&died_at)?;
    state.jobs.retry_dead_job(died_at, &job_id).await?;
    Ok(Json(StatusResponse::ok()))
}

/// POST <base>/api/delete_all_dead_jobs
pub async fn delete_all_dead_jobs(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<StatusResponse>> {
    state.jobs.delete_all_dead_jobs().await?;
    Ok(Json(StatusResponse::ok()))
}

/// POST <base>/api/retry_all_dead_jobs
pub async fn retry_all_dead_jobs(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<StatusResponse>> {
    state.jobs.retry_all_dead_jobs().await?;
    Ok(Json(StatusResponse::ok()))
}

/// GET|POST <base>/api/requests
///
/// Request recording has no backend yet; the screen gets an empty list.
pub async fn requests() -> Json<EntriesResponse<Value>> {
    Json(EntriesResponse::new(Vec::new()))
}

/// Missing page means the first one
fn parse_page(query: &PageQuery) -> ApiResult<u32> {
    match query.page.as_deref().map(str::trim) {
        None | Some("") => Ok(1),
        Some(raw) => raw
            .parse()
            .map_err(|_| ApiError::Validation(format!("Invalid page '{}'", raw))),
    }
}

fn parse_died_at(raw: &str) -> ApiResult<i64> {
    raw.parse()
        .map_err(|_| ApiError::Validation(format!("Invalid died_at '{}'", raw)))
}

fn page_response<T>(page: Page<T>) -> PageResponse<T> {
    PageResponse {
        count: page.count,
        entries: page.entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page() {
        assert_eq!(parse_page(&PageQuery::default()).unwrap(), 1);
        assert_eq!(parse_page(&PageQuery { page: Some("3".into()) }).unwrap(), 3);
        assert!(matches!(
            parse_page(&PageQuery { page: Some("two".into()) }),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_died_at() {
        assert_eq!(parse_died_at("1614000000").unwrap(), 1614000000);
        assert!(parse_died_at("yesterday").is_err());
    }
}
