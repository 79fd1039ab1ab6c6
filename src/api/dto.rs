//! Data Transfer Objects
//!
//! Request and response bodies of the monitoring API.

use serde::{Deserialize, Serialize};

// ============================================
// JOB DTOs
// ============================================

/// `{"entries": [...]}` listing
#[derive(Debug, Serialize)]
pub struct EntriesResponse<T> {
    pub entries: Vec<T>,
}

impl<T> EntriesResponse<T> {
    pub fn new(entries: Vec<T>) -> Self {
        Self { entries }
    }
}

/// One page of a job set
#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    /// Size of the whole set
    pub count: usize,
    pub entries: Vec<T>,
}

/// `?page=N`, kept as text so bad input can be reported
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<String>,
}

/// Acknowledgement of a maintenance action
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

// ============================================
// REMOTE CONTROL DTOs
// ============================================

/// State of the server-side recording flag after a toggle
#[derive(Debug, Serialize, Deserialize)]
pub struct RecordingResponse {
    pub recording: bool,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy", "unhealthy"
    pub status: String,
    /// Job backend status
    pub jobs: String,
    pub recording: bool,
    pub uptime_seconds: u64,
    pub version: String,
}
