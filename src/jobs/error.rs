//! Job store error types

use thiserror::Error;

/// Errors from the job backend
#[derive(Error, Debug)]
pub enum JobError {
    /// Pages are numbered from 1
    #[error("Invalid page: {0}")]
    InvalidPage(u32),

    #[error("Dead job not found: {job_id} (died at {died_at})")]
    DeadJobNotFound { died_at: i64, job_id: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for job backend operations
pub type JobResult<T> = Result<T, JobError>;
