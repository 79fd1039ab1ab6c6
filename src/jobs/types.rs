//! Job Model
//!
//! Records the monitoring API serves. Field names follow the job backend's
//! wire format so the dashboard screens can render them directly.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A unit of work, queued or parked in one of the job sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    pub id: String,

    /// Enqueue time, unix seconds
    #[serde(rename = "t", default)]
    pub enqueued_at: i64,

    #[serde(default)]
    pub args: Map<String, Value>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unique: bool,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub fails: i64,

    #[serde(rename = "err", default, skip_serializing_if = "Option::is_none")]
    pub last_err: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<i64>,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

impl Job {
    /// New job with a random id, enqueued now
    pub fn new(name: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            id: uuid::Uuid::new_v4().simple().to_string(),
            enqueued_at: chrono::Utc::now().timestamp(),
            args,
            unique: false,
            fails: 0,
            last_err: None,
            failed_at: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn enqueued_at(mut self, timestamp: i64) -> Self {
        self.enqueued_at = timestamp;
        self
    }

    /// Record a failed attempt
    pub fn failed(mut self, error: impl Into<String>, at: i64) -> Self {
        self.fails += 1;
        self.last_err = Some(error.into());
        self.failed_at = Some(at);
        self
    }

    /// Drop failure bookkeeping before the job runs again
    pub fn reset_failures(&mut self) {
        self.fails = 0;
        self.last_err = None;
        self.failed_at = None;
    }
}

/// A failed job waiting for its next attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryJob {
    pub retry_at: i64,
    #[serde(flatten)]
    pub job: Job,
}

/// A job set to run at a later time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub run_at: i64,
    #[serde(flatten)]
    pub job: Job,
}

/// A job that exhausted its retries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadJob {
    pub died_at: i64,
    #[serde(flatten)]
    pub job: Job,
}

/// Pending work for one job name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Queue {
    pub job_name: String,
    pub count: i64,
    /// Seconds the oldest pending job has waited
    pub latency: i64,
}

/// Liveness report of a worker pool process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerPoolHeartbeat {
    pub worker_pool_id: String,
    pub started_at: i64,
    pub heartbeat_at: i64,
    #[serde(default)]
    pub job_names: Vec<String>,
    pub concurrency: u32,
    pub host: String,
    pub pid: u32,
    #[serde(default)]
    pub worker_ids: Vec<String>,
}

/// What a single worker is doing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerObservation {
    pub worker_id: String,
    pub is_busy: bool,
    #[serde(default)]
    pub job_name: String,
    #[serde(default)]
    pub job_id: String,
    #[serde(default)]
    pub started_at: i64,
    #[serde(default)]
    pub args_json: String,
    #[serde(default)]
    pub checkin: String,
    #[serde(default)]
    pub checkin_at: i64,
}

/// One page of a job set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// Size of the whole set
    pub count: usize,
    pub entries: Vec<T>,
}
