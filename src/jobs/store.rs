//! In-Memory Job Store
//!
//! Holds queues, worker state and the retry/scheduled/dead job sets behind a
//! `tokio::sync::RwLock`. Job sets are ordered by their timestamp, then id.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use tokio::sync::RwLock;

use super::error::{JobError, JobResult};
use super::types::{
    DeadJob, Job, Page, Queue, RetryJob, ScheduledJob, WorkerObservation, WorkerPoolHeartbeat,
};

/// Entries per page of a job set
pub const PAGE_SIZE: usize = 20;

/// Read and maintenance operations the monitoring API needs
#[async_trait]
pub trait JobBackend: Send + Sync {
    async fn queues(&self) -> JobResult<Vec<Queue>>;

    async fn worker_pool_heartbeats(&self) -> JobResult<Vec<WorkerPoolHeartbeat>>;

    async fn worker_observations(&self) -> JobResult<Vec<WorkerObservation>>;

    async fn retry_jobs(&self, page: u32) -> JobResult<Page<RetryJob>>;

    async fn scheduled_jobs(&self, page: u32) -> JobResult<Page<ScheduledJob>>;

    async fn dead_jobs(&self, page: u32) -> JobResult<Page<DeadJob>>;

    async fn delete_dead_job(&self, died_at: i64, job_id: &str) -> JobResult<()>;

    /// Put a dead job back on its queue
    async fn retry_dead_job(&self, died_at: i64, job_id: &str) -> JobResult<()>;

    async fn delete_all_dead_jobs(&self) -> JobResult<usize>;

    async fn retry_all_dead_jobs(&self) -> JobResult<usize>;
}

type SetKey = (i64, String);

#[derive(Debug, Default)]
struct StoreInner {
    queues: BTreeMap<String, VecDeque<Job>>,
    heartbeats: BTreeMap<String, WorkerPoolHeartbeat>,
    observations: BTreeMap<String, WorkerObservation>,
    retry: BTreeMap<SetKey, RetryJob>,
    scheduled: BTreeMap<SetKey, ScheduledJob>,
    dead: BTreeMap<SetKey, DeadJob>,
}

impl StoreInner {
    fn enqueue(&mut self, mut job: Job, now: i64) {
        if job.enqueued_at == 0 {
            job.enqueued_at = now;
        }
        self.queues.entry(job.name.clone()).or_default().push_back(job);
    }

    fn requeue_dead(&mut self, dead: DeadJob, now: i64) {
        let mut job = dead.job;
        job.reset_failures();
        job.enqueued_at = now;
        self.enqueue(job, now);
    }
}

/// Seed data for a store, as loaded from a JSON file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StoreSnapshot {
    pub queued: Vec<Job>,
    pub scheduled: Vec<ScheduledJob>,
    pub retry: Vec<RetryJob>,
    pub dead: Vec<DeadJob>,
    pub worker_pools: Vec<WorkerPoolHeartbeat>,
    pub workers: Vec<WorkerObservation>,
}

/// Job backend kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    inner: RwLock<StoreInner>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled from a snapshot
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let now = now();
        let mut inner = StoreInner::default();

        for job in snapshot.queued {
            inner.enqueue(job, now);
        }
        for job in snapshot.scheduled {
            inner.scheduled.insert((job.run_at, job.job.id.clone()), job);
        }
        for job in snapshot.retry {
            inner.retry.insert((job.retry_at, job.job.id.clone()), job);
        }
        for job in snapshot.dead {
            inner.dead.insert((job.died_at, job.job.id.clone()), job);
        }
        for pool in snapshot.worker_pools {
            inner.heartbeats.insert(pool.worker_pool_id.clone(), pool);
        }
        for worker in snapshot.workers {
            inner.observations.insert(worker.worker_id.clone(), worker);
        }

        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Read a JSON snapshot file
    pub fn load_snapshot(path: &Path) -> JobResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let snapshot: StoreSnapshot = serde_json::from_str(&content)?;
        tracing::info!(
            path = ?path,
            queued = snapshot.queued.len(),
            dead = snapshot.dead.len(),
            "Loaded job snapshot"
        );
        Ok(Self::from_snapshot(snapshot))
    }

    pub async fn enqueue(&self, job: Job) {
        self.inner.write().await.enqueue(job, now());
    }

    pub async fn schedule(&self, job: ScheduledJob) {
        let key = (job.run_at, job.job.id.clone());
        self.inner.write().await.scheduled.insert(key, job);
    }

    pub async fn add_retry(&self, job: RetryJob) {
        let key = (job.retry_at, job.job.id.clone());
        self.inner.write().await.retry.insert(key, job);
    }

    pub async fn add_dead(&self, job: DeadJob) {
        let key = (job.died_at, job.job.id.clone());
        self.inner.write().await.dead.insert(key, job);
    }

    pub async fn record_heartbeat(&self, heartbeat: WorkerPoolHeartbeat) {
        self.inner
            .write()
            .await
            .heartbeats
            .insert(heartbeat.worker_pool_id.clone(), heartbeat);
    }

    pub async fn record_observation(&self, observation: WorkerObservation) {
        self.inner
            .write()
            .await
            .observations
            .insert(observation.worker_id.clone(), observation);
    }

    /// Pending jobs for a job name, oldest first
    pub async fn pending(&self, job_name: &str) -> Vec<Job> {
        self.inner
            .read()
            .await
            .queues
            .get(job_name)
            .map(|q| q.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl JobBackend for MemoryJobStore {
    async fn queues(&self) -> JobResult<Vec<Queue>> {
        let now = now();
        let inner = self.inner.read().await;
        Ok(inner
            .queues
            .iter()
            .filter(|(_, jobs)| !jobs.is_empty())
            .map(|(name, jobs)| Queue {
                job_name: name.clone(),
                count: jobs.len() as i64,
                latency: jobs
                    .front()
                    .map(|job| (now - job.enqueued_at).max(0))
                    .unwrap_or(0),
            })
            .collect())
    }

    async fn worker_pool_heartbeats(&self) -> JobResult<Vec<WorkerPoolHeartbeat>> {
        Ok(self.inner.read().await.heartbeats.values().cloned().collect())
    }

    async fn worker_observations(&self) -> JobResult<Vec<WorkerObservation>> {
        Ok(self.inner.read().await.observations.values().cloned().collect())
    }

    async fn retry_jobs(&self, page: u32) -> JobResult<Page<RetryJob>> {
        paginate(&self.inner.read().await.retry, page)
    }

    async fn scheduled_jobs(&self, page: u32) -> JobResult<Page<ScheduledJob>> {
        paginate(&self.inner.read().await.scheduled, page)
    }

    async fn dead_jobs(&self, page: u32) -> JobResult<Page<DeadJob>> {
        paginate(&self.inner.read().await.dead, page)
    }

    async fn delete_dead_job(&self, died_at: i64, job_id: &str) -> JobResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .dead
            .remove(&(died_at, job_id.to_string()))
            .ok_or_else(|| not_found(died_at, job_id))?;
        tracing::info!(job_id, died_at, "Deleted dead job");
        Ok(())
    }

    async fn retry_dead_job(&self, died_at: i64, job_id: &str) -> JobResult<()> {
        let mut inner = self.inner.write().await;
        let dead = inner
            .dead
            .remove(&(died_at, job_id.to_string()))
            .ok_or_else(|| not_found(died_at, job_id))?;
        inner.requeue_dead(dead, now());
        tracing::info!(job_id, died_at, "Retried dead job");
        Ok(())
    }

    async fn delete_all_dead_jobs(&self) -> JobResult<usize> {
        let mut inner = self.inner.write().await;
        let count = inner.dead.len();
        inner.dead.clear();
        tracing::info!(count, "Deleted all dead jobs");
        Ok(count)
    }

    async fn retry_all_dead_jobs(&self) -> JobResult<usize> {
        let now = now();
        let mut inner = self.inner.write().await;
        let dead = std::mem::take(&mut inner.dead);
        let count = dead.len();
        for job in dead.into_values() {
            inner.requeue_dead(job, now);
        }
        tracing::info!(count, "Retried all dead jobs");
        Ok(count)
    }
}

fn paginate<T: Clone>(set: &BTreeMap<SetKey, T>, page: u32) -> JobResult<Page<T>> {
    if page == 0 {
        return Err(JobError::InvalidPage(page));
    }
    let offset = (page as usize - 1) * PAGE_SIZE;
    Ok(Page {
        count: set.len(),
        entries: set.values().skip(offset).take(PAGE_SIZE).cloned().collect(),
    })
}

fn not_found(died_at: i64, job_id: &str) -> JobError {
    JobError::DeadJobNotFound {
        died_at,
        job_id: job_id.to_string(),
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use tempfile::tempdir;

    fn job(name: &str, id: &str) -> Job {
        Job::new(name, Map::new()).with_id(id)
    }

    #[tokio::test]
    async fn test_queues_grouped_by_name() {
        let store = MemoryJobStore::new();
        store.enqueue(job("email", "1")).await;
        store.enqueue(job("email", "2")).await;
        store.enqueue(job("report", "3")).await;

        let queues = store.queues().await.unwrap();
        assert_eq!(queues.len(), 2);
        assert_eq!(queues[0].job_name, "email");
        assert_eq!(queues[0].count, 2);
        assert_eq!(queues[1].job_name, "report");
        assert!(queues.iter().all(|q| q.latency >= 0));
    }

    #[tokio::test]
    async fn test_dead_jobs_paginate() {
        let store = MemoryJobStore::new();
        for i in 0..45 {
            store
                .add_dead(DeadJob {
                    died_at: 1000 + i,
                    job: job("email", &format!("job-{}", i)),
                })
                .await;
        }

        let first = store.dead_jobs(1).await.unwrap();
        assert_eq!(first.count, 45);
        assert_eq!(first.entries.len(), PAGE_SIZE);
        assert_eq!(first.entries[0].died_at, 1000);

        let second = store.dead_jobs(2).await.unwrap();
        assert_eq!(second.entries[0].died_at, 1020);

        let third = store.dead_jobs(3).await.unwrap();
        assert_eq!(third.entries.len(), 5);

        assert!(store.dead_jobs(4).await.unwrap().entries.is_empty());
        assert!(matches!(store.dead_jobs(0).await, Err(JobError::InvalidPage(0))));
    }

    #[tokio::test]
    async fn test_retry_dead_job_requeues() {
        let store = MemoryJobStore::new();
        store
            .add_dead(DeadJob {
                died_at: 500,
                job: job("email", "abc").failed("boom", 499),
            })
            .await;

        store.retry_dead_job(500, "abc").await.unwrap();

        assert_eq!(store.dead_jobs(1).await.unwrap().count, 0);
        let pending = store.pending("email").await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "abc");
        assert_eq!(pending[0].fails, 0);
        assert!(pending[0].last_err.is_none());

        assert!(matches!(
            store.retry_dead_job(500, "abc").await,
            Err(JobError::DeadJobNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_and_retry_all() {
        let store = MemoryJobStore::new();
        for i in 0..3 {
            store
                .add_dead(DeadJob {
                    died_at: i,
                    job: job("report", &i.to_string()),
                })
                .await;
        }

        store.delete_dead_job(0, "0").await.unwrap();
        assert_eq!(store.retry_all_dead_jobs().await.unwrap(), 2);
        assert_eq!(store.pending("report").await.len(), 2);
        assert_eq!(store.delete_all_dead_jobs().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_load_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("jobs.json");
        std::fs::write(
            &path,
            r#"{
                "queued": [{"name": "email", "id": "q1", "t": 1}],
                "dead": [{"died_at": 7, "name": "email", "id": "d1", "t": 1}],
                "worker_pools": [{
                    "worker_pool_id": "pool-1", "started_at": 1, "heartbeat_at": 2,
                    "job_names": ["email"], "concurrency": 4, "host": "worker-a",
                    "pid": 42, "worker_ids": ["w1"]
                }],
                "workers": [{"worker_id": "w1", "is_busy": true, "job_name": "email"}]
            }"#,
        )
        .unwrap();

        let store = MemoryJobStore::load_snapshot(&path).unwrap();
        assert_eq!(store.queues().await.unwrap()[0].count, 1);
        assert_eq!(store.dead_jobs(1).await.unwrap().entries[0].job.id, "d1");
        assert_eq!(store.worker_pool_heartbeats().await.unwrap()[0].pid, 42);
        assert!(store.worker_observations().await.unwrap()[0].is_busy);
    }
}
