//! The async job queue for Routes 3/4/5 (§5, §14). A DashMap-guarded shared
//! structure, not an external broker — the same "single contention point is
//! acceptable at the planned QPS" tradeoff the reference server made for its
//! rate limiter.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

use graphrag_retrieval::Answer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Complete,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobProgress {
    pub thoughts: Vec<String>,
}

pub struct Job {
    pub status: JobStatus,
    pub progress: JobProgress,
    pub result: Option<Answer>,
    pub error: Option<String>,
    last_heartbeat: Instant,
}

impl Job {
    fn new() -> Self {
        Self {
            status: JobStatus::Pending,
            progress: JobProgress { thoughts: Vec::new() },
            result: None,
            error: None,
            last_heartbeat: Instant::now(),
        }
    }
}

/// Single-claim-per-job queue: a job transitions `Pending -> Running` exactly
/// once per attempt. The reaper requeues a `Running` job whose heartbeat has
/// gone stale, matching §5's "worker heartbeats every 10s; a missed
/// heartbeat for > 30s returns the job to the queue" contract.
#[derive(Clone)]
pub struct JobQueue {
    jobs: Arc<DashMap<Uuid, Job>>,
    heartbeat_timeout: Duration,
}

impl JobQueue {
    pub fn new(heartbeat_timeout: Duration) -> Self {
        Self { jobs: Arc::new(DashMap::new()), heartbeat_timeout }
    }

    pub fn submit(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.jobs.insert(id, Job::new());
        id
    }

    /// Claims `id` for execution. Returns `false` if it was already claimed
    /// by another caller (single-claim semantics) — the only write race this
    /// queue has to guard against, since DashMap entries are lock-striped.
    pub fn claim(&self, id: Uuid) -> bool {
        match self.jobs.get_mut(&id) {
            Some(mut job) if job.status == JobStatus::Pending => {
                job.status = JobStatus::Running;
                job.last_heartbeat = Instant::now();
                true
            }
            _ => false,
        }
    }

    pub fn heartbeat(&self, id: Uuid) {
        if let Some(mut job) = self.jobs.get_mut(&id) {
            job.last_heartbeat = Instant::now();
        }
    }

    pub fn record_thought(&self, id: Uuid, thought: String) {
        if let Some(mut job) = self.jobs.get_mut(&id) {
            job.progress.thoughts.push(thought);
        }
    }

    pub fn complete(&self, id: Uuid, answer: Answer) {
        if let Some(mut job) = self.jobs.get_mut(&id) {
            job.status = JobStatus::Complete;
            job.result = Some(answer);
        }
    }

    pub fn fail(&self, id: Uuid, error: String) {
        if let Some(mut job) = self.jobs.get_mut(&id) {
            job.status = JobStatus::Failed;
            job.error = Some(error);
        }
    }

    pub fn status(&self, id: Uuid) -> Option<(JobStatus, JobProgress, Option<Answer>, Option<String>)> {
        self.jobs
            .get(&id)
            .map(|job| (job.status, job.progress.clone(), job.result.clone(), job.error.clone()))
    }

    /// Requeues any `Running` job whose heartbeat is older than the
    /// configured timeout. Run periodically by a background task started in
    /// [`crate::server::start_server`].
    pub fn reap_stale_jobs(&self) {
        for mut job in self.jobs.iter_mut() {
            if job.status == JobStatus::Running && job.last_heartbeat.elapsed() > self.heartbeat_timeout {
                tracing::warn!(job_id = %job.key(), "missed heartbeat, requeuing job");
                job.status = JobStatus::Pending;
            }
        }
    }
}
