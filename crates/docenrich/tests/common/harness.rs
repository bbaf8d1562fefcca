//! Supervisor wired to fake collaborators, plus polling helpers.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use docenrich::{
    Job, JobProgressBroadcaster, JobStatus, JobStore, JobSupervisor, Pipeline, PipelineConfig,
};

use super::fakes::FakeServices;

const POLL_INTERVAL: Duration = Duration::from_millis(5);
const WAIT_LIMIT: Duration = Duration::from_secs(10);

pub struct TestHarness {
    pub supervisor: JobSupervisor,
    pub fakes: Arc<FakeServices>,
}

impl TestHarness {
    /// Unbounded supervisor translating into Spanish.
    pub fn new(fakes: FakeServices) -> Self {
        Self::with_limit(fakes, 0)
    }

    pub fn with_limit(fakes: FakeServices, max_concurrent_jobs: usize) -> Self {
        let fakes = Arc::new(fakes);
        let config = PipelineConfig {
            target_language: "es".to_string(),
            stage_timeout: Duration::from_secs(5),
        };
        let pipeline = Pipeline::new(Arc::new(config), fakes.adapters());
        let supervisor = JobSupervisor::new(
            Arc::new(JobStore::new()),
            Arc::new(pipeline),
            JobProgressBroadcaster::new(1024),
            max_concurrent_jobs,
        );
        Self { supervisor, fakes }
    }

    pub fn job(&self, job_id: &str) -> Job {
        self.supervisor
            .store()
            .get(job_id)
            .unwrap_or_else(|| panic!("job {} not found", job_id))
    }

    /// Polls until the job is `done` or `error`.
    pub async fn wait_for_terminal(&self, job_id: &str) -> Job {
        self.wait_until(job_id, |job| job.status.is_terminal()).await
    }

    pub async fn wait_for_status(&self, job_id: &str, status: JobStatus) -> Job {
        self.wait_until(job_id, |job| job.status == status).await
    }

    pub async fn wait_until_idle(&self) {
        let deadline = tokio::time::Instant::now() + WAIT_LIMIT;
        while self.supervisor.active_jobs() > 0 {
            assert!(
                tokio::time::Instant::now() < deadline,
                "executions still running after {:?}",
                WAIT_LIMIT
            );
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_until<F>(&self, job_id: &str, done: F) -> Job
    where
        F: Fn(&Job) -> bool,
    {
        let deadline = tokio::time::Instant::now() + WAIT_LIMIT;
        loop {
            let job = self.job(job_id);
            if done(&job) {
                return job;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "job {} stuck in {}",
                job_id,
                job.status
            );
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}
