//! Owns job lifecycles: registration, detached execution and cancellation.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::FutureExt;
use tokio::sync::{broadcast, oneshot, Semaphore};
use tracing::{debug, error, info, Instrument};

use crate::config::Config;
use crate::error::{ConfigError, JobStoreError, QueryError, SubmitError};
use crate::jobs::{
    new_job_id, query, Job, JobProgressBroadcaster, JobProgressEvent, JobStatus, JobStore,
    ResultView, StatusSnapshot,
};
use crate::pipeline::{Pipeline, PipelineContext, StoreProgress};

/// Error recorded on a job cancelled through [`JobSupervisor::cancel`].
pub const CANCELLED_ERROR: &str = "job cancelled";

const DEFAULT_FILENAME: &str = "upload";

/// Running executions by job id. The sender is taken on cancel; the entry
/// itself is removed only by the execution when it exits.
type CancelMap = HashMap<String, Option<oneshot::Sender<()>>>;

/// Creates jobs and runs each one on its own tokio task.
///
/// Submissions never wait for a pipeline. When a concurrency bound is set,
/// jobs beyond it stay `queued` until a slot frees up.
pub struct JobSupervisor {
    store: Arc<JobStore>,
    pipeline: Arc<Pipeline>,
    broadcaster: JobProgressBroadcaster,
    concurrency_limit: Option<Arc<Semaphore>>,
    running: Arc<Mutex<CancelMap>>,
}

impl JobSupervisor {
    /// `max_concurrent_jobs == 0` leaves execution unbounded.
    pub fn new(
        store: Arc<JobStore>,
        pipeline: Arc<Pipeline>,
        broadcaster: JobProgressBroadcaster,
        max_concurrent_jobs: usize,
    ) -> Self {
        let concurrency_limit =
            (max_concurrent_jobs > 0).then(|| Arc::new(Semaphore::new(max_concurrent_jobs)));

        debug!(
            "Initializing job supervisor: max_concurrent={}",
            max_concurrent_jobs
        );

        Self {
            store,
            pipeline,
            broadcaster,
            concurrency_limit,
            running: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Production constructor: fresh store, HTTP-backed pipeline.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(
            Arc::new(JobStore::new()),
            Arc::new(Pipeline::from_config(config)?),
            JobProgressBroadcaster::default(),
            config.pipeline.max_concurrent_jobs,
        ))
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// Registers a job and starts its pipeline in the background.
    ///
    /// Must be called from within a tokio runtime. Returns as soon as the
    /// job is `queued`; later failures are recorded on the job.
    pub fn submit(&self, bytes: Vec<u8>, filename: &str) -> Result<String, SubmitError> {
        if bytes.is_empty() {
            return Err(SubmitError::InvalidInput("empty document".to_string()));
        }

        let filename = match filename.trim() {
            "" => DEFAULT_FILENAME.to_string(),
            name => name.to_string(),
        };

        let job = self
            .store
            .create(Job::new(new_job_id(), filename))
            .map_err(|e| SubmitError::Store(e.to_string()))?;

        info!(job_id = %job.id, filename = %job.filename, bytes = bytes.len(), "Job queued");
        self.broadcaster.send(JobProgressEvent::new(
            &job.id,
            &job.filename,
            JobStatus::Queued,
            "Queued",
        ));

        // Registered before spawning so the task can always find and remove it
        let (cancel_tx, cancel_rx) = oneshot::channel();
        self.lock_running().insert(job.id.clone(), Some(cancel_tx));

        let execution = Execution {
            store: Arc::clone(&self.store),
            pipeline: Arc::clone(&self.pipeline),
            broadcaster: self.broadcaster.clone(),
            concurrency_limit: self.concurrency_limit.clone(),
            running: Arc::clone(&self.running),
            job_id: job.id.clone(),
            filename: job.filename,
        };
        let span = tracing::info_span!("job", job_id = %job.id);
        tokio::spawn(execution.run(bytes, cancel_rx).instrument(span));

        Ok(job.id)
    }

    pub fn status(&self, job_id: &str) -> Result<StatusSnapshot, QueryError> {
        query::status(&self.store, job_id)
    }

    pub fn result(&self, job_id: &str) -> Result<ResultView, QueryError> {
        query::result(&self.store, job_id)
    }

    /// Moves a running or queued job to `error` and stops its execution.
    pub fn cancel(&self, job_id: &str) -> Result<StatusSnapshot, QueryError> {
        let job = self
            .store
            .update(job_id, |job| {
                job.fail(CANCELLED_ERROR)?;
                Ok(job.clone())
            })
            .map_err(|e| match e {
                JobStoreError::NotFound(id) => QueryError::NotFound(id),
                _ => QueryError::AlreadyTerminal(job_id.to_string()),
            })?;

        info!(job_id = %job_id, "Job cancelled");
        self.broadcaster.send(JobProgressEvent::failed(
            &job.id,
            &job.filename,
            CANCELLED_ERROR,
        ));

        let cancel_tx = self
            .lock_running()
            .get_mut(job_id)
            .and_then(Option::take);
        if let Some(cancel_tx) = cancel_tx {
            // The task may have finished in between
            let _ = cancel_tx.send(());
        }

        Ok(StatusSnapshot {
            status: job.status,
            error: job.error,
        })
    }

    /// Progress events for every job, one per status change.
    pub fn subscribe(&self) -> broadcast::Receiver<JobProgressEvent> {
        self.broadcaster.subscribe()
    }

    /// Number of jobs whose execution has not finished yet.
    pub fn active_jobs(&self) -> usize {
        self.lock_running().len()
    }

    fn lock_running(&self) -> MutexGuard<'_, CancelMap> {
        lock_cancel_map(&self.running)
    }
}

fn lock_cancel_map(running: &Mutex<CancelMap>) -> MutexGuard<'_, CancelMap> {
    match running.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("Cancellation map lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// Everything one detached job task needs.
struct Execution {
    store: Arc<JobStore>,
    pipeline: Arc<Pipeline>,
    broadcaster: JobProgressBroadcaster,
    concurrency_limit: Option<Arc<Semaphore>>,
    running: Arc<Mutex<CancelMap>>,
    job_id: String,
    filename: String,
}

impl Execution {
    async fn run(self, bytes: Vec<u8>, cancel_rx: oneshot::Receiver<()>) {
        let work = async {
            let _permit = match &self.concurrency_limit {
                Some(limit) => match Arc::clone(limit).acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(_) => {
                        error!("Concurrency limit closed, running unbounded");
                        None
                    }
                },
                None => None,
            };

            let progress = StoreProgress::new(
                Arc::clone(&self.store),
                self.broadcaster.clone(),
                &self.job_id,
                &self.filename,
            );
            let ctx = PipelineContext::new(&self.job_id, &self.filename, bytes);

            AssertUnwindSafe(self.pipeline.run(ctx, &progress))
                .catch_unwind()
                .await
        };

        tokio::select! {
            outcome = work => {
                if let Err(panic) = outcome {
                    self.record_panic(panic);
                }
            }
            _ = cancel_rx => {
                debug!("Execution stopped by cancellation");
            }
        }

        lock_cancel_map(&self.running).remove(&self.job_id);
    }

    fn record_panic(&self, panic: Box<dyn Any + Send>) {
        let message = format!("pipeline panicked: {}", panic_message(panic.as_ref()));
        error!(error = %message, "Pipeline panicked");

        match self.store.update(&self.job_id, |job| job.fail(message.clone())) {
            Ok(()) => self.broadcaster.send(JobProgressEvent::failed(
                &self.job_id,
                &self.filename,
                &message,
            )),
            Err(e) => debug!(error = %e, "Panic not recorded"),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
